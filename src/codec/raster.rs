use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::format::registry::FormatId;
use crate::foundation::core::FrameRGBA;
use crate::foundation::error::{CaptureError, CaptureResult};
use crate::foundation::math::over_opaque;

/// JPEG quality, matching what browsers use for canvas exports.
pub const JPEG_QUALITY: u8 = 92;

/// Lossy WebP quality on libwebp's 0-100 scale, matching browser canvas exports.
pub const WEBP_QUALITY: f32 = 80.0;

/// JPEG has no alpha channel; transparent pixels are composited over this color.
pub const JPEG_BACKGROUND: [u8; 3] = [0, 0, 0];

/// Encode a straight-alpha RGBA8 frame into `format`.
///
/// This is CPU-bound and synchronous; async callers run it on the blocking pool.
pub fn encode_raster(format: FormatId, frame: &FrameRGBA) -> CaptureResult<Vec<u8>> {
    frame.validate()?;

    let mut out = Vec::new();
    let res = match format {
        FormatId::Png => PngEncoder::new(&mut out).write_image(
            &frame.data,
            frame.width,
            frame.height,
            ExtendedColorType::Rgba8,
        ),
        FormatId::Jpeg => {
            let rgb = flatten_to_rgb8(frame, JPEG_BACKGROUND);
            JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).write_image(
                &rgb,
                frame.width,
                frame.height,
                ExtendedColorType::Rgb8,
            )
        }
        FormatId::Webp => return encode_lossy_webp(frame),
        FormatId::WebpLossless => {
            return Err(CaptureError::encode(
                "webp-lossless is encoded by the binary codec, not the raster path",
            ));
        }
    };
    res.map_err(|e| CaptureError::encode(format!("{format}: {e}")))?;
    Ok(out)
}

fn encode_lossy_webp(frame: &FrameRGBA) -> CaptureResult<Vec<u8>> {
    let encoded = webp::Encoder::from_rgba(&frame.data, frame.width, frame.height)
        .encode_simple(false, WEBP_QUALITY)
        .map_err(|e| CaptureError::encode(format!("webp: {e:?}")))?;
    Ok(encoded.to_vec())
}

fn flatten_to_rgb8(frame: &FrameRGBA, bg: [u8; 3]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(frame.data.len() / 4 * 3);
    for px in frame.data.chunks_exact(4) {
        let a = px[3];
        if a == 255 {
            rgb.extend_from_slice(&px[..3]);
            continue;
        }
        rgb.push(over_opaque(px[0], a, bg[0]));
        rgb.push(over_opaque(px[1], a, bg[1]));
        rgb.push(over_opaque(px[2], a, bg[2]));
    }
    rgb
}

#[cfg(test)]
#[path = "../../tests/unit/codec/raster.rs"]
mod tests;
