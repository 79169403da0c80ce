use super::*;

fn gradient(width: u32, height: u32) -> FrameRGBA {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[(x * 16) as u8, (y * 16) as u8, 128, 255]);
        }
    }
    FrameRGBA::new(width, height, data).unwrap()
}

#[test]
fn png_output_decodes_back_to_same_pixels() {
    let frame = gradient(8, 4);
    let bytes = encode_raster(FormatId::Png, &frame).unwrap();
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));

    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (8, 4));
    assert_eq!(decoded.into_raw(), frame.data);
}

#[test]
fn jpeg_output_has_soi_marker_and_dimensions() {
    let frame = gradient(16, 8);
    let bytes = encode_raster(FormatId::Jpeg, &frame).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 8));
}

fn has_chunk(bytes: &[u8], fourcc: &[u8; 4]) -> bool {
    bytes.windows(4).any(|w| w == fourcc)
}

#[test]
fn webp_output_is_lossy_vp8() {
    let bytes = encode_raster(FormatId::Webp, &gradient(16, 16)).unwrap();
    assert_eq!(&bytes[..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WEBP");
    assert!(has_chunk(&bytes, b"VP8 "));
    assert!(!has_chunk(&bytes, b"VP8L"));

    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 16));
}

#[test]
fn lossless_webp_never_takes_the_raster_path() {
    let frame = gradient(4, 4);
    assert!(matches!(
        encode_raster(FormatId::WebpLossless, &frame),
        Err(CaptureError::Encode(msg)) if msg.contains("binary codec")
    ));
}

#[test]
fn jpeg_flattens_alpha_over_background() {
    let frame = FrameRGBA::solid(1, 1, [255, 0, 0, 128]);
    assert_eq!(flatten_to_rgb8(&frame, [0, 0, 0]), vec![128, 0, 0]);
    assert_eq!(flatten_to_rgb8(&frame, [0, 0, 255]), vec![128, 0, 127]);
}

#[test]
fn malformed_frames_are_rejected_before_encoding() {
    let short = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 8],
    };
    assert!(matches!(
        encode_raster(FormatId::Png, &short),
        Err(CaptureError::Validation(_))
    ));

    let empty = FrameRGBA {
        width: 0,
        height: 0,
        data: Vec::new(),
    };
    assert!(encode_raster(FormatId::Jpeg, &empty).is_err());
}
