use std::sync::Arc;

use super::*;
use crate::codec::binary::{EmbeddedWebp, has_riff_header};
use crate::format::registry::{FormatId, descriptor};

#[tokio::test]
async fn raster_formats_do_not_touch_the_binary_codec() {
    let codec = BinaryCodec::new(Arc::new(EmbeddedWebp));
    let frame = FrameRGBA::solid(4, 4, [12, 34, 56, 255]);

    for id in [FormatId::Png, FormatId::Jpeg, FormatId::Webp] {
        let bytes = encode_frame(descriptor(id), frame.clone(), &codec)
            .await
            .unwrap();
        assert!(!bytes.is_empty(), "{id}");
    }
    assert!(!codec.is_initialized());
}

#[tokio::test]
async fn lossless_webp_goes_through_the_binary_codec() {
    let codec = BinaryCodec::new(Arc::new(EmbeddedWebp));
    let frame = FrameRGBA::solid(4, 4, [12, 34, 56, 255]);

    let bytes = encode_frame(descriptor(FormatId::WebpLossless), frame, &codec)
        .await
        .unwrap();
    assert!(has_riff_header(&bytes));
    assert!(codec.is_initialized());
}

#[tokio::test]
async fn webp_and_lossless_webp_produce_different_bitstreams() {
    let codec = BinaryCodec::new(Arc::new(EmbeddedWebp));
    let frame = FrameRGBA::solid(16, 16, [200, 40, 90, 255]);

    let lossy = encode_frame(descriptor(FormatId::Webp), frame.clone(), &codec)
        .await
        .unwrap();
    let lossless = encode_frame(descriptor(FormatId::WebpLossless), frame, &codec)
        .await
        .unwrap();

    assert_ne!(lossy, lossless);
    assert!(lossy.windows(4).any(|w| w == b"VP8 "));
    assert!(lossless.windows(4).any(|w| w == b"VP8L"));
}
