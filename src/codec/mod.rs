//! Frame encoders.
//!
//! Raster formats go through [`raster::encode_raster`] on the blocking pool. Lossless WebP goes
//! through the lazily loaded [`binary::BinaryCodec`].

/// Lazily initialized lossless codec module.
pub mod binary;
/// Generic raster encoders (PNG, JPEG, WebP).
pub mod raster;

use anyhow::Context as _;

use crate::codec::binary::BinaryCodec;
use crate::format::registry::{EncodePath, FormatDescriptor};
use crate::foundation::core::FrameRGBA;
use crate::foundation::error::CaptureResult;

/// Encode one frame with the encoder its format is registered for.
pub async fn encode_frame(
    desc: &FormatDescriptor,
    frame: FrameRGBA,
    binary: &BinaryCodec,
) -> CaptureResult<Vec<u8>> {
    match desc.path {
        EncodePath::BinaryCodec => binary.encode(frame).await,
        EncodePath::Raster { .. } => {
            let id = desc.id;
            tokio::task::spawn_blocking(move || raster::encode_raster(id, &frame))
                .await
                .context("raster encode task")?
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/dispatch.rs"]
mod tests;
