use crate::foundation::error::{CaptureError, CaptureResult};

/// 0-based index of a captured frame within one capture session.
///
/// Indices are assigned in render order and are gap-free: the n-th frame that reaches the write
/// scheduler gets index `n`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl std::fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A frame read back from the host renderer as straight-alpha RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major, straight (non-premultiplied) alpha.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Wrap a pixel buffer, checking that `data` holds exactly `width * height` RGBA pixels.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> CaptureResult<Self> {
        check_rgba8_len(width, height, data.len())?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Check that the frame is non-empty and its buffer matches its dimensions.
    pub(crate) fn validate(&self) -> CaptureResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::validation("frame width/height must be non-zero"));
        }
        check_rgba8_len(self.width, self.height, self.data.len())
    }

    /// A frame filled with a single straight-alpha color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let px = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(px * 4);
        for _ in 0..px {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// `true` when the frame has no pixels.
    ///
    /// Hosts return empty frames when the canvas could not be read; the capture pipeline treats
    /// them as a transient miss.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }
}

/// Byte length of a tightly packed `width`x`height` RGBA8 buffer.
pub(crate) fn rgba8_len(width: u32, height: u32) -> CaptureResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(4))
        .ok_or_else(|| {
            CaptureError::validation(format!("frame dimensions {width}x{height} overflow"))
        })
}

fn check_rgba8_len(width: u32, height: u32, len: usize) -> CaptureResult<()> {
    let expected = rgba8_len(width, height)?;
    if len != expected {
        return Err(CaptureError::validation(format!(
            "frame data is {len} bytes, expected {expected} for {width}x{height} rgba8"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
