use std::path::Path;

use anyhow::Context as _;

use crate::format::registry::{FormatDescriptor, FormatId, lookup};
use crate::foundation::error::{CaptureError, CaptureResult};

/// Default bound on concurrent frame writes.
pub const DEFAULT_PARALLEL_WRITE_LIMIT: usize = 8;

/// Options for [`crate::FrameCapturer::start`].
///
/// `format` is kept as the raw identifier so that options read from files or the command line are
/// validated by `start` itself, before any sink is requested.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureOptions {
    /// Format identifier, one of [`FormatId::as_str`]. Defaults to `"png"`.
    pub format: String,
    /// Number of frames to capture. `None` or `Some(0)` captures until stopped.
    pub frames: Option<u64>,
    /// Maximum number of writes in flight. `0` removes the bound.
    #[serde(alias = "parallelWriteLimit")]
    pub parallel_write_limit: usize,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            format: FormatId::Png.as_str().to_string(),
            frames: None,
            parallel_write_limit: DEFAULT_PARALLEL_WRITE_LIMIT,
        }
    }
}

impl CaptureOptions {
    /// Default options for `format`.
    pub fn new(format: FormatId) -> Self {
        Self {
            format: format.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Stop automatically after `frames` frames (0 = never).
    pub fn with_frames(mut self, frames: u64) -> Self {
        self.frames = Some(frames);
        self
    }

    /// Set the bound on concurrent writes (0 = unbounded).
    pub fn with_parallel_write_limit(mut self, limit: usize) -> Self {
        self.parallel_write_limit = limit;
        self
    }

    /// Target frame count, with `0` normalized to "unbounded".
    pub fn target_frames(&self) -> Option<u64> {
        self.frames.filter(|&n| n > 0)
    }

    /// Resolve `format` against the format registry.
    pub fn resolve_format(&self) -> CaptureResult<&'static FormatDescriptor> {
        lookup(&self.format)
    }

    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> CaptureResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| CaptureError::validation(format!("invalid capture options: {e}")))
    }

    /// Read options from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> CaptureResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read options file '{}'", path.display()))?;
        Self::from_json_str(&s)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/options.rs"]
mod tests;
