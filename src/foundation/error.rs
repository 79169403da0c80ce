/// Convenience result type used across framecap.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Error taxonomy for capture sessions and per-frame work.
///
/// Session-setup failures (`UnsupportedFormat`, `NoSink`, `AlreadyAttached`) are returned from
/// [`crate::FrameCapturer::start`]. Per-frame failures are logged by the pipeline and never reach
/// the caller of `start`/`stop`.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    /// The requested format identifier is not one of the registered formats.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The host declined to provide a sink, or the environment has none.
    #[error("no sink: {0}")]
    NoSink(String),

    /// A capture session is already attached to this capturer.
    #[error("capturer already attached")]
    AlreadyAttached,

    /// `stop` was called while `start` was still acquiring its sink.
    #[error("capture start cancelled")]
    Cancelled,

    /// The lossless codec module failed to load.
    #[error("codec init error: {0}")]
    CodecInit(String),

    /// The lossless codec produced bytes that are not a RIFF container.
    #[error("codec output corrupt: {0}")]
    CodecOutputCorrupt(String),

    /// A raster encoder failed to compress a frame.
    #[error("encode error: {0}")]
    Encode(String),

    /// Invalid user-provided options or pixel data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CaptureError {
    /// Build a [`CaptureError::UnsupportedFormat`] value.
    pub fn unsupported_format(name: impl Into<String>) -> Self {
        Self::UnsupportedFormat(name.into())
    }

    /// Build a [`CaptureError::NoSink`] value.
    pub fn no_sink(msg: impl Into<String>) -> Self {
        Self::NoSink(msg.into())
    }

    /// Build a [`CaptureError::CodecInit`] value.
    pub fn codec_init(msg: impl Into<String>) -> Self {
        Self::CodecInit(msg.into())
    }

    /// Build a [`CaptureError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`CaptureError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
