//! Framecap records frames from a live animation loop into numbered image files.
//!
//! The host supplies a [`Renderer`] (the draw loop) and a [`SinkProvider`] (where frames go).
//! A [`FrameCapturer`] then:
//!
//! - switches the renderer to one-frame-at-a-time drawing
//! - encodes every drawn frame as PNG, JPEG, WebP or lossless WebP
//! - writes `frame-00000.<ext>`, `frame-00001.<ext>`, ... with a bounded number of writes in
//!   flight, stopping at an optional frame target
//!
//! Lossless WebP goes through a [`BinaryCodec`] that is loaded on first use and shared by the
//! whole process.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Capture session, options, FPS estimate and write scheduling.
pub mod capture;
/// Frame encoders.
pub mod codec;
/// Output format registry.
pub mod format;
/// Interfaces to the animation host and the output directory.
pub mod host;

pub use crate::foundation::core::{FrameIndex, FrameRGBA};
pub use crate::foundation::error::{CaptureError, CaptureResult};

pub use crate::capture::fps::FpsEstimator;
pub use crate::capture::options::{CaptureOptions, DEFAULT_PARALLEL_WRITE_LIMIT};
pub use crate::capture::scheduler::WriteScheduler;
pub use crate::capture::session::{CaptureState, FrameCapturer, FrameHook};
pub use crate::codec::binary::{BinaryCodec, EmbeddedWebp, LosslessModule, ModuleSource};
pub use crate::codec::encode_frame;
pub use crate::format::registry::{
    EncodePath, FormatDescriptor, FormatId, formats, frame_file_name, lookup,
};
pub use crate::host::renderer::Renderer;
pub use crate::host::sink::{
    DirectorySink, FixedSink, FsDirectory, FsDirectoryProvider, MemoryDirectory, SinkProvider,
};
