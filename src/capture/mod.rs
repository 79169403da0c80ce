//! Capture session and the pieces it drives.

/// Rolling frames-per-second estimate.
pub mod fps;
/// Options accepted by [`session::FrameCapturer::start`].
pub mod options;
/// Bounded, fire-and-forget frame writes.
pub mod scheduler;
/// The capture state machine.
pub mod session;
