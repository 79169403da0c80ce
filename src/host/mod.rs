//! Interfaces to the world around the capture pipeline.
//!
//! The renderer and the sink are owned by the host application; the pipeline only talks to them
//! through these traits.

/// Host renderer contract.
pub mod renderer;
/// Directory-like sinks that captured frames are written into.
pub mod sink;
