use crate::capture::session::FrameHook;
use crate::foundation::core::FrameRGBA;

/// The animation host a [`crate::FrameCapturer`] captures from.
///
/// The renderer owns its draw loop. While a hook is attached it must call
/// [`FrameHook::post_draw`] after every drawn frame and await it before drawing the next one, so
/// per-frame callbacks never overlap. When the renderer is torn down it should call
/// [`FrameHook::teardown`].
///
/// All methods take `&self`; implementations use interior mutability.
pub trait Renderer: Send + Sync {
    /// Read back the most recently drawn frame, or `None` if the canvas cannot be read.
    fn current_frame(&self) -> Option<FrameRGBA>;

    /// Whether the draw loop is running continuously.
    fn is_looping(&self) -> bool;

    /// Start (`true`) or stop (`false`) continuous drawing.
    fn set_looping(&self, looping: bool);

    /// Draw exactly one more frame, even when not looping.
    fn request_frame(&self);

    /// Register the post-draw hook. Replaces any previous hook.
    fn attach(&self, hook: FrameHook);

    /// Remove the post-draw hook, if any.
    fn detach(&self);
}
