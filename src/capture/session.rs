use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;

use tokio::sync::watch;

use crate::capture::fps::FpsEstimator;
use crate::capture::options::CaptureOptions;
use crate::capture::scheduler::WriteScheduler;
use crate::codec::binary::BinaryCodec;
use crate::codec::encode_frame;
use crate::format::registry::{FormatDescriptor, FormatId, frame_file_name};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{CaptureError, CaptureResult};
use crate::host::renderer::Renderer;
use crate::host::sink::SinkProvider;

/// Captures frames drawn by a [`Renderer`] into a directory obtained from a [`SinkProvider`].
///
/// A capturer runs at most one session at a time. [`FrameCapturer::start`] attaches a
/// [`FrameHook`] to the renderer and switches it to one-frame-at-a-time drawing; each drawn
/// frame is encoded, named `frame-NNNNN.<ext>` in draw order and handed to a
/// [`WriteScheduler`]. The session ends on [`FrameCapturer::stop`], when the frame target is
/// reached, when codec initialization fails, or when the renderer is torn down.
///
/// Cloning is cheap; clones control the same session.
#[derive(Clone)]
pub struct FrameCapturer {
    shared: Arc<Shared>,
}

struct Shared {
    renderer: Arc<dyn Renderer>,
    sinks: Arc<dyn SinkProvider>,
    codec: Arc<BinaryCodec>,
    session: Mutex<Session>,
    state: watch::Sender<CaptureState>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    /// Waiting on the sink provider; guards against re-entrant starts. `stop` cancels it.
    Starting,
    Capturing,
}

struct Session {
    phase: Phase,
    /// Bumped by every start attempt so stale hooks and cancelled starts can tell.
    generation: u64,
    frame_count: u64,
    target_frames: Option<u64>,
    format: Option<&'static FormatDescriptor>,
    was_looping: bool,
    fps: FpsEstimator,
    /// Kept after stop so pending writes can still be drained.
    scheduler: Option<WriteScheduler>,
}

impl Session {
    fn is_current(&self, generation: u64) -> bool {
        self.phase == Phase::Capturing && self.generation == generation
    }
}

/// Snapshot of a capturer's observable state.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct CaptureState {
    /// `true` while a session is active.
    pub is_capturing: bool,
    /// Frames handed to the write scheduler in the current (or last) session.
    pub frame_count: u64,
    /// Frame target of the current (or last) session.
    pub target_frames: Option<u64>,
    /// Rolling frames-per-second estimate.
    pub fps: f64,
    /// Writes accepted but not finished yet.
    pub in_flight_writes: usize,
    /// Format of the current (or last) session.
    pub format: Option<FormatId>,
}

impl CaptureState {
    /// `"Capturing"` or `"Ready"`.
    pub fn status(&self) -> &'static str {
        if self.is_capturing {
            "Capturing"
        } else {
            "Ready"
        }
    }

    /// `"n/m"` when a target is set, otherwise `"n"`.
    pub fn progress(&self) -> String {
        match self.target_frames {
            Some(target) => format!("{}/{}", self.frame_count, target),
            None => self.frame_count.to_string(),
        }
    }
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | frames {} | {:.1} fps",
            self.status(),
            self.progress(),
            self.fps
        )?;
        if self.in_flight_writes > 0 {
            write!(f, " | {} pending", self.in_flight_writes)?;
        }
        Ok(())
    }
}

/// Per-frame callback handed to [`Renderer::attach`].
///
/// Holds only a weak reference to its capturer, so a renderer keeping a hook never keeps the
/// capturer alive.
#[derive(Clone, Debug)]
pub struct FrameHook {
    shared: Weak<Shared>,
    generation: u64,
}

impl FrameHook {
    /// Capture the frame the renderer just drew. Must be awaited before the next draw.
    pub async fn post_draw(&self) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        shared.on_frame(self.generation).await;
    }

    /// The renderer is going away; stop the session this hook belongs to.
    pub fn teardown(&self) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let current = shared.lock().is_current(self.generation);
        if current {
            tracing::info!("renderer torn down");
            shared.stop();
        }
    }
}

impl FrameCapturer {
    /// Capturer using the process-wide lossless codec.
    pub fn new(renderer: Arc<dyn Renderer>, sinks: Arc<dyn SinkProvider>) -> Self {
        Self::with_codec(renderer, sinks, BinaryCodec::shared())
    }

    /// Capturer using a specific lossless codec instance.
    pub fn with_codec(
        renderer: Arc<dyn Renderer>,
        sinks: Arc<dyn SinkProvider>,
        codec: Arc<BinaryCodec>,
    ) -> Self {
        let session = Session {
            phase: Phase::Idle,
            generation: 0,
            frame_count: 0,
            target_frames: None,
            format: None,
            was_looping: false,
            fps: FpsEstimator::new(Instant::now()),
            scheduler: None,
        };
        let (state, _) = watch::channel(CaptureState::default());
        Self {
            shared: Arc::new(Shared {
                renderer,
                sinks,
                codec,
                session: Mutex::new(session),
                state,
            }),
        }
    }

    /// Start a capture session.
    ///
    /// Fails with [`CaptureError::AlreadyAttached`] while a session is active or starting,
    /// [`CaptureError::UnsupportedFormat`] for an unknown format (the sink provider is not
    /// consulted), [`CaptureError::NoSink`] if the provider declines, and
    /// [`CaptureError::Cancelled`] if [`FrameCapturer::stop`] was called while the sink was
    /// being acquired.
    #[tracing::instrument(skip(self, options), fields(format = %options.format))]
    pub async fn start(&self, options: CaptureOptions) -> CaptureResult<()> {
        let shared = &self.shared;
        let (desc, generation) = {
            let mut s = shared.lock();
            if s.phase != Phase::Idle {
                return Err(CaptureError::AlreadyAttached);
            }
            let desc = options.resolve_format()?;
            s.phase = Phase::Starting;
            s.generation += 1;
            (desc, s.generation)
        };
        let mut starting = StartingGuard {
            shared,
            generation,
            armed: true,
        };

        let sink = shared
            .sinks
            .acquire()
            .await
            .map_err(|e| CaptureError::no_sink(format!("{e:#}")))?;

        let was_looping = shared.renderer.is_looping();
        let scheduler = WriteScheduler::new(options.parallel_write_limit, Arc::clone(&sink));
        {
            let mut s = shared.lock();
            if s.phase != Phase::Starting || s.generation != generation {
                drop(s);
                sink.release();
                tracing::info!("capture start cancelled");
                return Err(CaptureError::Cancelled);
            }
            s.phase = Phase::Capturing;
            s.frame_count = 0;
            s.target_frames = options.target_frames();
            s.format = Some(desc);
            s.was_looping = was_looping;
            s.fps.reset(Instant::now());
            s.scheduler = Some(scheduler);
        }
        starting.armed = false;
        shared.publish();

        tracing::info!(
            sink = %sink.describe(),
            target_frames = ?options.target_frames(),
            parallel_writes = options.parallel_write_limit,
            "capture started"
        );

        shared.renderer.set_looping(false);
        shared.renderer.attach(FrameHook {
            shared: Arc::downgrade(shared),
            generation,
        });
        shared.renderer.request_frame();
        Ok(())
    }

    /// End the active session, or cancel a start still waiting for its sink. Returns `false`
    /// if there was neither.
    ///
    /// Writes already accepted keep running but are dropped before they reach the released
    /// sink; use [`FrameCapturer::drain`] to wait for them.
    pub fn stop(&self) -> bool {
        self.shared.stop()
    }

    /// Current state.
    pub fn state(&self) -> CaptureState {
        self.shared.snapshot()
    }

    /// `true` while a session is active.
    pub fn is_capturing(&self) -> bool {
        self.shared.lock().phase == Phase::Capturing
    }

    /// Receiver that sees every published state change.
    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.shared.state.subscribe()
    }

    /// Resolve once no session is active.
    pub async fn wait_idle(&self) {
        let mut rx = self.subscribe();
        if !self.is_capturing() {
            return;
        }
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|state| !state.is_capturing).await;
    }

    /// Wait for every write accepted by the current (or last) session to finish.
    pub async fn drain(&self) {
        let scheduler = self.shared.lock().scheduler.clone();
        if let Some(scheduler) = scheduler {
            scheduler.drain().await;
        }
    }
}

impl std::fmt::Debug for FrameCapturer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCapturer")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Returns a start interrupted before the session is live to `Idle`.
struct StartingGuard<'a> {
    shared: &'a Shared,
    generation: u64,
    armed: bool,
}

impl Drop for StartingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut s = self.shared.lock();
            if s.phase == Phase::Starting && s.generation == self.generation {
                s.phase = Phase::Idle;
            }
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> CaptureState {
        let s = self.lock();
        CaptureState {
            is_capturing: s.phase == Phase::Capturing,
            frame_count: s.frame_count,
            target_frames: s.target_frames,
            fps: s.fps.fps(),
            in_flight_writes: s.scheduler.as_ref().map_or(0, WriteScheduler::in_flight),
            format: s.format.map(|d| d.id),
        }
    }

    fn publish(&self) {
        self.state.send_replace(self.snapshot());
    }

    fn stop(&self) -> bool {
        let (scheduler, was_looping, frames) = {
            let mut s = self.lock();
            match s.phase {
                Phase::Idle => return false,
                Phase::Starting => {
                    // The pending `start` sees this and gives its sink back.
                    s.phase = Phase::Idle;
                    return true;
                }
                Phase::Capturing => s.phase = Phase::Idle,
            }
            (s.scheduler.clone(), s.was_looping, s.frame_count)
        };

        if let Some(sink) = scheduler.as_ref().and_then(WriteScheduler::release) {
            sink.release();
        }
        if was_looping {
            self.renderer.set_looping(true);
        }
        self.renderer.detach();
        self.publish();
        tracing::info!(frames, "capture stopped");
        true
    }

    async fn on_frame(&self, generation: u64) {
        let desc = {
            let s = self.lock();
            match s.format {
                Some(desc) if s.is_current(generation) => desc,
                _ => return,
            }
        };

        let Some(frame) = self.renderer.current_frame().filter(|f| !f.is_empty()) else {
            tracing::debug!("no pixels to capture");
            return;
        };

        let bytes = match encode_frame(desc, frame, &self.codec).await {
            Ok(bytes) if bytes.is_empty() => {
                tracing::debug!(format = %desc.id, "encoder produced no bytes");
                return;
            }
            Ok(bytes) => bytes,
            Err(CaptureError::CodecInit(msg)) => {
                tracing::error!(error = %msg, "lossless codec unavailable, ending capture");
                if self.lock().is_current(generation) {
                    self.stop();
                }
                return;
            }
            Err(e) => {
                tracing::warn!(format = %desc.id, error = %e, "frame dropped");
                if self.lock().is_current(generation) {
                    self.renderer.request_frame();
                }
                return;
            }
        };

        let (name, scheduler) = {
            let s = self.lock();
            if !s.is_current(generation) {
                tracing::debug!("capture ended during encode, frame dropped");
                return;
            }
            match s.scheduler.clone().filter(WriteScheduler::is_attached) {
                Some(scheduler) => (frame_file_name(FrameIndex(s.frame_count), desc), scheduler),
                None => return,
            }
        };

        tracing::debug!(file = %name, bytes = bytes.len(), "frame encoded");
        scheduler.submit(name, bytes).await;

        let (capturing, reached) = {
            let mut s = self.lock();
            if s.generation != generation {
                return;
            }
            // Counted even if a stop raced the submit and the write gets dropped.
            s.frame_count += 1;
            let count = s.frame_count;
            s.fps.on_frame_written(count, Instant::now());
            let reached = s.target_frames.is_some_and(|target| count >= target);
            (s.phase == Phase::Capturing, reached)
        };
        self.publish();

        if !capturing {
            return;
        }
        if reached {
            self.stop();
        } else {
            self.renderer.request_frame();
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/session.rs"]
mod tests;
