use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use framecap::{FrameHook, FrameRGBA, Renderer};
use tokio::sync::Notify;

const BACKGROUND: [u8; 4] = [200, 200, 200, 255];
const INK: [u8; 4] = [20, 20, 20, 255];
const DISC: [u8; 4] = [230, 80, 60, 255];
/// Radians advanced per drawn frame.
const STEP: f32 = std::f32::consts::TAU / 120.0;

/// Procedural animation host: a line rotating around the canvas center with a disc at its tip.
pub struct SketchHost {
    width: u32,
    height: u32,
    interval: Duration,
    state: Mutex<State>,
    wake: Notify,
    closed: AtomicBool,
}

struct State {
    looping: bool,
    redraw: bool,
    hook: Option<FrameHook>,
    tick: u64,
    canvas: Option<FrameRGBA>,
}

impl SketchHost {
    /// A looping sketch drawing a `width`x`height` canvas every `interval`.
    pub fn new(width: u32, height: u32, interval: Duration) -> Self {
        Self {
            width,
            height,
            interval,
            state: Mutex::new(State {
                looping: true,
                redraw: false,
                hook: None,
                tick: 0,
                canvas: None,
            }),
            wake: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Draw loop. Returns after [`SketchHost::close`].
    pub async fn run(&self) {
        while !self.closed.load(Ordering::SeqCst) {
            let (draw, looping, hook, tick) = {
                let mut s = self.lock();
                let draw = s.looping || std::mem::take(&mut s.redraw);
                (draw, s.looping, s.hook.clone(), s.tick)
            };
            if !draw {
                self.wake.notified().await;
                continue;
            }

            let canvas = draw_sketch(self.width, self.height, tick);
            {
                let mut s = self.lock();
                s.canvas = Some(canvas);
                s.tick += 1;
            }
            if let Some(hook) = hook {
                hook.post_draw().await;
            }

            if looping {
                tokio::time::sleep(self.interval).await;
            } else {
                tokio::task::yield_now().await;
            }
        }
    }

    /// Stop the draw loop, tearing down any attached hook.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let hook = self.lock().hook.take();
        if let Some(hook) = hook {
            hook.teardown();
        }
        self.wake.notify_one();
    }
}

impl Renderer for SketchHost {
    fn current_frame(&self) -> Option<FrameRGBA> {
        self.lock().canvas.clone()
    }

    fn is_looping(&self) -> bool {
        self.lock().looping
    }

    fn set_looping(&self, looping: bool) {
        self.lock().looping = looping;
        self.wake.notify_one();
    }

    fn request_frame(&self) {
        self.lock().redraw = true;
        self.wake.notify_one();
    }

    fn attach(&self, hook: FrameHook) {
        self.lock().hook = Some(hook);
    }

    fn detach(&self) {
        self.lock().hook = None;
    }
}

/// Render frame `tick` of the sketch.
pub fn draw_sketch(width: u32, height: u32, tick: u64) -> FrameRGBA {
    let mut frame = FrameRGBA::solid(width, height, BACKGROUND);
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let reach = cx.min(cy) * 0.8;
    let angle = (tick % 120) as f32 * STEP;
    let (tip_x, tip_y) = (cx + reach * angle.cos(), cy + reach * angle.sin());
    let line_half_width = (reach / 40.0).max(0.75);
    let disc_radius = (reach / 6.0).max(1.5);

    for y in 0..height {
        for x in 0..width {
            let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
            let color = if (px - tip_x).hypot(py - tip_y) <= disc_radius {
                DISC
            } else if segment_distance(px, py, cx, cy, tip_x, tip_y) <= line_half_width {
                INK
            } else {
                continue;
            };
            let i = pixel_offset(x, y, width);
            frame.data[i..i + 4].copy_from_slice(&color);
        }
    }
    frame
}

/// Byte offset of pixel (`x`, `y`) in an RGBA8 buffer `width` pixels wide.
fn pixel_offset(x: u32, y: u32, width: u32) -> usize {
    (y as usize * width as usize + x as usize) * 4
}

fn segment_distance(px: f32, py: f32, ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let (dx, dy) = (bx - ax, by - ay);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0)
    };
    (px - (ax + t * dx)).hypot(py - (ay + t * dy))
}
