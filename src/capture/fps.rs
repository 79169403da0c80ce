use std::time::{Duration, Instant};

/// Number of samples in the rolling window.
pub const FPS_WINDOW: usize = 10;

/// Minimum wall-clock time between two samples.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Rolling frames-per-second estimate over written frames.
///
/// Frame writes complete asynchronously and out of order, so per-frame deltas are noisy. Instead
/// the estimator takes at most one sample per [`SAMPLE_INTERVAL`] (frames since last sample divided
/// by elapsed seconds) and reports the mean of the last [`FPS_WINDOW`] samples.
#[derive(Clone, Debug)]
pub struct FpsEstimator {
    samples: [f64; FPS_WINDOW],
    len: usize,
    cursor: usize,
    last_sample_at: Instant,
    last_sample_frames: u64,
    fps: f64,
}

impl FpsEstimator {
    /// Create an empty estimator whose first sample window starts at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            samples: [0.0; FPS_WINDOW],
            len: 0,
            cursor: 0,
            last_sample_at: now,
            last_sample_frames: 0,
            fps: 0.0,
        }
    }

    /// Drop all samples and restart the window at `now` with a frame count of 0.
    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    /// Record that `frame_count` frames have been written as of `now`.
    ///
    /// Returns `true` when a new sample was taken.
    pub fn on_frame_written(&mut self, frame_count: u64, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_sample_at);
        if elapsed < SAMPLE_INTERVAL {
            return false;
        }

        let frames = frame_count.saturating_sub(self.last_sample_frames);
        self.push_sample(frames as f64 / elapsed.as_secs_f64());
        self.last_sample_at = now;
        self.last_sample_frames = frame_count;
        true
    }

    /// Smoothed frames per second; `0.0` until the first sample.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Populated samples, oldest slot first in buffer order.
    pub fn samples(&self) -> &[f64] {
        &self.samples[..self.len]
    }

    fn push_sample(&mut self, sample: f64) {
        self.samples[self.cursor] = sample;
        self.cursor = (self.cursor + 1) % FPS_WINDOW;
        self.len = (self.len + 1).min(FPS_WINDOW);

        let populated = &self.samples[..self.len];
        self.fps = populated.iter().sum::<f64>() / populated.len() as f64;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/fps.rs"]
mod tests;
