use super::*;

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

#[test]
fn mean_covers_populated_slots_only() {
    let t0 = Instant::now();
    let mut est = FpsEstimator::new(t0);

    // 10 frames in the first second, 20 in the next, 30 in the third.
    assert!(est.on_frame_written(10, t0 + secs(1)));
    assert!(est.on_frame_written(30, t0 + secs(2)));
    assert!(est.on_frame_written(60, t0 + secs(3)));

    assert_eq!(est.samples(), &[10.0, 20.0, 30.0]);
    assert_eq!(est.fps(), 20.0);
}

#[test]
fn samples_are_taken_at_most_once_per_interval() {
    let t0 = Instant::now();
    let mut est = FpsEstimator::new(t0);

    assert!(!est.on_frame_written(5, t0 + Duration::from_millis(300)));
    assert!(!est.on_frame_written(9, t0 + Duration::from_millis(999)));
    assert_eq!(est.fps(), 0.0);
    assert!(est.samples().is_empty());

    // Frames from the skipped calls still count toward the next sample.
    assert!(est.on_frame_written(12, t0 + Duration::from_millis(1500)));
    assert_eq!(est.samples(), &[8.0]);
}

#[test]
fn window_wraps_after_ten_samples() {
    let t0 = Instant::now();
    let mut est = FpsEstimator::new(t0);

    let mut frames = 0;
    for i in 1..=12u64 {
        // Sample i measures i frames per second.
        frames += i;
        est.on_frame_written(frames, t0 + secs(i));
    }

    assert_eq!(est.samples().len(), FPS_WINDOW);
    // Slots 0 and 1 were overwritten by samples 11 and 12.
    assert_eq!(est.samples()[0], 11.0);
    assert_eq!(est.samples()[1], 12.0);
    let expected = (3..=12).sum::<u64>() as f64 / 10.0;
    assert!((est.fps() - expected).abs() < 1e-9);
}

#[test]
fn reset_clears_samples() {
    let t0 = Instant::now();
    let mut est = FpsEstimator::new(t0);
    est.on_frame_written(30, t0 + secs(1));
    assert!(est.fps() > 0.0);

    let t1 = t0 + secs(5);
    est.reset(t1);
    assert_eq!(est.fps(), 0.0);
    assert!(!est.on_frame_written(3, t1 + Duration::from_millis(10)));
    assert!(est.on_frame_written(4, t1 + secs(2)));
    assert_eq!(est.samples(), &[2.0]);
}
