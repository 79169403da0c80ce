use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::*;

struct CountingSource {
    loads: Arc<AtomicUsize>,
    fail: bool,
}

#[async_trait]
impl ModuleSource for CountingSource {
    async fn load(&self) -> anyhow::Result<Arc<dyn LosslessModule>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        // Keep the load pending long enough for a second caller to pile up behind it.
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.fail {
            anyhow::bail!("module blob is truncated");
        }
        Ok(Arc::new(WebpLosslessModule))
    }
}

/// Emits garbage on the first call, then valid WebP.
struct FlakyModule {
    calls: AtomicUsize,
}

impl LosslessModule for FlakyModule {
    fn encode(&self, rgba: &[u8], width: u32, height: u32) -> anyhow::Result<Vec<u8>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Ok(b"JUNKJUNK".to_vec());
        }
        WebpLosslessModule.encode(rgba, width, height)
    }
}

struct FlakySource;

#[async_trait]
impl ModuleSource for FlakySource {
    async fn load(&self) -> anyhow::Result<Arc<dyn LosslessModule>> {
        Ok(Arc::new(FlakyModule {
            calls: AtomicUsize::new(0),
        }))
    }
}

fn counting(fail: bool) -> (BinaryCodec, Arc<AtomicUsize>) {
    let loads = Arc::new(AtomicUsize::new(0));
    let codec = BinaryCodec::new(Arc::new(CountingSource {
        loads: Arc::clone(&loads),
        fail,
    }));
    (codec, loads)
}

#[tokio::test]
async fn concurrent_first_encodes_share_one_load() {
    let (codec, loads) = counting(false);
    assert!(!codec.is_initialized());

    let a = FrameRGBA::solid(2, 2, [255, 0, 0, 255]);
    let b = FrameRGBA::solid(3, 1, [0, 255, 0, 128]);
    let (ra, rb) = tokio::join!(codec.encode(a), codec.encode(b));

    assert!(has_riff_header(&ra.unwrap()));
    assert!(has_riff_header(&rb.unwrap()));
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(codec.is_initialized());

    codec.encode(FrameRGBA::solid(1, 1, [0, 0, 0, 0])).await.unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_load_fails_every_queued_encode_without_retry() {
    let (codec, loads) = counting(true);

    let (ra, rb) = tokio::join!(
        codec.encode(FrameRGBA::solid(1, 1, [0, 0, 0, 255])),
        codec.encode(FrameRGBA::solid(1, 1, [0, 0, 0, 255]))
    );
    for r in [ra, rb] {
        match r {
            Err(CaptureError::CodecInit(msg)) => assert!(msg.contains("truncated")),
            other => panic!("expected CodecInit, got {other:?}"),
        }
    }

    let later = codec.encode(FrameRGBA::solid(1, 1, [0, 0, 0, 255])).await;
    assert!(matches!(later, Err(CaptureError::CodecInit(_))));
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn non_riff_output_is_reported_as_corrupt_then_recovers() {
    let codec = BinaryCodec::new(Arc::new(FlakySource)).with_output_validation(true);
    let frame = FrameRGBA::solid(2, 2, [10, 20, 30, 255]);

    let first = codec.encode(frame.clone()).await;
    assert!(matches!(first, Err(CaptureError::CodecOutputCorrupt(_))));

    let second = codec.encode(frame).await.unwrap();
    assert!(has_riff_header(&second));
}

#[tokio::test]
async fn validation_can_be_disabled() {
    let codec = BinaryCodec::new(Arc::new(FlakySource)).with_output_validation(false);
    let bytes = codec
        .encode(FrameRGBA::solid(1, 1, [0, 0, 0, 255]))
        .await
        .unwrap();
    assert_eq!(bytes, b"JUNKJUNK");
}

#[tokio::test]
async fn embedded_module_round_trips_pixels() {
    let codec = BinaryCodec::new(Arc::new(EmbeddedWebp));
    let frame = FrameRGBA::new(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 64]).unwrap();
    let bytes = codec.encode(frame.clone()).await.unwrap();

    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(decoded.into_raw(), frame.data);
}

#[tokio::test]
async fn malformed_frames_do_not_trigger_a_load() {
    let (codec, loads) = counting(false);
    let bad = FrameRGBA {
        width: 4,
        height: 4,
        data: vec![0; 3],
    };
    assert!(matches!(
        codec.encode(bad).await,
        Err(CaptureError::Validation(_))
    ));
    assert_eq!(loads.load(Ordering::SeqCst), 0);
}

#[test]
fn riff_header_check() {
    assert!(has_riff_header(b"RIFF\0\0\0\0WEBP"));
    assert!(!has_riff_header(b"RIF"));
    assert!(!has_riff_header(b"\x89PNG"));
}
