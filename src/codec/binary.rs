use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};
use once_cell::sync::Lazy;
use tokio::sync::OnceCell;

use crate::foundation::core::FrameRGBA;
use crate::foundation::error::{CaptureError, CaptureResult};

/// Magic bytes every WebP file starts with.
pub const RIFF_MAGIC: [u8; 4] = *b"RIFF";

/// An instantiated lossless encoder.
///
/// Implementations are synchronous and CPU-bound; [`BinaryCodec`] calls them from the blocking
/// pool.
pub trait LosslessModule: Send + Sync {
    /// Encode tightly packed straight-alpha RGBA8 pixels.
    fn encode(&self, rgba: &[u8], width: u32, height: u32) -> anyhow::Result<Vec<u8>>;
}

/// Loads (fetches, unpacks, instantiates) a [`LosslessModule`].
///
/// [`BinaryCodec`] calls `load` at most once per codec instance.
#[async_trait]
pub trait ModuleSource: Send + Sync {
    /// Produce a ready-to-use module.
    async fn load(&self) -> anyhow::Result<Arc<dyn LosslessModule>>;
}

/// Built-in module source: the in-process lossless WebP encoder.
///
/// Loading instantiates the encoder on the blocking pool and probes it with a 1x1 encode, so a
/// broken encoder is reported as an init failure rather than on the first real frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedWebp;

#[derive(Debug)]
struct WebpLosslessModule;

impl LosslessModule for WebpLosslessModule {
    fn encode(&self, rgba: &[u8], width: u32, height: u32) -> anyhow::Result<Vec<u8>> {
        let mut out = Vec::new();
        WebPEncoder::new_lossless(&mut out)
            .write_image(rgba, width, height, ExtendedColorType::Rgba8)
            .context("lossless webp encode")?;
        Ok(out)
    }
}

#[async_trait]
impl ModuleSource for EmbeddedWebp {
    async fn load(&self) -> anyhow::Result<Arc<dyn LosslessModule>> {
        let module: Arc<dyn LosslessModule> = Arc::new(WebpLosslessModule);
        let probe = Arc::clone(&module);
        let bytes = tokio::task::spawn_blocking(move || probe.encode(&[0, 0, 0, 0], 1, 1))
            .await
            .context("codec probe task")??;
        anyhow::ensure!(
            has_riff_header(&bytes),
            "codec probe produced a non-RIFF payload"
        );
        Ok(module)
    }
}

static SHARED: Lazy<Arc<BinaryCodec>> =
    Lazy::new(|| Arc::new(BinaryCodec::new(Arc::new(EmbeddedWebp))));

/// Lossless WebP encoder backed by a module that is loaded on first use.
///
/// The first `encode` triggers `ModuleSource::load`; concurrent first callers wait on that same
/// load. The outcome is memoized: a loaded module is reused for the lifetime of the codec, and a
/// failed load fails every later `encode` with [`CaptureError::CodecInit`] without retrying.
pub struct BinaryCodec {
    source: Arc<dyn ModuleSource>,
    module: OnceCell<Result<Arc<dyn LosslessModule>, String>>,
    validate_output: bool,
}

impl BinaryCodec {
    /// Create a codec that loads its module from `source`.
    ///
    /// Output validation (RIFF header check) is enabled in debug builds only.
    pub fn new(source: Arc<dyn ModuleSource>) -> Self {
        Self {
            source,
            module: OnceCell::new(),
            validate_output: cfg!(debug_assertions),
        }
    }

    /// Override the RIFF header check on encoder output.
    pub fn with_output_validation(mut self, enabled: bool) -> Self {
        self.validate_output = enabled;
        self
    }

    /// Process-wide codec using [`EmbeddedWebp`].
    pub fn shared() -> Arc<BinaryCodec> {
        Arc::clone(&SHARED)
    }

    /// `true` once a load attempt has finished (successfully or not).
    pub fn is_initialized(&self) -> bool {
        self.module.initialized()
    }

    /// Get the loaded module, loading it first if needed.
    pub async fn module(&self) -> CaptureResult<Arc<dyn LosslessModule>> {
        let loaded = self
            .module
            .get_or_init(|| async {
                tracing::info!("loading lossless codec module");
                match self.source.load().await {
                    Ok(module) => {
                        tracing::info!("lossless codec module ready");
                        Ok(module)
                    }
                    Err(e) => {
                        let msg = format!("{e:#}");
                        tracing::error!(error = %msg, "lossless codec module failed to load");
                        Err(msg)
                    }
                }
            })
            .await;
        loaded.clone().map_err(CaptureError::codec_init)
    }

    /// Encode a frame as lossless WebP.
    pub async fn encode(&self, frame: FrameRGBA) -> CaptureResult<Vec<u8>> {
        frame.validate()?;
        let module = self.module().await?;

        let out = tokio::task::spawn_blocking(move || {
            module.encode(&frame.data, frame.width, frame.height)
        })
        .await
        .context("lossless encode task")?
        .map_err(|e| CaptureError::encode(format!("{e:#}")))?;

        if self.validate_output && !has_riff_header(&out) {
            let head = &out[..out.len().min(4)];
            return Err(CaptureError::CodecOutputCorrupt(format!(
                "invalid WebP header {head:02x?}, expected \"RIFF\""
            )));
        }
        Ok(out)
    }
}

impl std::fmt::Debug for BinaryCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryCodec")
            .field("initialized", &self.is_initialized())
            .field("validate_output", &self.validate_output)
            .finish()
    }
}

/// `true` when `bytes` starts with the RIFF container magic.
pub fn has_riff_header(bytes: &[u8]) -> bool {
    bytes.starts_with(&RIFF_MAGIC)
}

#[cfg(test)]
#[path = "../../tests/unit/codec/binary.rs"]
mod tests;
