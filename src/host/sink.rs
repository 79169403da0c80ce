use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context as _;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt as _;

/// A directory-like destination for captured frames.
#[async_trait]
pub trait DirectorySink: Send + Sync {
    /// Create (or truncate) the entry `name`, write `bytes` to it, and close it.
    async fn write_entry(&self, name: &str, bytes: &[u8]) -> io::Result<()>;

    /// Called once when the owning capture session stops.
    ///
    /// Writes already in flight may still complete after this.
    fn release(&self) {}

    /// Short description for logs.
    fn describe(&self) -> String {
        "sink".to_string()
    }
}

/// Hands out a sink when a capture session starts.
///
/// Acquisition may involve the user (a directory picker, a permission prompt) and may be declined;
/// a declined or failed acquisition is reported as an error.
#[async_trait]
pub trait SinkProvider: Send + Sync {
    /// Acquire a sink for a new session.
    async fn acquire(&self) -> anyhow::Result<Arc<dyn DirectorySink>>;
}

/// Sink writing each entry as a file in a filesystem directory.
#[derive(Clone, Debug)]
pub struct FsDirectory {
    root: PathBuf,
}

impl FsDirectory {
    /// Open `root`, creating it (and its parents) when missing.
    pub async fn open(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("failed to create output directory '{}'", root.display()))?;
        let meta = tokio::fs::metadata(&root)
            .await
            .with_context(|| format!("failed to stat '{}'", root.display()))?;
        anyhow::ensure!(meta.is_dir(), "'{}' is not a directory", root.display());
        anyhow::ensure!(
            !meta.permissions().readonly(),
            "'{}' is read-only",
            root.display()
        );
        Ok(Self { root })
    }

    /// Directory entries are written into.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DirectorySink for FsDirectory {
    async fn write_entry(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        check_entry_name(name)?;
        let mut file = tokio::fs::File::create(self.root.join(name)).await?;
        file.write_all(bytes).await?;
        file.flush().await
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Provider that opens a fixed filesystem directory.
#[derive(Clone, Debug)]
pub struct FsDirectoryProvider {
    root: PathBuf,
    create: bool,
}

impl FsDirectoryProvider {
    /// Provide `root`, creating it when it does not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            create: true,
        }
    }

    /// Decline acquisition instead of creating a missing directory.
    pub fn existing_only(mut self) -> Self {
        self.create = false;
        self
    }
}

#[async_trait]
impl SinkProvider for FsDirectoryProvider {
    async fn acquire(&self) -> anyhow::Result<Arc<dyn DirectorySink>> {
        if !self.create && !tokio::fs::try_exists(&self.root).await.unwrap_or(false) {
            anyhow::bail!("directory '{}' does not exist", self.root.display());
        }
        Ok(Arc::new(FsDirectory::open(&self.root).await?))
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryDirectory {
    /// Create an empty in-memory directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all written entries, sorted.
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Contents of the entry `name`, if written.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.lock().get(name).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DirectorySink for MemoryDirectory {
    async fn write_entry(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        check_entry_name(name)?;
        self.lock().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Provider that always hands out the same sink.
#[derive(Clone)]
pub struct FixedSink(pub Arc<dyn DirectorySink>);

#[async_trait]
impl SinkProvider for FixedSink {
    async fn acquire(&self) -> anyhow::Result<Arc<dyn DirectorySink>> {
        Ok(Arc::clone(&self.0))
    }
}

/// Entry names must be plain file names: no separators, no parent references.
fn check_entry_name(name: &str) -> io::Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if bad {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid entry name '{name}'"),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/host/sink.rs"]
mod tests;
