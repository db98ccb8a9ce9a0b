//! Credential persistence.
//!
//! The session loop talks to storage only through the [`Storage`] trait.
//! [`FileStorage`] is the on-disk default (JSON with restricted
//! permissions); [`MemoryStorage`] backs tests and embedding.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Persisted-credential access for the session loop.
///
/// `load` returns `Ok(None)` when nothing is stored; `Err` is reserved for
/// genuine I/O or parse failures. Implementations are called inline from
/// effect handlers and should stay local and fast.
pub trait Storage<C>: Send + Sync {
    fn load(&self) -> Result<Option<C>>;
    fn save(&self, credential: &C) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// JSON file storage with restricted permissions (0600 on Unix).
///
/// The file is written in place. Concurrent writers (other processes) are
/// not coordinated; last write wins.
pub struct FileStorage<C> {
    path: PathBuf,
    _credential: PhantomData<C>,
}

impl<C> FileStorage<C> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _credential: PhantomData,
        }
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<C> Storage<C> for FileStorage<C>
where
    C: Serialize + DeserializeOwned + Send + Sync,
{
    fn load(&self) -> Result<Option<C>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read credentials from {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .map(Some)
            .with_context(|| format!("Failed to parse credentials from {}", self.path.display()))
    }

    fn save(&self, credential: &C) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(credential).context("Failed to serialize credentials")?;

        // Write with restricted permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }
}

/// In-memory storage for tests and embedding.
pub struct MemoryStorage<C> {
    slot: Mutex<Option<C>>,
}

impl<C> MemoryStorage<C> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<C>> {
        // Any stored value is consistent, so poisoning is recoverable.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C> Default for MemoryStorage<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Storage<C> for MemoryStorage<C>
where
    C: Clone + Send + Sync,
{
    fn load(&self) -> Result<Option<C>> {
        Ok(self.lock().clone())
    }

    fn save(&self, credential: &C) -> Result<()> {
        *self.lock() = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock() = None;
        Ok(())
    }
}
