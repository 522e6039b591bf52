//! services/api/src/adapters/file_store.rs
//!
//! A `KeyValueStore` keeping each key in its own JSON file under a data
//! directory. Writes go to a temporary file first and are renamed into
//! place, so a crash never leaves a half-written collection behind.

use async_trait::async_trait;
use school_office_core::ports::{KeyValueStore, PortError, PortResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates the store, creating the data directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> PortResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(io_error)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PortResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PortError::Unexpected(format!("Invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

/// Interrupted or blocked filesystem calls may succeed on a retry; the rest will not.
fn io_error(e: std::io::Error) -> PortError {
    match e.kind() {
        ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut => {
            PortError::Unavailable(e.to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(e)),
        }
    }

    async fn set(&self, key: &str, value: String) -> PortResult<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value.as_bytes()).await.map_err(io_error)?;
        fs::rename(&tmp, &path).await.map_err(io_error)?;
        debug!("Wrote {} ({} bytes)", path.display(), value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e)),
        }
    }
}
