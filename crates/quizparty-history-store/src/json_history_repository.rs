//! JSON file implementation of the `HistoryRepository` trait.
//!
//! Saves write the whole snapshot to a sibling temporary file, flush it to
//! disk and rename it over the target, so readers never observe a partially
//! written file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use quizparty_core::error::DomainError;
use quizparty_core::repository::{HistoryRepository, HistorySnapshot};

/// File-backed history repository.
#[derive(Debug, Clone)]
pub struct JsonHistoryRepository {
    path: PathBuf,
}

impl JsonHistoryRepository {
    /// Creates a repository storing its snapshot at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn persistence_error(context: &str, path: &Path, e: impl std::fmt::Display) -> DomainError {
    DomainError::Persistence(format!("{context} {}: {e}", path.display()))
}

#[async_trait]
impl HistoryRepository for JsonHistoryRepository {
    async fn load(&self) -> Result<Option<HistorySnapshot>, DomainError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(persistence_error("cannot read", &self.path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| persistence_error("cannot parse", &self.path, e))
    }

    async fn save(&self, snapshot: &HistorySnapshot) -> Result<(), DomainError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| persistence_error("cannot create directory for", &self.path, e))?;
        }

        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| persistence_error("cannot serialize", &self.path, e))?;

        let tmp_path = self.temp_path();
        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(|e| persistence_error("cannot create", &tmp_path, e))?;
        file.write_all(&json)
            .await
            .map_err(|e| persistence_error("cannot write", &tmp_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| persistence_error("cannot sync", &tmp_path, e))?;
        drop(file);

        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| persistence_error("cannot replace", &self.path, e))?;

        debug!(
            path = %self.path.display(),
            ids = snapshot.used_question_ids.len(),
            "usage history saved"
        );
        Ok(())
    }
}
