//! Cache handler backed by a local JSON file

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use spotmux_core::{CacheError, CacheHandler, TokenRecord};
use tracing::debug;

/// Stores the token record as JSON at a fixed path.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// reader never sees a half-written record.
#[derive(Debug, Clone)]
pub struct FileCacheHandler {
    path: PathBuf,
}

impl FileCacheHandler {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "token.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn storage_error(action: &str, path: &Path, err: impl std::fmt::Display) -> CacheError {
    CacheError::Storage(format!("failed to {} {}: {}", action, path.display(), err))
}

#[async_trait]
impl CacheHandler for FileCacheHandler {
    async fn get(&self) -> Result<Option<TokenRecord>, CacheError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "[CacheHandler] No token file");
                return Ok(None);
            }
            Err(e) => return Err(storage_error("read", &self.path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let record: TokenRecord = serde_json::from_slice(&bytes)
            .map_err(|e| storage_error("parse", &self.path, e))?;
        Ok(Some(record))
    }

    async fn save(&self, record: &TokenRecord) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error("create directory for", &self.path, e))?;
        }

        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| storage_error("serialize", &self.path, e))?;

        let temp = self.temp_path();
        tokio::fs::write(&temp, &json)
            .await
            .map_err(|e| storage_error("write", &temp, e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| storage_error("replace", &self.path, e))?;

        debug!(path = %self.path.display(), "[CacheHandler] Saved token file");
        Ok(())
    }
}
