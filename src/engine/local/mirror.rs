//! Directory mirror acting as the remote manifest service.
//!
//! Every regular file in the mirror directory is a manifest entry whose
//! download id is the SHA-256 of its contents, so an edited file shows up
//! as a changed entry.

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::engine::hotfix::{ContentManifestClient, ManifestEntry};

pub struct DirectoryManifestClient {
    source_dir: PathBuf,
    cache_dir: PathBuf,
    listing: Mutex<Vec<ManifestEntry>>,
    contents: Mutex<HashMap<String, Vec<u8>>>,
}

impl DirectoryManifestClient {
    pub fn new(source_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            cache_dir: cache_dir.into(),
            listing: Mutex::new(Vec::new()),
            contents: Mutex::new(HashMap::new()),
        }
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    fn find(&self, download_id: &str) -> Option<ManifestEntry> {
        self.listing
            .lock()
            .iter()
            .find(|entry| entry.download_id == download_id)
            .cloned()
    }
}

/// Hex SHA-256 of a byte buffer
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ContentManifestClient for DirectoryManifestClient {
    async fn enumerate_files(&self) -> anyhow::Result<()> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.source_dir).await?;
        while let Some(item) = dir.next_entry().await? {
            if !item.file_type().await?.is_file() {
                continue;
            }
            let Some(name) = item.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let bytes = tokio::fs::read(item.path()).await?;
            entries.push(ManifestEntry::new(name, sha256_hex(&bytes), bytes.len() as u64));
        }
        debug!("enumerated {} files in {}", entries.len(), self.source_dir.display());
        *self.listing.lock() = entries;
        Ok(())
    }

    fn file_list(&self) -> Vec<ManifestEntry> {
        self.listing.lock().clone()
    }

    async fn read_file(&self, download_id: &str) -> anyhow::Result<()> {
        let entry = self
            .find(download_id)
            .ok_or_else(|| anyhow::anyhow!("unknown download id {}", download_id))?;

        let bytes = tokio::fs::read(self.source_dir.join(&entry.display_name)).await?;
        let actual = sha256_hex(&bytes);
        if actual != entry.download_id {
            anyhow::bail!(
                "{} changed while downloading: expected {}, got {}",
                entry.display_name,
                entry.download_id,
                actual
            );
        }

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        tokio::fs::write(self.cache_path(&entry), &bytes).await?;
        self.contents.lock().insert(entry.download_id, bytes);
        Ok(())
    }

    fn file_contents(&self, download_id: &str) -> Option<Vec<u8>> {
        self.contents.lock().get(download_id).cloned()
    }

    fn cache_path(&self, entry: &ManifestEntry) -> PathBuf {
        self.cache_dir.join(&entry.download_id)
    }

    fn clear_file(&self, download_id: &str) {
        self.contents.lock().remove(download_id);
    }

    fn clear_files(&self) {
        self.contents.lock().clear();
    }
}
