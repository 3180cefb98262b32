//! Content manifest client contract.

use async_trait::async_trait;
use std::path::PathBuf;

use super::manifest::ManifestEntry;

/// Remote file service the synchronizer pulls hotfix content from.
///
/// `read_file` leaves the file both in memory (`file_contents`) and at
/// `cache_path`, which is where localization and archive handlers load it
/// from.
#[async_trait]
pub trait ContentManifestClient: Send + Sync {
    /// Refresh the remote file listing.
    async fn enumerate_files(&self) -> anyhow::Result<()>;

    /// Listing from the last successful enumeration.
    fn file_list(&self) -> Vec<ManifestEntry>;

    /// Download one file.
    async fn read_file(&self, download_id: &str) -> anyhow::Result<()>;

    fn file_contents(&self, download_id: &str) -> Option<Vec<u8>>;

    /// Deterministic on-disk location of a downloaded file.
    fn cache_path(&self, entry: &ManifestEntry) -> PathBuf;

    /// Drop the in-memory buffer of one download.
    fn clear_file(&self, download_id: &str);

    /// Drop every in-memory buffer. Cached files on disk stay.
    fn clear_files(&self);
}
