//! Hotfix manifest entries and filtering rules.

use serde::{Deserialize, Serialize};

use crate::engine::config::HotfixConfig;

/// One remote file as reported by manifest enumeration.
///
/// Field order matters: the derived `Ord` is the canonical sort order
/// (name, then id, then size).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub display_name: String,
    pub download_id: String,
    pub size: u64,
}

impl ManifestEntry {
    pub fn new(display_name: impl Into<String>, download_id: impl Into<String>, size: u64) -> Self {
        Self {
            display_name: display_name.into(),
            download_id: download_id.into(),
            size,
        }
    }
}

/// How a hotfix file gets applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Config delta merged into a named store
    Config,
    /// Replacement localization resource
    Localization,
    /// Package archive to mount
    Archive,
}

/// Decides which enumerated files are hotfix content for this client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRules {
    platform_prefix: String,
    config_extension: String,
    archive_extension: String,
    localization_name: String,
}

const DEFAULT_PREFIX: &str = "Default";

impl FilterRules {
    pub fn new(config: &HotfixConfig) -> Self {
        Self {
            platform_prefix: config.platform_prefix.clone(),
            config_extension: config.config_extension.trim_start_matches('.').to_string(),
            archive_extension: config.archive_extension.trim_start_matches('.').to_string(),
            localization_name: config.localization_file_name(),
        }
    }

    pub fn platform_prefix(&self) -> &str {
        &self.platform_prefix
    }

    /// Classify a file name, or None if this client should ignore it.
    pub fn classify(&self, file_name: &str) -> Option<ContentKind> {
        if file_name == self.localization_name {
            return Some(ContentKind::Localization);
        }
        if !file_name.starts_with(&self.platform_prefix) {
            return None;
        }
        let extension = extension_of(file_name)?;
        if extension.eq_ignore_ascii_case(&self.config_extension) {
            Some(ContentKind::Config)
        } else if extension.eq_ignore_ascii_case(&self.archive_extension) {
            Some(ContentKind::Archive)
        } else {
            None
        }
    }

    /// Name of the config store a delta file targets.
    ///
    /// `Linux_DefaultGame.ini` resolves to `Game`.
    pub fn config_store_name(&self, file_name: &str) -> String {
        let stem = match file_name.rfind('.') {
            Some(dot) => &file_name[..dot],
            None => file_name,
        };
        let stem = stem.strip_prefix(self.platform_prefix.as_str()).unwrap_or(stem);
        let stem = stem.strip_prefix(DEFAULT_PREFIX).unwrap_or(stem);
        stem.to_string()
    }
}

fn extension_of(file_name: &str) -> Option<&str> {
    let dot = file_name.rfind('.')?;
    Some(&file_name[dot + 1..])
}

/// Keep the entries `wants` accepts and put them in canonical order, so two
/// listings with the same entries compare equal however the server ordered
/// them.
pub fn filter_and_sort<F>(files: Vec<ManifestEntry>, mut wants: F) -> Vec<ManifestEntry>
where
    F: FnMut(&ManifestEntry) -> bool,
{
    let mut filtered: Vec<ManifestEntry> = files.into_iter().filter(|entry| wants(entry)).collect();
    filtered.sort();
    filtered
}

/// Total payload size of a manifest.
pub fn total_bytes(files: &[ManifestEntry]) -> u64 {
    files.iter().map(|entry| entry.size).sum()
}
