//! File-backed hotfix targets.

use anyhow::Context;
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::engine::hotfix::{ArchiveMounter, ConfigStore, LocalizationStore};

/// Appends config deltas to `<dir>/<store>.ini`.
pub struct FileConfigStore {
    dir: PathBuf,
    reloads: Mutex<Vec<String>>,
}

impl FileConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            reloads: Mutex::new(Vec::new()),
        }
    }

    pub fn store_path(&self, store_name: &str) -> PathBuf {
        self.dir.join(format!("{}.ini", store_name))
    }

    /// Every type or object name reloaded so far.
    pub fn reloaded(&self) -> Vec<String> {
        self.reloads.lock().clone()
    }
}

impl ConfigStore for FileConfigStore {
    fn merge(&self, store_name: &str, delta: &str) -> anyhow::Result<()> {
        if store_name.is_empty() {
            anyhow::bail!("delta does not name a config store");
        }
        fs::create_dir_all(&self.dir)?;
        let path = self.store_path(store_name);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        writeln!(file, "{}", delta.trim_end())?;
        Ok(())
    }

    fn reload_instances_of_types(&self, type_names: &[String], object_names: &[String]) -> usize {
        let mut reloads = self.reloads.lock();
        for name in type_names.iter().chain(object_names) {
            info!("reloading config for {}", name);
            reloads.push(name.clone());
        }
        type_names.len() + object_names.len()
    }
}

/// Tracks which localization resource is active.
#[derive(Default)]
pub struct FileLocalizationStore {
    active: Mutex<Option<PathBuf>>,
}

impl FileLocalizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<PathBuf> {
        self.active.lock().clone()
    }
}

impl LocalizationStore for FileLocalizationStore {
    fn update_from(&self, path: &Path) -> anyhow::Result<()> {
        if !path.is_file() {
            anyhow::bail!("localization resource {} not found", path.display());
        }
        *self.active.lock() = Some(path.to_path_buf());
        Ok(())
    }
}

/// Mounts archives by remembering them; an archive must exist on disk.
#[derive(Default)]
pub struct DirectoryArchiveMounter {
    mounted: Mutex<Vec<PathBuf>>,
}

impl DirectoryArchiveMounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mounted(&self) -> Vec<PathBuf> {
        self.mounted.lock().clone()
    }
}

impl ArchiveMounter for DirectoryArchiveMounter {
    fn mount(&self, path: &Path) -> bool {
        if !path.is_file() {
            return false;
        }
        let mut mounted = self.mounted.lock();
        if !mounted.iter().any(|p| p == path) {
            mounted.push(path.to_path_buf());
        }
        true
    }

    fn unmount(&self, path: &Path) {
        self.mounted.lock().retain(|p| p != path);
    }
}
