//! Hotfix Content Synchronizer
//!
//! One cycle runs enumerate → filter/diff → unmount/download → apply, strictly
//! in that order. Only one cycle may be in flight; a second start is rejected.
//!
//! Apply is fail-forward: archives mounted earlier in a failing pass stay
//! mounted and stay recorded in the mount set.

use futures_util::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::client::ContentManifestClient;
use super::manifest::{filter_and_sort, total_bytes, FilterRules, ManifestEntry};
use super::processor::{ApplyContext, DefaultHotfixProcessor, HotfixProcessor};
use super::targets::{HotfixTargets, ReloadRequirement};
use crate::engine::config::HotfixConfig;
use crate::engine::error::UpdateError;
use crate::engine::events::{EventBus, UpdateEvent};

/// Outcome of one synchronizer cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotfixResult {
    Success,
    SuccessNoChange,
    Failed,
    SuccessNeedsReload,
    SuccessNeedsRelaunch,
}

impl HotfixResult {
    fn from_requirement(requirement: ReloadRequirement) -> Self {
        match requirement {
            ReloadRequirement::None => Self::Success,
            ReloadRequirement::Reload => Self::SuccessNeedsReload,
            ReloadRequirement::Relaunch => Self::SuccessNeedsRelaunch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Download and apply everything that changed.
    Full,
    /// Only report whether anything changed.
    AvailabilityOnly,
}

/// Download counters of the active cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncProgress {
    pub files_downloaded: usize,
    pub total_files: usize,
    pub bytes_downloaded: u64,
    pub total_bytes: u64,
}

#[derive(Default)]
struct SyncState {
    in_progress: bool,
    /// Filtered, sorted listing of the active cycle.
    enumerated: Vec<ManifestEntry>,
    /// Listing of the last cycle that fully downloaded and applied.
    applied: Vec<ManifestEntry>,
    pending: HashSet<String>,
    mounted: Vec<PathBuf>,
    progress: SyncProgress,
}

pub struct HotfixSynchronizer {
    rules: FilterRules,
    client: Arc<dyn ContentManifestClient>,
    targets: HotfixTargets,
    processor: Arc<dyn HotfixProcessor>,
    events: EventBus,
    state: Mutex<SyncState>,
}

/// Clears the in-flight flag however the cycle future ends, including being
/// dropped mid-cycle.
struct CycleGuard<'a> {
    state: &'a Mutex<SyncState>,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.in_progress = false;
        state.pending.clear();
    }
}

impl HotfixSynchronizer {
    pub fn new(
        config: &HotfixConfig,
        client: Arc<dyn ContentManifestClient>,
        targets: HotfixTargets,
        events: EventBus,
    ) -> Self {
        Self {
            rules: FilterRules::new(config),
            client,
            targets,
            processor: Arc::new(DefaultHotfixProcessor),
            events,
            state: Mutex::new(SyncState::default()),
        }
    }

    /// Substitute the per-content-type handlers.
    pub fn with_processor(mut self, processor: Arc<dyn HotfixProcessor>) -> Self {
        self.processor = processor;
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn rules(&self) -> &FilterRules {
        &self.rules
    }

    /// Run a full download-and-apply cycle.
    pub async fn start_hotfix(&self) -> Result<HotfixResult, UpdateError> {
        self.run(SyncMode::Full).await
    }

    /// Report whether the remote manifest differs from the applied one,
    /// without downloading anything.
    pub async fn check_availability(&self) -> Result<HotfixResult, UpdateError> {
        self.run(SyncMode::AvailabilityOnly).await
    }

    /// Run one cycle. The only `Err` is `AlreadyInProgress`; every other
    /// failure comes back as `HotfixResult::Failed`.
    pub async fn run(&self, mode: SyncMode) -> Result<HotfixResult, UpdateError> {
        {
            let mut state = self.state.lock();
            if state.in_progress {
                warn!("hotfix cycle already in progress, ignoring {:?} request", mode);
                return Err(UpdateError::AlreadyInProgress);
            }
            state.in_progress = true;
            state.progress = SyncProgress::default();
        }
        let guard = CycleGuard { state: &self.state };

        let result = match self.run_cycle(mode).await {
            Ok(result) => result,
            Err(e) => {
                warn!("hotfix cycle failed: {}", e);
                HotfixResult::Failed
            }
        };

        {
            let mut state = self.state.lock();
            // Either promoted to `applied` already or stale.
            state.enumerated.clear();
            if result == HotfixResult::Failed {
                state.pending.clear();
            }
        }
        self.client.clear_files();
        drop(guard);

        info!("hotfix cycle ({:?}) finished: {:?}", mode, result);
        self.events.emit(UpdateEvent::HotfixComplete { result });
        Ok(result)
    }

    async fn run_cycle(&self, mode: SyncMode) -> Result<HotfixResult, UpdateError> {
        self.client
            .enumerate_files()
            .await
            .map_err(|e| UpdateError::EnumerationFailure(e.to_string()))?;

        let files = filter_and_sort(self.client.file_list(), |entry| {
            self.processor.wants_processing(&self.rules, entry)
        });
        let changed = {
            let mut state = self.state.lock();
            state.enumerated = files.clone();
            state.enumerated != state.applied
        };

        if !changed {
            info!("hotfix manifest unchanged ({} files)", files.len());
            return Ok(HotfixResult::SuccessNoChange);
        }
        if mode == SyncMode::AvailabilityOnly {
            info!("hotfix available ({} files)", files.len());
            return Ok(HotfixResult::Success);
        }

        self.unmount_all();
        self.download_all(&files).await?;
        let requirement = self.apply_all(&files)?;

        self.state.lock().applied = files;
        Ok(HotfixResult::from_requirement(requirement))
    }

    fn unmount_all(&self) {
        let mounted = std::mem::take(&mut self.state.lock().mounted);
        for path in &mounted {
            debug!("unmounting {}", path.display());
            self.targets.archives.unmount(path);
        }
    }

    async fn download_all(&self, files: &[ManifestEntry]) -> Result<(), UpdateError> {
        // Fill the pending set completely before issuing anything, so a read
        // that completes immediately cannot drain it early.
        {
            let mut state = self.state.lock();
            state.pending = files.iter().map(|entry| entry.download_id.clone()).collect();
            state.progress.total_files = files.len();
            state.progress.total_bytes = total_bytes(files);
        }

        // Identical content shares a download id; read it once.
        let mut issued = HashSet::new();
        let mut downloads = FuturesUnordered::new();
        for entry in files {
            let download_id = entry.download_id.as_str();
            if !issued.insert(download_id) {
                continue;
            }
            let client = &self.client;
            downloads.push(async move { (download_id, client.read_file(download_id).await) });
        }

        while let Some((download_id, outcome)) = downloads.next().await {
            if let Err(e) = outcome {
                return Err(UpdateError::DownloadFailure {
                    download_id: download_id.to_string(),
                    reason: e.to_string(),
                });
            }
            for entry in files.iter().filter(|entry| entry.download_id == download_id) {
                self.on_file_downloaded(entry);
            }
        }

        let remaining = self.state.lock().pending.len();
        if remaining != 0 {
            return Err(UpdateError::DownloadFailure {
                download_id: String::new(),
                reason: format!("{} downloads never completed", remaining),
            });
        }
        Ok(())
    }

    fn on_file_downloaded(&self, entry: &ManifestEntry) {
        let progress = {
            let mut state = self.state.lock();
            state.pending.remove(&entry.download_id);
            state.progress.files_downloaded += 1;
            state.progress.bytes_downloaded += entry.size;
            state.progress
        };
        debug!(
            "downloaded {} ({}/{} files)",
            entry.display_name, progress.files_downloaded, progress.total_files
        );

        self.events.emit(UpdateEvent::HotfixProgress {
            files_downloaded: progress.files_downloaded,
            total_files: progress.total_files,
            bytes_downloaded: progress.bytes_downloaded,
            total_bytes: progress.total_bytes,
        });
        self.events.emit(UpdateEvent::HotfixFileProcessed {
            friendly_name: entry.display_name.clone(),
            cache_name: self.client.cache_path(entry).display().to_string(),
        });
    }

    fn apply_all(&self, files: &[ManifestEntry]) -> Result<ReloadRequirement, UpdateError> {
        let ctx = ApplyContext {
            rules: &self.rules,
            targets: &self.targets,
            client: self.client.as_ref(),
        };

        let mut requirement = ReloadRequirement::None;
        for (index, entry) in files.iter().enumerate() {
            let outcome = self.processor.apply(&ctx, entry)?;
            let needed_later = files[index + 1..]
                .iter()
                .any(|later| later.download_id == entry.download_id);
            if !needed_later {
                self.client.clear_file(&entry.download_id);
            }
            if let Some(path) = outcome.mounted {
                let mut state = self.state.lock();
                if !state.mounted.contains(&path) {
                    state.mounted.push(path);
                }
            }
            requirement = requirement.max(outcome.requirement);
        }
        Ok(requirement)
    }

    pub fn is_in_progress(&self) -> bool {
        self.state.lock().in_progress
    }

    pub fn applied_manifest(&self) -> Vec<ManifestEntry> {
        self.state.lock().applied.clone()
    }

    pub fn mounted_archives(&self) -> Vec<PathBuf> {
        self.state.lock().mounted.clone()
    }

    pub fn pending_downloads(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn progress(&self) -> SyncProgress {
        self.state.lock().progress
    }

    /// Unmount everything and forget the applied manifest, so the next cycle
    /// treats every remote file as new. Refused while a cycle is running.
    pub fn reset(&self) -> Result<(), UpdateError> {
        {
            let state = self.state.lock();
            if state.in_progress {
                return Err(UpdateError::AlreadyInProgress);
            }
        }
        self.unmount_all();
        let mut state = self.state.lock();
        state.applied.clear();
        state.enumerated.clear();
        state.pending.clear();
        state.progress = SyncProgress::default();
        Ok(())
    }
}
