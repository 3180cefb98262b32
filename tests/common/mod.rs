#![allow(dead_code)]

use async_trait::async_trait;
use hotpatch_lib::engine::config::{HotfixConfig, UpdateConfig};
use hotpatch_lib::engine::events::{EventBus, UpdateEvent};
use hotpatch_lib::engine::hotfix::{
    ArchiveMounter, ConfigStore, ContentManifestClient, HotfixSynchronizer, HotfixTargets, LocalizationStore,
    ManifestEntry, ReloadRequirement,
};
use hotpatch_lib::engine::platform::{AssetPreloadMonitor, Capability, PrivilegeFlags, PrivilegeGate};
use hotpatch_lib::engine::updater::UpdateOrchestrator;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

pub const PREFIX: &str = "PlatformX_";

pub fn hotfix_config() -> HotfixConfig {
    HotfixConfig {
        platform_prefix: PREFIX.to_string(),
        ..HotfixConfig::default()
    }
}

/// In-memory manifest service.
#[derive(Default)]
pub struct MockManifestClient {
    remote: Mutex<Vec<(ManifestEntry, Vec<u8>)>>,
    listing: Mutex<Vec<ManifestEntry>>,
    contents: Mutex<HashMap<String, Vec<u8>>>,
    failing_reads: Mutex<HashSet<String>>,
    fail_enumeration: AtomicBool,
    enumerate_delay: Mutex<Option<Duration>>,
    reads: AtomicUsize,
    clears: AtomicUsize,
    released: Mutex<Vec<String>>,
}

impl MockManifestClient {
    /// Replace the remote listing. Ids are `<name>@<version>`.
    pub fn publish(&self, files: &[(&str, &str, &str)]) {
        *self.remote.lock() = files
            .iter()
            .map(|(name, version, body)| {
                let entry = ManifestEntry::new(*name, format!("{}@{}", name, version), body.len() as u64);
                (entry, body.as_bytes().to_vec())
            })
            .collect();
    }

    /// Replace the remote listing with explicit download ids.
    pub fn publish_with_ids(&self, files: &[(&str, &str, &str)]) {
        *self.remote.lock() = files
            .iter()
            .map(|(name, download_id, body)| {
                (ManifestEntry::new(*name, *download_id, body.len() as u64), body.as_bytes().to_vec())
            })
            .collect();
    }

    pub fn fail_read_of(&self, download_id: &str) {
        self.failing_reads.lock().insert(download_id.to_string());
    }

    pub fn set_enumeration_fails(&self, fails: bool) {
        self.fail_enumeration.store(fails, Ordering::SeqCst);
    }

    pub fn set_enumerate_delay(&self, delay: Duration) {
        *self.enumerate_delay.lock() = Some(delay);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    /// Ids whose buffer was dropped one at a time, in order.
    pub fn released(&self) -> Vec<String> {
        self.released.lock().clone()
    }

    pub fn buffered(&self) -> usize {
        self.contents.lock().len()
    }
}

#[async_trait]
impl ContentManifestClient for MockManifestClient {
    async fn enumerate_files(&self) -> anyhow::Result<()> {
        let delay = *self.enumerate_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_enumeration.load(Ordering::SeqCst) {
            anyhow::bail!("manifest service unavailable");
        }
        *self.listing.lock() = self.remote.lock().iter().map(|(entry, _)| entry.clone()).collect();
        Ok(())
    }

    fn file_list(&self) -> Vec<ManifestEntry> {
        self.listing.lock().clone()
    }

    async fn read_file(&self, download_id: &str) -> anyhow::Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing_reads.lock().contains(download_id) {
            anyhow::bail!("connection reset while reading {}", download_id);
        }
        let body = self
            .remote
            .lock()
            .iter()
            .find(|(entry, _)| entry.download_id == download_id)
            .map(|(_, body)| body.clone())
            .ok_or_else(|| anyhow::anyhow!("unknown file {}", download_id))?;
        self.contents.lock().insert(download_id.to_string(), body);
        Ok(())
    }

    fn file_contents(&self, download_id: &str) -> Option<Vec<u8>> {
        self.contents.lock().get(download_id).cloned()
    }

    fn cache_path(&self, entry: &ManifestEntry) -> PathBuf {
        PathBuf::from("/cache").join(&entry.download_id)
    }

    fn clear_file(&self, download_id: &str) {
        self.released.lock().push(download_id.to_string());
        self.contents.lock().remove(download_id);
    }

    fn clear_files(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.contents.lock().clear();
    }
}

/// Calls made on the apply targets, in order, shared between stores.
pub type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
pub struct RecordingConfigStore {
    pub journal: Journal,
    pub merges: Mutex<Vec<(String, String)>>,
    pub reloads: Mutex<Vec<String>>,
    pub fail_merge: AtomicBool,
}

impl ConfigStore for RecordingConfigStore {
    fn merge(&self, store_name: &str, delta: &str) -> anyhow::Result<()> {
        if self.fail_merge.load(Ordering::SeqCst) {
            anyhow::bail!("store {} is read-only", store_name);
        }
        self.journal.lock().push(format!("merge {}", store_name));
        self.merges.lock().push((store_name.to_string(), delta.to_string()));
        Ok(())
    }

    fn reload_instances_of_types(&self, type_names: &[String], object_names: &[String]) -> usize {
        let mut reloads = self.reloads.lock();
        reloads.extend(type_names.iter().cloned());
        reloads.extend(object_names.iter().cloned());
        type_names.len() + object_names.len()
    }
}

#[derive(Default)]
pub struct RecordingLocalization {
    pub journal: Journal,
    pub swaps: Mutex<Vec<PathBuf>>,
}

impl LocalizationStore for RecordingLocalization {
    fn update_from(&self, path: &Path) -> anyhow::Result<()> {
        self.journal.lock().push(format!("localization {}", path.display()));
        self.swaps.lock().push(path.to_path_buf());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMounter {
    pub journal: Journal,
    pub mounted: Mutex<Vec<PathBuf>>,
    pub unmounted: Mutex<Vec<PathBuf>>,
    pub refuse: Mutex<HashSet<PathBuf>>,
    pub requirement: Mutex<ReloadRequirement>,
}

impl ArchiveMounter for RecordingMounter {
    fn mount(&self, path: &Path) -> bool {
        if self.refuse.lock().contains(path) {
            return false;
        }
        self.journal.lock().push(format!("mount {}", path.display()));
        self.mounted.lock().push(path.to_path_buf());
        true
    }

    fn unmount(&self, path: &Path) {
        self.unmounted.lock().push(path.to_path_buf());
    }

    fn reload_requirement(&self, _path: &Path) -> ReloadRequirement {
        *self.requirement.lock()
    }
}

/// Synchronizer wired to recording collaborators.
pub struct HotfixHarness {
    pub journal: Journal,
    pub client: Arc<MockManifestClient>,
    pub config: Arc<RecordingConfigStore>,
    pub localization: Arc<RecordingLocalization>,
    pub mounter: Arc<RecordingMounter>,
    pub sync: Arc<HotfixSynchronizer>,
}

impl HotfixHarness {
    pub fn new() -> Self {
        let client = Arc::new(MockManifestClient::default());
        let journal = Journal::default();
        let config = Arc::new(RecordingConfigStore {
            journal: journal.clone(),
            ..Default::default()
        });
        let localization = Arc::new(RecordingLocalization {
            journal: journal.clone(),
            ..Default::default()
        });
        let mounter = Arc::new(RecordingMounter {
            journal: journal.clone(),
            ..Default::default()
        });
        let targets = HotfixTargets::new(config.clone(), localization.clone(), mounter.clone());
        let sync = Arc::new(HotfixSynchronizer::new(
            &hotfix_config(),
            client.clone(),
            targets,
            EventBus::new(),
        ));
        Self {
            journal,
            client,
            config,
            localization,
            mounter,
            sync,
        }
    }
}

/// Gate with a configurable answer that counts its calls.
#[derive(Default)]
pub struct MockGate {
    flags: Mutex<PrivilegeFlags>,
    login: Mutex<Option<Result<String, String>>>,
    checks: AtomicUsize,
    logins: AtomicUsize,
    seen_users: Mutex<Vec<Option<String>>>,
}

impl MockGate {
    pub fn with_flags(flags: PrivilegeFlags) -> Self {
        let gate = Self::default();
        gate.set_flags(flags);
        gate
    }

    pub fn set_flags(&self, flags: PrivilegeFlags) {
        *self.flags.lock() = flags;
    }

    /// Give the gate a platform identity service answering with `outcome`.
    pub fn set_login(&self, outcome: Result<&str, &str>) {
        *self.login.lock() = Some(outcome.map(str::to_string).map_err(str::to_string));
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn seen_users(&self) -> Vec<Option<String>> {
        self.seen_users.lock().clone()
    }
}

#[async_trait]
impl PrivilegeGate for MockGate {
    async fn check_privilege(&self, user_id: Option<&str>, _capability: Capability) -> PrivilegeFlags {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.seen_users.lock().push(user_id.map(str::to_string));
        *self.flags.lock()
    }

    fn has_platform_identity(&self) -> bool {
        self.login.lock().is_some()
    }

    async fn console_login(&self, _controller_id: u32) -> anyhow::Result<String> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        match self.login.lock().clone() {
            Some(Ok(user)) => Ok(user),
            Some(Err(reason)) => Err(anyhow::anyhow!(reason)),
            None => Err(anyhow::anyhow!("no identity service")),
        }
    }
}

/// Preload whose pending count the test sets directly.
#[derive(Default)]
pub struct ManualPreload {
    pending: AtomicU32,
}

impl ManualPreload {
    pub fn set(&self, pending: u32) {
        self.pending.store(pending, Ordering::SeqCst);
    }
}

impl AssetPreloadMonitor for ManualPreload {
    fn pending_async_loads(&self) -> u32 {
        self.pending.load(Ordering::SeqCst)
    }
}

/// Orchestrator over a hotfix harness.
pub struct UpdateHarness {
    pub hotfix: HotfixHarness,
    pub gate: Arc<MockGate>,
    pub preload: Arc<ManualPreload>,
    pub updater: UpdateOrchestrator,
}

impl UpdateHarness {
    pub fn new(config: UpdateConfig) -> Self {
        let hotfix = HotfixHarness::new();
        let gate = Arc::new(MockGate::default());
        let preload = Arc::new(ManualPreload::default());
        let updater = UpdateOrchestrator::new(config, gate.clone(), hotfix.sync.clone(), preload.clone());
        Self {
            hotfix,
            gate,
            preload,
            updater,
        }
    }
}

/// Collect events up to and including the next `CheckComplete`.
pub async fn until_complete(events: &mut UnboundedReceiver<UpdateEvent>) -> Vec<UpdateEvent> {
    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        let done = matches!(event, UpdateEvent::CheckComplete { .. });
        seen.push(event);
        if done {
            return seen;
        }
    }
    panic!("event bus closed before CheckComplete; saw {:?}", seen);
}

/// Drain whatever is already queued.
pub fn drain(events: &mut UnboundedReceiver<UpdateEvent>) -> Vec<UpdateEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}
