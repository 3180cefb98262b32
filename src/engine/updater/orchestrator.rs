//! Update Orchestrator
//!
//! Sequences patch check → platform environment → hotfix → preload wait →
//! completion. `start_check` never blocks: it flips state under a short lock
//! and spawns the sequence on the tokio runtime it is called from.
//!
//! Events are emitted only after the state lock is released, so listeners
//! may call back into the orchestrator from their handlers.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::cache::{CacheEntrySnapshot, CompletionCache};
use super::preload::PreloadTracker;
use super::state::{CheckMode, PatchCheckResult, StartCheckResult, UpdateCompletionStatus, UpdateState};
use crate::engine::config::UpdateConfig;
use crate::engine::error::UpdateError;
use crate::engine::events::{EventBus, UpdateEvent};
use crate::engine::hotfix::{HotfixResult, HotfixSynchronizer};
use crate::engine::platform::{AssetPreloadMonitor, Capability, PrivilegeGate};

struct OrchestratorState {
    current: UpdateState,
    check_in_progress: bool,
    /// Mode of the running check; cleared when its completion fires.
    active_mode: Option<CheckMode>,
    initial_update_finished: bool,
    platform_environment_detected: bool,
    user_id: Option<String>,
    patch_result: PatchCheckResult,
    hotfix_result: Option<HotfixResult>,
    cache: CompletionCache,
    preload: PreloadTracker,
    #[cfg(debug_assertions)]
    debug_override: Option<i32>,
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self {
            current: UpdateState::Idle,
            check_in_progress: false,
            active_mode: None,
            initial_update_finished: false,
            platform_environment_detected: false,
            user_id: None,
            patch_result: PatchCheckResult::default(),
            hotfix_result: None,
            cache: CompletionCache::default(),
            preload: PreloadTracker::default(),
            #[cfg(debug_assertions)]
            debug_override: None,
        }
    }
}

struct Shared {
    config: UpdateConfig,
    gate: Arc<dyn PrivilegeGate>,
    hotfix: Arc<HotfixSynchronizer>,
    preload: Arc<dyn AssetPreloadMonitor>,
    events: EventBus,
    state: Mutex<OrchestratorState>,
}

/// Serializable view of the orchestrator for status displays.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorSnapshot {
    pub state: UpdateState,
    pub check_in_progress: bool,
    pub hotfix_availability_only: bool,
    pub platform_environment_detected: bool,
    pub worst_pending_loads: u32,
    pub cache: Vec<CacheEntrySnapshot>,
}

/// Drives the startup update sequence. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct UpdateOrchestrator {
    shared: Arc<Shared>,
}

impl UpdateOrchestrator {
    /// Events are published on the synchronizer's bus, so hotfix progress
    /// and orchestrator state arrive on one channel.
    pub fn new(
        config: UpdateConfig,
        gate: Arc<dyn PrivilegeGate>,
        hotfix: Arc<HotfixSynchronizer>,
        preload: Arc<dyn AssetPreloadMonitor>,
    ) -> Self {
        let events = hotfix.events().clone();
        Self {
            shared: Arc::new(Shared {
                config,
                gate,
                hotfix,
                preload,
                events,
                state: Mutex::new(OrchestratorState::default()),
            }),
        }
    }

    pub fn subscribe(&self) -> tokio::sync::mpsc::UnboundedReceiver<UpdateEvent> {
        self.shared.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }

    pub fn hotfix(&self) -> &Arc<HotfixSynchronizer> {
        &self.shared.hotfix
    }

    /// Start a check. Must be called from within a tokio runtime.
    pub fn start_check(&self, hotfix_only: bool) -> StartCheckResult {
        let shared = &self.shared;
        let mode = CheckMode::from_hotfix_only(hotfix_only);

        if !shared.config.checks_enabled {
            info!("{}, reporting no change", UpdateError::ChecksDisabled);
            let task = Arc::clone(shared);
            tokio::spawn(async move {
                task.check_complete(mode, UpdateCompletionStatus::SuccessNoChange, false).await;
            });
            return StartCheckResult::Disabled;
        }

        let mut state = shared.state.lock();
        if state.check_in_progress {
            warn!(
                "update check already in progress ({:?}), ignoring {:?} request",
                state.current, mode
            );
            return StartCheckResult::AlreadyInProgress;
        }
        state.check_in_progress = true;
        state.active_mode = Some(mode);
        let changed = state.transition(UpdateState::Pending);
        let cached = state.cache.replayable(mode, Instant::now(), shared.config.cache_ttl());
        drop(state);
        shared.publish(changed);

        match cached {
            Some(cached) => {
                info!("returning cached update result {:?} for {:?}", cached, mode);
                let task = Arc::clone(shared);
                tokio::spawn(async move {
                    time::sleep(task.config.cached_response_delay()).await;
                    task.check_complete(mode, cached, false).await;
                });
                StartCheckResult::Cached
            }
            None => {
                info!("starting {:?} update check", mode);
                let task = Arc::clone(shared);
                tokio::spawn(async move {
                    let status = task.run_phases(mode).await;
                    task.check_complete(mode, status, true).await;
                });
                StartCheckResult::Started
            }
        }
    }

    /// Preload progress in [0, 1]; 0 until something has been pending.
    pub fn load_progress(&self) -> f32 {
        let current = self.shared.preload.pending_async_loads();
        self.shared.state.lock().preload.progress(current)
    }

    pub fn state(&self) -> UpdateState {
        self.shared.state.lock().current
    }

    pub fn is_check_in_progress(&self) -> bool {
        self.shared.state.lock().check_in_progress
    }

    pub fn is_hotfixing_enabled(&self) -> bool {
        self.shared.config.hotfixing_enabled
    }

    pub fn is_blocking_on_initial_load_enabled(&self) -> bool {
        self.shared.config.block_on_initial_load
    }

    /// Forget cache timestamps and drop back to `Pending`.
    pub fn reset(&self) {
        let changed = {
            let mut state = self.shared.state.lock();
            state.cache.clear_timestamps();
            state.transition(UpdateState::Pending)
        };
        self.shared.publish(changed);
    }

    pub fn snapshot(&self) -> OrchestratorSnapshot {
        let state = self.shared.state.lock();
        OrchestratorSnapshot {
            state: state.current,
            check_in_progress: state.check_in_progress,
            hotfix_availability_only: state.active_mode == Some(CheckMode::HotfixAvailabilityOnly),
            platform_environment_detected: state.platform_environment_detected,
            worst_pending_loads: state.preload.worst_pending(),
            cache: state.cache.snapshot(),
        }
    }

    /// Force every completion to report `status` (by discriminant).
    /// Out-of-range values and `None` disable the override.
    #[cfg(debug_assertions)]
    pub fn set_debug_completion_override(&self, status: Option<i32>) {
        self.shared.state.lock().debug_override = status;
    }
}

impl Shared {
    fn set_state(&self, new_state: UpdateState) {
        let changed = self.state.lock().transition(new_state);
        self.publish(changed);
    }

    /// Must be called with the state lock released.
    fn publish(&self, event: Option<UpdateEvent>) {
        if let Some(event) = event {
            self.events.emit(event);
        }
    }

    async fn run_phases(&self, mode: CheckMode) -> UpdateCompletionStatus {
        let patch = self.check_patch().await;
        if let Some(e) = patch.as_error() {
            if patch == PatchCheckResult::NoLoggedInUser {
                warn!("{}", e);
                return UpdateCompletionStatus::FailureNotLoggedIn;
            }
            info!("skipping hotfix check: {}", e);
            return self.wait_for_initial_load().await;
        }

        if let Err(e) = self.detect_platform_environment().await {
            warn!("{}", e);
            return UpdateCompletionStatus::FailureNotLoggedIn;
        }

        self.set_state(UpdateState::CheckingHotfix);
        if mode == CheckMode::HotfixAvailabilityOnly {
            let result = self.run_hotfix(true).await;
            return UpdateCompletionStatus::from_availability(result);
        }

        let result = self.run_hotfix(false).await;
        self.state.lock().hotfix_result = Some(result);
        self.wait_for_initial_load().await
    }

    async fn check_patch(&self) -> PatchCheckResult {
        let (user_id, changed) = {
            let mut state = self.state.lock();
            state.patch_result = PatchCheckResult::NoPatchRequired;
            state.hotfix_result = None;
            (state.user_id.clone(), state.transition(UpdateState::CheckingPatch))
        };
        self.publish(changed);

        let flags = self.gate.check_privilege(user_id.as_deref(), Capability::CanPlay).await;
        let patch = PatchCheckResult::from_flags(flags);
        info!("patch check returned {} -> {:?}", flags, patch);

        self.state.lock().patch_result = patch;
        patch
    }

    async fn detect_platform_environment(&self) -> Result<(), UpdateError> {
        if !self.gate.has_platform_identity() {
            return Ok(());
        }
        if self.state.lock().platform_environment_detected {
            return Ok(());
        }

        self.set_state(UpdateState::DetectingPlatformEnvironment);
        match self.gate.console_login(self.config.controller_id).await {
            Ok(user_id) => {
                info!("platform environment detected, user {}", user_id);
                let mut state = self.state.lock();
                state.platform_environment_detected = true;
                state.user_id = Some(user_id);
                Ok(())
            }
            Err(e) => Err(UpdateError::LoginFailure(e.to_string())),
        }
    }

    async fn run_hotfix(&self, availability_only: bool) -> HotfixResult {
        if !self.config.hotfixing_enabled {
            debug!("hotfixing disabled");
            return HotfixResult::SuccessNoChange;
        }
        let outcome = if availability_only {
            self.hotfix.check_availability().await
        } else {
            self.hotfix.start_hotfix().await
        };
        outcome.unwrap_or_else(|e| {
            warn!("hotfix check rejected: {}", e);
            HotfixResult::Failed
        })
    }

    async fn wait_for_initial_load(&self) -> UpdateCompletionStatus {
        let changed = {
            let mut state = self.state.lock();
            state.preload.reset();
            state.transition(UpdateState::WaitingOnInitialLoad)
        };
        self.publish(changed);

        if self.config.block_on_initial_load {
            let mut ticker = time::interval(self.config.preload_poll_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let pending = self.preload.pending_async_loads();
                if self.state.lock().preload.record(pending) {
                    break;
                }
            }
        }

        let (status, changed) = {
            let mut state = self.state.lock();
            let changed = state.transition(UpdateState::InitialLoadComplete);
            (
                UpdateCompletionStatus::from_results(state.patch_result, state.hotfix_result),
                changed,
            )
        };
        self.publish(changed);
        status
    }

    async fn check_complete(&self, mode: CheckMode, status: UpdateCompletionStatus, update_timestamp: bool) {
        let status = {
            let mut state = self.state.lock();
            let status = state.apply_debug_override(status);
            state.cache.record(mode, status, update_timestamp, Instant::now());
            status
        };

        let delay = match mode {
            CheckMode::HotfixAvailabilityOnly => self.config.availability_complete_delay(),
            CheckMode::Full => self.config.check_complete_delay(),
        };
        time::sleep(delay).await;

        let changed = {
            let mut state = self.state.lock();
            state.active_mode = None;
            state.check_in_progress = false;
            let next = if state.initial_update_finished {
                UpdateState::Complete
            } else {
                UpdateState::Pending
            };
            state.initial_update_finished = true;
            state.transition(next)
        };

        info!("update check complete: {:?}", status);
        self.events.emit(UpdateEvent::CheckComplete { status });
        self.publish(changed);
    }
}

impl OrchestratorState {
    /// Move to `new_state`, returning the event to publish once unlocked.
    fn transition(&mut self, new_state: UpdateState) -> Option<UpdateEvent> {
        if self.current == new_state {
            return None;
        }
        debug!("update state {:?} -> {:?}", self.current, new_state);
        self.current = new_state;
        Some(UpdateEvent::StateChanged { state: new_state })
    }

    #[cfg(debug_assertions)]
    fn apply_debug_override(&self, status: UpdateCompletionStatus) -> UpdateCompletionStatus {
        match self.debug_override.map(UpdateCompletionStatus::try_from) {
            Some(Ok(forced)) => {
                warn!("debug override replaces {:?} with {:?}", status, forced);
                forced
            }
            _ => status,
        }
    }

    #[cfg(not(debug_assertions))]
    fn apply_debug_override(&self, status: UpdateCompletionStatus) -> UpdateCompletionStatus {
        status
    }
}
