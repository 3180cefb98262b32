//! Per-mode completion cache.
//!
//! Process-lifetime only. Monotonic `Instant`s drive the TTL; the wall-clock
//! time is kept for display.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

use super::state::{CheckMode, UpdateCompletionStatus};

#[derive(Debug, Clone, Default)]
pub struct CompletionCacheEntry {
    pub mode: CheckMode,
    pub last_result: UpdateCompletionStatus,
    pub last_success: Option<Instant>,
    pub last_success_at: Option<DateTime<Utc>>,
}

/// Serializable copy of a cache entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntrySnapshot {
    pub mode: CheckMode,
    pub last_result: UpdateCompletionStatus,
    pub last_success_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CompletionCache {
    entries: [CompletionCacheEntry; 2],
}

impl Default for CompletionCache {
    fn default() -> Self {
        Self {
            entries: [
                CompletionCacheEntry {
                    mode: CheckMode::Full,
                    ..Default::default()
                },
                CompletionCacheEntry {
                    mode: CheckMode::HotfixAvailabilityOnly,
                    ..Default::default()
                },
            ],
        }
    }
}

impl CompletionCache {
    pub fn entry(&self, mode: CheckMode) -> &CompletionCacheEntry {
        &self.entries[mode.index()]
    }

    /// The cached status to replay, or None if a fresh check is required.
    pub fn replayable(&self, mode: CheckMode, now: Instant, ttl: Duration) -> Option<UpdateCompletionStatus> {
        let entry = self.entry(mode);
        if entry.last_result.forces_recheck() {
            return None;
        }
        let last_success = entry.last_success?;
        if now.saturating_duration_since(last_success) > ttl {
            return None;
        }
        Some(entry.last_result)
    }

    /// Record a completion. The timestamp only moves for fresh successes.
    pub fn record(&mut self, mode: CheckMode, status: UpdateCompletionStatus, update_timestamp: bool, now: Instant) {
        let entry = &mut self.entries[mode.index()];
        entry.last_result = status;
        if update_timestamp && status.is_success() {
            entry.last_success = Some(now);
            entry.last_success_at = Some(Utc::now());
        }
    }

    pub fn clear_timestamps(&mut self) {
        for entry in &mut self.entries {
            entry.last_success = None;
            entry.last_success_at = None;
        }
    }

    pub fn snapshot(&self) -> Vec<CacheEntrySnapshot> {
        self.entries
            .iter()
            .map(|entry| CacheEntrySnapshot {
                mode: entry.mode,
                last_result: entry.last_result,
                last_success_at: entry.last_success_at,
            })
            .collect()
    }
}
