//! Consumer-facing events
//!
//! One bus carries everything a loading screen needs: state transitions,
//! hotfix progress and the final completion status. Every subscriber gets
//! its own unbounded queue, so a slow reader never loses events.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::hotfix::HotfixResult;
use super::updater::{UpdateCompletionStatus, UpdateState};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UpdateEvent {
    StateChanged {
        state: UpdateState,
    },
    CheckComplete {
        status: UpdateCompletionStatus,
    },
    HotfixProgress {
        files_downloaded: usize,
        total_files: usize,
        bytes_downloaded: u64,
        total_bytes: u64,
    },
    HotfixFileProcessed {
        friendly_name: String,
        cache_name: String,
    },
    HotfixComplete {
        result: HotfixResult,
    },
}

/// Cloneable registry of subscribers; clones share it.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<UpdateEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. It sees every event emitted from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<UpdateEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.lock().push(sender);
        receiver
    }

    /// Fan out to every live subscriber; dropped receivers are forgotten.
    pub fn emit(&self, event: UpdateEvent) {
        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
