//! Simulated asset preload.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::engine::platform::AssetPreloadMonitor;

/// Starts with `pending` outstanding loads and finishes one per poll.
#[derive(Debug, Default)]
pub struct CountdownPreload {
    remaining: AtomicU32,
}

impl CountdownPreload {
    pub fn new(pending: u32) -> Self {
        Self {
            remaining: AtomicU32::new(pending),
        }
    }
}

impl AssetPreloadMonitor for CountdownPreload {
    fn pending_async_loads(&self) -> u32 {
        let current = self.remaining.load(Ordering::Relaxed);
        if current > 0 {
            self.remaining.store(current - 1, Ordering::Relaxed);
        }
        current
    }
}
