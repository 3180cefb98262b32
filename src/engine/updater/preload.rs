//! Initial preload tracking
//!
//! Remembers the worst pending-load count seen while waiting so the loading
//! screen can show a monotone-ish progress bar.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadTracker {
    worst_pending: u32,
}

impl PreloadTracker {
    pub fn reset(&mut self) {
        self.worst_pending = 0;
    }

    /// Record one poll. Returns true once nothing is pending.
    pub fn record(&mut self, current_pending: u32) -> bool {
        self.worst_pending = self.worst_pending.max(current_pending);
        current_pending == 0
    }

    pub fn worst_pending(&self) -> u32 {
        self.worst_pending
    }

    /// Fraction of the worst backlog that has drained, in [0, 1].
    pub fn progress(&self, current_pending: u32) -> f32 {
        if self.worst_pending == 0 {
            return 0.0;
        }
        let done = self.worst_pending.saturating_sub(current_pending) as f32;
        (done / self.worst_pending as f32).clamp(0.0, 1.0)
    }
}
