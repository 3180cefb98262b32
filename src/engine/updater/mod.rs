//! Startup Update Orchestration
//!
//! Components:
//! - `state` - States, completion codes and result mapping
//! - `cache` - Per-mode completion cache with TTL
//! - `preload` - Initial asset preload tracking
//! - `orchestrator` - The patch → environment → hotfix → preload sequence

pub mod cache;
pub mod orchestrator;
pub mod preload;
pub mod state;

pub use cache::{CacheEntrySnapshot, CompletionCache, CompletionCacheEntry};
pub use orchestrator::{OrchestratorSnapshot, UpdateOrchestrator};
pub use preload::PreloadTracker;
pub use state::{CheckMode, PatchCheckResult, StartCheckResult, UpdateCompletionStatus, UpdateState};
