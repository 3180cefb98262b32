// Hotpatch Engine - Core module structure
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod hotfix;
pub mod local;
pub mod platform;
pub mod updater;

pub use config::Config;
pub use error::UpdateError;
pub use events::{EventBus, UpdateEvent};
pub use hotfix::{HotfixResult, HotfixSynchronizer};
pub use updater::{StartCheckResult, UpdateCompletionStatus, UpdateOrchestrator, UpdateState};
