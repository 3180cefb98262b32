//! Hotfix Content Sync
//!
//! Components:
//! - `manifest` - Manifest entries, filtering and canonical ordering
//! - `client` - Remote file service contract
//! - `targets` - Config, localization and archive stores
//! - `processor` - Per-content-type apply handlers
//! - `synchronizer` - The enumerate/diff/download/apply cycle

pub mod client;
pub mod manifest;
pub mod processor;
pub mod synchronizer;
pub mod targets;

pub use client::ContentManifestClient;
pub use manifest::{ContentKind, FilterRules, ManifestEntry};
pub use processor::{ApplyContext, ApplyOutcome, DefaultHotfixProcessor, HotfixProcessor};
pub use synchronizer::{HotfixResult, HotfixSynchronizer, SyncMode, SyncProgress};
pub use targets::{ArchiveMounter, ConfigStore, HotfixTargets, LocalizationStore, ReloadRequirement};
