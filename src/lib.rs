//! Hotpatch - startup update orchestration and hotfix content sync
//!
//! Before gameplay starts a client asks the platform whether its binary
//! needs a store patch, logs in to the platform identity service if there is
//! one, pulls small hotfix files (config deltas, a localization bundle,
//! package archives) and waits for the initial asset preload. A loading
//! screen follows along through [`engine::UpdateEvent`]s.
//!
//! ```no_run
//! use std::sync::Arc;
//! use hotpatch_lib::engine::config::Config;
//! use hotpatch_lib::engine::events::{EventBus, UpdateEvent};
//! use hotpatch_lib::engine::hotfix::{HotfixSynchronizer, HotfixTargets};
//! use hotpatch_lib::engine::local::*;
//! use hotpatch_lib::engine::platform::{NoPendingLoads, PrivilegeFlags, StaticPrivilegeGate};
//! use hotpatch_lib::engine::updater::UpdateOrchestrator;
//!
//! # async fn run() {
//! let config = Config::default();
//! let targets = HotfixTargets::new(
//!     Arc::new(FileConfigStore::new("config")),
//!     Arc::new(FileLocalizationStore::new()),
//!     Arc::new(DirectoryArchiveMounter::new()),
//! );
//! let client = Arc::new(DirectoryManifestClient::new("mirror", "cache"));
//! let hotfix = Arc::new(HotfixSynchronizer::new(&config.hotfix, client, targets, EventBus::new()));
//! let updater = UpdateOrchestrator::new(
//!     config.update,
//!     Arc::new(StaticPrivilegeGate::new(PrivilegeFlags::NONE)),
//!     hotfix,
//!     Arc::new(NoPendingLoads),
//! );
//! let mut events = updater.subscribe();
//! updater.start_check(false);
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//!     if matches!(event, UpdateEvent::CheckComplete { .. }) {
//!         break;
//!     }
//! }
//! # }
//! ```

pub mod engine;
