//! Live stores that hotfix content is applied to.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Config system that accepts deltas and can reload live objects.
pub trait ConfigStore: Send + Sync {
    /// Merge `delta` (ini text) into the store named `store_name`.
    fn merge(&self, store_name: &str, delta: &str) -> anyhow::Result<()>;

    /// Reload every live instance of the named types plus the named
    /// per-object-config instances. Returns how many were reloaded.
    fn reload_instances_of_types(&self, type_names: &[String], object_names: &[String]) -> usize;
}

pub trait LocalizationStore: Send + Sync {
    /// Swap the active localization resource for the one at `path`.
    fn update_from(&self, path: &Path) -> anyhow::Result<()>;
}

pub trait ArchiveMounter: Send + Sync {
    fn mount(&self, path: &Path) -> bool;

    fn unmount(&self, path: &Path);

    /// What the game has to do for freshly mounted content to take effect.
    fn reload_requirement(&self, _path: &Path) -> ReloadRequirement {
        ReloadRequirement::None
    }
}

/// Ordered from weakest to strongest so a cycle can keep the maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadRequirement {
    #[default]
    None,
    Reload,
    Relaunch,
}

/// Everything the apply phase writes to.
#[derive(Clone)]
pub struct HotfixTargets {
    pub config: Arc<dyn ConfigStore>,
    pub localization: Arc<dyn LocalizationStore>,
    pub archives: Arc<dyn ArchiveMounter>,
}

impl HotfixTargets {
    pub fn new(
        config: Arc<dyn ConfigStore>,
        localization: Arc<dyn LocalizationStore>,
        archives: Arc<dyn ArchiveMounter>,
    ) -> Self {
        Self {
            config,
            localization,
            archives,
        }
    }
}
