//! Platform Integration Module
//!
//! Host platform detection plus the contracts the orchestrator consumes from
//! the platform layer: the privilege/login gate and the asset-preload monitor.

pub mod gate;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use gate::{Capability, PrivilegeFlags, PrivilegeGate, StaticPrivilegeGate};

/// Supported platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    MacOS,
    Linux,
    Windows,
    Unknown,
}

impl Platform {
    /// Detect current platform
    pub fn current() -> Self {
        #[cfg(target_os = "macos")]
        return Platform::MacOS;

        #[cfg(target_os = "linux")]
        return Platform::Linux;

        #[cfg(target_os = "windows")]
        return Platform::Windows;

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        return Platform::Unknown;
    }

    /// Name used as the prefix of platform-specific hotfix files
    pub fn name(&self) -> &'static str {
        match self {
            Platform::MacOS => "Mac",
            Platform::Linux => "Linux",
            Platform::Windows => "Windows",
            Platform::Unknown => "Unknown",
        }
    }

    /// Get platform-specific directory for downloaded hotfix files
    pub fn hotfix_cache_dir(&self) -> Option<PathBuf> {
        match self {
            Platform::MacOS => dirs::cache_dir().map(|d| d.join("Hotpatch")),
            Platform::Linux => dirs::cache_dir().map(|d| d.join("hotpatch")),
            Platform::Windows => dirs::cache_dir().map(|d| d.join("Hotpatch")),
            Platform::Unknown => None,
        }
    }
}

/// Reports how many asset loads are still outstanding.
///
/// Polled by the orchestrator while it waits for the initial preload.
pub trait AssetPreloadMonitor: Send + Sync {
    fn pending_async_loads(&self) -> u32;
}

/// Monitor for hosts that never preload anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPendingLoads;

impl AssetPreloadMonitor for NoPendingLoads {
    fn pending_async_loads(&self) -> u32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_detection() {
        let platform = Platform::current();

        #[cfg(target_os = "linux")]
        assert_eq!(platform.name(), "Linux");

        #[cfg(target_os = "windows")]
        assert_eq!(platform.name(), "Windows");

        #[cfg(target_os = "macos")]
        assert_eq!(platform.name(), "Mac");
    }

    #[test]
    fn test_no_pending_loads() {
        assert_eq!(NoPendingLoads.pending_async_loads(), 0);
    }
}
