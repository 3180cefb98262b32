//! Privilege / Login Gate
//!
//! The store-level patch check is an opaque privilege query against the
//! platform. Its answer is a bitmask; the orchestrator decides what it means.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Result bits reported by a privilege check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrivilegeFlags(u32);

impl PrivilegeFlags {
    pub const NONE: Self = Self(0);
    pub const SYSTEM_UPDATE_REQUIRED: Self = Self(1 << 0);
    pub const PATCH_AVAILABLE: Self = Self(1 << 1);
    pub const USER_NOT_LOGGED_IN: Self = Self(1 << 2);
    pub const USER_NOT_FOUND: Self = Self(1 << 3);
    pub const GENERIC_FAILURE: Self = Self(1 << 4);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if any bit of `other` is set in `self`.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for PrivilegeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PrivilegeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for PrivilegeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Capability being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    CanPlay,
}

/// Platform privilege and identity services.
#[async_trait]
pub trait PrivilegeGate: Send + Sync {
    /// Query a capability for a user (None before anyone has logged in).
    async fn check_privilege(&self, user_id: Option<&str>, capability: Capability) -> PrivilegeFlags;

    /// Whether this platform has its own identity service that needs a
    /// console login before content can be fetched.
    fn has_platform_identity(&self) -> bool {
        false
    }

    /// Log in the user on `controller_id`, returning their user id.
    async fn console_login(&self, controller_id: u32) -> anyhow::Result<String> {
        Err(anyhow::anyhow!(
            "no platform identity service for controller {}",
            controller_id
        ))
    }
}

/// Gate answering every check with a fixed bitmask.
///
/// Used by the CLI and by hosts without a store layer.
#[derive(Debug, Clone, Default)]
pub struct StaticPrivilegeGate {
    flags: PrivilegeFlags,
    login_user: Option<String>,
}

impl StaticPrivilegeGate {
    pub fn new(flags: PrivilegeFlags) -> Self {
        Self {
            flags,
            login_user: None,
        }
    }

    /// Pretend the platform has an identity service that logs in `user_id`.
    pub fn with_platform_login(mut self, user_id: impl Into<String>) -> Self {
        self.login_user = Some(user_id.into());
        self
    }
}

#[async_trait]
impl PrivilegeGate for StaticPrivilegeGate {
    async fn check_privilege(&self, _user_id: Option<&str>, _capability: Capability) -> PrivilegeFlags {
        self.flags
    }

    fn has_platform_identity(&self) -> bool {
        self.login_user.is_some()
    }

    async fn console_login(&self, controller_id: u32) -> anyhow::Result<String> {
        self.login_user
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no platform identity service for controller {}", controller_id))
    }
}
