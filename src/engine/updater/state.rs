//! Update State Machine Types
//!
//! States, completion codes and the mapping rules between phase results
//! and what the loading screen is finally told.

use serde::{Deserialize, Serialize};

use crate::engine::error::UpdateError;
use crate::engine::hotfix::HotfixResult;
use crate::engine::platform::PrivilegeFlags;

/// Where the startup update sequence currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateState {
    /// Nothing has been requested yet
    #[default]
    Idle,
    /// A check was requested, or the first check finished
    Pending,
    /// Asking the platform whether the client binary needs a patch
    CheckingPatch,
    /// Logging in to the platform identity service
    DetectingPlatformEnvironment,
    /// Running the hotfix synchronizer
    CheckingHotfix,
    /// Waiting for background asset loads to drain
    WaitingOnInitialLoad,
    InitialLoadComplete,
    /// A later check finished
    Complete,
}

/// Final status reported to listeners.
///
/// Discriminants are stable; the debug override addresses statuses by them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum UpdateCompletionStatus {
    #[default]
    Unknown = 0,
    Success = 1,
    SuccessNoChange = 2,
    SuccessNeedsReload = 3,
    SuccessNeedsRelaunch = 4,
    SuccessNeedsPatch = 5,
    FailurePatchCheck = 6,
    FailureHotfixCheck = 7,
    FailureNotLoggedIn = 8,
}

impl UpdateCompletionStatus {
    pub const ALL: [Self; 9] = [
        Self::Unknown,
        Self::Success,
        Self::SuccessNoChange,
        Self::SuccessNeedsReload,
        Self::SuccessNeedsRelaunch,
        Self::SuccessNeedsPatch,
        Self::FailurePatchCheck,
        Self::FailureHotfixCheck,
        Self::FailureNotLoggedIn,
    ];

    /// Statuses that refresh the cache timestamp.
    pub fn is_success(self) -> bool {
        matches!(
            self,
            Self::Success | Self::SuccessNoChange | Self::SuccessNeedsReload | Self::SuccessNeedsRelaunch
        )
    }

    /// Statuses that are never replayed from cache.
    pub fn forces_recheck(self) -> bool {
        matches!(
            self,
            Self::Unknown | Self::FailurePatchCheck | Self::FailureHotfixCheck | Self::FailureNotLoggedIn
        )
    }

    /// Status for a full check once preload has drained.
    pub fn from_results(patch: PatchCheckResult, hotfix: Option<HotfixResult>) -> Self {
        match patch {
            PatchCheckResult::PatchRequired => Self::SuccessNeedsPatch,
            PatchCheckResult::PatchCheckFailure => Self::FailurePatchCheck,
            PatchCheckResult::NoLoggedInUser => Self::FailureNotLoggedIn,
            PatchCheckResult::NoPatchRequired => match hotfix {
                Some(HotfixResult::Success) => Self::Success,
                Some(HotfixResult::SuccessNoChange) | None => Self::SuccessNoChange,
                Some(HotfixResult::Failed) => Self::FailureHotfixCheck,
                Some(HotfixResult::SuccessNeedsReload) => Self::SuccessNeedsReload,
                Some(HotfixResult::SuccessNeedsRelaunch) => Self::SuccessNeedsRelaunch,
            },
        }
    }

    /// Status for an availability-only hotfix check.
    pub fn from_availability(hotfix: HotfixResult) -> Self {
        match hotfix {
            HotfixResult::SuccessNoChange => Self::SuccessNoChange,
            HotfixResult::Failed => Self::FailureHotfixCheck,
            HotfixResult::Success | HotfixResult::SuccessNeedsReload | HotfixResult::SuccessNeedsRelaunch => {
                Self::Success
            }
        }
    }
}

impl TryFrom<i32> for UpdateCompletionStatus {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| *status as i32 == value)
            .ok_or(value)
    }
}

/// Interpretation of the privilege bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchCheckResult {
    #[default]
    NoPatchRequired,
    PatchRequired,
    NoLoggedInUser,
    PatchCheckFailure,
}

impl PatchCheckResult {
    /// Patch bits win over login bits, which win over the generic failure bit.
    pub fn from_flags(flags: PrivilegeFlags) -> Self {
        if flags.intersects(PrivilegeFlags::SYSTEM_UPDATE_REQUIRED | PrivilegeFlags::PATCH_AVAILABLE) {
            Self::PatchRequired
        } else if flags.intersects(PrivilegeFlags::USER_NOT_LOGGED_IN | PrivilegeFlags::USER_NOT_FOUND) {
            Self::NoLoggedInUser
        } else if flags.intersects(PrivilegeFlags::GENERIC_FAILURE) {
            Self::PatchCheckFailure
        } else {
            Self::NoPatchRequired
        }
    }
}

impl PatchCheckResult {
    /// The error this result stands for, if it blocks the hotfix phase.
    pub fn as_error(self) -> Option<UpdateError> {
        match self {
            Self::NoPatchRequired => None,
            Self::PatchRequired => Some(UpdateError::PatchRequired),
            Self::NoLoggedInUser => Some(UpdateError::NotLoggedIn),
            Self::PatchCheckFailure => Some(UpdateError::PatchCheckFailure),
        }
    }
}

/// Which of the two cached check flavours is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    #[default]
    Full,
    HotfixAvailabilityOnly,
}

impl CheckMode {
    pub fn from_hotfix_only(hotfix_only: bool) -> Self {
        if hotfix_only {
            Self::HotfixAvailabilityOnly
        } else {
            Self::Full
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Full => 0,
            Self::HotfixAvailabilityOnly => 1,
        }
    }
}

/// What `start_check` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartCheckResult {
    /// Checks are off; a no-change completion is on its way.
    Disabled,
    /// The cached status will be replayed.
    Cached,
    Started,
    /// A check is already running; nothing was changed.
    AlreadyInProgress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_result_priority() {
        let all = PrivilegeFlags::PATCH_AVAILABLE
            | PrivilegeFlags::USER_NOT_LOGGED_IN
            | PrivilegeFlags::GENERIC_FAILURE;
        assert_eq!(PatchCheckResult::from_flags(all), PatchCheckResult::PatchRequired);
        assert_eq!(
            PatchCheckResult::from_flags(PrivilegeFlags::SYSTEM_UPDATE_REQUIRED),
            PatchCheckResult::PatchRequired
        );
        assert_eq!(
            PatchCheckResult::from_flags(PrivilegeFlags::USER_NOT_FOUND | PrivilegeFlags::GENERIC_FAILURE),
            PatchCheckResult::NoLoggedInUser
        );
        assert_eq!(
            PatchCheckResult::from_flags(PrivilegeFlags::GENERIC_FAILURE),
            PatchCheckResult::PatchCheckFailure
        );
        assert_eq!(
            PatchCheckResult::from_flags(PrivilegeFlags::NONE),
            PatchCheckResult::NoPatchRequired
        );
    }

    #[test]
    fn test_patch_result_errors() {
        assert_eq!(PatchCheckResult::NoPatchRequired.as_error(), None);
        assert_eq!(PatchCheckResult::PatchRequired.as_error(), Some(UpdateError::PatchRequired));
        assert_eq!(PatchCheckResult::NoLoggedInUser.as_error(), Some(UpdateError::NotLoggedIn));
    }

    #[test]
    fn test_final_status_mapping() {
        use HotfixResult as H;
        use PatchCheckResult as P;
        use UpdateCompletionStatus as S;

        assert_eq!(S::from_results(P::PatchRequired, Some(H::Failed)), S::SuccessNeedsPatch);
        assert_eq!(S::from_results(P::PatchCheckFailure, None), S::FailurePatchCheck);
        assert_eq!(S::from_results(P::NoPatchRequired, Some(H::Success)), S::Success);
        assert_eq!(S::from_results(P::NoPatchRequired, Some(H::Failed)), S::FailureHotfixCheck);
        assert_eq!(
            S::from_results(P::NoPatchRequired, Some(H::SuccessNeedsRelaunch)),
            S::SuccessNeedsRelaunch
        );
        assert_eq!(S::from_availability(H::Success), S::Success);
        assert_eq!(S::from_availability(H::Failed), S::FailureHotfixCheck);
    }

    #[test]
    fn test_status_discriminants_round_trip() {
        for status in UpdateCompletionStatus::ALL {
            assert_eq!(UpdateCompletionStatus::try_from(status as i32), Ok(status));
        }
        assert_eq!(UpdateCompletionStatus::try_from(9), Err(9));
        assert_eq!(UpdateCompletionStatus::try_from(-1), Err(-1));
    }

    #[test]
    fn test_cache_policy_sets_are_disjoint() {
        for status in UpdateCompletionStatus::ALL {
            assert!(!(status.is_success() && status.forces_recheck()));
        }
        assert!(!UpdateCompletionStatus::SuccessNeedsPatch.is_success());
        assert!(!UpdateCompletionStatus::SuccessNeedsPatch.forces_recheck());
    }
}
