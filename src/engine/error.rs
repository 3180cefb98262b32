//! Update Error Types

use thiserror::Error;

/// Failure taxonomy shared by the orchestrator and the hotfix synchronizer.
///
/// None of these ever escape the public surface as a panic; each one is
/// folded into a completion status or a `HotfixResult` at the phase boundary
/// where it happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    #[error("Update checks are disabled")]
    ChecksDisabled,

    #[error("An update cycle is already in progress")]
    AlreadyInProgress,

    #[error("Manifest enumeration failed: {0}")]
    EnumerationFailure(String),

    #[error("Download of {download_id} failed: {reason}")]
    DownloadFailure { download_id: String, reason: String },

    #[error("Applying {file} failed: {reason}")]
    ApplyFailure { file: String, reason: String },

    #[error("Console login failed: {0}")]
    LoginFailure(String),

    #[error("No user is logged in")]
    NotLoggedIn,

    #[error("Client patch required")]
    PatchRequired,

    #[error("Patch check failed")]
    PatchCheckFailure,
}

