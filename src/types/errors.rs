//! Error types used across Drivestage.
//!
//! The fatal/recoverable split drives the apply engine's control flow: fatal
//! kinds abort the remainder of a plan, recoverable kinds are recorded as a
//! failed per-operation result and execution continues.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure categories for remote-store calls and local validation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Credentials invalid or token refresh failed.
    #[error("authentication failed")]
    Auth,
    /// Access denied by the remote store.
    #[error("permission denied")]
    Permission,
    /// Malformed request (multi-parent move, folder copy, non-folder parent).
    #[error("invalid argument")]
    InvalidArgument,
    /// Structural precondition violated (unknown target, pending ops, unresolved id).
    #[error("invalid state")]
    InvalidState,
    /// Remote item does not exist.
    #[error("not found")]
    NotFound,
    /// The item changed remotely since its version was captured.
    #[error("conflict")]
    Conflict,
    /// Remote store rate limit hit.
    #[error("rate limited")]
    RateLimit,
    /// Storage or request quota exceeded.
    #[error("quota exceeded")]
    QuotaExceeded,
    /// Transport-level failure the collaborator could not retry away.
    #[error("network error")]
    Network,
    /// Unclassified remote API error.
    #[error("api error")]
    Api,
    /// Local file read/write failure during upload or download.
    #[error("io error")]
    Io,
}

impl ErrorKind {
    /// Whether this kind halts an in-progress apply instead of being
    /// recorded per-operation and skipped past.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(
            self,
            ErrorKind::Auth
                | ErrorKind::Permission
                | ErrorKind::InvalidArgument
                | ErrorKind::InvalidState
        )
    }

    /// Stable identifier used in emitted facts and result listings.
    #[must_use]
    pub const fn id_str(self) -> &'static str {
        match self {
            ErrorKind::Auth => "E_AUTH",
            ErrorKind::Permission => "E_PERMISSION",
            ErrorKind::InvalidArgument => "E_INVALID_ARGUMENT",
            ErrorKind::InvalidState => "E_INVALID_STATE",
            ErrorKind::NotFound => "E_NOT_FOUND",
            ErrorKind::Conflict => "E_CONFLICT",
            ErrorKind::RateLimit => "E_RATE_LIMIT",
            ErrorKind::QuotaExceeded => "E_QUOTA",
            ErrorKind::Network => "E_NETWORK",
            ErrorKind::Api => "E_API",
            ErrorKind::Io => "E_IO",
        }
    }
}

/// Structured error with a kind and human message.
///
/// `Clone + Serialize` so a failed operation can carry its error inside the
/// returned [`SyncResult`](crate::types::SyncResult).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {msg}")]
pub struct Error {
    pub kind: ErrorKind,
    pub msg: String,
}

impl Error {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, msg)
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }

    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

/// Convenient alias for results returning a `types::Error`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_split_matches_contract() {
        for kind in [
            ErrorKind::Auth,
            ErrorKind::Permission,
            ErrorKind::InvalidArgument,
            ErrorKind::InvalidState,
        ] {
            assert!(kind.is_fatal(), "{kind} should be fatal");
        }
        for kind in [
            ErrorKind::NotFound,
            ErrorKind::Conflict,
            ErrorKind::RateLimit,
            ErrorKind::QuotaExceeded,
            ErrorKind::Network,
            ErrorKind::Api,
            ErrorKind::Io,
        ] {
            assert!(!kind.is_fatal(), "{kind} should be recoverable");
        }
    }
}
