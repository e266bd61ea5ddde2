//! Error types for Cargomail.
//!
//! Uses thiserror for ergonomic error definitions. Validation errors are
//! raised before any write; store errors are always safe to retry because a
//! failed mutation never commits partial state.

use crate::models::{ContactStatus, SequenceKind};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Contact rule violations
    #[error("Field is immutable: {0}")]
    ImmutableField(&'static str),

    #[error("Invalid contact status: {0}")]
    InvalidStatus(String),

    #[error("Transition not allowed: {from} -> {to}")]
    DisallowedTransition {
        from: ContactStatus,
        to: ContactStatus,
    },

    // Resource errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    // Validation errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Store errors
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    #[error("Store unavailable: timed out waiting for write scope of user {user_id}")]
    LockTimeout { user_id: i64 },

    /// Counters were never seeded for this user. Indicates a provisioning
    /// bug rather than a runtime condition.
    #[error("Sequence {kind} not provisioned for user {user_id}")]
    SequenceNotProvisioned { user_id: i64, kind: SequenceKind },

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ImmutableField(_) => "IMMUTABLE_FIELD",
            Self::InvalidStatus(_) => "INVALID_STATUS",
            Self::DisallowedTransition { .. } => "DISALLOWED_TRANSITION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::StoreUnavailable(_) | Self::LockTimeout { .. } => "STORE_UNAVAILABLE",
            Self::SequenceNotProvisioned { .. } => "SEQUENCE_NOT_PROVISIONED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller may retry the whole operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::LockTimeout { .. })
    }

    /// Integration errors that should never occur in a correctly wired system.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SequenceNotProvisioned { .. })
    }

    /// Contact lookups report missing and foreign contacts identically.
    pub(crate) fn contact_not_found(contact_id: i64) -> Self {
        Self::NotFound(format!("Contact not found: {}", contact_id))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_are_retryable() {
        assert!(Error::StoreUnavailable(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(Error::LockTimeout { user_id: 1 }.is_retryable());
        assert!(!Error::ImmutableField("uuid").is_retryable());
        assert!(!Error::contact_not_found(7).is_retryable());
    }

    #[test]
    fn test_provisioning_error_is_fatal() {
        let err = Error::SequenceNotProvisioned {
            user_id: 3,
            kind: SequenceKind::History,
        };
        assert!(err.is_fatal());
        assert!(!err.is_retryable());
        assert_eq!(err.error_code(), "SEQUENCE_NOT_PROVISIONED");
        assert_eq!(err.to_string(), "Sequence history not provisioned for user 3");
    }

    #[test]
    fn test_disallowed_transition_message() {
        let err = Error::DisallowedTransition {
            from: ContactStatus::Trashed,
            to: ContactStatus::Modified,
        };
        assert_eq!(err.to_string(), "Transition not allowed: trashed -> modified");
        assert_eq!(err.error_code(), "DISALLOWED_TRANSITION");
    }
}
