//! Engine error types.
//!
//! [`NotFoundError`] is fatal to a call and leaves no side effects.
//! [`PersistenceError`] comes from a port. On a read it is fatal; on an
//! alert or audit write the engine reports it next to the verdict instead
//! (see [`TransitionReport`](crate::TransitionReport)).

use thiserror::Error;
use uuid::Uuid;

/// A referenced record does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("dossier {0} not found")]
    Dossier(String),

    #[error("alert {0} not found")]
    Alert(Uuid),

    #[error("organization {0} not found")]
    Organization(String),
}

/// A port failed to read or write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// Storage backend rejected or could not run the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored record could not be decoded.
    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
}

/// Errors returned by [`ComplianceEngine`](crate::ComplianceEngine) calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComplianceError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
