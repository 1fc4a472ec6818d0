//! Error types for the ledger.

use datavault_core::Principal;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A non-member tried to read the vault. A security alert was recorded.
    #[error("not authorized: {0}")]
    NotAuthorized(Principal),

    /// An owner-only operation was called by someone else.
    #[error("owner only: caller {caller} is not the vault owner")]
    OwnerOnly { caller: Principal },

    /// Revoking the owner would break `owner ∈ authorized`.
    #[error("the vault owner cannot be revoked")]
    CannotRevokeOwner,

    /// The call was rejected before touching state.
    #[error("invalid call: {0}")]
    InvalidCall(String),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("migration error: {0}")]
    Migration(String),

    /// A blocking storage task failed to complete.
    #[error("task error: {0}")]
    Task(String),
}

impl LedgerError {
    /// Whether this is a revert raised by the vault's own rules, as opposed
    /// to an infrastructure failure.
    pub fn is_revert(&self) -> bool {
        matches!(
            self,
            LedgerError::NotAuthorized(_)
                | LedgerError::OwnerOnly { .. }
                | LedgerError::CannotRevokeOwner
                | LedgerError::InvalidCall(_)
        )
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
