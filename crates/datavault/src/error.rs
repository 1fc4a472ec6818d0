//! Error types for the DataVault client.

use datavault_core::{CoreError, Principal};
use datavault_ledger::LedgerError;
use thiserror::Error;

/// Why a signing collaborator produced no signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// The user (or wallet policy) refused to sign.
    #[error("signing declined")]
    Declined,

    #[error("signing failed: {0}")]
    Failed(String),
}

/// Errors that can occur during client workflows.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No usable authentication signature; nothing was submitted.
    #[error("authentication refused: {0}")]
    AuthenticationRefused(String),

    /// Ledger error, including `NotAuthorized` and owner-only reverts.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Local cryptographic failure.
    #[error("crypto error: {0}")]
    Core(#[from] CoreError),

    /// The vault holds no data (or no key) for this principal yet.
    #[error("no data in vault")]
    NoData,

    /// A grant target has not published an encryption key.
    #[error("no published encryption key for {0}")]
    MissingEncryptionKey(Principal),

    /// A blocking task failed to complete.
    #[error("task error: {0}")]
    Task(String),
}

impl VaultError {
    /// Whether the ledger refused a read for lack of authorization.
    pub fn is_not_authorized(&self) -> bool {
        matches!(self, VaultError::Ledger(LedgerError::NotAuthorized(_)))
    }

    /// Whether the ledger refused an owner-only operation.
    pub fn is_owner_only_violation(&self) -> bool {
        matches!(self, VaultError::Ledger(LedgerError::OwnerOnly { .. }))
    }
}

/// Errors from the smart-wallet proxy.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Only the wallet's owner may execute through it.
    #[error("caller {caller} does not own this wallet")]
    NotOwner { caller: Principal },

    /// The forwarded call reverted.
    #[error("execution failed: {reason}")]
    ExecutionFailed { reason: String },

    /// The ledger itself failed (storage, task), not the call.
    #[error("ledger error: {0}")]
    Ledger(LedgerError),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, VaultError>;
