//! Ledger trait: the abstract interface for the vault's access ledger.
//!
//! Every backend exposes the same seven operations plus the event log.
//! Implementations include SQLite (persistent) and in-memory (for tests).

use async_trait::async_trait;
use tokio::sync::broadcast;

use datavault_core::{Ciphertext, Principal, WrappedKey};

use crate::calls::{CallOutput, LedgerCall};
use crate::error::Result;
use crate::events::LedgerEvent;
use crate::state::AccessRecord;

/// The Ledger trait: async interface to the vault's access ledger.
///
/// # Design Notes
///
/// - **Serialized mutations**: `upload_data`, `grant_access` and
///   `revoke_access` are all-or-nothing and totally ordered.
/// - **Caller identity**: every call names its caller. The ledger trusts it;
///   authenticating the caller is the transport's job.
/// - **Alerts on denial**: a denied `access_data` commits a `SecurityAlert`
///   before returning `NotAuthorized`, on every attempt.
#[async_trait]
pub trait Ledger: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// The vault owner.
    async fn owner(&self) -> Result<Principal>;

    /// Whether `principal` is currently authorized.
    async fn authorized_users(&self, principal: &Principal) -> Result<bool>;

    /// The principal's wrapped key, empty if it has none.
    async fn user_keys(&self, principal: &Principal) -> Result<WrappedKey>;

    // ─────────────────────────────────────────────────────────────────────────
    // Owner-only Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the stored ciphertext and checksum, refreshing the owner's
    /// wrapped key. Emits `DataUploaded`.
    async fn upload_data(
        &self,
        caller: &Principal,
        ciphertext: Ciphertext,
        owner_key: WrappedKey,
        checksum: String,
    ) -> Result<()>;

    /// Authorize `target` with its own wrapped key.
    async fn grant_access(
        &self,
        caller: &Principal,
        target: &Principal,
        wrapped_key: WrappedKey,
    ) -> Result<()>;

    /// Deauthorize `target` and clear its wrapped key.
    async fn revoke_access(&self, caller: &Principal, target: &Principal) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Gated Read
    // ─────────────────────────────────────────────────────────────────────────

    /// Read the vault as `caller`.
    ///
    /// # Errors
    /// - `NotAuthorized` if `caller` is not authorized; a `SecurityAlert`
    ///   has been committed by the time this returns.
    async fn access_data(&self, caller: &Principal) -> Result<AccessRecord>;

    // ─────────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────────

    /// All committed events, oldest first.
    async fn events(&self) -> Result<Vec<LedgerEvent>>;

    /// Receive events committed from now on.
    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent>;

    /// Execute an encoded call as `caller`.
    async fn submit(&self, caller: &Principal, call: LedgerCall) -> Result<CallOutput> {
        tracing::debug!(caller = %caller, call = call.name(), "submit");
        match call {
            LedgerCall::Owner => self.owner().await.map(CallOutput::Owner),
            LedgerCall::AuthorizedUsers { principal } => {
                self.authorized_users(&principal).await.map(CallOutput::Bool)
            }
            LedgerCall::UserKeys { principal } => {
                self.user_keys(&principal).await.map(CallOutput::WrappedKey)
            }
            LedgerCall::UploadData {
                ciphertext,
                owner_key,
                checksum,
            } => {
                self.upload_data(caller, ciphertext, owner_key, checksum)
                    .await?;
                Ok(CallOutput::Unit)
            }
            LedgerCall::GrantAccess {
                principal,
                wrapped_key,
            } => {
                self.grant_access(caller, &principal, wrapped_key).await?;
                Ok(CallOutput::Unit)
            }
            LedgerCall::RevokeAccess { principal } => {
                self.revoke_access(caller, &principal).await?;
                Ok(CallOutput::Unit)
            }
            LedgerCall::AccessData => self.access_data(caller).await.map(CallOutput::Access),
        }
    }
}

/// Extension helpers over [`Ledger`].
#[async_trait]
pub trait LedgerExt: Ledger {
    /// Number of `SecurityAlert` events in the log.
    async fn security_alert_count(&self) -> Result<usize> {
        Ok(self
            .events()
            .await?
            .iter()
            .filter(|e| e.kind.is_security_alert())
            .count())
    }
}

impl<T: Ledger + ?Sized> LedgerExt for T {}
