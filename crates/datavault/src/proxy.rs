//! Smart-wallet proxy.
//!
//! A [`SmartWallet`] is a principal of its own, derived from its owner. Its
//! owner submits encoded ledger calls through it; the ledger sees the
//! wallet's address as the caller. The wallet is just another identity to
//! the ledger and must be granted like any other.

use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

use datavault_core::{now_millis, Principal};
use datavault_ledger::{CallOutput, Ledger, LedgerCall};

use crate::error::ProxyError;

const WALLET_LABEL: &str = "smart-wallet";

/// A successful execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Interop name of the forwarded call.
    pub call: &'static str,
    /// The encoded call as submitted.
    pub payload: Vec<u8>,
    /// Unix ms.
    pub at: i64,
}

#[derive(Debug)]
pub struct SmartWallet {
    owner: Principal,
    address: Principal,
    executions: Mutex<Vec<Execution>>,
}

impl SmartWallet {
    pub fn new(owner: Principal) -> Self {
        Self {
            owner,
            address: Principal::derive(&owner, WALLET_LABEL),
            executions: Mutex::new(Vec::new()),
        }
    }

    pub fn owner(&self) -> Principal {
        self.owner
    }

    /// The identity the ledger sees for calls made through this wallet.
    pub fn address(&self) -> Principal {
        self.address
    }

    /// Forward an encoded call to `ledger` as this wallet.
    ///
    /// # Errors
    /// - `NotOwner` if `caller` does not own the wallet.
    /// - `ExecutionFailed` if the payload does not decode or the call reverts.
    /// - `Ledger` if the ledger itself failed.
    pub async fn execute<L: Ledger + ?Sized>(
        &self,
        caller: &Principal,
        ledger: &L,
        payload: &[u8],
    ) -> Result<CallOutput, ProxyError> {
        if *caller != self.owner {
            warn!(caller = %caller, wallet = %self.address, "execute by non-owner");
            return Err(ProxyError::NotOwner { caller: *caller });
        }

        let call = LedgerCall::from_bytes(payload).map_err(|e| ProxyError::ExecutionFailed {
            reason: e.to_string(),
        })?;
        let name = call.name();

        match ledger.submit(&self.address, call).await {
            Ok(output) => {
                self.executions
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(Execution {
                        call: name,
                        payload: payload.to_vec(),
                        at: now_millis(),
                    });
                info!(wallet = %self.address, call = name, "executed");
                Ok(output)
            }
            Err(e) if e.is_revert() => {
                warn!(wallet = %self.address, call = name, error = %e, "execution reverted");
                Err(ProxyError::ExecutionFailed {
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(ProxyError::Ledger(e)),
        }
    }

    /// Successful executions, oldest first.
    pub fn executions(&self) -> Vec<Execution> {
        self.executions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datavault_ledger::{LedgerError, LedgerExt, MemoryLedger};

    fn p(b: u8) -> Principal {
        Principal::from_bytes([b; 32])
    }

    #[tokio::test]
    async fn test_non_owner_cannot_execute() {
        let ledger = MemoryLedger::new(p(1));
        let wallet = SmartWallet::new(p(2));
        let payload = LedgerCall::Owner.to_bytes().unwrap();

        let err = wallet.execute(&p(3), &ledger, &payload).await.unwrap_err();
        assert!(matches!(err, ProxyError::NotOwner { caller } if caller == p(3)));
        assert!(wallet.executions().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_wallet_read_fails_and_alerts() {
        let ledger = MemoryLedger::new(p(1));
        let wallet = SmartWallet::new(p(2));
        let payload = LedgerCall::AccessData.to_bytes().unwrap();

        let err = wallet.execute(&p(2), &ledger, &payload).await.unwrap_err();
        assert!(matches!(err, ProxyError::ExecutionFailed { .. }));
        assert_eq!(ledger.security_alert_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_query_through_wallet() {
        let ledger = MemoryLedger::new(p(1));
        let wallet = SmartWallet::new(p(2));
        let payload = LedgerCall::AuthorizedUsers {
            principal: wallet.address(),
        }
        .to_bytes()
        .unwrap();

        let out = wallet.execute(&p(2), &ledger, &payload).await.unwrap();
        assert_eq!(out, CallOutput::Bool(false));
        assert_eq!(wallet.executions().len(), 1);
        assert_eq!(wallet.executions()[0].call, "authorizedUsers");
    }

    #[tokio::test]
    async fn test_garbage_payload_fails_execution() {
        let ledger = MemoryLedger::new(p(1));
        let wallet = SmartWallet::new(p(2));
        let err = wallet.execute(&p(2), &ledger, b"\xff\xff").await.unwrap_err();
        assert!(matches!(err, ProxyError::ExecutionFailed { .. }));
    }

    #[test]
    fn test_reverts_are_classified() {
        assert!(LedgerError::NotAuthorized(p(1)).is_revert());
        assert!(!LedgerError::Task("x".into()).is_revert());
    }
}
