//! In-memory implementation of the Ledger trait.
//!
//! Same semantics as the SQLite backend but keeps everything in memory with
//! no persistence. Thread-safe via RwLock; one write lock per mutation
//! gives the total order. Reads of the vault contents take the write lock
//! too, so a denial and its alert are one step, and events reach
//! subscribers in `seq` order.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use datavault_core::{Ciphertext, Principal, WrappedKey};

use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::events::{EventBus, EventKind, LedgerEvent};
use crate::state::{AccessDecision, AccessRecord, VaultState};
use crate::traits::Ledger;

/// In-memory ledger.
///
/// All data is lost when the ledger is dropped.
pub struct MemoryLedger {
    inner: RwLock<MemoryLedgerInner>,
    bus: EventBus,
    clock: Arc<dyn Clock>,
}

struct MemoryLedgerInner {
    state: VaultState,
    events: Vec<LedgerEvent>,
}

impl MemoryLedgerInner {
    fn append(&mut self, kind: EventKind) -> LedgerEvent {
        let event = LedgerEvent {
            seq: self.events.len() as u64 + 1,
            kind,
        };
        self.events.push(event.clone());
        event
    }
}

impl MemoryLedger {
    /// Create a vault owned by `owner` with the default configuration.
    pub fn new(owner: Principal) -> Self {
        Self::with_config(owner, LedgerConfig::default())
    }

    pub fn with_config(owner: Principal, config: LedgerConfig) -> Self {
        Self::with_clock(owner, config, Arc::new(SystemClock))
    }

    /// Create a vault that timestamps alerts with `clock`.
    pub fn with_clock(owner: Principal, config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        info!(owner = %owner, "vault created");
        Self {
            inner: RwLock::new(MemoryLedgerInner {
                state: VaultState::new(owner),
                events: Vec::new(),
            }),
            bus: EventBus::new(config.event_capacity),
            clock,
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryLedgerInner>> {
        self.inner
            .read()
            .map_err(|e| LedgerError::Task(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryLedgerInner>> {
        self.inner
            .write()
            .map_err(|e| LedgerError::Task(format!("lock poisoned: {}", e)))
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn owner(&self) -> Result<Principal> {
        Ok(self.read()?.state.owner())
    }

    async fn authorized_users(&self, principal: &Principal) -> Result<bool> {
        Ok(self.read()?.state.is_authorized(principal))
    }

    async fn user_keys(&self, principal: &Principal) -> Result<WrappedKey> {
        Ok(self.read()?.state.wrapped_key(principal))
    }

    async fn upload_data(
        &self,
        caller: &Principal,
        ciphertext: Ciphertext,
        owner_key: WrappedKey,
        checksum: String,
    ) -> Result<()> {
        let seq = {
            let mut inner = self.write()?;
            let kind = inner.state.upload(caller, ciphertext, owner_key, checksum)?;
            let event = inner.append(kind);
            let seq = event.seq;
            self.bus.publish(event);
            seq
        };

        info!(seq, "data uploaded");
        Ok(())
    }

    async fn grant_access(
        &self,
        caller: &Principal,
        target: &Principal,
        wrapped_key: WrappedKey,
    ) -> Result<()> {
        self.write()?.state.grant(caller, *target, wrapped_key)?;
        info!(target = %target, "access granted");
        Ok(())
    }

    async fn revoke_access(&self, caller: &Principal, target: &Principal) -> Result<()> {
        self.write()?.state.revoke(caller, target)?;
        info!(target = %target, "access revoked");
        Ok(())
    }

    async fn access_data(&self, caller: &Principal) -> Result<AccessRecord> {
        let now = self.clock.now();
        let outcome = {
            let mut inner = self.write()?;
            match inner.state.access(caller, now) {
                AccessDecision::Granted(record) => Ok(record),
                AccessDecision::Denied { alert } => {
                    let event = inner.append(alert);
                    self.bus.publish(event.clone());
                    Err(event)
                }
            }
        };

        match outcome {
            Ok(record) => {
                debug!(caller = %caller, "access granted");
                Ok(record)
            }
            Err(event) => {
                warn!(intruder = %caller, time = now, seq = event.seq, "security alert");
                Err(LedgerError::NotAuthorized(*caller))
            }
        }
    }

    async fn events(&self) -> Result<Vec<LedgerEvent>> {
        Ok(self.read()?.events.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.bus.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::{CallOutput, LedgerCall};
    use crate::clock::FixedClock;
    use crate::traits::LedgerExt;

    fn p(b: u8) -> Principal {
        Principal::from_bytes([b; 32])
    }

    fn key(s: &str) -> WrappedKey {
        WrappedKey::from_text(s)
    }

    #[tokio::test]
    async fn test_owner_authorized_by_default() {
        let ledger = MemoryLedger::new(p(1));
        assert_eq!(ledger.owner().await.unwrap(), p(1));
        assert!(ledger.authorized_users(&p(1)).await.unwrap());
        assert!(!ledger.authorized_users(&p(2)).await.unwrap());
    }

    #[tokio::test]
    async fn test_grant_and_revoke() {
        let ledger = MemoryLedger::new(p(1));
        ledger.grant_access(&p(1), &p(2), key("w")).await.unwrap();
        assert!(ledger.authorized_users(&p(2)).await.unwrap());
        assert_eq!(ledger.user_keys(&p(2)).await.unwrap(), key("w"));

        ledger.revoke_access(&p(1), &p(2)).await.unwrap();
        assert!(!ledger.authorized_users(&p(2)).await.unwrap());
        assert_eq!(ledger.user_keys(&p(2)).await.unwrap().as_str(), "");
    }

    #[tokio::test]
    async fn test_non_owner_cannot_grant() {
        let ledger = MemoryLedger::new(p(1));
        let err = ledger.grant_access(&p(2), &p(3), key("w")).await.unwrap_err();
        assert!(matches!(err, LedgerError::OwnerOnly { .. }));
        assert!(err.is_revert());
        assert!(!ledger.authorized_users(&p(3)).await.unwrap());
    }

    #[tokio::test]
    async fn test_every_denied_read_raises_one_alert() {
        let clock = Arc::new(FixedClock::new(42));
        let ledger = MemoryLedger::with_clock(p(1), LedgerConfig::default(), clock.clone());
        let mut rx = ledger.subscribe();

        for attempt in 1..=3 {
            let err = ledger.access_data(&p(9)).await.unwrap_err();
            assert!(matches!(err, LedgerError::NotAuthorized(who) if who == p(9)));
            assert_eq!(ledger.security_alert_count().await.unwrap(), attempt);

            let event = rx.recv().await.unwrap();
            assert_eq!(
                event.kind,
                EventKind::SecurityAlert {
                    intruder: p(9),
                    time: 41 + attempt as i64
                }
            );
            clock.advance(1);
        }
    }

    #[tokio::test]
    async fn test_upload_emits_data_uploaded() {
        let ledger = MemoryLedger::new(p(1));
        let ct = Ciphertext::from_text("x1:IyA1Jyo=");
        ledger
            .upload_data(&p(1), ct.clone(), key("owner"), "sum".into())
            .await
            .unwrap();

        let events = ledger.events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].seq, 1);
        assert_eq!(events[0].kind, EventKind::data_uploaded(&ct));

        let record = ledger.access_data(&p(1)).await.unwrap();
        assert_eq!(record.ciphertext, ct);
        assert_eq!(record.wrapped_key, key("owner"));
    }

    #[tokio::test]
    async fn test_access_before_upload_is_empty() {
        let ledger = MemoryLedger::new(p(1));
        let record = ledger.access_data(&p(1)).await.unwrap();
        assert!(record.is_empty());
    }

    #[tokio::test]
    async fn test_submit_dispatches() {
        let ledger = MemoryLedger::new(p(1));
        let out = ledger.submit(&p(5), LedgerCall::Owner).await.unwrap();
        assert_eq!(out, CallOutput::Owner(p(1)));

        let err = ledger
            .submit(&p(5), LedgerCall::RevokeAccess { principal: p(1) })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::OwnerOnly { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_alerts_publish_in_seq_order() {
        let ledger = Arc::new(MemoryLedger::new(p(1)));
        let mut rx = ledger.subscribe();

        let tasks: Vec<_> = (0..32u8)
            .map(|i| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.access_data(&p(100 + i)).await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().is_err());
        }

        for expected in 1..=32u64 {
            assert_eq!(rx.recv().await.unwrap().seq, expected);
        }
        assert_eq!(ledger.security_alert_count().await.unwrap(), 32);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_loses_events_not_the_log() {
        let config = LedgerConfig::default().with_event_capacity(2);
        let ledger = MemoryLedger::with_config(p(1), config);
        let mut rx = ledger.subscribe();

        for i in 0..5 {
            let _ = ledger.access_data(&p(10 + i)).await;
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
        assert_eq!(rx.recv().await.unwrap().seq, 4);
        assert_eq!(ledger.events().await.unwrap().len(), 5);
    }
}
