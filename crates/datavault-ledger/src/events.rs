//! Ledger events.
//!
//! The ledger is the sole writer of events. The log is append-only and every
//! event carries a sequence number assigned at commit time.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use datavault_core::{Blake3Hash, Ciphertext, Principal};

use crate::error::{LedgerError, Result};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// New ciphertext was anchored. `handle` is the hex Blake3 hash of the
    /// ciphertext text.
    DataUploaded { handle: String },

    /// A non-member attempted to read the vault.
    SecurityAlert { intruder: Principal, time: i64 },
}

impl EventKind {
    /// Build a `DataUploaded` event for a ciphertext.
    pub fn data_uploaded(ciphertext: &Ciphertext) -> Self {
        EventKind::DataUploaded {
            handle: ciphertext_handle(ciphertext),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::DataUploaded { .. } => "DataUploaded",
            EventKind::SecurityAlert { .. } => "SecurityAlert",
        }
    }

    pub fn is_security_alert(&self) -> bool {
        matches!(self, EventKind::SecurityAlert { .. })
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| LedgerError::Serialization(e.to_string()))
    }
}

/// A committed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Position in the event log, starting at 1.
    pub seq: u64,
    pub kind: EventKind,
}

/// The handle published for a ciphertext in `DataUploaded`.
pub fn ciphertext_handle(ciphertext: &Ciphertext) -> String {
    Blake3Hash::hash(ciphertext.as_str().as_bytes()).to_hex()
}

/// Fan-out of committed events to live subscribers.
#[derive(Debug, Clone)]
pub(crate) struct EventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn publish(&self, event: LedgerEvent) {
        // No subscribers is fine; the log is the source of truth.
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_cbor_roundtrip() {
        let kind = EventKind::SecurityAlert {
            intruder: Principal::from_bytes([0x09; 32]),
            time: 1_700_000_000_000,
        };
        let recovered = EventKind::from_bytes(&kind.to_bytes().unwrap()).unwrap();
        assert_eq!(kind, recovered);
    }

    #[test]
    fn test_handle_is_stable() {
        let ct = Ciphertext::from_text("x1:IyA1Jyo=");
        assert_eq!(ciphertext_handle(&ct), ciphertext_handle(&ct.clone()));
        assert_eq!(ciphertext_handle(&ct).len(), 64);
    }

    #[tokio::test]
    async fn test_bus_delivers_to_subscribers() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        let event = LedgerEvent {
            seq: 1,
            kind: EventKind::DataUploaded {
                handle: "h".into(),
            },
        };
        bus.publish(event.clone());
        assert_eq!(rx.recv().await.unwrap(), event);
    }
}
