//! Security alert monitor.
//!
//! Subscribes to a ledger's live events and logs every `SecurityAlert` at
//! warn level, keeping a tally and the list of intruders seen.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast::error::RecvError, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use datavault_core::Principal;
use datavault_ledger::{EventKind, Ledger};

/// One observed alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservedAlert {
    pub intruder: Principal,
    pub time: i64,
}

#[derive(Default)]
struct Shared {
    count: AtomicUsize,
    alerts: Mutex<Vec<ObservedAlert>>,
    notify: Notify,
}

/// Handle to a running monitor task.
///
/// The task ends when the ledger drops its event channel or when the
/// handle is stopped or dropped.
pub struct AlertMonitor {
    shared: Arc<Shared>,
    handle: JoinHandle<()>,
}

impl AlertMonitor {
    /// Start watching `ledger`. Must be called inside a tokio runtime.
    pub fn spawn<L: Ledger + ?Sized>(ledger: &L) -> Self {
        let mut rx = ledger.subscribe();
        let shared = Arc::new(Shared::default());
        let task_shared = shared.clone();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let EventKind::SecurityAlert { intruder, time } = event.kind {
                            warn!(intruder = %intruder, time, seq = event.seq, "SECURITY ALERT: unauthorized access attempt");
                            task_shared
                                .alerts
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .push(ObservedAlert { intruder, time });
                            task_shared.count.fetch_add(1, Ordering::SeqCst);
                            task_shared.notify.notify_waiters();
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "alert monitor lagged; see the ledger event log");
                    }
                    Err(RecvError::Closed) => {
                        debug!("ledger event channel closed");
                        break;
                    }
                }
            }
        });

        Self { shared, handle }
    }

    /// Alerts observed so far.
    pub fn alert_count(&self) -> usize {
        self.shared.count.load(Ordering::SeqCst)
    }

    pub fn alerts(&self) -> Vec<ObservedAlert> {
        self.shared
            .alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait until at least `n` alerts have been observed.
    pub async fn wait_for(&self, n: usize) {
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.alert_count() >= n {
                return;
            }
            notified.await;
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the monitor task.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for AlertMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
