//! SQLite implementation of the Ledger trait.
//!
//! This is the persistent backend. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking. Every call runs in one
//! transaction: the vault state is loaded, one [`VaultState`] transition is
//! applied, and the changed rows plus any event are committed together.
//! Events are published while the connection is still held, so subscribers
//! see them in `seq` order.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use datavault_core::{Ciphertext, Principal, WrappedKey};

use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::events::{EventBus, EventKind, LedgerEvent};
use crate::migration;
use crate::state::{AccessDecision, AccessRecord, VaultState};
use crate::traits::Ledger;

/// SQLite-backed ledger.
///
/// Thread-safe via internal Mutex; the mutex also serializes transactions.
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
    bus: EventBus,
    clock: Arc<dyn Clock>,
}

impl SqliteLedger {
    /// Create (or reopen) a vault owned by `owner` at `path`.
    ///
    /// Fails with `InvalidData` if the file already holds a vault with a
    /// different owner.
    pub fn create(path: impl AsRef<Path>, owner: Principal, config: LedgerConfig) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        init_vault(&mut conn, &owner)?;
        info!(owner = %owner, "vault created");
        Ok(Self::from_conn(conn, config))
    }

    /// Open an existing vault at `path`.
    ///
    /// Never creates the file: a missing path fails with `Database`.
    pub fn open(path: impl AsRef<Path>, config: LedgerConfig) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let mut conn = Connection::open_with_flags(path, flags)?;
        migration::migrate(&mut conn)?;
        let owner = load_state(&conn)?.owner();
        debug!(owner = %owner, "vault opened");
        Ok(Self::from_conn(conn, config))
    }

    /// A vault in an in-memory SQLite database. Useful for testing.
    pub fn create_in_memory(owner: Principal) -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        init_vault(&mut conn, &owner)?;
        Ok(Self::from_conn(conn, LedgerConfig::default()))
    }

    /// Timestamp alerts with `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn from_conn(conn: Connection, config: LedgerConfig) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            bus: EventBus::new(config.event_capacity),
            clock: Arc::new(SystemClock),
        }
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| LedgerError::Task(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| LedgerError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row helpers
// ─────────────────────────────────────────────────────────────────────────────

fn principal_from_blob(bytes: Vec<u8>) -> Result<Principal> {
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| LedgerError::InvalidData(format!("principal of {} bytes", b.len())))?;
    Ok(Principal::from_bytes(bytes))
}

fn init_vault(conn: &mut Connection, owner: &Principal) -> Result<()> {
    let tx = conn.transaction()?;

    let existing: Option<Vec<u8>> = tx
        .query_row("SELECT owner FROM vault WHERE id = 1", [], |row| row.get(0))
        .optional()?;

    match existing {
        Some(bytes) => {
            let current = principal_from_blob(bytes)?;
            if current != *owner {
                return Err(LedgerError::InvalidData(format!(
                    "vault already owned by {}",
                    current
                )));
            }
        }
        None => {
            let now = datavault_core::now_millis();
            tx.execute(
                "INSERT INTO vault (id, owner, created_at) VALUES (1, ?1, ?2)",
                params![owner.as_bytes().as_slice(), now],
            )?;
            tx.execute(
                "INSERT INTO members (principal, wrapped_key, granted_at) VALUES (?1, '', ?2)",
                params![owner.as_bytes().as_slice(), now],
            )?;
        }
    }

    tx.commit()?;
    Ok(())
}

fn load_state(conn: &Connection) -> Result<VaultState> {
    let (owner, ciphertext, checksum): (Vec<u8>, String, String) = conn
        .query_row(
            "SELECT owner, ciphertext, checksum FROM vault WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?
        .ok_or_else(|| LedgerError::InvalidData("no vault in database".into()))?;

    let mut stmt = conn.prepare("SELECT principal, wrapped_key FROM members")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut members = Vec::new();
    for row in rows {
        let (principal, key) = row?;
        members.push((principal_from_blob(principal)?, WrappedKey::from_text(key)));
    }

    Ok(VaultState::from_parts(
        principal_from_blob(owner)?,
        members,
        Ciphertext::from_text(ciphertext),
        checksum,
    ))
}

fn upsert_member(conn: &Connection, principal: &Principal, key: &WrappedKey, now: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO members (principal, wrapped_key, granted_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(principal) DO UPDATE SET
            wrapped_key = excluded.wrapped_key,
            granted_at = excluded.granted_at",
        params![principal.as_bytes().as_slice(), key.as_str(), now],
    )?;
    Ok(())
}

fn append_event(conn: &Connection, kind: EventKind, now: i64) -> Result<LedgerEvent> {
    conn.execute(
        "INSERT INTO events (kind, body, recorded_at) VALUES (?1, ?2, ?3)",
        params![kind.name(), kind.to_bytes()?, now],
    )?;
    Ok(LedgerEvent {
        seq: conn.last_insert_rowid() as u64,
        kind,
    })
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn owner(&self) -> Result<Principal> {
        self.run(|conn| Ok(load_state(conn)?.owner())).await
    }

    async fn authorized_users(&self, principal: &Principal) -> Result<bool> {
        let principal = *principal;
        self.run(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM members WHERE principal = ?1",
                    params![principal.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn user_keys(&self, principal: &Principal) -> Result<WrappedKey> {
        let principal = *principal;
        self.run(move |conn| {
            let key: Option<String> = conn
                .query_row(
                    "SELECT wrapped_key FROM members WHERE principal = ?1",
                    params![principal.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(key.map(WrappedKey::from_text).unwrap_or_default())
        })
        .await
    }

    async fn upload_data(
        &self,
        caller: &Principal,
        ciphertext: Ciphertext,
        owner_key: WrappedKey,
        checksum: String,
    ) -> Result<()> {
        let caller = *caller;
        let now = self.clock.now();
        let bus = self.bus.clone();

        let seq = self
            .run(move |conn| {
                let tx = conn.transaction()?;
                let mut state = load_state(&tx)?;
                let kind = state.upload(&caller, ciphertext, owner_key, checksum)?;

                tx.execute(
                    "UPDATE vault SET ciphertext = ?1, checksum = ?2 WHERE id = 1",
                    params![state.ciphertext().as_str(), state.checksum()],
                )?;
                upsert_member(&tx, &state.owner(), &state.wrapped_key(&state.owner()), now)?;
                let event = append_event(&tx, kind, now)?;

                tx.commit()?;
                let seq = event.seq;
                bus.publish(event);
                Ok(seq)
            })
            .await?;

        info!(seq, "data uploaded");
        Ok(())
    }

    async fn grant_access(
        &self,
        caller: &Principal,
        target: &Principal,
        wrapped_key: WrappedKey,
    ) -> Result<()> {
        let (caller, target) = (*caller, *target);
        let now = self.clock.now();

        self.run(move |conn| {
            let tx = conn.transaction()?;
            let mut state = load_state(&tx)?;
            state.grant(&caller, target, wrapped_key)?;
            upsert_member(&tx, &target, &state.wrapped_key(&target), now)?;
            tx.commit()?;
            Ok(())
        })
        .await?;

        info!(target = %target, "access granted");
        Ok(())
    }

    async fn revoke_access(&self, caller: &Principal, target: &Principal) -> Result<()> {
        let (caller, target) = (*caller, *target);

        self.run(move |conn| {
            let tx = conn.transaction()?;
            let mut state = load_state(&tx)?;
            state.revoke(&caller, &target)?;
            tx.execute(
                "DELETE FROM members WHERE principal = ?1",
                params![target.as_bytes().as_slice()],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await?;

        info!(target = %target, "access revoked");
        Ok(())
    }

    async fn access_data(&self, caller: &Principal) -> Result<AccessRecord> {
        let caller = *caller;
        let now = self.clock.now();
        let bus = self.bus.clone();

        let outcome = self
            .run(move |conn| {
                let tx = conn.transaction()?;
                let state = load_state(&tx)?;
                match state.access(&caller, now) {
                    AccessDecision::Granted(record) => Ok(Ok(record)),
                    AccessDecision::Denied { alert } => {
                        // The alert commits even though the call fails.
                        let event = append_event(&tx, alert, now)?;
                        tx.commit()?;
                        let seq = event.seq;
                        bus.publish(event);
                        Ok(Err(seq))
                    }
                }
            })
            .await?;

        match outcome {
            Ok(record) => {
                debug!(caller = %caller, "access granted");
                Ok(record)
            }
            Err(seq) => {
                warn!(intruder = %caller, time = now, seq, "security alert");
                Err(LedgerError::NotAuthorized(caller))
            }
        }
    }

    async fn events(&self) -> Result<Vec<LedgerEvent>> {
        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT seq, body FROM events ORDER BY seq")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?;

            let mut events = Vec::new();
            for row in rows {
                let (seq, body) = row?;
                events.push(LedgerEvent {
                    seq: seq as u64,
                    kind: EventKind::from_bytes(&body)?,
                });
            }
            Ok(events)
        })
        .await
    }

    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.bus.subscribe()
    }
}
