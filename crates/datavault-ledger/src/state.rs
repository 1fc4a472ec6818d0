//! Vault state machine.
//!
//! [`VaultState`] is the pure transition function behind every ledger
//! backend. Backends load it, apply one transition, and commit the result
//! together with the events it produced.
//!
//! Invariants:
//! - `owner ∈ authorized`, from creation onward.
//! - A non-owner principal has a wrapped key iff it is authorized.
//! - `ciphertext` and `checksum` are only ever replaced together.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use datavault_core::{Ciphertext, Principal, WrappedKey};

use crate::error::{LedgerError, Result};
use crate::events::EventKind;

/// What an authorized reader receives from `accessData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub ciphertext: Ciphertext,
    /// The caller's own wrapped key.
    pub wrapped_key: WrappedKey,
    /// Hex checksum of the plaintext behind `ciphertext`.
    pub checksum: String,
}

impl AccessRecord {
    /// True when nothing has been uploaded yet.
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }
}

/// Result of evaluating a read against the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Granted(AccessRecord),
    /// The read is denied; the backend must commit the alert before failing.
    Denied { alert: EventKind },
}

/// Authoritative vault state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultState {
    owner: Principal,
    authorized: BTreeSet<Principal>,
    wrapped_keys: BTreeMap<Principal, WrappedKey>,
    ciphertext: Ciphertext,
    checksum: String,
}

impl VaultState {
    /// A fresh vault: only the owner is authorized, nothing uploaded.
    pub fn new(owner: Principal) -> Self {
        let mut authorized = BTreeSet::new();
        authorized.insert(owner);
        Self {
            owner,
            authorized,
            wrapped_keys: BTreeMap::new(),
            ciphertext: Ciphertext::default(),
            checksum: String::new(),
        }
    }

    /// Rebuild state from persisted parts.
    ///
    /// `members` lists every authorized principal with its wrapped key; the
    /// owner's key may be empty before the first upload. The owner is
    /// re-inserted if missing.
    pub fn from_parts(
        owner: Principal,
        members: impl IntoIterator<Item = (Principal, WrappedKey)>,
        ciphertext: Ciphertext,
        checksum: String,
    ) -> Self {
        let mut state = Self::new(owner);
        for (principal, key) in members {
            state.authorized.insert(principal);
            if !key.is_empty() {
                state.wrapped_keys.insert(principal, key);
            }
        }
        state.ciphertext = ciphertext;
        state.checksum = checksum;
        state
    }

    pub fn owner(&self) -> Principal {
        self.owner
    }

    pub fn is_authorized(&self, principal: &Principal) -> bool {
        self.authorized.contains(principal)
    }

    /// The principal's wrapped key, empty if it has none.
    pub fn wrapped_key(&self, principal: &Principal) -> WrappedKey {
        self.wrapped_keys
            .get(principal)
            .cloned()
            .unwrap_or_default()
    }

    /// All authorized principals, owner included.
    pub fn members(&self) -> impl Iterator<Item = &Principal> {
        self.authorized.iter()
    }

    pub fn ciphertext(&self) -> &Ciphertext {
        &self.ciphertext
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Owner-only: replace the ciphertext/checksum pair and refresh the
    /// owner's wrapped key.
    pub fn upload(
        &mut self,
        caller: &Principal,
        ciphertext: Ciphertext,
        owner_key: WrappedKey,
        checksum: String,
    ) -> Result<EventKind> {
        self.ensure_owner(caller)?;
        if owner_key.is_empty() {
            return Err(LedgerError::InvalidCall("owner wrapped key is empty".into()));
        }

        let event = EventKind::data_uploaded(&ciphertext);
        self.ciphertext = ciphertext;
        self.checksum = checksum;
        self.wrapped_keys.insert(self.owner, owner_key);
        Ok(event)
    }

    /// Owner-only: authorize `target` with its wrapped key.
    ///
    /// Granting an already authorized principal overwrites its key.
    pub fn grant(
        &mut self,
        caller: &Principal,
        target: Principal,
        wrapped_key: WrappedKey,
    ) -> Result<()> {
        self.ensure_owner(caller)?;
        if wrapped_key.is_empty() {
            return Err(LedgerError::InvalidCall("wrapped key is empty".into()));
        }

        self.authorized.insert(target);
        self.wrapped_keys.insert(target, wrapped_key);
        Ok(())
    }

    /// Owner-only: remove `target` and clear its wrapped key.
    ///
    /// Revoking a principal that is not authorized is a no-op.
    pub fn revoke(&mut self, caller: &Principal, target: &Principal) -> Result<()> {
        self.ensure_owner(caller)?;
        if *target == self.owner {
            return Err(LedgerError::CannotRevokeOwner);
        }

        self.authorized.remove(target);
        self.wrapped_keys.remove(target);
        Ok(())
    }

    /// Decide a read by `caller` at time `now`.
    pub fn access(&self, caller: &Principal, now: i64) -> AccessDecision {
        if !self.is_authorized(caller) {
            return AccessDecision::Denied {
                alert: EventKind::SecurityAlert {
                    intruder: *caller,
                    time: now,
                },
            };
        }

        AccessDecision::Granted(AccessRecord {
            ciphertext: self.ciphertext.clone(),
            wrapped_key: self.wrapped_key(caller),
            checksum: self.checksum.clone(),
        })
    }

    fn ensure_owner(&self, caller: &Principal) -> Result<()> {
        if *caller == self.owner {
            Ok(())
        } else {
            Err(LedgerError::OwnerOnly { caller: *caller })
        }
    }
}
