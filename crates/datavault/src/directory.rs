//! Directory of published encryption keys.
//!
//! Grantees publish the public half of their encryption identity here so an
//! owner can wrap the vault key for them without any interaction.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use datavault_core::{EncryptionPublicKey, Principal};

#[derive(Debug, Default)]
pub struct KeyDirectory {
    keys: RwLock<HashMap<Principal, EncryptionPublicKey>>,
}

impl KeyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish (or replace) the encryption key for `principal`.
    pub fn publish(&self, principal: Principal, key: EncryptionPublicKey) {
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(principal, key);
    }

    pub fn lookup(&self, principal: &Principal) -> Option<EncryptionPublicKey> {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(principal)
            .copied()
    }

    /// Every published `(principal, key)` pair.
    pub fn entries(&self) -> Vec<(Principal, EncryptionPublicKey)> {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(principal, key)| (*principal, *key))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.keys.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
