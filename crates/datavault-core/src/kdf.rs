//! Key derivation from authentication signatures.
//!
//! A principal proves control of its identity by signing one fixed message.
//! The signature is hashed into a [`MasterKey`]; nothing secret ever leaves
//! the principal. The master key is the principal's KEK for its own wrapped
//! key and the seed of its X25519 encryption identity.

use std::fmt;

use crate::crypto::{EncryptionPublicKey, EncryptionSecret, Signature};

/// Message every principal signs to derive its master key.
pub const DEFAULT_AUTH_MESSAGE: &str = "DATAVAULT_AUTH_V1";

const MASTER_KEY_CONTEXT: &str = "datavault-v1-master-key";
const ENCRYPTION_IDENTITY_CONTEXT: &str = "datavault-v1-encryption-identity";

/// A 256-bit master key derived from an authentication signature.
#[derive(Clone, PartialEq, Eq)]
pub struct MasterKey([u8; 32]);

impl MasterKey {
    /// Derive the master key for a signature.
    ///
    /// Deterministic: the same signature always yields the same key.
    pub fn derive(signature: &Signature) -> Self {
        Self(blake3::derive_key(MASTER_KEY_CONTEXT, signature.as_bytes()))
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The X25519 secret this principal uses to receive wrapped keys.
    pub fn encryption_secret(&self) -> EncryptionSecret {
        let mut hasher = blake3::Hasher::new_derive_key(ENCRYPTION_IDENTITY_CONTEXT);
        hasher.update(&self.0);
        EncryptionSecret::from_bytes(*hasher.finalize().as_bytes())
    }

    /// The public half of [`MasterKey::encryption_secret`], safe to publish.
    pub fn encryption_public_key(&self) -> EncryptionPublicKey {
        self.encryption_secret().public_key()
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(..)")
    }
}
