//! Key wrapping.
//!
//! Each authorized principal holds its own [`WrappedKey`]: the upload's
//! symmetric key sealed under that principal's key-encryption key (KEK)
//! with the content cipher. Every entry opens to the *same* symmetric key.
//!
//! There are two ways to obtain a KEK:
//!
//! - **Direct**: the principal's own [`MasterKey`] bytes. Used by the owner
//!   for its own entry.
//! - **Key agreement**: the granter runs X25519 between a fresh ephemeral key
//!   and the grantee's published [`EncryptionPublicKey`]. The ephemeral
//!   public key travels inside the envelope so the grantee can recompute the
//!   KEK from its own master key.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cipher::{self, CipherSuite, Ciphertext, SymmetricKey};
use crate::crypto::{EncryptionPublicKey, EphemeralKeyPair};
use crate::error::{CoreError, Result};
use crate::kdf::MasterKey;

/// Wire form of a wrapped key before text encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct WrapEnvelope {
    /// Suite `sealed` was produced with; must agree with its prefix.
    suite: CipherSuite,

    /// Sender's ephemeral X25519 key, present for key-agreement wraps.
    ephemeral_public: Option<EncryptionPublicKey>,

    /// The symmetric key sealed with the content cipher.
    sealed: Ciphertext,
}

/// A symmetric key sealed for one principal, in its textual ledger form.
///
/// The empty string means "no key": it is what the ledger reports for a
/// principal that was never granted or has been revoked.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WrappedKey(String);

impl WrappedKey {
    /// The "no key" value.
    pub const fn empty() -> Self {
        Self(String::new())
    }

    /// Wrap text read from the ledger.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn encode(envelope: &WrapEnvelope) -> Result<Self> {
        let mut buf = Vec::new();
        ciborium::into_writer(envelope, &mut buf)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        Ok(Self(STANDARD.encode(buf)))
    }

    fn decode(&self) -> Result<WrapEnvelope> {
        if self.is_empty() {
            return Err(CoreError::Encoding("wrapped key is empty".into()));
        }
        let bytes = STANDARD
            .decode(&self.0)
            .map_err(|e| CoreError::Encoding(e.to_string()))?;
        let envelope: WrapEnvelope = ciborium::from_reader(bytes.as_slice())
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        if envelope.sealed.suite() != envelope.suite {
            return Err(CoreError::Encoding(format!(
                "envelope suite {:?} does not match sealed key",
                envelope.suite
            )));
        }
        Ok(envelope)
    }

    /// The suite the key was sealed with, if the envelope decodes.
    pub fn suite(&self) -> Option<CipherSuite> {
        self.decode().ok().map(|env| env.suite)
    }

    /// Whether this key was wrapped via key agreement.
    pub fn is_key_agreement(&self) -> bool {
        self.decode()
            .map(|env| env.ephemeral_public.is_some())
            .unwrap_or(false)
    }
}

impl fmt::Debug for WrappedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WrappedKey({} chars)", self.0.len())
    }
}

/// Seal `sym_key` directly under `kek`.
pub fn wrap(sym_key: &SymmetricKey, kek: &[u8], suite: CipherSuite) -> Result<WrappedKey> {
    let sealed = cipher::encrypt(suite, sym_key.as_bytes(), kek)?;
    WrappedKey::encode(&WrapEnvelope {
        suite,
        ephemeral_public: None,
        sealed,
    })
}

/// Open a directly wrapped key under `kek`.
///
/// With the repeating-XOR suite a wrong KEK yields a wrong (but well-formed)
/// key; the mismatch only shows up in the content checksum.
pub fn unwrap(wrapped: &WrappedKey, kek: &[u8]) -> Result<SymmetricKey> {
    let envelope = wrapped.decode()?;
    open(&envelope.sealed, kek)
}

/// Seal `sym_key` for a recipient identified by its published encryption key.
pub fn wrap_for_recipient(
    sym_key: &SymmetricKey,
    recipient: &EncryptionPublicKey,
    suite: CipherSuite,
) -> Result<WrappedKey> {
    let ephemeral = EphemeralKeyPair::generate();
    let ephemeral_public = ephemeral.public_key();
    let shared = ephemeral.diffie_hellman(recipient);
    let kek = shared.derive_kek(&agreement_context(&ephemeral_public, recipient));

    let sealed = cipher::encrypt(suite, sym_key.as_bytes(), &kek)?;
    WrappedKey::encode(&WrapEnvelope {
        suite,
        ephemeral_public: Some(ephemeral_public),
        sealed,
    })
}

/// Open any wrapped key addressed to the holder of `master`.
///
/// Dispatches on the envelope: key-agreement wraps use the master key's
/// X25519 identity, direct wraps use the master key itself as KEK.
pub fn unwrap_with_master(wrapped: &WrappedKey, master: &MasterKey) -> Result<SymmetricKey> {
    let envelope = wrapped.decode()?;
    match envelope.ephemeral_public {
        Some(ephemeral_public) => {
            let secret = master.encryption_secret();
            let recipient = secret.public_key();
            let shared = secret.diffie_hellman(&ephemeral_public);
            let kek = shared.derive_kek(&agreement_context(&ephemeral_public, &recipient));
            open(&envelope.sealed, &kek)
        }
        None => open(&envelope.sealed, master.as_bytes()),
    }
}

fn open(sealed: &Ciphertext, kek: &[u8]) -> Result<SymmetricKey> {
    let key_bytes = cipher::decrypt(sealed, kek)?;
    SymmetricKey::from_slice(&key_bytes)
}

fn agreement_context(ephemeral: &EncryptionPublicKey, recipient: &EncryptionPublicKey) -> Vec<u8> {
    let mut context = Vec::with_capacity(64);
    context.extend_from_slice(ephemeral.as_bytes());
    context.extend_from_slice(recipient.as_bytes());
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_wrap_roundtrip() {
        let sym = SymmetricKey::generate();
        let master = MasterKey::from_bytes([0x10; 32]);

        for suite in [CipherSuite::RepeatingXor, CipherSuite::ChaCha20Poly1305] {
            let wrapped = wrap(&sym, master.as_bytes(), suite).unwrap();
            assert!(!wrapped.is_key_agreement());
            assert_eq!(unwrap(&wrapped, master.as_bytes()).unwrap(), sym);
            assert_eq!(unwrap_with_master(&wrapped, &master).unwrap(), sym);
        }
    }

    #[test]
    fn test_recipient_wrap_roundtrip() {
        let sym = SymmetricKey::generate();
        let grantee = MasterKey::from_bytes([0x20; 32]);

        let wrapped = wrap_for_recipient(
            &sym,
            &grantee.encryption_public_key(),
            CipherSuite::ChaCha20Poly1305,
        )
        .unwrap();

        assert!(wrapped.is_key_agreement());
        assert_eq!(unwrap_with_master(&wrapped, &grantee).unwrap(), sym);
    }

    #[test]
    fn test_recipient_wrap_wrong_master_fails() {
        let sym = SymmetricKey::generate();
        let grantee = MasterKey::from_bytes([0x20; 32]);
        let other = MasterKey::from_bytes([0x21; 32]);

        let wrapped = wrap_for_recipient(
            &sym,
            &grantee.encryption_public_key(),
            CipherSuite::ChaCha20Poly1305,
        )
        .unwrap();

        assert!(unwrap_with_master(&wrapped, &other).is_err());
    }

    #[test]
    fn test_xor_wrap_wrong_kek_yields_different_key() {
        let sym = SymmetricKey::generate();
        let wrapped = wrap(&sym, &[0x01; 32], CipherSuite::RepeatingXor).unwrap();
        let wrong = unwrap(&wrapped, &[0x02; 32]).unwrap();
        assert_ne!(wrong, sym);
    }

    #[test]
    fn test_envelope_records_its_suite() {
        let sym = SymmetricKey::generate();
        for suite in [CipherSuite::RepeatingXor, CipherSuite::ChaCha20Poly1305] {
            let wrapped = wrap(&sym, &[0x01; 32], suite).unwrap();
            assert_eq!(wrapped.suite(), Some(suite));
        }
        assert_eq!(WrappedKey::empty().suite(), None);
    }

    #[test]
    fn test_envelope_suite_mismatch_is_rejected() {
        let sym = SymmetricKey::generate();
        let kek = [0x01; 32];
        let forged = WrappedKey::encode(&WrapEnvelope {
            suite: CipherSuite::ChaCha20Poly1305,
            ephemeral_public: None,
            sealed: cipher::encrypt(CipherSuite::RepeatingXor, sym.as_bytes(), &kek).unwrap(),
        })
        .unwrap();

        assert!(matches!(unwrap(&forged, &kek), Err(CoreError::Encoding(_))));
        assert_eq!(forged.suite(), None);
    }

    #[test]
    fn test_empty_and_garbage_wrapped_keys_fail() {
        let master = MasterKey::from_bytes([0x10; 32]);
        assert!(unwrap_with_master(&WrappedKey::empty(), &master).is_err());
        assert!(unwrap_with_master(&WrappedKey::from_text("encrypted-key"), &master).is_err());
    }
}
