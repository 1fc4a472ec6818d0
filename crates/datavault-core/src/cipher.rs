//! Content cipher.
//!
//! Encrypts payload bytes under a symmetric key and encodes the result as
//! text for storage on the ledger. Two suites are supported:
//!
//! - [`CipherSuite::RepeatingXor`]: each byte is XORed with the key repeated
//!   to the payload length. Length-preserving, and decryption with a wrong
//!   key silently yields garbage. Offers no real confidentiality; kept for
//!   reading legacy vaults.
//! - [`CipherSuite::ChaCha20Poly1305`]: authenticated encryption with a fresh
//!   96-bit nonce per call. Wrong keys and tampering fail decryption.
//!
//! Ciphertext text is `"<prefix>:<base64>"`. Text without a known prefix is
//! read as a legacy repeating-XOR ciphertext.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::random_bytes;
use crate::error::{CoreError, Result};

const XOR_PREFIX: &str = "x1:";
const AEAD_PREFIX: &str = "c1:";
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const AEAD_KEY_CONTEXT: &str = "datavault-v1-aead-key";

/// Which cipher produced a ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CipherSuite {
    /// Repeating-key XOR.
    RepeatingXor,
    /// ChaCha20-Poly1305 with a random nonce.
    #[default]
    ChaCha20Poly1305,
}

impl CipherSuite {
    fn prefix(self) -> &'static str {
        match self {
            CipherSuite::RepeatingXor => XOR_PREFIX,
            CipherSuite::ChaCha20Poly1305 => AEAD_PREFIX,
        }
    }
}

/// A 256-bit symmetric key that encrypts one upload.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; 32]);

impl SymmetricKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        Self(random_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CoreError::InvalidKeyLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// Textual ciphertext as stored on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Ciphertext(String);

impl Ciphertext {
    /// Wrap ciphertext text read from storage.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True before the first upload.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The suite this ciphertext was produced with.
    pub fn suite(&self) -> CipherSuite {
        if self.0.starts_with(AEAD_PREFIX) {
            CipherSuite::ChaCha20Poly1305
        } else {
            CipherSuite::RepeatingXor
        }
    }

    fn body(&self) -> &str {
        self.0
            .strip_prefix(self.suite().prefix())
            .unwrap_or(&self.0)
    }

    /// Decode the base64 body into raw cipher bytes.
    pub fn raw_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.body())
            .map_err(|e| CoreError::Encoding(e.to_string()))
    }

    /// Re-encode raw cipher bytes under the given suite.
    pub fn from_raw(suite: CipherSuite, raw: &[u8]) -> Self {
        Self(format!("{}{}", suite.prefix(), STANDARD.encode(raw)))
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encrypt `plaintext` under `key`.
pub fn encrypt(suite: CipherSuite, plaintext: &[u8], key: &[u8]) -> Result<Ciphertext> {
    if key.is_empty() {
        return Err(CoreError::EmptyKey);
    }

    let raw = match suite {
        CipherSuite::RepeatingXor => xor_with_repeating_key(plaintext, key),
        CipherSuite::ChaCha20Poly1305 => {
            let cipher = aead_cipher(key)?;
            let nonce: [u8; NONCE_LEN] = random_bytes();
            let sealed = cipher
                .encrypt(Nonce::from_slice(&nonce), plaintext)
                .map_err(|e| CoreError::Encryption(e.to_string()))?;

            let mut raw = Vec::with_capacity(NONCE_LEN + sealed.len());
            raw.extend_from_slice(&nonce);
            raw.extend_from_slice(&sealed);
            raw
        }
    };

    Ok(Ciphertext::from_raw(suite, &raw))
}

/// Decrypt `ciphertext` under `key`.
///
/// For [`CipherSuite::RepeatingXor`] this never fails on a wrong key; it
/// returns same-length garbage that only a checksum can detect.
pub fn decrypt(ciphertext: &Ciphertext, key: &[u8]) -> Result<Vec<u8>> {
    if key.is_empty() {
        return Err(CoreError::EmptyKey);
    }

    let raw = ciphertext.raw_bytes()?;
    match ciphertext.suite() {
        CipherSuite::RepeatingXor => Ok(xor_with_repeating_key(&raw, key)),
        CipherSuite::ChaCha20Poly1305 => {
            if raw.len() < NONCE_LEN + TAG_LEN {
                return Err(CoreError::Decryption(format!(
                    "ciphertext too short: {} bytes",
                    raw.len()
                )));
            }
            let (nonce, sealed) = raw.split_at(NONCE_LEN);
            aead_cipher(key)?
                .decrypt(Nonce::from_slice(nonce), sealed)
                .map_err(|e| CoreError::Decryption(e.to_string()))
        }
    }
}

fn xor_with_repeating_key(data: &[u8], key: &[u8]) -> Vec<u8> {
    data.iter()
        .zip(key.iter().cycle())
        .map(|(d, k)| d ^ k)
        .collect()
}

// Keys of any length are condensed to 256 bits for ChaCha20.
fn aead_cipher(key: &[u8]) -> Result<ChaCha20Poly1305> {
    let key = blake3::derive_key(AEAD_KEY_CONTEXT, key);
    ChaCha20Poly1305::new_from_slice(&key).map_err(|e| CoreError::Encryption(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_xor_known_vector() {
        let ct = encrypt(CipherSuite::RepeatingXor, b"HELLO", b"key").unwrap();
        assert_eq!(ct.as_str(), "x1:IyA1Jyo=");
        assert_eq!(decrypt(&ct, b"key").unwrap(), b"HELLO");
    }

    #[test]
    fn test_xor_is_length_preserving() {
        let ct = encrypt(CipherSuite::RepeatingXor, b"hello world", b"k").unwrap();
        assert_eq!(ct.raw_bytes().unwrap().len(), 11);
    }

    #[test]
    fn test_unprefixed_text_reads_as_xor() {
        let legacy = Ciphertext::from_text("IyA1Jyo=");
        assert_eq!(legacy.suite(), CipherSuite::RepeatingXor);
        assert_eq!(decrypt(&legacy, b"key").unwrap(), b"HELLO");
    }

    #[test]
    fn test_xor_wrong_key_returns_garbage() {
        let ct = encrypt(CipherSuite::RepeatingXor, b"HELLO", b"key").unwrap();
        let garbage = decrypt(&ct, b"nope").unwrap();
        assert_eq!(garbage.len(), 5);
        assert_ne!(garbage, b"HELLO");
    }

    #[test]
    fn test_aead_roundtrip_and_fresh_nonce() {
        let key = SymmetricKey::generate();
        let a = encrypt(CipherSuite::ChaCha20Poly1305, b"secret", key.as_bytes()).unwrap();
        let b = encrypt(CipherSuite::ChaCha20Poly1305, b"secret", key.as_bytes()).unwrap();

        assert_ne!(a, b);
        assert_eq!(a.suite(), CipherSuite::ChaCha20Poly1305);
        assert_eq!(decrypt(&a, key.as_bytes()).unwrap(), b"secret");
    }

    #[test]
    fn test_aead_wrong_key_fails() {
        let ct = encrypt(CipherSuite::ChaCha20Poly1305, b"secret", b"key-one").unwrap();
        assert!(matches!(
            decrypt(&ct, b"key-two"),
            Err(CoreError::Decryption(_))
        ));
    }

    #[test]
    fn test_aead_truncated_ciphertext_fails() {
        let ct = Ciphertext::from_raw(CipherSuite::ChaCha20Poly1305, &[0u8; 8]);
        assert!(matches!(decrypt(&ct, b"k"), Err(CoreError::Decryption(_))));
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            encrypt(CipherSuite::RepeatingXor, b"data", b""),
            Err(CoreError::EmptyKey)
        ));
    }

    #[test]
    fn test_bad_base64_is_encoding_error() {
        let ct = Ciphertext::from_text("x1:!!not-base64!!");
        assert!(matches!(decrypt(&ct, b"k"), Err(CoreError::Encoding(_))));
    }

    #[test]
    fn test_symmetric_key_from_slice_checks_length() {
        assert!(SymmetricKey::from_slice(&[0u8; 31]).is_err());
        assert!(SymmetricKey::from_slice(&[0u8; 32]).is_ok());
    }

    proptest! {
        #[test]
        fn prop_roundtrip_any_suite(
            plaintext in prop::collection::vec(any::<u8>(), 0..512),
            key in prop::collection::vec(any::<u8>(), 1..64),
            aead in any::<bool>(),
        ) {
            let suite = if aead { CipherSuite::ChaCha20Poly1305 } else { CipherSuite::RepeatingXor };
            let ct = encrypt(suite, &plaintext, &key).unwrap();
            prop_assert_eq!(decrypt(&ct, &key).unwrap(), plaintext);
        }
    }
}
