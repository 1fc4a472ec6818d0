//! Checksum integrity.
//!
//! The checksum is a SHA-256 digest of the *plaintext*, computed once at
//! upload time. After decryption the reader recomputes it; any mismatch
//! (wrong key, corrupted ciphertext, tampering) classifies as
//! [`Integrity::Tampered`].

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;

/// A 32-byte SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Compute the digest of the given data.
    pub fn compute(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, the form stored on the ledger.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex, accepting an optional `0x` prefix and either case.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.trim();
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Outcome of an integrity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Integrity {
    Verified,
    Tampered,
}

impl Integrity {
    pub fn is_verified(&self) -> bool {
        matches!(self, Integrity::Verified)
    }
}

impl fmt::Display for Integrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Integrity::Verified => f.write_str("VERIFIED"),
            Integrity::Tampered => f.write_str("TAMPERED"),
        }
    }
}

/// Compute the checksum of a plaintext.
pub fn digest(plaintext: &[u8]) -> Digest {
    Digest::compute(plaintext)
}

/// Recompute the checksum and compare for exact equality.
pub fn verify(plaintext: &[u8], expected: &Digest) -> Integrity {
    if digest(plaintext) == *expected {
        Integrity::Verified
    } else {
        Integrity::Tampered
    }
}

/// Like [`verify`], for a checksum read back from the ledger as text.
///
/// A checksum that does not parse cannot vouch for anything and is
/// classified as tampered.
pub fn verify_hex(plaintext: &[u8], expected: &str) -> Integrity {
    match Digest::from_hex(expected) {
        Ok(expected) => verify(plaintext, &expected),
        Err(_) => Integrity::Tampered,
    }
}
