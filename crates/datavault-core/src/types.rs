//! Strong type definitions for DataVault.
//!
//! Identities are newtypes so an owner, a reader, and a proxy can never be
//! confused with raw key material at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte principal identity.
///
/// For a signing principal this is its Ed25519 verifying key. Proxy
/// identities (smart wallets) are derived from their owner via
/// [`Principal::derive`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Principal(pub [u8; 32]);

impl Principal {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }

    /// Derive a secondary identity controlled by `parent`.
    ///
    /// `Principal::derive(parent, label)` is stable for the same inputs.
    pub fn derive(parent: &Principal, label: &str) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key("datavault-v1-principal");
        hasher.update(&parent.0);
        hasher.update(label.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Principal {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Principal {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_hex_roundtrip() {
        let p = Principal::from_bytes([0x42; 32]);
        let recovered = Principal::from_hex(&p.to_hex()).unwrap();
        assert_eq!(p, recovered);

        let prefixed = format!("0x{}", p.to_hex());
        assert_eq!(Principal::from_hex(&prefixed).unwrap(), p);
    }

    #[test]
    fn test_principal_from_hex_wrong_length() {
        assert!(Principal::from_hex("abcd").is_err());
    }

    #[test]
    fn test_principal_display() {
        let p = Principal::from_bytes([0xab; 32]);
        assert_eq!(format!("{}", p), "abababababababab");
        assert!(format!("{:?}", p).starts_with("Principal("));
    }

    #[test]
    fn test_derived_principal_stable_and_distinct() {
        let parent = Principal::from_bytes([0x01; 32]);
        let a = Principal::derive(&parent, "smart-wallet");
        let b = Principal::derive(&parent, "smart-wallet");
        let c = Principal::derive(&parent, "other");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, parent);
    }
}
