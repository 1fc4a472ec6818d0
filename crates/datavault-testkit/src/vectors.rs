//! Golden test vectors for deterministic verification.
//!
//! The checksum and the legacy repeating-XOR cipher are deterministic, so
//! every implementation must reproduce these outputs exactly. The AEAD
//! suite uses a random nonce and has no fixed vectors.

use serde::Serialize;

use datavault_core::{checksum, cipher, CipherSuite, Ciphertext};

/// A checksum vector.
#[derive(Debug, Clone, Serialize)]
pub struct ChecksumVector {
    pub name: &'static str,
    pub plaintext: &'static [u8],
    /// Expected SHA-256, lower hex.
    pub expected_hex: &'static str,
}

/// A repeating-XOR cipher vector.
#[derive(Debug, Clone, Serialize)]
pub struct XorVector {
    pub name: &'static str,
    pub plaintext: &'static [u8],
    pub key: &'static [u8],
    /// Expected base64 of the raw ciphertext, without the suite prefix.
    pub expected_base64: &'static str,
}

pub fn checksum_vectors() -> Vec<ChecksumVector> {
    vec![
        ChecksumVector {
            name: "empty",
            plaintext: b"",
            expected_hex: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
        ChecksumVector {
            name: "hello world",
            plaintext: b"hello world",
            expected_hex: "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
        },
        ChecksumVector {
            name: "HELLO",
            plaintext: b"HELLO",
            expected_hex: "3733cd977ff8eb18b987357e22ced99f46097f31ecb239e878ae63760e83e4d5",
        },
    ]
}

pub fn xor_vectors() -> Vec<XorVector> {
    vec![
        XorVector {
            name: "single-byte key",
            plaintext: b"hello world",
            key: &[0x2a],
            expected_base64: "Qk9GRkUKXUVYRk4=",
        },
        XorVector {
            name: "key shorter than text",
            plaintext: b"The quick brown fox",
            key: b"secret",
            expected_base64: "Jw0GUhQBGgYIUgcGHBINUgMbCw==",
        },
        XorVector {
            name: "HELLO under key",
            plaintext: b"HELLO",
            key: b"key",
            expected_base64: "IyA1Jyo=",
        },
        XorVector {
            name: "empty plaintext",
            plaintext: b"",
            key: b"k",
            expected_base64: "",
        },
    ]
}

/// Check every vector against this build. Returns `(name, matches, actual)`.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let mut results = Vec::new();

    for v in checksum_vectors() {
        let actual = checksum::digest(v.plaintext).to_hex();
        results.push((v.name.to_string(), actual == v.expected_hex, actual));
    }

    for v in xor_vectors() {
        let actual = cipher::encrypt(CipherSuite::RepeatingXor, v.plaintext, v.key)
            .map(|ct| ct.as_str().trim_start_matches("x1:").to_string())
            .unwrap_or_else(|e| format!("error: {}", e));
        results.push((v.name.to_string(), actual == v.expected_base64, actual));
    }

    results
}

/// The vector set as pretty JSON, for other implementations to consume.
pub fn vectors_json() -> serde_json::Result<String> {
    #[derive(Serialize)]
    struct VectorFile {
        description: &'static str,
        checksum: Vec<ChecksumVector>,
        repeating_xor: Vec<XorVector>,
    }

    serde_json::to_string_pretty(&VectorFile {
        description: "Golden vectors for the DataVault checksum and legacy cipher.",
        checksum: checksum_vectors(),
        repeating_xor: xor_vectors(),
    })
}

/// Decrypt a vector's unprefixed legacy text.
pub fn decrypt_legacy(v: &XorVector) -> datavault_core::Result<Vec<u8>> {
    cipher::decrypt(&Ciphertext::from_text(v.expected_base64), v.key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, actual) in verify_all_vectors() {
            assert!(matches, "vector {} produced {}", name, actual);
        }
    }

    #[test]
    fn test_legacy_text_decrypts() {
        for v in xor_vectors() {
            assert_eq!(decrypt_legacy(&v).unwrap(), v.plaintext, "vector {}", v.name);
        }
    }

    #[test]
    fn test_vectors_json_lists_hex() {
        let json = vectors_json().unwrap();
        assert!(json.contains("3733cd977ff8eb18b987357e22ced99f46097f31ecb239e878ae63760e83e4d5"));
        assert!(json.contains("IyA1Jyo="));
    }
}
