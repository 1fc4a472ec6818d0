//! Error types for DataVault core primitives.

use thiserror::Error;

/// Errors that can occur in the core primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A key stream cannot be formed from an empty key.
    #[error("key must not be empty")]
    EmptyKey,

    /// Key material has the wrong length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("encryption error: {0}")]
    Encryption(String),

    /// Authenticated decryption rejected the ciphertext.
    #[error("decryption error: {0}")]
    Decryption(String),

    /// Textual encoding (base64 / hex) could not be parsed.
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
