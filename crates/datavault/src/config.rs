//! Client configuration.

use datavault_core::{CipherSuite, DEFAULT_AUTH_MESSAGE};

/// Configuration for a [`VaultClient`](crate::VaultClient).
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// The message signed to derive the master key. Every client of one
    /// deployment must use the same value.
    pub auth_message: String,
    /// Suite used for new uploads and key wraps.
    pub cipher_suite: CipherSuite,
    /// Check the authentication signature against the signer's principal
    /// before deriving keys from it.
    pub verify_signatures: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            auth_message: DEFAULT_AUTH_MESSAGE.to_string(),
            cipher_suite: CipherSuite::default(),
            verify_signatures: true,
        }
    }
}

impl VaultConfig {
    pub fn with_auth_message(mut self, message: impl Into<String>) -> Self {
        self.auth_message = message.into();
        self
    }

    pub fn with_cipher_suite(mut self, suite: CipherSuite) -> Self {
        self.cipher_suite = suite;
        self
    }

    pub fn with_signature_verification(mut self, enabled: bool) -> Self {
        self.verify_signatures = enabled;
        self
    }
}
