//! # DataVault
//!
//! An encrypted data vault with a ledger-held access gate.
//!
//! ## Overview
//!
//! The owner encrypts a payload locally, anchors the ciphertext and its
//! checksum on the access ledger, and hands each authorized reader its own
//! wrapped copy of the vault key. Readers fetch the ciphertext through the
//! ledger's gate, unwrap, decrypt, and check the checksum. Every denied read
//! leaves a `SecurityAlert` in the ledger's event log.
//!
//! ## Key Concepts
//!
//! - **Master key**: derived from the principal's signature over a fixed
//!   authentication message. Never stored.
//! - **Wrapped key**: the vault key sealed for one principal.
//! - **Integrity**: `VERIFIED` or `TAMPERED`. A value, not an error.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use datavault::{Keypair, MemoryLedger, VaultClient, VaultConfig};
//!
//! async fn example() {
//!     let owner = Keypair::generate();
//!     let ledger = Arc::new(MemoryLedger::new(owner.principal()));
//!     let client = VaultClient::new(ledger, owner, VaultConfig::default());
//!
//!     client.upload(b"HELLO").await.unwrap();
//!
//!     let data = client.access().await.unwrap();
//!     assert!(data.is_verified());
//!     assert_eq!(data.text(), Some("HELLO"));
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `datavault::core` - Primitives (cipher, checksum, key wrapping, proofs)
//! - `datavault::ledger` - The access ledger and its backends

pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod monitor;
pub mod proxy;
pub mod signer;

// Re-export component crates
pub use datavault_core as core;
pub use datavault_ledger as ledger;

pub use client::{RecoveredData, UploadReceipt, VaultClient};
pub use config::VaultConfig;
pub use directory::KeyDirectory;
pub use error::{ProxyError, Result, SignerError, VaultError};
pub use monitor::{AlertMonitor, ObservedAlert};
pub use proxy::{Execution, SmartWallet};
pub use signer::Signer;

// Re-export commonly used types
pub use datavault_core::{
    CipherSuite, EncryptionPublicKey, Integrity, Keypair, Principal, ProofOfPossession,
    WrappedKey,
};
pub use datavault_ledger::{
    AccessRecord, CallOutput, EventKind, Ledger, LedgerCall, LedgerConfig, LedgerError,
    LedgerEvent, LedgerExt, MemoryLedger, SqliteLedger,
};
