//! # DataVault Testkit
//!
//! Testing utilities for DataVault.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Checksum and legacy-cipher outputs every
//!   implementation must reproduce
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A vault with an owner client, deterministic parties, and
//!   signers that refuse
//!
//! ## Golden Vectors
//!
//! ```rust
//! use datavault_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, actual) in verify_all_vectors() {
//!     assert!(matches, "{}: {}", name, actual);
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use datavault_core::CipherSuite;
//! use datavault_testkit::fixtures::{TestVault, READER_SEED};
//!
//! async fn example() {
//!     let vault = TestVault::memory(CipherSuite::default());
//!     vault.owner.upload(b"HELLO").await.unwrap();
//!
//!     let reader = vault.client(READER_SEED);
//!     reader.publish_encryption_key(&vault.directory).await.unwrap();
//!     vault
//!         .owner
//!         .grant_from_directory(&reader.principal(), &vault.directory)
//!         .await
//!         .unwrap();
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{keypair, DecliningSigner, EmptySigner, TestVault};
pub use vectors::{checksum_vectors, verify_all_vectors, vectors_json, xor_vectors};
