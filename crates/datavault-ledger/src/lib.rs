//! # DataVault Ledger
//!
//! The access ledger: the single authority holding the vault's owner,
//! authorized principals, wrapped keys, ciphertext and checksum.
//!
//! ## Overview
//!
//! [`VaultState`] is the pure state machine. Backends implement the
//! [`Ledger`] trait around it: [`SqliteLedger`] persists to disk,
//! [`MemoryLedger`] keeps everything in memory for tests.
//!
//! ## Key Types
//!
//! - [`Ledger`] - The async trait for the seven vault operations
//! - [`LedgerCall`] / [`CallOutput`] - Encoded calls, as carried by proxies
//! - [`LedgerEvent`] - `DataUploaded` and `SecurityAlert`
//! - [`AccessRecord`] - What an authorized read returns
//!
//! ## Usage
//!
//! ```rust,no_run
//! use datavault_core::Keypair;
//! use datavault_ledger::{Ledger, LedgerConfig, SqliteLedger};
//!
//! async fn example() {
//!     let owner = Keypair::generate().principal();
//!     let ledger = SqliteLedger::create("vault.db", owner, LedgerConfig::default()).unwrap();
//!
//!     assert!(ledger.authorized_users(&owner).await.unwrap());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Owner is always authorized**: the owner cannot be revoked
//! - **Alerts on every denial**: each denied read commits one `SecurityAlert`
//! - **All-or-nothing**: a rejected call leaves state and log untouched

pub mod calls;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod state;
pub mod traits;

pub use calls::{CallOutput, LedgerCall};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use events::{ciphertext_handle, EventKind, LedgerEvent};
pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;
pub use state::{AccessDecision, AccessRecord, VaultState};
pub use traits::{Ledger, LedgerExt};
