//! # DataVault Core
//!
//! Pure primitives for DataVault: identities, key derivation, the content
//! cipher, checksums, key wrapping, and proofs of possession.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over byte buffers and keys.
//!
//! ## Key Types
//!
//! - [`Principal`] - A 32-byte identity (owner, reader, or proxy)
//! - [`MasterKey`] - Deterministic key derived from an authentication signature
//! - [`Ciphertext`] - Textual (base64) ciphertext tagged with its [`CipherSuite`]
//! - [`Digest`] - SHA-256 checksum of plaintext
//! - [`WrappedKey`] - A symmetric key sealed under a principal's KEK
//! - [`ProofOfPossession`] - Commitment bundle proving knowledge of a secret
//!
//! ## Read Path
//!
//! A reader derives its master key, unwraps the symmetric key, decrypts the
//! ciphertext, and then *must* check the checksum: the legacy
//! [`CipherSuite::RepeatingXor`] never reports a wrong key on its own.
//!
//! ```rust
//! use datavault_core::{checksum, cipher, CipherSuite, Integrity, SymmetricKey};
//!
//! let key = SymmetricKey::generate();
//! let sealed = cipher::encrypt(CipherSuite::RepeatingXor, b"HELLO", key.as_bytes()).unwrap();
//! let expected = checksum::digest(b"HELLO");
//!
//! let opened = cipher::decrypt(&sealed, key.as_bytes()).unwrap();
//! assert_eq!(checksum::verify(&opened, &expected), Integrity::Verified);
//! ```

pub mod checksum;
pub mod cipher;
pub mod crypto;
pub mod error;
pub mod kdf;
pub mod keywrap;
pub mod possession;
pub mod types;

pub use checksum::{Digest, Integrity};
pub use cipher::{CipherSuite, Ciphertext, SymmetricKey};
pub use crypto::{
    Blake3Hash, EncryptionPublicKey, EncryptionSecret, EphemeralKeyPair, Keypair, SharedKey,
    Signature,
};
pub use error::{CoreError, Result};
pub use kdf::{MasterKey, DEFAULT_AUTH_MESSAGE};
pub use keywrap::WrappedKey;
pub use possession::{Nullifier, PossessionProver, ProofOfPossession, POSSESSION_DOMAIN_TAG};
pub use types::{now_millis, Principal};
