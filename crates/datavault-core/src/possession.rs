//! Proof of possession.
//!
//! Lets a principal show it holds a recovered plaintext without
//! republishing it:
//!
//! - `commitment = H(secret ‖ nullifier)`
//! - `proof = H(domain_tag ‖ secret ‖ nullifier)`
//!
//! where the nullifier is fresh randomness used for exactly one proof.
//!
//! This is a possession *check*, not a zero-knowledge proof: the verifier
//! must itself hold the secret to recompute the commitment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::crypto::{random_bytes, Blake3Hash};
use crate::types::now_millis;

/// Domain tag mixed into every proof hash.
pub const POSSESSION_DOMAIN_TAG: &[u8] = b"DATAVAULT_POP_V1";

/// Single-use randomness bound to one proof.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nullifier(pub [u8; 32]);

impl Nullifier {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nullifier({})", &self.to_hex()[..16])
    }
}

/// A proof bundle. Not persisted; consumed by local verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfPossession {
    pub commitment: Blake3Hash,
    pub nullifier: Nullifier,
    pub proof: Blake3Hash,
    /// When the proof was produced (Unix ms).
    pub timestamp: i64,
}

impl ProofOfPossession {
    /// Check the commitment against `secret`.
    pub fn verify(&self, secret: &[u8]) -> bool {
        commitment(secret, &self.nullifier) == self.commitment
    }

    /// [`ProofOfPossession::verify`] plus a check that `proof` was built
    /// from the same secret and nullifier under the domain tag.
    pub fn verify_binding(&self, secret: &[u8]) -> bool {
        self.verify(secret) && proof_hash(secret, &self.nullifier) == self.proof
    }
}

/// Produces proofs, never reusing a nullifier within its lifetime.
///
/// The first eight nullifier bytes are a per-prover counter, so two proofs
/// from one prover always differ; the rest is fresh randomness.
#[derive(Debug, Default)]
pub struct PossessionProver {
    issued: AtomicU64,
}

impl PossessionProver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a proof for `secret` with a fresh nullifier.
    pub fn prove(&self, secret: &[u8]) -> ProofOfPossession {
        let nullifier = self.fresh_nullifier();
        ProofOfPossession {
            commitment: commitment(secret, &nullifier),
            nullifier,
            proof: proof_hash(secret, &nullifier),
            timestamp: now_millis(),
        }
    }

    /// Number of proofs issued so far.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    fn fresh_nullifier(&self) -> Nullifier {
        let counter = self.issued.fetch_add(1, Ordering::Relaxed);
        let mut bytes: [u8; 32] = random_bytes();
        bytes[..8].copy_from_slice(&counter.to_le_bytes());
        Nullifier(bytes)
    }
}

fn commitment(secret: &[u8], nullifier: &Nullifier) -> Blake3Hash {
    Blake3Hash::hash_parts(&[secret, nullifier.0.as_slice()])
}

fn proof_hash(secret: &[u8], nullifier: &Nullifier) -> Blake3Hash {
    Blake3Hash::hash_parts(&[POSSESSION_DOMAIN_TAG, secret, nullifier.0.as_slice()])
}
