//! Proptest generators for property-based testing.

use proptest::prelude::*;

use datavault_core::{CipherSuite, Keypair, Principal, SymmetricKey};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random Principal.
pub fn principal() -> impl Strategy<Value = Principal> {
    any::<[u8; 32]>().prop_map(Principal::from_bytes)
}

/// Generate a random 256-bit symmetric key.
pub fn symmetric_key() -> impl Strategy<Value = SymmetricKey> {
    any::<[u8; 32]>().prop_map(SymmetricKey::from_bytes)
}

/// Generate a non-empty raw key of any length up to `max_len`.
pub fn raw_key(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=max_len.max(1))
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate printable text payloads.
pub fn text_payload() -> impl Strategy<Value = String> {
    "[ -~]{0,64}"
}

pub fn cipher_suite() -> impl Strategy<Value = CipherSuite> {
    prop_oneof![
        Just(CipherSuite::RepeatingXor),
        Just(CipherSuite::ChaCha20Poly1305),
    ]
}

/// A single-bit mutation to apply to a byte buffer: `(index, bit)`.
///
/// The index is reduced modulo the buffer length when applied.
pub fn bit_flip() -> impl Strategy<Value = (usize, u8)> {
    (any::<usize>(), 0u8..8)
}

/// Flip one bit of `bytes` in place. No-op on an empty buffer.
pub fn apply_bit_flip(bytes: &mut [u8], (index, bit): (usize, u8)) {
    if bytes.is_empty() {
        return;
    }
    let i = index % bytes.len();
    bytes[i] ^= 1 << bit;
}
