//! Property tests for the cipher, checksum, key wrapping and proofs.

use proptest::prelude::*;

use datavault_core::{
    checksum, cipher, keywrap, CipherSuite, Ciphertext, Digest, Integrity, MasterKey,
    PossessionProver, DEFAULT_AUTH_MESSAGE,
};
use datavault_testkit::generators::{
    apply_bit_flip, bit_flip, cipher_suite, keypair, payload, raw_key, symmetric_key,
    text_payload,
};

/// Decrypt and classify, treating an authenticated-decryption failure as
/// tampering.
fn read_back(ciphertext: &Ciphertext, key: &[u8], expected: &Digest) -> Integrity {
    match cipher::decrypt(ciphertext, key) {
        Ok(plaintext) => checksum::verify(&plaintext, expected),
        Err(_) => Integrity::Tampered,
    }
}

proptest! {
    #[test]
    fn prop_roundtrip(
        suite in cipher_suite(),
        plaintext in payload(512),
        key in raw_key(64),
    ) {
        let sealed = cipher::encrypt(suite, &plaintext, &key).unwrap();
        prop_assert_eq!(sealed.suite(), suite);
        prop_assert_eq!(cipher::decrypt(&sealed, &key).unwrap(), plaintext);
    }

    #[test]
    fn prop_text_survives_with_hex_checksum(
        suite in cipher_suite(),
        text in text_payload(),
        key in symmetric_key(),
    ) {
        let stored = checksum::digest(text.as_bytes()).to_hex();
        let sealed = cipher::encrypt(suite, text.as_bytes(), key.as_bytes()).unwrap();
        let opened = cipher::decrypt(&sealed, key.as_bytes()).unwrap();

        prop_assert_eq!(checksum::verify_hex(&opened, &stored), Integrity::Verified);
        prop_assert_eq!(String::from_utf8(opened).unwrap(), text);
    }

    #[test]
    fn prop_mutated_ciphertext_reads_as_tampered(
        suite in cipher_suite(),
        plaintext in payload(256).prop_filter("non-empty", |p| !p.is_empty()),
        key in raw_key(32),
        flip in bit_flip(),
    ) {
        let expected = checksum::digest(&plaintext);
        let sealed = cipher::encrypt(suite, &plaintext, &key).unwrap();

        let mut raw = sealed.raw_bytes().unwrap();
        apply_bit_flip(&mut raw, flip);
        let tampered = Ciphertext::from_raw(suite, &raw);

        prop_assert_eq!(read_back(&sealed, &key, &expected), Integrity::Verified);
        prop_assert_eq!(read_back(&tampered, &key, &expected), Integrity::Tampered);
    }

    #[test]
    fn prop_wrapped_keys_open_to_the_same_vault_key(
        suite in cipher_suite(),
        vault_key in symmetric_key(),
        owner in keypair(),
        grantees in prop::collection::vec(keypair(), 1..4),
    ) {
        let owner_master = MasterKey::derive(&owner.sign(DEFAULT_AUTH_MESSAGE.as_bytes()));
        let owner_entry = keywrap::wrap(&vault_key, owner_master.as_bytes(), suite).unwrap();
        let from_owner = keywrap::unwrap_with_master(&owner_entry, &owner_master).unwrap();

        for grantee in grantees {
            let master = MasterKey::derive(&grantee.sign(DEFAULT_AUTH_MESSAGE.as_bytes()));
            let entry = keywrap::wrap_for_recipient(
                &from_owner,
                &master.encryption_public_key(),
                suite,
            )
            .unwrap();
            prop_assert_eq!(keywrap::unwrap_with_master(&entry, &master).unwrap(), vault_key.clone());
        }
    }

    #[test]
    fn prop_proofs_bind_to_their_secret(
        secret in payload(128),
        other in payload(128),
    ) {
        let prover = PossessionProver::new();
        let a = prover.prove(&secret);
        let b = prover.prove(&secret);

        prop_assert!(a.verify(&secret));
        prop_assert!(a.verify_binding(&secret));
        prop_assert_ne!(a.nullifier, b.nullifier);
        prop_assert_ne!(a.commitment, b.commitment);
        prop_assert_ne!(a.proof, b.proof);
        if other != secret {
            prop_assert!(!a.verify(&other));
        }
    }
}
