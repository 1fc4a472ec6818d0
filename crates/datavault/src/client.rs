//! The client workflow.
//!
//! [`VaultClient`] runs the local half of every vault operation for one
//! principal: authenticate with the signer, derive the master key, then
//! encrypt, wrap, and submit to the ledger, or read, unwrap, decrypt and
//! verify. Derived keys and plaintext live only in locals; nothing secret is
//! persisted or logged.

use std::sync::Arc;

use tracing::{debug, info, warn};

use datavault_core::{
    checksum, cipher, keywrap, EncryptionPublicKey, Integrity, MasterKey, PossessionProver,
    Principal, ProofOfPossession, SymmetricKey,
};
use datavault_ledger::{ciphertext_handle, Ledger};

use crate::config::VaultConfig;
use crate::directory::KeyDirectory;
use crate::error::{Result, VaultError};
use crate::signer::Signer;

/// What an upload anchored on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Handle published in the `DataUploaded` event.
    pub handle: String,
    /// Hex SHA-256 of the plaintext.
    pub checksum: String,
}

/// The result of a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredData {
    /// The decrypted bytes. `None` when authenticated decryption rejected
    /// the ciphertext or key, so there is nothing to return.
    pub plaintext: Option<Vec<u8>>,
    /// Checksum classification. Callers must check this before trusting
    /// `plaintext`.
    pub integrity: Integrity,
    /// The checksum stored on the ledger.
    pub checksum: String,
}

impl RecoveredData {
    pub fn is_verified(&self) -> bool {
        self.integrity.is_verified()
    }

    /// The plaintext as UTF-8 text, if it is any.
    pub fn text(&self) -> Option<&str> {
        self.plaintext
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    fn tampered(checksum: String) -> Self {
        Self {
            plaintext: None,
            integrity: Integrity::Tampered,
            checksum,
        }
    }
}

/// One principal's view of a vault.
pub struct VaultClient<L: Ledger, S: Signer> {
    ledger: Arc<L>,
    signer: S,
    config: VaultConfig,
    prover: Arc<PossessionProver>,
}

impl<L: Ledger, S: Signer> VaultClient<L, S> {
    pub fn new(ledger: Arc<L>, signer: S, config: VaultConfig) -> Self {
        Self {
            ledger,
            signer,
            config,
            prover: Arc::new(PossessionProver::new()),
        }
    }

    /// The principal this client acts as.
    pub fn principal(&self) -> Principal {
        self.signer.principal()
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Key Derivation
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign the authentication message and derive the master key.
    ///
    /// # Errors
    /// - `AuthenticationRefused` if the signer declines or fails, returns an
    ///   empty signature, or (with verification on) a signature that does
    ///   not verify for this principal.
    pub async fn authenticate(&self) -> Result<MasterKey> {
        let message = self.config.auth_message.as_bytes();
        let signature = self
            .signer
            .sign(message)
            .await
            .map_err(|e| VaultError::AuthenticationRefused(e.to_string()))?;

        if signature.is_empty() {
            return Err(VaultError::AuthenticationRefused("empty signature".into()));
        }

        if self.config.verify_signatures {
            self.principal()
                .verify(message, &signature)
                .map_err(|e| VaultError::AuthenticationRefused(e.to_string()))?;
        }

        debug!(principal = %self.principal(), "authenticated");
        Ok(MasterKey::derive(&signature))
    }

    /// The public half of this principal's encryption identity.
    pub async fn encryption_public_key(&self) -> Result<EncryptionPublicKey> {
        Ok(self.authenticate().await?.encryption_public_key())
    }

    /// Publish this principal's encryption key so owners can grant to it.
    pub async fn publish_encryption_key(
        &self,
        directory: &KeyDirectory,
    ) -> Result<EncryptionPublicKey> {
        let key = self.encryption_public_key().await?;
        directory.publish(self.principal(), key);
        info!(principal = %self.principal(), "encryption key published");
        Ok(key)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Owner Workflows
    // ─────────────────────────────────────────────────────────────────────────

    /// Encrypt `plaintext` under a freshly drawn vault key and anchor it on
    /// the ledger.
    ///
    /// Only the owner's entry is refreshed. Other members' entries still open
    /// the previous key, so their reads classify as tampered until they are
    /// granted again; [`VaultClient::upload_shared`] does that in one step.
    /// A revoked principal's old key never opens the new ciphertext.
    pub async fn upload(&self, plaintext: &[u8]) -> Result<UploadReceipt> {
        let master = self.authenticate().await?;
        self.upload_with_key(plaintext, &master, &SymmetricKey::generate())
            .await
    }

    /// [`VaultClient::upload`], then re-wrap the new vault key for every
    /// principal in `directory` that is still authorized.
    ///
    /// Authorized members with no published key keep their stale entry.
    pub async fn upload_shared(
        &self,
        plaintext: &[u8],
        directory: &KeyDirectory,
    ) -> Result<UploadReceipt> {
        let master = self.authenticate().await?;
        let principal = self.principal();
        let sym_key = SymmetricKey::generate();
        let receipt = self.upload_with_key(plaintext, &master, &sym_key).await?;

        let mut shared = 0usize;
        for (member, recipient) in directory.entries() {
            if member == principal || !self.ledger.authorized_users(&member).await? {
                continue;
            }
            let wrapped =
                keywrap::wrap_for_recipient(&sym_key, &recipient, self.config.cipher_suite)?;
            self.ledger
                .grant_access(&principal, &member, wrapped)
                .await?;
            shared += 1;
        }

        info!(handle = %receipt.handle, members = shared, "vault key re-shared");
        Ok(receipt)
    }

    async fn upload_with_key(
        &self,
        plaintext: &[u8],
        master: &MasterKey,
        sym_key: &SymmetricKey,
    ) -> Result<UploadReceipt> {
        let principal = self.principal();
        let suite = self.config.cipher_suite;

        let ciphertext = cipher::encrypt(suite, plaintext, sym_key.as_bytes())?;
        let digest = checksum::digest(plaintext).to_hex();
        let owner_key = keywrap::wrap(sym_key, master.as_bytes(), suite)?;
        let handle = ciphertext_handle(&ciphertext);

        self.ledger
            .upload_data(&principal, ciphertext, owner_key, digest.clone())
            .await?;

        info!(handle = %handle, suite = ?suite, "upload anchored");
        Ok(UploadReceipt {
            handle,
            checksum: digest,
        })
    }

    /// Authorize `target`, wrapping the vault key for its published
    /// encryption key.
    ///
    /// # Errors
    /// - `NoData` if this principal holds no vault key yet.
    /// - `Ledger(OwnerOnly)` if this principal is not the owner.
    pub async fn grant(&self, target: &Principal, recipient: &EncryptionPublicKey) -> Result<()> {
        let master = self.authenticate().await?;
        let sym_key = self
            .current_vault_key(&master)
            .await?
            .ok_or(VaultError::NoData)?;

        let wrapped = keywrap::wrap_for_recipient(&sym_key, recipient, self.config.cipher_suite)?;
        self.ledger
            .grant_access(&self.principal(), target, wrapped)
            .await?;

        info!(target = %target, "granted");
        Ok(())
    }

    /// [`VaultClient::grant`], looking the recipient key up in `directory`.
    pub async fn grant_from_directory(
        &self,
        target: &Principal,
        directory: &KeyDirectory,
    ) -> Result<()> {
        let recipient = directory
            .lookup(target)
            .ok_or(VaultError::MissingEncryptionKey(*target))?;
        self.grant(target, &recipient).await
    }

    pub async fn revoke(&self, target: &Principal) -> Result<()> {
        self.ledger.revoke_access(&self.principal(), target).await?;
        info!(target = %target, "revoked");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reader Workflow
    // ─────────────────────────────────────────────────────────────────────────

    /// Read, unwrap, decrypt and verify the vault contents.
    ///
    /// # Errors
    /// - `Ledger(NotAuthorized)` if this principal is not authorized. The
    ///   ledger has recorded a security alert.
    /// - `NoData` if nothing was uploaded yet.
    pub async fn access(&self) -> Result<RecoveredData> {
        let master = self.authenticate().await?;
        let record = self.ledger.access_data(&self.principal()).await?;
        if record.is_empty() || record.wrapped_key.is_empty() {
            return Err(VaultError::NoData);
        }

        let sym_key = match keywrap::unwrap_with_master(&record.wrapped_key, &master) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "wrapped key rejected");
                return Ok(RecoveredData::tampered(record.checksum));
            }
        };

        let plaintext = match cipher::decrypt(&record.ciphertext, sym_key.as_bytes()) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                warn!(error = %e, "ciphertext rejected");
                return Ok(RecoveredData::tampered(record.checksum));
            }
        };

        let integrity = checksum::verify_hex(&plaintext, &record.checksum);
        if !integrity.is_verified() {
            warn!(principal = %self.principal(), "checksum mismatch");
        }

        Ok(RecoveredData {
            plaintext: Some(plaintext),
            integrity,
            checksum: record.checksum,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Proof of Possession
    // ─────────────────────────────────────────────────────────────────────────

    /// Prove possession of `secret` on the blocking pool.
    ///
    /// Dropping the future abandons the proof; the secret copy is dropped
    /// with the task.
    pub async fn prove_possession(&self, secret: Vec<u8>) -> Result<ProofOfPossession> {
        let prover = self.prover.clone();
        tokio::task::spawn_blocking(move || prover.prove(&secret))
            .await
            .map_err(|e| VaultError::Task(format!("spawn_blocking failed: {}", e)))
    }

    pub fn verify_possession(proof: &ProofOfPossession, secret: &[u8]) -> bool {
        proof.verify(secret)
    }

    /// This principal's current vault key, if its ledger entry opens.
    async fn current_vault_key(&self, master: &MasterKey) -> Result<Option<SymmetricKey>> {
        let wrapped = self.ledger.user_keys(&self.principal()).await?;
        if wrapped.is_empty() {
            return Ok(None);
        }
        match keywrap::unwrap_with_master(&wrapped, master) {
            Ok(key) => Ok(Some(key)),
            Err(e) => {
                warn!(error = %e, "existing wrapped key does not open");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use datavault_core::{CipherSuite, Keypair, Signature};
    use datavault_ledger::{LedgerExt, MemoryLedger};

    use crate::error::SignerError;

    struct Refusing(Principal, SignerError);

    #[async_trait]
    impl Signer for Refusing {
        fn principal(&self) -> Principal {
            self.0
        }

        async fn sign(&self, _message: &[u8]) -> std::result::Result<Signature, SignerError> {
            Err(self.1.clone())
        }
    }

    fn owner_client(suite: CipherSuite) -> VaultClient<MemoryLedger, Keypair> {
        let owner = Keypair::from_seed(&[0x01; 32]);
        let ledger = Arc::new(MemoryLedger::new(owner.principal()));
        VaultClient::new(
            ledger,
            owner,
            VaultConfig::default().with_cipher_suite(suite),
        )
    }

    #[tokio::test]
    async fn test_upload_and_read_back() {
        for suite in [CipherSuite::RepeatingXor, CipherSuite::ChaCha20Poly1305] {
            let client = owner_client(suite);
            let receipt = client.upload(b"HELLO").await.unwrap();
            assert_eq!(receipt.checksum, checksum::digest(b"HELLO").to_hex());

            let data = client.access().await.unwrap();
            assert_eq!(data.integrity, Integrity::Verified);
            assert_eq!(data.text(), Some("HELLO"));
        }
    }

    #[tokio::test]
    async fn test_access_before_upload_is_no_data() {
        let client = owner_client(CipherSuite::default());
        assert!(matches!(client.access().await, Err(VaultError::NoData)));
    }

    #[tokio::test]
    async fn test_each_upload_draws_a_fresh_key() {
        let client = owner_client(CipherSuite::ChaCha20Poly1305);
        client.upload(b"first").await.unwrap();
        let master = client.authenticate().await.unwrap();
        let before = client.current_vault_key(&master).await.unwrap();

        client.upload(b"second").await.unwrap();
        let after = client.current_vault_key(&master).await.unwrap();

        assert!(before.is_some() && after.is_some());
        assert_ne!(before, after);
        assert_eq!(client.access().await.unwrap().text(), Some("second"));
    }

    #[tokio::test]
    async fn test_refused_signature_submits_nothing() {
        let owner = Principal::from_bytes([0x05; 32]);
        let ledger = Arc::new(MemoryLedger::new(owner));
        let client = VaultClient::new(
            ledger.clone(),
            Refusing(owner, SignerError::Declined),
            VaultConfig::default(),
        );

        assert!(matches!(
            client.upload(b"HELLO").await,
            Err(VaultError::AuthenticationRefused(_))
        ));
        assert!(matches!(
            client.access().await,
            Err(VaultError::AuthenticationRefused(_))
        ));
        assert!(ledger.events().await.unwrap().is_empty());
        assert_eq!(ledger.security_alert_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_signer_failure_is_reported() {
        let owner = Principal::from_bytes([0x05; 32]);
        let ledger = Arc::new(MemoryLedger::new(owner));
        let client = VaultClient::new(
            ledger,
            Refusing(owner, SignerError::Failed("wallet disconnected".into())),
            VaultConfig::default(),
        );

        match client.authenticate().await {
            Err(VaultError::AuthenticationRefused(reason)) => {
                assert!(reason.contains("wallet disconnected"));
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_signature_from_wrong_key_is_refused() {
        let owner = Keypair::from_seed(&[0x01; 32]);
        let impostor = Keypair::from_seed(&[0x02; 32]);

        struct Impersonating {
            claimed: Principal,
            actual: Keypair,
        }

        #[async_trait]
        impl Signer for Impersonating {
            fn principal(&self) -> Principal {
                self.claimed
            }

            async fn sign(&self, message: &[u8]) -> std::result::Result<Signature, SignerError> {
                Ok(self.actual.sign(message))
            }
        }

        let ledger = Arc::new(MemoryLedger::new(owner.principal()));
        let client = VaultClient::new(
            ledger,
            Impersonating {
                claimed: owner.principal(),
                actual: impostor,
            },
            VaultConfig::default(),
        );
        assert!(matches!(
            client.authenticate().await,
            Err(VaultError::AuthenticationRefused(_))
        ));
    }

    #[tokio::test]
    async fn test_possession_proof() {
        let client = owner_client(CipherSuite::default());
        let proof = client.prove_possession(b"HELLO".to_vec()).await.unwrap();
        assert!(VaultClient::<MemoryLedger, Keypair>::verify_possession(&proof, b"HELLO"));
        assert!(!VaultClient::<MemoryLedger, Keypair>::verify_possession(&proof, b"HELL0"));
    }
}
