//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: deterministic parties and a
//! vault with an owner client already bound to its ledger.

use std::sync::Arc;

use async_trait::async_trait;

use datavault::{KeyDirectory, Signer, SignerError, VaultClient, VaultConfig};
use datavault_core::{CipherSuite, Keypair, Principal, Signature};
use datavault_ledger::{Ledger, MemoryLedger, Result as LedgerResult, SqliteLedger};

/// A deterministic keypair from a one-byte seed.
pub fn keypair(seed: u8) -> Keypair {
    Keypair::from_seed(&[seed; 32])
}

/// Seeds of the parties used across scenarios.
pub const OWNER_SEED: u8 = 0x01;
pub const READER_SEED: u8 = 0x02;
pub const INTRUDER_SEED: u8 = 0x03;

/// A vault with an owner client and a shared key directory.
pub struct TestVault<L: Ledger> {
    pub ledger: Arc<L>,
    pub owner: VaultClient<L, Keypair>,
    pub directory: KeyDirectory,
    pub config: VaultConfig,
}

impl TestVault<MemoryLedger> {
    /// A vault on an in-memory ledger.
    pub fn memory(suite: CipherSuite) -> Self {
        let owner = keypair(OWNER_SEED);
        let ledger = Arc::new(MemoryLedger::new(owner.principal()));
        Self::with_ledger(ledger, owner, suite)
    }
}

impl TestVault<SqliteLedger> {
    /// A vault on an in-memory SQLite ledger.
    pub fn sqlite(suite: CipherSuite) -> LedgerResult<Self> {
        let owner = keypair(OWNER_SEED);
        let ledger = Arc::new(SqliteLedger::create_in_memory(owner.principal())?);
        Ok(Self::with_ledger(ledger, owner, suite))
    }
}

impl<L: Ledger> TestVault<L> {
    pub fn with_ledger(ledger: Arc<L>, owner: Keypair, suite: CipherSuite) -> Self {
        let config = VaultConfig::default().with_cipher_suite(suite);
        Self {
            owner: VaultClient::new(ledger.clone(), owner, config.clone()),
            ledger,
            directory: KeyDirectory::new(),
            config,
        }
    }

    /// A client for another party on the same ledger.
    pub fn client(&self, seed: u8) -> VaultClient<L, Keypair> {
        VaultClient::new(self.ledger.clone(), keypair(seed), self.config.clone())
    }

    pub fn owner_principal(&self) -> Principal {
        self.owner.principal()
    }
}

/// A signer whose user always refuses.
#[derive(Debug, Clone, Copy)]
pub struct DecliningSigner(pub Principal);

#[async_trait]
impl Signer for DecliningSigner {
    fn principal(&self) -> Principal {
        self.0
    }

    async fn sign(&self, _message: &[u8]) -> Result<Signature, SignerError> {
        Err(SignerError::Declined)
    }
}

/// A signer that hands back an empty signature.
#[derive(Debug, Clone, Copy)]
pub struct EmptySigner(pub Principal);

#[async_trait]
impl Signer for EmptySigner {
    fn principal(&self) -> Principal {
        self.0
    }

    async fn sign(&self, _message: &[u8]) -> Result<Signature, SignerError> {
        Ok(Signature::from_bytes(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parties_are_distinct_and_stable() {
        assert_eq!(keypair(OWNER_SEED).principal(), keypair(OWNER_SEED).principal());
        assert_ne!(keypair(OWNER_SEED).principal(), keypair(READER_SEED).principal());
        assert_ne!(keypair(READER_SEED).principal(), keypair(INTRUDER_SEED).principal());
    }
}
