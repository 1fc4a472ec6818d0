//! The signing collaborator.
//!
//! A wallet, hardware key, or in-process keypair that signs the
//! authentication message on the principal's behalf. Signing is a suspension
//! point: the user may take a while, or decline.

use async_trait::async_trait;

use datavault_core::{Keypair, Principal, Signature};

use crate::error::SignerError;

#[async_trait]
pub trait Signer: Send + Sync {
    /// The identity this signer signs for.
    fn principal(&self) -> Principal;

    /// Sign `message`. The same message must always yield the same bytes.
    async fn sign(&self, message: &[u8]) -> Result<Signature, SignerError>;
}

#[async_trait]
impl Signer for Keypair {
    fn principal(&self) -> Principal {
        Keypair::principal(self)
    }

    async fn sign(&self, message: &[u8]) -> Result<Signature, SignerError> {
        Ok(Keypair::sign(self, message))
    }
}
