//! Call descriptors for the ledger's operation surface.
//!
//! A [`LedgerCall`] is what a transaction carries: one of the seven named
//! operations with its arguments. Proxies forward calls as CBOR bytes and
//! the ledger answers with a [`CallOutput`].

use serde::{Deserialize, Serialize};

use datavault_core::{Ciphertext, Principal, WrappedKey};

use crate::error::{LedgerError, Result};
use crate::state::AccessRecord;

/// One ledger operation with its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCall {
    Owner,
    AuthorizedUsers {
        principal: Principal,
    },
    UserKeys {
        principal: Principal,
    },
    UploadData {
        ciphertext: Ciphertext,
        owner_key: WrappedKey,
        checksum: String,
    },
    GrantAccess {
        principal: Principal,
        wrapped_key: WrappedKey,
    },
    RevokeAccess {
        principal: Principal,
    },
    AccessData,
}

impl LedgerCall {
    /// The operation's interop name.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerCall::Owner => "owner",
            LedgerCall::AuthorizedUsers { .. } => "authorizedUsers",
            LedgerCall::UserKeys { .. } => "userKeys",
            LedgerCall::UploadData { .. } => "uploadData",
            LedgerCall::GrantAccess { .. } => "grantAccess",
            LedgerCall::RevokeAccess { .. } => "revokeAccess",
            LedgerCall::AccessData => "accessData",
        }
    }

    /// Whether the call changes vault state when it succeeds.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            LedgerCall::UploadData { .. }
                | LedgerCall::GrantAccess { .. }
                | LedgerCall::RevokeAccess { .. }
        )
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes)
            .map_err(|e| LedgerError::InvalidCall(format!("undecodable call: {}", e)))
    }
}

/// What a call returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutput {
    Owner(Principal),
    Bool(bool),
    WrappedKey(WrappedKey),
    Unit,
    Access(AccessRecord),
}

impl CallOutput {
    pub fn into_access(self) -> Option<AccessRecord> {
        match self {
            CallOutput::Access(record) => Some(record),
            _ => None,
        }
    }
}
