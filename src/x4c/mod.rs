// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! X4C contract layer.
//!
//! - `registry` - alias resolution and facade construction ([`X4cClient`])
//! - `credentials` - tezos-client credential files
//! - `fa2` / `custodian` - contract facades, one method per entrypoint
//! - `storage` - lazily cached, backend-agnostic storage views
//! - `events` - typed contract events

pub mod credentials;
pub mod custodian;
pub mod events;
pub mod fa2;
pub mod registry;
pub mod storage;

use std::fmt;

use serde::Serialize;

use crate::indexer::IndexerError;
use crate::tezos::TezosError;

pub use credentials::{CredentialError, CredentialStore, NamedValue};
pub use custodian::CustodianContract;
pub use events::{ContractEvent, EventPayload};
pub use fa2::{Fa2Contract, TokenInfo};
pub use registry::{ClientSettings, ContractHandle, ContractKind, Originated, X4cClient};
pub use storage::{CustodianStorage, Fa2Storage};

/// What an alias was expected to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasRole {
    Signer,
    Contract,
}

impl fmt::Display for AliasRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signer => write!(f, "Signer"),
            Self::Contract => write!(f, "Contract"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum X4cError {
    #[error("{role} `{name}` not recognised")]
    AliasNotFound { role: AliasRole, name: String },

    #[error("No default FA2 contract; name the contract explicitly")]
    NoDefaultContract,

    #[error("Signer not provided")]
    SignerRequired,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Indexer(#[from] IndexerError),

    #[error(transparent)]
    Tezos(#[from] TezosError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

/// Outcome of every write entrypoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    pub operation_hash: String,
}
