// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tezos integration.
//!
//! This module provides functionality for:
//! - Michelson byte and base58check encodings
//! - Micheline values for entrypoint arguments and originations
//! - Signing with local ed25519 keys or a remote signer
//! - Forging, injecting and confirming operations through a node

pub mod encoding;
pub mod keys;
pub mod micheline;
pub mod node;

#[cfg(test)]
pub(crate) mod testing;

pub use keys::{LocalKey, RemoteSigner, Signer};
pub use micheline::{Micheline, Parameters, Script};
pub use node::{Limits, OperationLimits, RpcNode, TezosNode};

/// Tezos layer errors.
#[derive(Debug, thiserror::Error)]
pub enum TezosError {
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Remote signer not configured for {0}")]
    SignerNotConfigured(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("Operation {hash} rejected: {reason}")]
    OperationRejected { hash: String, reason: String },

    #[error("Operation {hash} not included within {blocks} blocks")]
    NotIncluded { hash: String, blocks: u64 },
}
