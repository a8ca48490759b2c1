// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Tezos Node Client
//!
//! Submits manager operations through a node's RPC interface.
//!
//! ## Strategy
//!
//! 1. **Forge**: the node forges the operation (`helpers/forge/operations`)
//!    against the current head; a `reveal` is prepended when the source's
//!    manager key is not on chain yet.
//! 2. **Sign**: the forged bytes are signed with the generic-operation
//!    watermark (`0x03`) by a local key or the remote signer.
//! 3. **Inject**: the signed bytes go to `/injection/operation`.
//! 4. **Confirm**: manager-pass operations of every block from the head at
//!    injection time on are scanned until the hash shows up. After
//!    `max_wait_blocks` blocks without it the operation is reported as not
//!    included.
//!
//! Fees and limits are fixed per operation kind ([`OperationLimits`]); no
//! simulation is performed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::keys::Signer;
use super::micheline::{Parameters, Script};
use super::TezosError;

/// Watermark of generic (manager) operations.
const GENERIC_OPERATION_WATERMARK: u8 = 0x03;

/// Validation pass of manager operations in a block.
const MANAGER_PASS: usize = 3;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Blocks scanned before giving up on an injected operation. Matches the
/// protocol's maximum operation TTL, after which the operation can no longer
/// be included.
pub const DEFAULT_MAX_WAIT_BLOCKS: u64 = 120;

/// Result of a confirmed origination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origination {
    pub operation_hash: String,
    pub contract_address: String,
}

/// Node-facing operations used by the contract facades and the registry.
#[async_trait]
pub trait TezosNode: Send + Sync {
    /// Entrypoint names exposed by a contract.
    async fn entrypoints(&self, address: &str) -> Result<Vec<String>, TezosError>;

    /// Call a contract entrypoint and wait for inclusion. Returns the
    /// operation hash.
    async fn call_contract(
        &self,
        signer: &dyn Signer,
        destination: &str,
        parameters: Parameters,
    ) -> Result<String, TezosError>;

    /// Originate a contract and wait for inclusion.
    async fn originate(&self, signer: &dyn Signer, script: Script)
        -> Result<Origination, TezosError>;
}

/// Fee (mutez), gas and storage limits applied to each operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub fee: u64,
    pub gas_limit: u64,
    pub storage_limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationLimits {
    pub reveal: Limits,
    pub transaction: Limits,
    pub origination: Limits,
}

impl Default for OperationLimits {
    fn default() -> Self {
        Self {
            reveal: Limits {
                fee: 1_000,
                gas_limit: 1_000,
                storage_limit: 0,
            },
            transaction: Limits {
                fee: 50_000,
                gas_limit: 200_000,
                storage_limit: 1_000,
            },
            origination: Limits {
                fee: 200_000,
                gas_limit: 200_000,
                storage_limit: 60_000,
            },
        }
    }
}

/// Node RPC client.
#[derive(Debug, Clone)]
pub struct RpcNode {
    rpc_url: String,
    limits: OperationLimits,
    poll_interval: Duration,
    max_wait_blocks: u64,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct BlockHeader {
    level: u64,
}

#[derive(Debug, Deserialize)]
struct EntrypointsResponse {
    entrypoints: serde_json::Map<String, Value>,
}

impl RpcNode {
    pub fn new(rpc_url: impl Into<String>) -> Result<Self, TezosError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TezosError::Rpc(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            rpc_url: rpc_url.into(),
            limits: OperationLimits::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait_blocks: DEFAULT_MAX_WAIT_BLOCKS,
            http,
        })
    }

    pub fn with_limits(mut self, limits: OperationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_wait_blocks(mut self, max_wait_blocks: u64) -> Self {
        self.max_wait_blocks = max_wait_blocks;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.rpc_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, TezosError> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| TezosError::Rpc(format!("GET {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TezosError::Rpc(format!("GET {path} returned {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| TezosError::InvalidResponse(format!("GET {path} invalid JSON: {e}")))
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        payload: &Value,
    ) -> Result<T, TezosError> {
        let response = self
            .http
            .post(self.url(path))
            .json(payload)
            .send()
            .await
            .map_err(|e| TezosError::Rpc(format!("POST {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TezosError::Rpc(format!("POST {path} returned {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| TezosError::InvalidResponse(format!("POST {path} invalid JSON: {e}")))
    }

    async fn head_level(&self) -> Result<u64, TezosError> {
        let header: BlockHeader = self.get_json("/chains/main/blocks/head/header").await?;
        Ok(header.level)
    }

    /// Forge, sign, inject and confirm `operations` (contents without
    /// `source`/`counter`). Returns the hash and the applied contents.
    async fn submit(
        &self,
        signer: &dyn Signer,
        operations: Vec<(Value, Limits)>,
    ) -> Result<(String, Vec<Value>), TezosError> {
        let source = signer.public_key_hash().to_string();

        let counter: String = self
            .get_json(&format!(
                "/chains/main/blocks/head/context/contracts/{source}/counter"
            ))
            .await?;
        let mut counter: u64 = counter
            .parse()
            .map_err(|e| TezosError::InvalidResponse(format!("counter {counter}: {e}")))?;

        let manager_key: Value = self
            .get_json(&format!(
                "/chains/main/blocks/head/context/contracts/{source}/manager_key"
            ))
            .await?;

        let mut contents = Vec::with_capacity(operations.len() + 1);
        if manager_key.is_null() {
            debug!(source = %source, "Prepending reveal");
            let public_key = signer.public_key().await?;
            let mut reveal = json!({ "kind": "reveal", "public_key": public_key });
            counter += 1;
            fill_manager_fields(&mut reveal, &source, counter, self.limits.reveal);
            contents.push(reveal);
        }
        for (mut operation, limits) in operations {
            counter += 1;
            fill_manager_fields(&mut operation, &source, counter, limits);
            contents.push(operation);
        }

        let branch: String = self.get_json("/chains/main/blocks/head/hash").await?;
        let level = self.head_level().await?;

        let forged: String = self
            .post_json(
                "/chains/main/blocks/head/helpers/forge/operations",
                &json!({ "branch": branch, "contents": contents }),
            )
            .await?;
        let forged_bytes = hex::decode(&forged)
            .map_err(|e| TezosError::InvalidResponse(format!("forged bytes: {e}")))?;

        let mut watermarked = Vec::with_capacity(forged_bytes.len() + 1);
        watermarked.push(GENERIC_OPERATION_WATERMARK);
        watermarked.extend_from_slice(&forged_bytes);
        let signature = signer.sign(&watermarked).await?;

        let signed = format!("{forged}{}", hex::encode(signature));
        let hash: String = self
            .post_json("/injection/operation", &Value::String(signed))
            .await?;
        info!(operation = %hash, source = %source, "Operation injected, awaiting confirmation");

        let applied = self.wait_for_inclusion(&hash, level).await?;
        check_applied(&hash, &applied)?;
        info!(operation = %hash, "Operation confirmed");
        Ok((hash, applied))
    }

    /// Scan blocks from `from_level` on until `hash` is included, returning
    /// the operation contents with their metadata.
    async fn wait_for_inclusion(&self, hash: &str, from_level: u64) -> Result<Vec<Value>, TezosError> {
        let last_level = from_level.saturating_add(self.max_wait_blocks);
        let mut next_level = from_level;
        loop {
            let head = self.head_level().await?;
            while next_level <= head {
                let operations: Vec<Value> = self
                    .get_json(&format!(
                        "/chains/main/blocks/{next_level}/operations/{MANAGER_PASS}"
                    ))
                    .await?;
                if let Some(contents) = find_operation(&operations, hash) {
                    debug!(operation = %hash, level = next_level, "Operation included");
                    return Ok(contents);
                }
                next_level += 1;
            }
            if next_level > last_level {
                warn!(operation = %hash, from_level, last_level, "Operation not included");
                return Err(TezosError::NotIncluded {
                    hash: hash.to_string(),
                    blocks: self.max_wait_blocks + 1,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn fill_manager_fields(operation: &mut Value, source: &str, counter: u64, limits: Limits) {
    if let Value::Object(fields) = operation {
        fields.insert("source".into(), json!(source));
        fields.insert("counter".into(), json!(counter.to_string()));
        fields.insert("fee".into(), json!(limits.fee.to_string()));
        fields.insert("gas_limit".into(), json!(limits.gas_limit.to_string()));
        fields.insert("storage_limit".into(), json!(limits.storage_limit.to_string()));
    }
}

fn find_operation(operations: &[Value], hash: &str) -> Option<Vec<Value>> {
    operations
        .iter()
        .find(|op| op.get("hash").and_then(Value::as_str) == Some(hash))
        .and_then(|op| op.get("contents"))
        .and_then(Value::as_array)
        .cloned()
}

fn check_applied(hash: &str, contents: &[Value]) -> Result<(), TezosError> {
    for content in contents {
        let result = &content["metadata"]["operation_result"];
        let status = result["status"].as_str().unwrap_or("unknown");
        if status != "applied" {
            let reason = match result.get("errors") {
                Some(errors) => format!("{status}: {errors}"),
                None => status.to_string(),
            };
            return Err(TezosError::OperationRejected {
                hash: hash.to_string(),
                reason,
            });
        }
    }
    Ok(())
}

#[async_trait]
impl TezosNode for RpcNode {
    async fn entrypoints(&self, address: &str) -> Result<Vec<String>, TezosError> {
        let response: EntrypointsResponse = self
            .get_json(&format!(
                "/chains/main/blocks/head/context/contracts/{address}/entrypoints"
            ))
            .await?;
        Ok(response.entrypoints.keys().cloned().collect())
    }

    async fn call_contract(
        &self,
        signer: &dyn Signer,
        destination: &str,
        parameters: Parameters,
    ) -> Result<String, TezosError> {
        let transaction = json!({
            "kind": "transaction",
            "amount": "0",
            "destination": destination,
            "parameters": parameters,
        });
        let (hash, _) = self
            .submit(signer, vec![(transaction, self.limits.transaction)])
            .await?;
        Ok(hash)
    }

    async fn originate(
        &self,
        signer: &dyn Signer,
        script: Script,
    ) -> Result<Origination, TezosError> {
        let origination = json!({
            "kind": "origination",
            "balance": "0",
            "script": script,
        });
        let (hash, contents) = self
            .submit(signer, vec![(origination, self.limits.origination)])
            .await?;

        let contract_address = contents
            .iter()
            .filter_map(|c| c["metadata"]["operation_result"]["originated_contracts"].as_array())
            .flatten()
            .find_map(Value::as_str)
            .ok_or_else(|| {
                TezosError::InvalidResponse(format!("{hash}: no originated contract in result"))
            })?
            .to_string();

        Ok(Origination {
            operation_hash: hash,
            contract_address,
        })
    }
}
