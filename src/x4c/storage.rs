// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Views
//!
//! Read models of one FA2 or Custodian contract, built from indexer data.
//!
//! ## Caching
//!
//! A view fetches each item (contract storage, each big-map) at most once
//! and keeps it for its own lifetime. Cells are [`OnceCell`]s, so concurrent
//! readers of one view share a single in-flight fetch; a failed fetch leaves
//! the cell empty for the next caller. Nothing is invalidated: build a new
//! view to observe newer chain state.
//!
//! ## Big-map pointers
//!
//! Indexers report an empty big-map pointer as `null`. Such a pointer reads
//! as an empty collection without a big-map request.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::indexer::{
    as_nat, as_text, BigMapEntry, ContractStorage, IndexerClient, IndexerError, RecordSchema,
};
use crate::tezos::encoding::{hex_to_text, michelson_bytes_to_string};

use super::events::TokenRef;

pub const CUSTODIAN_LEDGER_KEY: RecordSchema = RecordSchema(&["kyc", "token_address", "token_id"]);
pub const EXTERNAL_LEDGER_KEY: RecordSchema = RecordSchema(&["token_address", "token_id"]);
pub const FA2_LEDGER_KEY: RecordSchema = RecordSchema(&["token_owner", "token_id"]);
pub const OPERATOR_RECORD: RecordSchema = RecordSchema(&["token_owner", "token_operator", "token_id"]);
pub const TOKEN_METADATA_VALUE: RecordSchema = RecordSchema(&["token_id", "token_info"]);

/// Custodian ledger entry: `amount` of an FA2 token held for `kyc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustodianLedgerEntry {
    pub kyc: String,
    /// FA2 contract that minted the token.
    pub minter: String,
    pub token_id: u64,
    pub amount: u64,
}

/// FA2 ledger entry. FA2 ledgers are keyed by owner and token only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fa2LedgerEntry {
    pub owner: String,
    pub token_id: u64,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operator {
    /// Owner identity, decoded from Michelson bytes on the Custodian.
    pub owner: String,
    pub operator: String,
    pub token_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenMetadata {
    pub token_id: u64,
    /// `token_info` with byte values decoded to text where possible.
    pub token_info: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalLedgerEntry {
    pub token: TokenRef,
    pub amount: u64,
}

/// Storage fetch shared by both views.
struct StorageCache {
    indexer: Arc<dyn IndexerClient>,
    address: String,
    info: OnceCell<ContractStorage>,
}

impl StorageCache {
    fn new(indexer: Arc<dyn IndexerClient>, address: String) -> Self {
        Self {
            indexer,
            address,
            info: OnceCell::new(),
        }
    }

    async fn info(&self) -> Result<&ContractStorage, IndexerError> {
        self.info
            .get_or_try_init(|| self.indexer.contract_storage(&self.address))
            .await
    }

    async fn big_map<'a>(
        &self,
        cell: &'a OnceCell<Vec<BigMapEntry>>,
        field: &str,
        key_schema: RecordSchema,
    ) -> Result<&'a [BigMapEntry], IndexerError> {
        let entries = cell
            .get_or_try_init(|| async {
                match self.info().await?.big_map_id(field)? {
                    Some(id) => self.indexer.big_map_values(id, key_schema).await,
                    None => Ok(Vec::new()),
                }
            })
            .await?;
        Ok(entries.as_slice())
    }

    /// Operator list embedded in storage.
    async fn operators(&self, decode_owner: bool) -> Result<Vec<Operator>, IndexerError> {
        let raw = match self.info().await?.field("operators") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(IndexerError::UnexpectedShape(format!(
                    "operators is not a list: {other}"
                )))
            }
        };

        raw.iter()
            .map(|item| {
                let fields = self.indexer.normalize_record(item, OPERATOR_RECORD)?;
                let owner = as_text(&fields[0])?;
                Ok(Operator {
                    owner: if decode_owner {
                        michelson_bytes_to_string(&owner)
                    } else {
                        owner
                    },
                    operator: as_text(&fields[1])?,
                    token_id: as_nat(&fields[2])?,
                })
            })
            .collect()
    }
}

/// String-keyed metadata big-map with byte values (TZIP-16 `metadata`).
fn text_map(entries: &[BigMapEntry]) -> Result<BTreeMap<String, String>, IndexerError> {
    entries
        .iter()
        .map(|entry| {
            let value = as_text(&entry.value)?;
            let text = hex_to_text(&value).unwrap_or(value);
            Ok((as_text(&entry.key[0])?, text))
        })
        .collect()
}

/// Read model of a Custodian contract.
pub struct CustodianStorage {
    cache: StorageCache,
    ledger: OnceCell<Vec<BigMapEntry>>,
    external_ledger: OnceCell<Vec<BigMapEntry>>,
    metadata: OnceCell<Vec<BigMapEntry>>,
}

impl CustodianStorage {
    pub fn new(indexer: Arc<dyn IndexerClient>, address: impl Into<String>) -> Self {
        Self {
            cache: StorageCache::new(indexer, address.into()),
            ledger: OnceCell::new(),
            external_ledger: OnceCell::new(),
            metadata: OnceCell::new(),
        }
    }

    pub fn address(&self) -> &str {
        &self.cache.address
    }

    pub async fn custodian_address(&self) -> Result<String, IndexerError> {
        self.cache.info().await?.string_field("custodian")
    }

    pub async fn ledger(&self) -> Result<Vec<CustodianLedgerEntry>, IndexerError> {
        let entries = self
            .cache
            .big_map(&self.ledger, "ledger", CUSTODIAN_LEDGER_KEY)
            .await?;

        entries
            .iter()
            .map(|entry| {
                Ok(CustodianLedgerEntry {
                    kyc: michelson_bytes_to_string(&as_text(&entry.key[0])?),
                    minter: as_text(&entry.key[1])?,
                    token_id: as_nat(&entry.key[2])?,
                    amount: as_nat(&entry.value)?,
                })
            })
            .collect()
    }

    pub async fn external_ledger(&self) -> Result<Vec<ExternalLedgerEntry>, IndexerError> {
        let entries = self
            .cache
            .big_map(&self.external_ledger, "external_ledger", EXTERNAL_LEDGER_KEY)
            .await?;

        entries
            .iter()
            .map(|entry| {
                Ok(ExternalLedgerEntry {
                    token: TokenRef {
                        token_address: as_text(&entry.key[0])?,
                        token_id: as_nat(&entry.key[1])?,
                    },
                    amount: as_nat(&entry.value)?,
                })
            })
            .collect()
    }

    pub async fn operators(&self) -> Result<Vec<Operator>, IndexerError> {
        self.cache.operators(true).await
    }

    pub async fn metadata(&self) -> Result<BTreeMap<String, String>, IndexerError> {
        let entries = self
            .cache
            .big_map(&self.metadata, "metadata", RecordSchema::SCALAR)
            .await?;
        text_map(entries)
    }
}

/// Read model of an FA2 contract.
pub struct Fa2Storage {
    cache: StorageCache,
    ledger: OnceCell<Vec<BigMapEntry>>,
    token_metadata: OnceCell<Vec<BigMapEntry>>,
    metadata: OnceCell<Vec<BigMapEntry>>,
}

impl Fa2Storage {
    pub fn new(indexer: Arc<dyn IndexerClient>, address: impl Into<String>) -> Self {
        Self {
            cache: StorageCache::new(indexer, address.into()),
            ledger: OnceCell::new(),
            token_metadata: OnceCell::new(),
            metadata: OnceCell::new(),
        }
    }

    pub fn address(&self) -> &str {
        &self.cache.address
    }

    pub async fn oracle_address(&self) -> Result<String, IndexerError> {
        self.cache.info().await?.string_field("oracle")
    }

    pub async fn ledger(&self) -> Result<Vec<Fa2LedgerEntry>, IndexerError> {
        let entries = self
            .cache
            .big_map(&self.ledger, "ledger", FA2_LEDGER_KEY)
            .await?;

        entries
            .iter()
            .map(|entry| {
                Ok(Fa2LedgerEntry {
                    owner: as_text(&entry.key[0])?,
                    token_id: as_nat(&entry.key[1])?,
                    amount: as_nat(&entry.value)?,
                })
            })
            .collect()
    }

    pub async fn operators(&self) -> Result<Vec<Operator>, IndexerError> {
        self.cache.operators(false).await
    }

    pub async fn token_metadata(&self) -> Result<Vec<TokenMetadata>, IndexerError> {
        let entries = self
            .cache
            .big_map(&self.token_metadata, "token_metadata", RecordSchema::SCALAR)
            .await?;

        entries
            .iter()
            .map(|entry| {
                let fields = self
                    .cache
                    .indexer
                    .normalize_record(&entry.value, TOKEN_METADATA_VALUE)?;
                let token_info = match &fields[1] {
                    Value::Object(info) => info
                        .iter()
                        .map(|(k, v)| {
                            let value = as_text(v)?;
                            Ok((k.clone(), hex_to_text(&value).unwrap_or(value)))
                        })
                        .collect::<Result<_, IndexerError>>()?,
                    Value::Null => BTreeMap::new(),
                    other => {
                        return Err(IndexerError::UnexpectedShape(format!(
                            "token_info is not a map: {other}"
                        )))
                    }
                };
                Ok(TokenMetadata {
                    token_id: as_nat(&fields[0])?,
                    token_info,
                })
            })
            .collect()
    }

    pub async fn metadata(&self) -> Result<BTreeMap<String, String>, IndexerError> {
        let entries = self
            .cache
            .big_map(&self.metadata, "metadata", RecordSchema::SCALAR)
            .await?;
        text_map(entries)
    }
}
