// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Indexer Clients
//!
//! Read access to contract storage, big-maps, operations and events through a
//! third-party block indexer.
//!
//! ## Backends
//!
//! | Backend | Storage | Big-map keys | Event time field |
//! |---------|---------|--------------|------------------|
//! | Tzkt | raw named storage | named records | `timestamp` |
//! | Tzstats | `{value, prim}` | flat positional tuples | `time` |
//!
//! The backend is picked explicitly from configuration ([`IndexerBackend`]).
//! Each implementation normalizes its own shapes: records (big-map keys,
//! entries of lists held in storage) come back as positional field values in
//! the order of a [`RecordSchema`], and events carry a parsed timestamp.
//! Callers never branch on the backend.

pub mod tzkt;
pub mod tzstats;

use std::{fmt, str::FromStr, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use tzkt::TzktClient;
pub use tzstats::TzstatsClient;

/// Indexer layer errors.
#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("Indexer request failed: {0}")]
    Request(String),

    #[error("Indexer response was invalid: {0}")]
    InvalidResponse(String),

    #[error("Unexpected indexer data shape: {0}")]
    UnexpectedShape(String),
}

/// Which indexer API the configured URL speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexerBackend {
    #[default]
    Tzkt,
    Tzstats,
}

impl fmt::Display for IndexerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tzkt => write!(f, "tzkt"),
            Self::Tzstats => write!(f, "tzstats"),
        }
    }
}

impl FromStr for IndexerBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tzkt" => Ok(Self::Tzkt),
            "tzstats" => Ok(Self::Tzstats),
            other => Err(format!("unknown indexer backend `{other}` (expected tzkt or tzstats)")),
        }
    }
}

/// Field names of a Michelson record in left-to-right pair order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSchema(pub &'static [&'static str]);

impl RecordSchema {
    /// A single scalar (e.g. a `nat` or `string` big-map key).
    pub const SCALAR: RecordSchema = RecordSchema(&["value"]);

    pub fn fields(&self) -> &'static [&'static str] {
        self.0
    }
}

/// Raw contract storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractStorage {
    pub value: Value,
    /// Michelson primitives, only returned by backends that support them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prim: Option<Value>,
}

impl ContractStorage {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.value.get(name)
    }

    /// String field of the storage record.
    pub fn string_field(&self, name: &str) -> Result<String, IndexerError> {
        self.field(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| IndexerError::UnexpectedShape(format!("storage field `{name}` is not a string")))
    }

    /// Big-map pointer held in a storage field.
    ///
    /// Empty big-maps can be reported as `null`; that and a missing field both
    /// yield `None`.
    pub fn big_map_id(&self, name: &str) -> Result<Option<u64>, IndexerError> {
        match self.field(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => as_nat(value).map(Some),
        }
    }
}

/// Active big-map entry with its key normalized to a [`RecordSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct BigMapEntry {
    pub key: Vec<Value>,
    pub value: Value,
}

/// Contract event, normalized across backends.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEvent {
    pub id: u64,
    pub tag: String,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
    /// Record as returned by the indexer.
    pub raw: Value,
}

#[async_trait]
pub trait IndexerClient: Send + Sync {
    fn backend(&self) -> IndexerBackend;

    async fn contract_storage(&self, address: &str) -> Result<ContractStorage, IndexerError>;

    /// All active entries of a big-map, keys normalized to `key_schema`.
    async fn big_map_values(
        &self,
        big_map_id: u64,
        key_schema: RecordSchema,
    ) -> Result<Vec<BigMapEntry>, IndexerError>;

    /// Operation records of one operation group.
    async fn operation(&self, hash: &str) -> Result<Vec<Value>, IndexerError>;

    /// Events emitted by a contract, oldest first, optionally restricted to a tag.
    async fn events(
        &self,
        address: &str,
        tag: Option<&str>,
    ) -> Result<Vec<IndexedEvent>, IndexerError>;

    /// Normalize a record rendered by this backend into positional fields.
    fn normalize_record(&self, raw: &Value, schema: RecordSchema) -> Result<Vec<Value>, IndexerError>;
}

/// Build the client for the configured backend.
pub fn connect(backend: IndexerBackend, base_url: &str) -> Result<Arc<dyn IndexerClient>, IndexerError> {
    Ok(match backend {
        IndexerBackend::Tzkt => Arc::new(TzktClient::new(base_url)?),
        IndexerBackend::Tzstats => Arc::new(TzstatsClient::new(base_url)?),
    })
}

/// Natural number that indexers render either as a JSON number or a string.
pub fn as_nat(value: &Value) -> Result<u64, IndexerError> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| IndexerError::UnexpectedShape(format!("expected a natural number, got {value}")))
}

/// Text value of a field (strings as-is, numbers rendered).
pub fn as_text(value: &Value) -> Result<String, IndexerError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(IndexerError::UnexpectedShape(format!("expected text, got {other}"))),
    }
}

/// Look up a field by name in a (possibly nested) named record.
///
/// Tzkt nests sub-records (`{"kyc": .., "token": {"token_id": .., ..}}`); the
/// first match in breadth-first order wins.
fn find_named_field<'a>(record: &'a serde_json::Map<String, Value>, name: &str) -> Option<&'a Value> {
    if let Some(value) = record.get(name) {
        return Some(value);
    }
    record
        .values()
        .filter_map(Value::as_object)
        .find_map(|nested| find_named_field(nested, name))
}

/// Normalize a named record into schema order.
fn named_record(
    record: &serde_json::Map<String, Value>,
    schema: RecordSchema,
) -> Result<Vec<Value>, IndexerError> {
    schema
        .fields()
        .iter()
        .map(|field| {
            find_named_field(record, field).cloned().ok_or_else(|| {
                IndexerError::UnexpectedShape(format!("record has no field `{field}`"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn backend_parses_from_config_values() {
        assert_eq!("tzkt".parse::<IndexerBackend>().unwrap(), IndexerBackend::Tzkt);
        assert_eq!(" TzStats ".parse::<IndexerBackend>().unwrap(), IndexerBackend::Tzstats);
        assert!("https://api.tzstats.com".parse::<IndexerBackend>().is_err());
    }

    #[test]
    fn big_map_pointer_handles_null_and_strings() {
        let storage = ContractStorage {
            value: json!({ "ledger": null, "metadata": "42", "token_metadata": 7 }),
            prim: None,
        };
        assert_eq!(storage.big_map_id("ledger").unwrap(), None);
        assert_eq!(storage.big_map_id("missing").unwrap(), None);
        assert_eq!(storage.big_map_id("metadata").unwrap(), Some(42));
        assert_eq!(storage.big_map_id("token_metadata").unwrap(), Some(7));
    }

    #[test]
    fn named_record_searches_nested_records() {
        let key = json!({ "kyc": "0501", "token": { "token_id": "1", "token_address": "KT1X" } });
        let fields = named_record(
            key.as_object().unwrap(),
            RecordSchema(&["kyc", "token_address", "token_id"]),
        )
        .unwrap();
        assert_eq!(fields, vec![json!("0501"), json!("KT1X"), json!("1")]);

        let err = named_record(key.as_object().unwrap(), RecordSchema(&["owner"])).unwrap_err();
        assert!(matches!(err, IndexerError::UnexpectedShape(_)));
    }
}
