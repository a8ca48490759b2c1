// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tzstats explorer API backend (`{base}/explorer/...`).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{
    named_record, BigMapEntry, ContractStorage, IndexedEvent, IndexerBackend, IndexerClient,
    IndexerError, RecordSchema,
};

const PAGE_SIZE: usize = 500;

#[derive(Debug, Clone)]
pub struct TzstatsClient {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct StorageResponse {
    value: Value,
    #[serde(default)]
    prim: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct BigMapValue {
    key: Value,
    value: Value,
}

#[derive(Debug, Deserialize)]
struct ContractEvent {
    #[serde(alias = "row_id")]
    id: u64,
    #[serde(default)]
    tag: String,
    time: DateTime<Utc>,
    #[serde(default)]
    payload: Value,
}

impl TzstatsClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, IndexerError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| IndexerError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, IndexerError> {
        let url = format!("{}/explorer/{}", self.base_url.trim_end_matches('/'), path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| IndexerError::Request(format!("GET {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IndexerError::Request(format!(
                "GET {path} returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| IndexerError::InvalidResponse(format!("GET {path} invalid JSON: {e}")))
    }
}

#[async_trait]
impl IndexerClient for TzstatsClient {
    fn backend(&self) -> IndexerBackend {
        IndexerBackend::Tzstats
    }

    async fn contract_storage(&self, address: &str) -> Result<ContractStorage, IndexerError> {
        let storage: StorageResponse = self
            .get_json(&format!("contract/{address}/storage"), &[])
            .await?;
        Ok(ContractStorage {
            value: storage.value,
            prim: storage.prim,
        })
    }

    async fn big_map_values(
        &self,
        big_map_id: u64,
        key_schema: RecordSchema,
    ) -> Result<Vec<BigMapEntry>, IndexerError> {
        let path = format!("bigmap/{big_map_id}/values");
        let mut entries = Vec::new();
        let mut offset = 0;

        loop {
            let page: Vec<BigMapValue> = self
                .get_json(
                    &path,
                    &[
                        ("limit", PAGE_SIZE.to_string()),
                        ("offset", offset.to_string()),
                    ],
                )
                .await?;
            let fetched = page.len();

            for item in page {
                entries.push(BigMapEntry {
                    key: self.normalize_record(&item.key, key_schema)?,
                    value: item.value,
                });
            }

            if fetched < PAGE_SIZE {
                break;
            }
            offset += fetched;
        }

        debug!(big_map = big_map_id, entries = entries.len(), "Fetched big-map values");
        Ok(entries)
    }

    async fn operation(&self, hash: &str) -> Result<Vec<Value>, IndexerError> {
        self.get_json(&format!("op/{hash}"), &[]).await
    }

    async fn events(
        &self,
        address: &str,
        tag: Option<&str>,
    ) -> Result<Vec<IndexedEvent>, IndexerError> {
        let raw: Vec<Value> = self
            .get_json(&format!("contract/{address}/events"), &[])
            .await?;

        let mut events = Vec::with_capacity(raw.len());
        for record in raw {
            let event: ContractEvent = serde_json::from_value(record.clone())
                .map_err(|e| IndexerError::InvalidResponse(format!("contract event: {e}")))?;
            if tag.is_some_and(|tag| tag != event.tag) {
                continue;
            }
            events.push(IndexedEvent {
                id: event.id,
                tag: event.tag,
                timestamp: event.time,
                payload: event.payload,
                raw: record,
            });
        }
        Ok(events)
    }

    /// Tzstats renders pair keys as flat tuples, either as arrays or as
    /// objects keyed by position (`"0"`, `"1"`, ...). Values of annotated
    /// records keep their field names.
    fn normalize_record(&self, raw: &Value, schema: RecordSchema) -> Result<Vec<Value>, IndexerError> {
        let arity = schema.fields().len();
        match raw {
            Value::Array(tuple) if schema != RecordSchema::SCALAR => {
                if tuple.len() != arity {
                    return Err(IndexerError::UnexpectedShape(format!(
                        "expected a {arity}-tuple for {:?}, got {raw}",
                        schema.fields()
                    )));
                }
                Ok(tuple.clone())
            }
            Value::Object(record) if schema != RecordSchema::SCALAR => {
                let positional: Option<Vec<Value>> = (0..arity)
                    .map(|i| record.get(&i.to_string()).cloned())
                    .collect();
                match positional {
                    Some(fields) if record.len() == arity => Ok(fields),
                    _ => named_record(record, schema),
                }
            }
            Value::Object(_) | Value::Array(_) => Err(IndexerError::UnexpectedShape(format!(
                "expected a scalar, got {raw}"
            ))),
            scalar if schema == RecordSchema::SCALAR => Ok(vec![scalar.clone()]),
            other => Err(IndexerError::UnexpectedShape(format!(
                "expected a record with fields {:?}, got {other}",
                schema.fields()
            ))),
        }
    }
}
