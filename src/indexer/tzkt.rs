// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tzkt API backend (`{base}/v1/...`).

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

const API_VERSION: &str = "v1";

/// Tzkt caps `limit` at 10000; smaller pages keep responses modest.
const PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct TzktClient {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct BigMapKey {
    key: Value,
    value: Value,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ContractEvent {
    id: u64,
    #[serde(default)]
    tag: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    payload: Value,
}

impl TzktClient {
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
        let url = format!(
            "{}/{API_VERSION}/{}",
            self.base_url.trim_end_matches('/'),
            path
        );
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
impl IndexerClient for TzktClient {
    fn backend(&self) -> IndexerBackend {
        IndexerBackend::Tzkt
    }

    async fn contract_storage(&self, address: &str) -> Result<ContractStorage, IndexerError> {
        let value = self
            .get_json(&format!("contracts/{address}/storage"), &[])
            .await?;
        Ok(ContractStorage { value, prim: None })
    }

    async fn big_map_values(
        &self,
        big_map_id: u64,
        key_schema: RecordSchema,
    ) -> Result<Vec<BigMapEntry>, IndexerError> {
        let path = format!("bigmaps/{big_map_id}/keys");
        let mut entries = Vec::new();
        let mut offset = 0;

        loop {
            let page: Vec<BigMapKey> = self
                .get_json(
                    &path,
                    &[
                        ("active", "true".to_string()),
                        ("limit", PAGE_SIZE.to_string()),
                        ("offset", offset.to_string()),
                    ],
                )
                .await?;
            let fetched = page.len();

            for item in page.into_iter().filter(|item| item.active) {
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

        debug!(big_map = big_map_id, entries = entries.len(), "Fetched big-map keys");
        Ok(entries)
    }

    async fn operation(&self, hash: &str) -> Result<Vec<Value>, IndexerError> {
        self.get_json(&format!("operations/{hash}"), &[]).await
    }

    async fn events(
        &self,
        address: &str,
        tag: Option<&str>,
    ) -> Result<Vec<IndexedEvent>, IndexerError> {
        let mut query = vec![("contract", address.to_string())];
        if let Some(tag) = tag {
            query.push(("tag", tag.to_string()));
        }
        let raw: Vec<Value> = self.get_json("contracts/events", &query).await?;

        raw.into_iter()
            .map(|record| {
                let event: ContractEvent = serde_json::from_value(record.clone()).map_err(|e| {
                    IndexerError::InvalidResponse(format!("contract event: {e}"))
                })?;
                Ok(IndexedEvent {
                    id: event.id,
                    tag: event.tag,
                    timestamp: event.timestamp,
                    payload: event.payload,
                    raw: record,
                })
            })
            .collect()
    }

    /// Tzkt renders annotated records as (nested) JSON objects.
    fn normalize_record(&self, raw: &Value, schema: RecordSchema) -> Result<Vec<Value>, IndexerError> {
        match raw {
            Value::Object(record) if schema != RecordSchema::SCALAR => named_record(record, schema),
            Value::Object(_) | Value::Array(_) if schema == RecordSchema::SCALAR => Err(
                IndexerError::UnexpectedShape(format!("expected a scalar, got {raw}")),
            ),
            scalar if schema == RecordSchema::SCALAR => Ok(vec![scalar.clone()]),
            other => Err(IndexerError::UnexpectedShape(format!(
                "expected a record with fields {:?}, got {other}",
                schema.fields()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    const CUSTODIAN_LEDGER: RecordSchema = RecordSchema(&["kyc", "token_address", "token_id"]);

    #[tokio::test]
    async fn storage_is_returned_raw() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/contracts/KT1Custodian/storage")
            .with_body(r#"{"custodian": "tz1abc", "ledger": 12, "operators": []}"#)
            .create_async()
            .await;

        let client = TzktClient::new(server.url()).unwrap();
        let storage = client.contract_storage("KT1Custodian").await.unwrap();
        assert_eq!(storage.string_field("custodian").unwrap(), "tz1abc");
        assert_eq!(storage.big_map_id("ledger").unwrap(), Some(12));
        assert!(storage.prim.is_none());
    }

    #[tokio::test]
    async fn big_map_keys_are_normalized_and_inactive_dropped() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/v1/bigmaps/12/keys")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("active".into(), "true".into()),
                Matcher::UrlEncoded("offset".into(), "0".into()),
            ]))
            .with_body(
                json!([
                    {
                        "id": 1, "active": true, "hash": "expr1",
                        "key": { "kyc": "05010000000473656c66", "token": { "token_id": "0", "token_address": "KT1Fa2" } },
                        "value": "100", "firstLevel": 1, "lastLevel": 2, "updates": 1
                    },
                    {
                        "id": 2, "active": false, "hash": "expr2",
                        "key": { "kyc": "gone", "token": { "token_id": "1", "token_address": "KT1Fa2" } },
                        "value": "0", "firstLevel": 1, "lastLevel": 2, "updates": 2
                    }
                ])
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let client = TzktClient::new(server.url()).unwrap();
        let entries = client.big_map_values(12, CUSTODIAN_LEDGER).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].key,
            vec![json!("05010000000473656c66"), json!("KT1Fa2"), json!("0")]
        );
        assert_eq!(entries[0].value, json!("100"));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn full_pages_are_followed_by_the_next_offset() {
        const FA2_LEDGER: RecordSchema = RecordSchema(&["token_owner", "token_id"]);
        let page = |start: usize, count: usize| {
            let keys: Vec<Value> = (start..start + count)
                .map(|i| {
                    json!({
                        "id": i, "active": true, "hash": format!("expr{i}"),
                        "key": { "token_owner": format!("tz1owner{i}"), "token_id": i.to_string() },
                        "value": "1"
                    })
                })
                .collect();
            Value::Array(keys).to_string()
        };

        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/v1/bigmaps/31/keys")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("limit".into(), "1000".into()),
                Matcher::UrlEncoded("offset".into(), "0".into()),
            ]))
            .with_body(page(0, PAGE_SIZE))
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/v1/bigmaps/31/keys")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("limit".into(), "1000".into()),
                Matcher::UrlEncoded("offset".into(), "1000".into()),
            ]))
            .with_body(page(PAGE_SIZE, 2))
            .expect(1)
            .create_async()
            .await;

        let client = TzktClient::new(server.url()).unwrap();
        let entries = client.big_map_values(31, FA2_LEDGER).await.unwrap();
        assert_eq!(entries.len(), PAGE_SIZE + 2);
        assert_eq!(entries[1001].key, vec![json!("tz1owner1001"), json!("1001")]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn events_parse_timestamp_and_pass_tag_filter() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/contracts/events")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("contract".into(), "KT1Custodian".into()),
                Matcher::UrlEncoded("tag".into(), "retire".into()),
            ]))
            .with_body(
                json!([{
                    "id": 77, "level": 10, "timestamp": "2022-10-01T12:00:00Z",
                    "contract": { "address": "KT1Custodian" }, "codeHash": 1,
                    "tag": "retire", "payload": "6f6666736574", "transactionId": 5
                }])
                .to_string(),
            )
            .create_async()
            .await;

        let client = TzktClient::new(server.url()).unwrap();
        let events = client.events("KT1Custodian", Some("retire")).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, 77);
        assert_eq!(events[0].tag, "retire");
        assert_eq!(events[0].timestamp.to_rfc3339(), "2022-10-01T12:00:00+00:00");
        assert_eq!(events[0].raw["transactionId"], json!(5));
    }

    #[tokio::test]
    async fn failed_request_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/operations/ooMissing")
            .with_status(404)
            .create_async()
            .await;

        let client = TzktClient::new(server.url()).unwrap();
        let err = client.operation("ooMissing").await.unwrap_err();
        assert!(matches!(err, IndexerError::Request(msg) if msg.contains("404")));
    }

    #[test]
    fn scalar_keys_pass_through() {
        let client = TzktClient::new("http://localhost").unwrap();
        assert_eq!(
            client.normalize_record(&json!("1"), RecordSchema::SCALAR).unwrap(),
            vec![json!("1")]
        );
        assert!(client.normalize_record(&json!(["a", "b"]), CUSTODIAN_LEDGER).is_err());
    }
}
