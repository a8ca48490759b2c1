// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed contract events.
//!
//! | Tag | Payload |
//! |-----|---------|
//! | `retire` | hex bytes of the UTF-8 retirement reason |
//! | `internal_mint` | `{token: {token_id, token_address}, amount, new_total}` |
//! | `internal_transfer` | `{from, to, token, amount}`, identities as Michelson bytes |
//!
//! Unknown tags, and payloads that do not match their tag, are kept raw.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::indexer::{as_nat, as_text, IndexedEvent, IndexerError};
use crate::tezos::encoding::{hex_to_text, michelson_bytes_to_string};

pub const RETIRE_TAG: &str = "retire";
pub const INTERNAL_MINT_TAG: &str = "internal_mint";
pub const INTERNAL_TRANSFER_TAG: &str = "internal_transfer";

/// FA2 token as referenced from the Custodian contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRef {
    pub token_address: String,
    pub token_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    Retire {
        reason: String,
    },
    InternalMint {
        token: TokenRef,
        amount: u64,
        new_total: u64,
    },
    InternalTransfer {
        from: String,
        to: String,
        token: TokenRef,
        amount: u64,
    },
    Other {
        payload: Value,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractEvent {
    pub id: u64,
    pub tag: String,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl From<IndexedEvent> for ContractEvent {
    fn from(event: IndexedEvent) -> Self {
        let payload = match decode_payload(&event.tag, &event.payload) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(event = event.id, tag = %event.tag, error = %e, "Keeping undecodable event payload raw");
                EventPayload::Other {
                    payload: event.payload.clone(),
                }
            }
        };
        Self {
            id: event.id,
            tag: event.tag,
            timestamp: event.timestamp,
            payload,
        }
    }
}

fn field<'a>(payload: &'a Value, name: &str) -> Result<&'a Value, IndexerError> {
    payload
        .get(name)
        .ok_or_else(|| IndexerError::UnexpectedShape(format!("event payload has no `{name}`")))
}

fn token_ref(value: &Value) -> Result<TokenRef, IndexerError> {
    Ok(TokenRef {
        token_address: as_text(field(value, "token_address")?)?,
        token_id: as_nat(field(value, "token_id")?)?,
    })
}

fn decode_payload(tag: &str, payload: &Value) -> Result<EventPayload, IndexerError> {
    match tag {
        RETIRE_TAG => {
            let raw = payload.as_str().ok_or_else(|| {
                IndexerError::UnexpectedShape("retire payload is not a byte string".to_string())
            })?;
            let reason = hex_to_text(raw).ok_or_else(|| {
                IndexerError::UnexpectedShape("retire payload is not UTF-8 hex".to_string())
            })?;
            Ok(EventPayload::Retire { reason })
        }
        INTERNAL_MINT_TAG => Ok(EventPayload::InternalMint {
            token: token_ref(field(payload, "token")?)?,
            amount: as_nat(field(payload, "amount")?)?,
            new_total: as_nat(field(payload, "new_total")?)?,
        }),
        INTERNAL_TRANSFER_TAG => Ok(EventPayload::InternalTransfer {
            from: michelson_bytes_to_string(&as_text(field(payload, "from")?)?),
            to: michelson_bytes_to_string(&as_text(field(payload, "to")?)?),
            token: token_ref(field(payload, "token")?)?,
            amount: as_nat(field(payload, "amount")?)?,
        }),
        _ => Ok(EventPayload::Other {
            payload: payload.clone(),
        }),
    }
}
