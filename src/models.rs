// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. Field names are camelCase on
//! the wire, and every successful response wraps its payload in `data`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

// =============================================================================
// Credit Models
// =============================================================================

/// One custodian ledger entry with indexer deep links.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreditSource {
    pub token_id: u64,
    /// Indexer page of the FA2 contract that minted the credits.
    pub tzstats_minter_url: String,
    /// Off-chain identity the credits are held for.
    pub kyc: String,
    /// Indexer page of the custodian contract.
    pub tzstats_custodian_url: String,
    pub amount: u64,
    /// Address of the FA2 contract.
    pub minter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CreditSourcesResponse {
    pub data: Vec<CreditSource>,
}

/// Request to retire credits held by the custodian.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreditRetireRequest {
    /// FA2 contract alias or address.
    pub minter: String,
    /// Identity whose credits are retired; `self` when omitted.
    #[serde(default)]
    pub kyc: Option<String>,
    #[serde(alias = "tokenID")]
    pub token_id: u64,
    /// Must be positive.
    pub amount: i64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreditRetireData {
    pub message: String,
    pub update_hash: String,
    pub tzstats_update_hash_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CreditRetireResponse {
    pub data: CreditRetireData,
}

// =============================================================================
// Information Models
// =============================================================================

/// Raw indexer records, passed through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct IndexerDataResponse {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct IndexerUrlResponse {
    /// Base URL of the indexer web UI.
    pub data: String,
}
