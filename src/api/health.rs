// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::indexer::IndexerBackend;
use crate::state::AppState;

/// Liveness response with a summary of the loaded client state.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Backend of the connected indexer (`tzkt` or `tzstats`).
    #[schema(value_type = String)]
    pub indexer: IndexerBackend,
    /// Number of known contracts.
    pub contracts: usize,
    /// Number of local keys.
    pub keys: usize,
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is alive", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        indexer: state.client.indexer().backend(),
        contracts: state.client.contracts().await.len(),
        keys: state.client.keys().len(),
    })
}
