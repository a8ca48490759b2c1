// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::ApiError,
    models::{IndexerDataResponse, IndexerUrlResponse},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/operation/{op_hash}",
    params(("op_hash" = String, Path, description = "Operation hash")),
    tag = "Information",
    responses(
        (status = 200, body = IndexerDataResponse),
        (status = 404, description = "Indexer lookup failed")
    )
)]
pub async fn get_operation(
    Path(op_hash): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<IndexerDataResponse>, ApiError> {
    let data = state.client.indexer().operation(&op_hash).await?;
    Ok(Json(IndexerDataResponse { data }))
}

#[utoipa::path(
    get,
    path = "/events/{contract_hash}",
    params(("contract_hash" = String, Path, description = "Contract alias or address")),
    tag = "Information",
    responses(
        (status = 200, body = IndexerDataResponse),
        (status = 404, description = "Indexer lookup failed")
    )
)]
pub async fn get_events(
    Path(contract_hash): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<IndexerDataResponse>, ApiError> {
    raw_events(&state, &contract_hash, None).await
}

#[utoipa::path(
    get,
    path = "/contract/{contract_hash}/events/{tag}",
    params(
        ("contract_hash" = String, Path, description = "Contract alias or address"),
        ("tag" = String, Path, description = "Event tag, e.g. `retire`")
    ),
    tag = "Information",
    responses(
        (status = 200, body = IndexerDataResponse),
        (status = 404, description = "Indexer lookup failed")
    )
)]
pub async fn get_tagged_events(
    Path((contract_hash, tag)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<IndexerDataResponse>, ApiError> {
    raw_events(&state, &contract_hash, Some(&tag)).await
}

async fn raw_events(
    state: &AppState,
    contract: &str,
    tag: Option<&str>,
) -> Result<Json<IndexerDataResponse>, ApiError> {
    let address = state.client.resolve_hash(contract).await;
    let events = state.client.indexer().events(&address, tag).await?;
    Ok(Json(IndexerDataResponse {
        data: events.into_iter().map(|event| event.raw).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/indexer-url",
    tag = "Information",
    responses((status = 200, body = IndexerUrlResponse))
)]
pub async fn indexer_url(State(state): State<AppState>) -> Json<IndexerUrlResponse> {
    Json(IndexerUrlResponse {
        data: state.client.settings().indexer_web_url.clone(),
    })
}

#[utoipa::path(
    get,
    path = "/info/indexer-url",
    tag = "Information",
    responses((status = 200, body = IndexerUrlResponse))
)]
pub async fn info_indexer_url(state: State<AppState>) -> Json<IndexerUrlResponse> {
    indexer_url(state).await
}
