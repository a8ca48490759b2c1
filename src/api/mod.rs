// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        CreditRetireData, CreditRetireRequest, CreditRetireResponse, CreditSource,
        CreditSourcesResponse, IndexerDataResponse, IndexerUrlResponse,
    },
    state::AppState,
};

pub mod credits;
pub mod health;
pub mod information;

/// Note: no route checks who is calling; the service is meant to sit behind
/// an authenticating gateway.
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health::health))
        .route(
            "/credit/sources/{custodian_id}",
            get(credits::credit_sources),
        )
        .route("/retire/{custodian_id}", post(credits::retire_credits))
        .route(
            "/contract/{contract_hash}/retire",
            post(credits::retire_contract_credits),
        )
        .route("/operation/{op_hash}", get(information::get_operation))
        .route("/events/{contract_hash}", get(information::get_events))
        .route(
            "/contract/{contract_hash}/events/{tag}",
            get(information::get_tagged_events),
        )
        .route("/indexer-url", get(information::indexer_url))
        .route("/info/indexer-url", get(information::info_indexer_url))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        credits::credit_sources,
        credits::retire_credits,
        credits::retire_contract_credits,
        information::get_operation,
        information::get_events,
        information::get_tagged_events,
        information::indexer_url,
        information::info_indexer_url
    ),
    components(
        schemas(
            CreditSource,
            CreditSourcesResponse,
            CreditRetireRequest,
            CreditRetireData,
            CreditRetireResponse,
            IndexerDataResponse,
            IndexerUrlResponse,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Credits", description = "Custodied credits and retirement"),
        (name = "Information", description = "Indexer lookups")
    )
)]
struct ApiDoc;
