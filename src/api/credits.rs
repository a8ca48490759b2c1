// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use tracing::{info, warn};

use crate::{
    error::{ApiError, NOT_FOUND_MESSAGE},
    models::{
        CreditRetireData, CreditRetireRequest, CreditRetireResponse, CreditSource,
        CreditSourcesResponse,
    },
    state::AppState,
};

pub const RETIRE_MESSAGE: &str = "Successfully retired credits";

#[utoipa::path(
    get,
    path = "/credit/sources/{custodian_id}",
    params(
        ("custodian_id" = String, Path, description = "Custodian contract alias or address")
    ),
    tag = "Credits",
    responses(
        (status = 200, body = CreditSourcesResponse),
        (status = 404, description = "Unknown custodian or indexer failure")
    )
)]
pub async fn credit_sources(
    Path(custodian_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CreditSourcesResponse>, ApiError> {
    let custodian = state
        .client
        .custodian_contract(Some(&custodian_id), None)
        .await?;
    let ledger = custodian.storage().ledger().await?;

    let web_url = &state.client.settings().indexer_web_url;
    let data = ledger
        .into_iter()
        .map(|entry| CreditSource {
            token_id: entry.token_id,
            tzstats_minter_url: format!("{web_url}/{}", entry.minter),
            kyc: entry.kyc,
            tzstats_custodian_url: format!("{web_url}/{}", custodian.address()),
            amount: entry.amount,
            minter: entry.minter,
        })
        .collect();

    Ok(Json(CreditSourcesResponse { data }))
}

#[utoipa::path(
    post,
    path = "/retire/{custodian_id}",
    params(
        ("custodian_id" = String, Path, description = "Custodian contract alias or address")
    ),
    request_body = CreditRetireRequest,
    tag = "Credits",
    responses(
        (status = 200, body = CreditRetireResponse),
        (status = 404, description = "Invalid request or failed operation")
    )
)]
pub async fn retire_credits(
    Path(custodian_id): Path<String>,
    State(state): State<AppState>,
    body: Result<Json<CreditRetireRequest>, JsonRejection>,
) -> Result<Json<CreditRetireResponse>, ApiError> {
    retire(&state, &custodian_id, body).await
}

#[utoipa::path(
    post,
    path = "/contract/{contract_hash}/retire",
    params(
        ("contract_hash" = String, Path, description = "Custodian contract alias or address")
    ),
    request_body = CreditRetireRequest,
    tag = "Credits",
    responses(
        (status = 200, body = CreditRetireResponse),
        (status = 404, description = "Invalid request or failed operation")
    )
)]
pub async fn retire_contract_credits(
    Path(contract_hash): Path<String>,
    State(state): State<AppState>,
    body: Result<Json<CreditRetireRequest>, JsonRejection>,
) -> Result<Json<CreditRetireResponse>, ApiError> {
    retire(&state, &contract_hash, body).await
}

async fn retire(
    state: &AppState,
    custodian_id: &str,
    body: Result<Json<CreditRetireRequest>, JsonRejection>,
) -> Result<Json<CreditRetireResponse>, ApiError> {
    let Json(request) = body.map_err(|e| {
        warn!(error = %e, "Rejected retire request body");
        ApiError::not_found(NOT_FOUND_MESSAGE)
    })?;
    let Some(operator) = state.custodian_operator.as_deref() else {
        warn!("Retire requested but no custodian operator is configured");
        return Err(ApiError::not_found(NOT_FOUND_MESSAGE));
    };
    let amount = u64::try_from(request.amount)
        .ok()
        .filter(|amount| *amount > 0)
        .ok_or_else(|| {
            warn!(amount = request.amount, "Amount to retire is not valid");
            ApiError::not_found(NOT_FOUND_MESSAGE)
        })?;

    let custodian = state
        .client
        .custodian_contract(Some(custodian_id), Some(operator))
        .await?;
    let minter = state.client.resolve_hash(&request.minter).await;
    let result = custodian
        .retire(
            &minter,
            request.token_id,
            amount,
            request.kyc.as_deref(),
            &request.reason,
        )
        .await?;

    info!(
        custodian = %custodian.address(),
        operation = %result.operation_hash,
        "Credits retired"
    );
    let web_url = &state.client.settings().indexer_web_url;
    Ok(Json(CreditRetireResponse {
        data: CreditRetireData {
            message: RETIRE_MESSAGE.to_string(),
            tzstats_update_hash_url: format!("{web_url}/{}", result.operation_hash),
            update_hash: result.operation_hash,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{custodian_address, fa2_address, json_body, node, send, state, WEB_URL};
    use axum::{body::Body, http::Request, http::StatusCode};
    use mockito::Matcher;
    use serde_json::json;
    use tempfile::tempdir;

    fn retire_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn credit_sources_list_ledger_with_links() {
        let mut server = mockito::Server::new_async().await;
        let custodian = custodian_address();
        let _storage = server
            .mock("GET", format!("/v1/contracts/{custodian}/storage").as_str())
            .with_body(json!({"custodian": "tz1c", "ledger": 21, "operators": []}).to_string())
            .create_async()
            .await;
        let _keys = server
            .mock("GET", "/v1/bigmaps/21/keys")
            .match_query(Matcher::Any)
            .with_body(
                json!([{
                    "id": 1, "active": true,
                    "key": {"kyc": "05010000000473656c66", "token": {"token_id": "4", "token_address": fa2_address()}},
                    "value": "12"
                }])
                .to_string(),
            )
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let state = state(dir.path(), &server.url(), node(), None).await;
        let response = send(
            state,
            Request::get("/credit/sources/custody").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"data": [{
                "tokenId": 4,
                "tzstatsMinterUrl": format!("{WEB_URL}/{}", fa2_address()),
                "kyc": "self",
                "tzstatsCustodianUrl": format!("{WEB_URL}/{custodian}"),
                "amount": 12,
                "minter": fa2_address()
            }]})
        );
    }

    #[tokio::test]
    async fn credit_sources_failures_are_not_found() {
        let dir = tempdir().unwrap();
        let state = state(dir.path(), "http://127.0.0.1:9", node(), None).await;

        let unknown = send(
            state.clone(),
            Request::get("/credit/sources/nope").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let unreachable = send(
            state,
            Request::get("/credit/sources/custody").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(unreachable.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn retire_returns_hash_and_link() {
        let dir = tempdir().unwrap();
        let node = node();
        let state = state(dir.path(), "http://127.0.0.1:9", node.clone(), Some("alice")).await;

        let response = send(
            state,
            retire_request(
                "/retire/custody",
                json!({"minter": "credits", "kyc": "acme", "tokenId": 4, "amount": 2, "reason": "offset"}),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"data": {
                "message": RETIRE_MESSAGE,
                "updateHash": "ooMockOperation1",
                "tzstatsUpdateHashUrl": format!("{WEB_URL}/ooMockOperation1")
            }})
        );

        let calls = node.calls();
        assert_eq!(calls[0].destination, custodian_address());
        assert_eq!(calls[0].parameters.entrypoint, "retire");
        let value = serde_json::to_value(&calls[0].parameters.value).unwrap();
        assert_eq!(value[0]["args"][0], json!({"string": fa2_address()}));
    }

    #[tokio::test]
    async fn retire_rejections_are_not_found() {
        let dir = tempdir().unwrap();
        let node = node();
        let with_operator = state(dir.path(), "http://127.0.0.1:9", node.clone(), Some("alice")).await;
        let body = json!({"minter": "credits", "tokenId": 4, "amount": 0, "reason": "offset"});

        let zero = send(with_operator.clone(), retire_request("/contract/custody/retire", body)).await;
        assert_eq!(zero.status(), StatusCode::NOT_FOUND);

        let malformed = send(
            with_operator,
            retire_request("/retire/custody", json!({"minter": "credits"})),
        )
        .await;
        assert_eq!(malformed.status(), StatusCode::NOT_FOUND);

        let other_dir = tempdir().unwrap();
        let without_operator = state(other_dir.path(), "http://127.0.0.1:9", node.clone(), None).await;
        let missing = send(
            without_operator,
            retire_request(
                "/retire/custody",
                json!({"minter": "credits", "tokenId": 4, "amount": 1, "reason": "offset"}),
            ),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert!(node.calls().is_empty());
    }
}
