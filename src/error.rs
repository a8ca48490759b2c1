// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::warn;

use crate::indexer::IndexerError;
use crate::x4c::X4cError;

/// Body returned for every failed route.
pub const NOT_FOUND_MESSAGE: &str = "Not found";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

// The API does not leak failure details; they only go to the log.
impl From<X4cError> for ApiError {
    fn from(err: X4cError) -> Self {
        warn!(error = %err, "Request failed");
        Self::not_found(NOT_FOUND_MESSAGE)
    }
}

impl From<IndexerError> for ApiError {
    fn from(err: IndexerError) -> Self {
        X4cError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let other = ApiError::new(StatusCode::BAD_GATEWAY, "upstream");
        assert_eq!(other.status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn domain_errors_collapse_to_not_found() {
        let err: ApiError = X4cError::SignerRequired.into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, NOT_FOUND_MESSAGE);

        let err: ApiError = IndexerError::Request("connection refused".into()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(!err.message.contains("refused"));
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::not_found("gone").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"gone"}"#);
    }
}
