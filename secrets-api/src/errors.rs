// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::path::PathBuf;
use std::time::Duration;

use axum::Json;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AppError {
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    #[error("key not found at {}", .0.display())]
    KeyNotFound(PathBuf),
    #[error("sealing engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("sealing engine error: {0:?} {1}")]
    EngineRejected(Option<i32>, String),
    #[error("sealing engine timed out after {0:?}")]
    EngineTimeout(Duration),
    #[error("sealed output does not match the input keys")]
    EngineOutputMismatch,
    #[error("file {0} not found")]
    FileNotFound(String),
    #[error("invalid file name: {0}")]
    InvalidFilename(String),
    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),
    #[error("request timed out after {0:?}")]
    RequestTimeout(Duration),
    #[error("internal server error")]
    InternalServerError,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::MalformedDocument(_) | Self::InvalidFilename(_) => StatusCode::BAD_REQUEST,
            Self::KeyNotFound(_) | Self::FileNotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RequestTimeout(_) => StatusCode::REQUEST_TIMEOUT,
            Self::EngineUnavailable(_)
            | Self::EngineRejected(_, _)
            | Self::EngineTimeout(_)
            | Self::EngineOutputMismatch
            | Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match self {
            Self::InternalServerError => "Internal Server Error".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({"code": status.as_u16(), "message": message}));

        (status, body).into_response()
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(source: serde_yaml::Error) -> Self {
        AppError::MalformedDocument(source.to_string())
    }
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge(crate::constants::MAX_BODY_SIZE);
        }
        tracing::warn!("[api] failed to read request body: {}", rejection.body_text());
        AppError::MalformedDocument(rejection.body_text())
    }
}

impl From<std::io::Error> for AppError {
    fn from(_source: std::io::Error) -> Self {
        tracing::error!("{:?}", _source);
        AppError::InternalServerError
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_malformed_document_is_bad_request() {
        let (status, body) = render(AppError::MalformedDocument("missing metadata.name".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
        assert_eq!(body["message"], "malformed document: missing metadata.name");
    }

    #[tokio::test]
    async fn test_key_not_found_is_not_found() {
        let (status, body) = render(AppError::KeyNotFound(PathBuf::from("/keys/tls.key"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "key not found at /keys/tls.key");
    }

    #[tokio::test]
    async fn test_engine_failures_are_internal_errors() {
        for error in [
            AppError::EngineUnavailable("kubeseal".into()),
            AppError::EngineRejected(Some(1), "error: cannot fetch certificate".into()),
            AppError::EngineTimeout(Duration::from_secs(1)),
            AppError::EngineOutputMismatch,
        ] {
            let (status, body) = render(error).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["code"], 500);
        }
    }

    #[tokio::test]
    async fn test_engine_rejection_carries_stderr() {
        let (_, body) = render(AppError::EngineRejected(Some(1), "no key could decrypt secret".into())).await;
        assert!(body["message"].as_str().unwrap().contains("no key could decrypt secret"));
    }

    #[tokio::test]
    async fn test_limits_are_structured() {
        let (status, body) = render(AppError::PayloadTooLarge(1024)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["code"], 413);
        assert_eq!(body["message"], "request body exceeds 1024 bytes");

        let (status, body) = render(AppError::RequestTimeout(Duration::from_secs(25))).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["code"], 408);
        assert_eq!(body["message"], "request timed out after 25s");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let (_, body) = render(AppError::InternalServerError).await;
        assert_eq!(body["message"], "Internal Server Error");
    }

    #[test]
    fn test_yaml_error_is_malformed_document() {
        let source = serde_yaml::from_str::<serde_yaml::Value>("{unclosed").unwrap_err();
        assert!(matches!(AppError::from(source), AppError::MalformedDocument(_)));
    }
}
