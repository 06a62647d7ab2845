// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! HTTP route handlers for the sealed secrets API.
//!
//! This module provides the following endpoints:
//!
//! | Method | Path | Handler | Description |
//! |--------|------|---------|-------------|
//! | GET | `/health` | [`health`] | Health check endpoint |
//! | POST | `/encrypt` | [`encrypt`] | Seal a plaintext secret |
//! | POST | `/decrypt` | [`decrypt`] | Unseal a sealed secret |
//! | GET | `/secrets` | [`list_secrets`] | List sealed secret files |
//! | GET | `/secrets/{filename}/decrypt` | [`decrypt_file`] | Unseal a sealed secret file |
//!
//! Request bodies may be JSON or YAML. All responses are JSON.

use std::path::{Component, Path};
use std::sync::Arc;

use crate::application::AppState;
use crate::codec;
use crate::constants::SERVICE_NAME;
use crate::errors::AppError;
use crate::models::{DecryptResponse, EncryptResponse, SecretsListResponse};
use crate::scanner;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path as UrlPath, State};
use axum::response::IntoResponse;
use serde_json::json;

/// Health check endpoint.
///
/// # Response
///
/// ```json
/// {"status": "healthy", "service": "sealed-secrets-api"}
/// ```
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "healthy", "service": SERVICE_NAME}))
}

/// Seals a plaintext secret.
///
/// # Errors
///
/// - [`AppError::MalformedDocument`] - Empty or invalid body
/// - [`AppError::PayloadTooLarge`] - Body exceeds the configured limit
/// - [`AppError::KeyNotFound`] - Configured certificate is missing
/// - [`AppError::EngineUnavailable`], [`AppError::EngineRejected`],
///   [`AppError::EngineTimeout`] - The sealing engine failed
#[tracing::instrument(skip(state, body))]
pub async fn encrypt(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<EncryptResponse>, AppError> {
    let secret = codec::parse_secret(&body?)?;

    tracing::debug!(
        "[api] sealing {}/{} ({} keys)",
        secret.metadata.namespace,
        secret.metadata.name,
        secret.key_set().len()
    );

    let sealed_secret = state.engine.seal(&secret).await?;

    Ok(Json(EncryptResponse { sealed_secret }))
}

/// Unseals a sealed secret with the configured private key.
///
/// # Errors
///
/// - [`AppError::MalformedDocument`] - Empty or invalid body
/// - [`AppError::PayloadTooLarge`] - Body exceeds the configured limit
/// - [`AppError::KeyNotFound`] - Configured private key is missing
/// - [`AppError::EngineUnavailable`], [`AppError::EngineRejected`],
///   [`AppError::EngineTimeout`] - The sealing engine failed
#[tracing::instrument(skip(state, body))]
pub async fn decrypt(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<DecryptResponse>, AppError> {
    let sealed = codec::parse_sealed(&body?)?;

    tracing::debug!(
        "[api] unsealing {}/{}",
        sealed.metadata.namespace,
        sealed.metadata.name
    );

    let decrypted_secret = state
        .engine
        .unseal(&sealed, &state.options.private_key_path)
        .await?;

    Ok(Json(DecryptResponse {
        file: None,
        decrypted_secret,
    }))
}

/// Lists the sealed secret files in the secrets directory.
#[tracing::instrument(skip(state))]
pub async fn list_secrets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SecretsListResponse>, AppError> {
    let secrets = scanner::list(&state.options.secrets_dir).await?;

    Ok(Json(SecretsListResponse { secrets }))
}

/// Unseals a sealed secret file from the secrets directory.
///
/// # Errors
///
/// - [`AppError::InvalidFilename`] - `filename` is not a plain file name
/// - [`AppError::FileNotFound`] - No such file in the secrets directory
/// - otherwise as [`decrypt`]
#[tracing::instrument(skip(state))]
pub async fn decrypt_file(
    State(state): State<Arc<AppState>>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Json<DecryptResponse>, AppError> {
    validate_filename(&filename)?;

    let path = state.options.secrets_dir.join(&filename);
    let contents = match tokio::fs::read(&path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::FileNotFound(filename));
        }
        Err(e) => return Err(e.into()),
    };
    let sealed = codec::parse_sealed(&contents)?;

    let decrypted_secret = state
        .engine
        .unseal(&sealed, &state.options.private_key_path)
        .await?;

    Ok(Json(DecryptResponse {
        file: Some(filename),
        decrypted_secret,
    }))
}

/// Accepts a single, normal path component only: no separators, no `..` and
/// no hidden files.
fn validate_filename(filename: &str) -> Result<(), AppError> {
    let mut components = Path::new(filename).components();
    let valid = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !filename.starts_with('.')
        && !filename.contains(['/', '\\']);

    if !valid {
        tracing::warn!("[api] rejected file name {:?}", filename);
        return Err(AppError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;

    // Unit tests for route handlers (testing handler functions directly)
    // Integration tests using TestServer are in tests/http_integration.rs

    #[tokio::test]
    async fn test_health_returns_ok() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "sealed-secrets-api");
    }

    #[test]
    fn test_validate_filename() {
        assert!(validate_filename("db-pass-sealed.yaml").is_ok());
        assert!(validate_filename("does-not-exist.yaml").is_ok());

        for name in ["", ".", "..", "../db-pass-sealed.yaml", "/etc/passwd", "a/b.yaml", "a\\b.yaml", ".hidden-sealed.yaml"] {
            assert_eq!(
                validate_filename(name),
                Err(AppError::InvalidFilename(name.to_string())),
                "{name:?} should be rejected"
            );
        }
    }
}
