// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Document codec for secret and sealed secret documents.
//!
//! Request bodies and engine output may be YAML or JSON; since JSON is a
//! subset of the YAML flow syntax, both are decoded by `serde_yaml`. Documents
//! handed to the sealing engine are always encoded as YAML.
//!
//! # Strict vs. tolerant decoding
//!
//! [`parse_secret`] and [`parse_sealed`] are strict: the document must be
//! well formed, carry the expected `kind` and a valid `metadata.name`.
//! [`probe_summary`] is used for inventory listings and only requires the
//! input to be a mapping; every field is optional.

use serde::Deserialize;
use validator::Validate;
use zeroize::Zeroizing;

use crate::constants::{DEFAULT_NAMESPACE, SEALED_SECRET_KIND, SECRET_KIND, UNKNOWN_NAME};
use crate::errors::AppError;
use crate::models::{SealedSecretDocument, SecretDocument};

/// Decodes a plaintext [`SecretDocument`].
///
/// # Errors
///
/// Returns [`AppError::MalformedDocument`] if the input is empty, is not
/// well-formed YAML/JSON, is not a `Secret`, or fails metadata validation.
pub fn parse_secret(bytes: &[u8]) -> Result<SecretDocument, AppError> {
    ensure_not_empty(bytes, "no secret data provided")?;
    let document: SecretDocument = serde_yaml::from_slice(bytes)?;
    ensure_kind(&document.kind, SECRET_KIND)?;
    document
        .validate()
        .map_err(|e| AppError::MalformedDocument(e.to_string()))?;
    Ok(document)
}

/// Decodes a [`SealedSecretDocument`].
///
/// # Errors
///
/// Returns [`AppError::MalformedDocument`] under the same conditions as
/// [`parse_secret`], with `SealedSecret` as the expected kind.
pub fn parse_sealed(bytes: &[u8]) -> Result<SealedSecretDocument, AppError> {
    ensure_not_empty(bytes, "no sealed secret data provided")?;
    let document: SealedSecretDocument = serde_yaml::from_slice(bytes)?;
    ensure_kind(&document.kind, SEALED_SECRET_KIND)?;
    document
        .validate()
        .map_err(|e| AppError::MalformedDocument(e.to_string()))?;
    Ok(document)
}

/// Encodes a document as YAML.
///
/// The returned buffer is wiped on drop since it may hold plaintext values.
pub fn to_yaml<T: serde::Serialize>(document: &T) -> Result<Zeroizing<Vec<u8>>, AppError> {
    let yaml = serde_yaml::to_string(document).map_err(|e| {
        tracing::error!("[codec] failed to encode document: {:?}", e);
        AppError::InternalServerError
    })?;
    Ok(Zeroizing::new(yaml.into_bytes()))
}

#[derive(Debug, Default, Deserialize)]
struct DocumentProbe {
    #[serde(default)]
    metadata: Option<MetadataProbe>,
}

#[derive(Debug, Default, Deserialize)]
struct MetadataProbe {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    namespace: Option<String>,
}

/// Extracts `(name, namespace)` from a document without validating it.
///
/// Missing fields fall back to `"unknown"` and `"default"`.
pub fn probe_summary(bytes: &[u8]) -> Result<(String, String), AppError> {
    let probe: DocumentProbe = serde_yaml::from_slice(bytes)?;
    let metadata = probe.metadata.unwrap_or_default();
    let name = metadata
        .name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_NAME.to_string());
    let namespace = metadata
        .namespace
        .filter(|namespace| !namespace.is_empty())
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
    Ok((name, namespace))
}

#[inline]
fn ensure_not_empty(bytes: &[u8], message: &str) -> Result<(), AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::MalformedDocument(message.to_string()));
    }
    Ok(())
}

#[inline]
fn ensure_kind(kind: &str, expected: &str) -> Result<(), AppError> {
    if kind != expected {
        return Err(AppError::MalformedDocument(format!(
            "expected kind {expected}, got {kind}"
        )));
    }
    Ok(())
}
