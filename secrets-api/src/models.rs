// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::constants::{
    DEFAULT_NAMESPACE, MAX_DATA_ENTRIES, MAX_NAMESPACE_LENGTH, MAX_NAME_LENGTH,
    SEALED_SECRET_API_VERSION, SEALED_SECRET_KIND, SECRET_API_VERSION, SECRET_KIND,
};

/// Identity of a secret document. `namespace` defaults to `"default"` when it
/// is absent, null or empty, and is always serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ObjectMeta {
    #[serde(default)]
    #[validate(custom(function = "validate_object_name"))]
    pub name: String,

    #[serde(default = "default_namespace", deserialize_with = "deserialize_namespace")]
    #[validate(custom(function = "validate_namespace"))]
    pub namespace: String,

    #[serde(default, deserialize_with = "null_as_default")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "null_as_default")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// Metadata this service does not interpret (`creationTimestamp`,
    /// `ownerReferences`, ...), passed through unchanged.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ObjectMeta {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// A plaintext Kubernetes `Secret`.
///
/// Values in `data` are base64 text and are carried verbatim, so a document
/// survives a parse/serialize cycle byte for byte.
#[derive(Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SecretDocument {
    #[serde(default = "default_secret_api_version")]
    pub api_version: String,

    #[serde(default = "default_secret_kind")]
    pub kind: String,

    #[validate(nested)]
    pub metadata: ObjectMeta,

    #[serde(rename = "type")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(custom(function = "validate_data_keys"))]
    pub data: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "null_as_default")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[validate(custom(function = "validate_data_keys"))]
    pub string_data: BTreeMap<String, String>,

    /// Remaining top-level fields such as `immutable`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SecretDocument {
    pub fn new(metadata: ObjectMeta, data: BTreeMap<String, String>) -> Self {
        Self {
            api_version: default_secret_api_version(),
            kind: default_secret_kind(),
            metadata,
            secret_type: None,
            data,
            string_data: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Keys the sealing engine is expected to encrypt: `data` and `stringData`.
    pub fn key_set(&self) -> BTreeSet<&str> {
        self.data
            .keys()
            .chain(self.string_data.keys())
            .map(String::as_str)
            .collect()
    }
}

// Custom Debug implementation to prevent accidental logging of secret values
impl fmt::Debug for SecretDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretDocument")
            .field("api_version", &self.api_version)
            .field("kind", &self.kind)
            .field("metadata", &self.metadata)
            .field("secret_type", &self.secret_type)
            .field("data", &self.data.keys().collect::<Vec<_>>())
            .field("string_data", &self.string_data.keys().collect::<Vec<_>>())
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The encrypted counterpart of a [`SecretDocument`], as produced by the
/// sealing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SealedSecretDocument {
    #[serde(default = "default_sealed_api_version")]
    pub api_version: String,

    #[serde(default = "default_sealed_kind")]
    pub kind: String,

    #[validate(nested)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: SealedSecretSpec,
}

impl SealedSecretDocument {
    pub fn key_set(&self) -> BTreeSet<&str> {
        self.spec.encrypted_data.keys().map(String::as_str).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedSecretSpec {
    /// Ciphertexts are opaque to this service.
    #[serde(default, deserialize_with = "null_as_default")]
    pub encrypted_data: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<serde_json::Value>,
}

/// Projection of a sealed file found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SecretSummary {
    pub file: String,
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptResponse {
    pub sealed_secret: SealedSecretDocument,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub decrypted_secret: SecretDocument,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsListResponse {
    pub secrets: Vec<SecretSummary>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_secret_api_version() -> String {
    SECRET_API_VERSION.to_string()
}

fn default_secret_kind() -> String {
    SECRET_KIND.to_string()
}

fn default_sealed_api_version() -> String {
    SEALED_SECRET_API_VERSION.to_string()
}

fn default_sealed_kind() -> String {
    SEALED_SECRET_KIND.to_string()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_namespace<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let namespace = Option::<String>::deserialize(deserializer)?;
    Ok(namespace
        .filter(|ns| !ns.is_empty())
        .unwrap_or_else(default_namespace))
}

/// Validates a DNS-1123 subdomain (e.g. "db-pass", "tls.example.com").
///
/// Names are later used to build file names, so anything that could act as a
/// path separator or traversal sequence is rejected here.
pub fn validate_object_name(name: &str) -> Result<(), validator::ValidationError> {
    if name.is_empty() {
        return Err(validator::ValidationError::new("empty_name"));
    }
    if name.len() as u64 > MAX_NAME_LENGTH {
        return Err(validator::ValidationError::new("name_too_long"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(validator::ValidationError::new("invalid_name"));
    }
    // every dot-separated label must itself start and end alphanumeric
    if !name.split('.').all(starts_and_ends_alphanumeric) {
        return Err(validator::ValidationError::new("invalid_name"));
    }
    Ok(())
}

/// Validates a DNS-1123 label (e.g. "prod", "kube-system")
fn validate_namespace(namespace: &str) -> Result<(), validator::ValidationError> {
    if namespace.is_empty() || namespace.len() as u64 > MAX_NAMESPACE_LENGTH {
        return Err(validator::ValidationError::new("invalid_namespace_length"));
    }
    if !namespace
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        || !starts_and_ends_alphanumeric(namespace)
    {
        return Err(validator::ValidationError::new("invalid_namespace"));
    }
    Ok(())
}

/// Secret keys: alphanumerics, `-`, `_` and `.`
fn validate_data_keys(data: &BTreeMap<String, String>) -> Result<(), validator::ValidationError> {
    if data.len() > MAX_DATA_ENTRIES {
        return Err(validator::ValidationError::new("too_many_entries"));
    }
    let valid = data.keys().all(|key| {
        !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    });
    if !valid {
        return Err(validator::ValidationError::new("invalid_data_key"));
    }
    Ok(())
}

fn starts_and_ends_alphanumeric(value: &str) -> bool {
    let alphanumeric = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    value.chars().next().is_some_and(alphanumeric) && value.chars().last().is_some_and(alphanumeric)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_object_name() {
        assert!(validate_object_name("db-pass").is_ok());
        assert!(validate_object_name("tls.example.com").is_ok());
        assert!(validate_object_name("a").is_ok());

        assert!(validate_object_name("").is_err());
        assert!(validate_object_name("DB-Pass").is_err());
        assert!(validate_object_name("-leading").is_err());
        assert!(validate_object_name("trailing.").is_err());
        assert!(validate_object_name("../etc/passwd").is_err());
        assert!(validate_object_name("a..b").is_err());
        assert!(validate_object_name("a.-b").is_err());
        assert!(validate_object_name("a-.b").is_err());
        assert!(validate_object_name(".leading").is_err());
        assert!(validate_object_name("db-1.prod-2").is_ok());
        assert!(validate_object_name("nested/name").is_err());
        assert!(validate_object_name(&"a".repeat(254)).is_err());
    }

    #[test]
    fn test_validate_namespace() {
        assert!(validate_namespace("prod").is_ok());
        assert!(validate_namespace("kube-system").is_ok());

        assert!(validate_namespace("team.prod").is_err());
        assert!(validate_namespace("Prod").is_err());
        assert!(validate_namespace(&"n".repeat(64)).is_err());
    }

    #[test]
    fn test_validate_data_keys() {
        let mut data = BTreeMap::new();
        data.insert("password".to_string(), "czNjcjN0".to_string());
        data.insert("tls.crt".to_string(), "".to_string());
        data.insert("API_KEY-2".to_string(), "".to_string());
        assert!(validate_data_keys(&data).is_ok());

        data.insert("../escape".to_string(), "".to_string());
        assert!(validate_data_keys(&data).is_err());
    }

    #[test]
    fn test_key_set_includes_string_data() {
        let mut document = SecretDocument::new(ObjectMeta::new("app", "default"), BTreeMap::new());
        document.data.insert("password".into(), "czNjcjN0".into());
        document.string_data.insert("username".into(), "admin".into());

        let keys: Vec<&str> = document.key_set().into_iter().collect();
        assert_eq!(keys, vec!["password", "username"]);
    }

    #[test]
    fn test_debug_redacts_values() {
        let mut data = BTreeMap::new();
        data.insert("password".to_string(), "czNjcjN0".to_string());
        let document = SecretDocument::new(ObjectMeta::new("db-pass", "prod"), data);

        let debug = format!("{document:?}");
        assert!(debug.contains("password"));
        assert!(!debug.contains("czNjcjN0"));
    }

    #[test]
    fn test_unknown_fields_are_carried_through() {
        let yaml = "apiVersion: v1\nkind: Secret\nimmutable: true\nmetadata:\n  name: db-pass\n  creationTimestamp: null\n  ownerReferences:\n  - kind: Deployment\n    name: api\ndata:\n  password: czNjcjN0\n";
        let document: SecretDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(document.extra["immutable"], serde_json::Value::Bool(true));
        assert_eq!(document.metadata.extra["creationTimestamp"], serde_json::Value::Null);
        assert_eq!(document.metadata.extra["ownerReferences"][0]["name"], "api");
        assert_eq!(document.data["password"], "czNjcjN0");
        assert!(!document.extra.contains_key("data"));

        let encoded = serde_yaml::to_string(&document).unwrap();
        assert!(encoded.contains("immutable: true"));
        assert!(encoded.contains("creationTimestamp: null"));
        let reparsed: SecretDocument = serde_yaml::from_str(&encoded).unwrap();
        assert_eq!(reparsed, document);
    }

    #[test]
    fn test_nested_validation_rejects_bad_name() {
        let document = SecretDocument::new(ObjectMeta::new("Bad_Name", "default"), BTreeMap::new());
        assert!(document.validate().is_err());

        let document = SecretDocument::new(ObjectMeta::new("good-name", "default"), BTreeMap::new());
        assert!(document.validate().is_ok());
    }
}
