// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Inventory of sealed secret files persisted next to the service.
//!
//! Listing is best effort: a file that cannot be read or decoded is logged
//! and skipped so that one corrupt file does not hide the rest.

use std::path::Path;

use crate::codec;
use crate::constants::SEALED_FILE_SUFFIX;
use crate::errors::AppError;
use crate::models::SecretSummary;

/// Lists every `*-sealed.yaml` file in `dir`, sorted by file name.
///
/// # Errors
///
/// Returns an error only if `dir` itself cannot be read.
#[tracing::instrument]
pub async fn list(dir: &Path) -> Result<Vec<SecretSummary>, AppError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        tracing::error!("[scanner] unable to read {}: {:?}", dir.display(), e);
        AppError::from(e)
    })?;

    let mut secrets = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let Some(file) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !file.ends_with(SEALED_FILE_SUFFIX) {
            continue;
        }

        let contents = match tokio::fs::read(entry.path()).await {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("[scanner] skipping {}: {:?}", file, e);
                continue;
            }
        };

        match codec::probe_summary(&contents) {
            Ok((name, namespace)) => secrets.push(SecretSummary {
                file,
                name,
                namespace,
            }),
            Err(e) => tracing::warn!("[scanner] skipping {}: {}", file, e),
        }
    }

    secrets.sort();

    tracing::debug!("[scanner] found {} sealed secrets", secrets.len());

    Ok(secrets)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sealed_yaml(name: &str, namespace: &str) -> String {
        format!(
            "apiVersion: bitnami.com/v1alpha1\nkind: SealedSecret\nmetadata:\n  name: {name}\n  namespace: {namespace}\nspec:\n  encryptedData:\n    password: AgBy3i4O\n"
        )
    }

    #[tokio::test]
    async fn test_list_skips_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("db-pass-sealed.yaml"), sealed_yaml("db-pass", "prod")).unwrap();
        std::fs::write(dir.path().join("api-key-sealed.yaml"), sealed_yaml("api-key", "staging")).unwrap();
        std::fs::write(dir.path().join("broken-sealed.yaml"), "metadata: [unclosed").unwrap();

        let secrets = list(dir.path()).await.unwrap();
        assert_eq!(
            secrets,
            vec![
                SecretSummary {
                    file: "api-key-sealed.yaml".to_string(),
                    name: "api-key".to_string(),
                    namespace: "staging".to_string(),
                },
                SecretSummary {
                    file: "db-pass-sealed.yaml".to_string(),
                    name: "db-pass".to_string(),
                    namespace: "prod".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_list_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("db-pass.yaml"), sealed_yaml("db-pass", "prod")).unwrap();
        std::fs::write(dir.path().join("db-pass-sealed.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("nested-sealed.yaml.d")).unwrap();

        assert!(list(dir.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_defaults_missing_metadata() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("anonymous-sealed.yaml"),
            "kind: SealedSecret\nspec:\n  encryptedData: {}\n",
        )
        .unwrap();

        let secrets = list(dir.path()).await.unwrap();
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets[0].name, "unknown");
        assert_eq!(secrets[0].namespace, "default");
    }

    #[tokio::test]
    async fn test_list_skips_unreadable_entries() {
        let dir = tempfile::tempdir().unwrap();
        // a directory matching the suffix cannot be read as a file
        std::fs::create_dir(dir.path().join("weird-sealed.yaml")).unwrap();
        std::fs::write(dir.path().join("db-pass-sealed.yaml"), sealed_yaml("db-pass", "prod")).unwrap();

        let secrets = list(dir.path()).await.unwrap();
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets[0].file, "db-pass-sealed.yaml");
    }

    #[tokio::test]
    async fn test_list_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = list(&dir.path().join("missing")).await.unwrap_err();
        assert_eq!(err, AppError::InternalServerError);
    }

    #[tokio::test]
    async fn test_list_rescans_every_call() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list(dir.path()).await.unwrap().is_empty());

        std::fs::write(dir.path().join("db-pass-sealed.yaml"), sealed_yaml("db-pass", "prod")).unwrap();
        assert_eq!(list(dir.path()).await.unwrap().len(), 1);
    }
}
