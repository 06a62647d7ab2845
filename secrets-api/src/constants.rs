// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

pub const SERVICE_NAME: &str = "sealed-secrets-api";
/// Sealed documents on disk are named `<name>-sealed.yaml`
pub const SEALED_FILE_SUFFIX: &str = "-sealed.yaml";
pub const STAGED_FILE_SUFFIX: &str = ".yaml";
pub const STAGING_DIR_PREFIX: &str = "sealed-secrets-api-";
/// bytes of the document name kept in a staged file name
pub const MAX_STAGED_NAME_LENGTH: usize = 64;

pub const DEFAULT_NAMESPACE: &str = "default";
pub const UNKNOWN_NAME: &str = "unknown";
pub const SECRET_API_VERSION: &str = "v1";
pub const SECRET_KIND: &str = "Secret";
pub const SEALED_SECRET_API_VERSION: &str = "bitnami.com/v1alpha1";
pub const SEALED_SECRET_KIND: &str = "SealedSecret";

pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(15);
/// added on top of the engine timeout so the engine always gives up first
pub const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);
pub const MAX_BODY_SIZE: usize = 1024 * 1024; // 1 MB

// Validation constants for object metadata
/// https://kubernetes.io/docs/concepts/overview/working-with-objects/names/#dns-subdomain-names
pub const MAX_NAME_LENGTH: u64 = 253;
pub const MAX_NAMESPACE_LENGTH: u64 = 63;
pub const MAX_DATA_ENTRIES: usize = 256;
