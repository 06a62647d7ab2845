// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::constants::{DEFAULT_ENGINE_TIMEOUT, REQUEST_TIMEOUT_MARGIN};

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct ApiOptions {
    #[arg(long, default_value = "127.0.0.1", env("SEALED_SECRETS_API_HOST"))]
    pub host: String,
    #[arg(long, default_value = "5000", env("SEALED_SECRETS_API_PORT"))]
    pub port: u16,
    /// PEM private key used to unseal
    #[arg(
        long,
        default_value = "sealed-secrets-private.key",
        env("SEALED_SECRETS_API_PRIVATE_KEY_PATH")
    )]
    pub private_key_path: PathBuf,
    /// PEM certificate used to seal; kubeseal fetches it from the cluster when unset
    #[arg(long, env("SEALED_SECRETS_API_CERT_PATH"))]
    pub cert_path: Option<PathBuf>,
    #[arg(long, default_value = "kubeseal", env("SEALED_SECRETS_API_KUBESEAL_PATH"))]
    pub kubeseal_path: PathBuf,
    /// Directory holding `<name>-sealed.yaml` files
    #[arg(long, default_value = ".", env("SEALED_SECRETS_API_SECRETS_DIR"))]
    pub secrets_dir: PathBuf,
    #[arg(long, env("SEALED_SECRETS_API_STAGING_DIR"))]
    pub staging_dir: Option<PathBuf>,
    #[arg(long, default_value = "15", env("SEALED_SECRETS_API_ENGINE_TIMEOUT_SECS"))]
    pub engine_timeout_secs: u64,
}

impl ApiOptions {
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs(self.engine_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        self.engine_timeout() + REQUEST_TIMEOUT_MARGIN
    }
}

impl Default for ApiOptions {
    fn default() -> Self {
        ApiOptions {
            host: "127.0.0.1".to_string(),
            port: 5000,
            private_key_path: PathBuf::from("sealed-secrets-private.key"),
            cert_path: None,
            kubeseal_path: PathBuf::from("kubeseal"),
            secrets_dir: PathBuf::from("."),
            staging_dir: None,
            engine_timeout_secs: DEFAULT_ENGINE_TIMEOUT.as_secs(),
        }
    }
}
