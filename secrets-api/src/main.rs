// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sealed_secrets_api::application::Application;
use sealed_secrets_api::configuration::ApiOptions;
use sealed_secrets_api::engine::Kubeseal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("[api] init");

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        // this needs to be set to remove duplicated information in the log.
        .with_current_span(false)
        .with_ansi(false)
        .without_time()
        // remove the name of the function from every log entry
        .with_target(false)
        .init();

    // get configuration options from arguments or environment variables
    let options = ApiOptions::parse();

    tracing::info!("[api] {:?}", &options);

    if !options.private_key_path.is_file() {
        tracing::warn!(
            "[api] private key not found at {}, unsealing will fail",
            options.private_key_path.display()
        );
    }

    let engine = Kubeseal::from_options(&options).context("failed to prepare staging directory")?;

    tracing::info!(
        "[api] staging documents in {}",
        engine.staging().root().display()
    );

    let application = Application::build(options, Arc::new(engine))
        .await
        .context("failed to bind listener")?;

    application
        .run_until_stopped()
        .await
        .context("server error")
}
