// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use crate::configuration::ApiOptions;
use crate::constants::MAX_BODY_SIZE;
use crate::engine::SealingEngine;
use crate::errors::AppError;
use crate::routes;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::serve::Serve;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub options: ApiOptions,
    pub engine: Arc<dyn SealingEngine>,
}

pub struct Application {
    port: u16,
    server: Serve<TcpListener, Router, Router>,
}

impl Application {
    pub async fn build(
        options: ApiOptions,
        engine: Arc<dyn SealingEngine>,
    ) -> Result<Self, std::io::Error> {
        let address = format!("{}:{}", options.host, options.port);
        let listener = TcpListener::bind(address).await?;
        let server = run(listener, options.clone(), engine)?;
        let port = server.local_addr()?.port();

        tracing::info!("[api] listening at http://{}:{}", options.host, port);

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/// Builds the router with all middleware applied.
///
/// Request bodies are capped at [`MAX_BODY_SIZE`] and every request is bounded
/// by [`ApiOptions::request_timeout`], which leaves the engine timeout room to
/// fire first. A request that hits the router timeout gets the same structured
/// error body as every other failure.
pub fn create_router(options: ApiOptions, engine: Arc<dyn SealingEngine>) -> Router {
    let request_timeout = options.request_timeout();
    let state = Arc::new(AppState { options, engine });

    Router::new()
        .route("/health", get(routes::health))
        .route("/encrypt", post(routes::encrypt))
        .route("/decrypt", post(routes::decrypt))
        .route("/secrets", get(routes::list_secrets))
        .route("/secrets/{filename}/decrypt", get(routes::decrypt_file))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::map_response(move |response: Response| async move {
            structure_timeout(response, request_timeout)
        }))
        .layer(TraceLayer::new_for_http())
}

/// Replaces the bare response of the timeout layer with an [`AppError`] body.
fn structure_timeout(response: Response, request_timeout: Duration) -> Response {
    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response;
    }
    tracing::warn!("[api] request timed out after {:?}", request_timeout);
    AppError::RequestTimeout(request_timeout).into_response()
}

#[tracing::instrument(skip(listener, engine))]
pub fn run(
    listener: TcpListener,
    options: ApiOptions,
    engine: Arc<dyn SealingEngine>,
) -> Result<Serve<TcpListener, Router, Router>, std::io::Error> {
    let app = create_router(options, engine);
    Ok(axum::serve(listener, app))
}
