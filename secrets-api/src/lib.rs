// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # Sealed Secrets API
//!
//! An HTTP API for sealing Kubernetes secrets and unsealing them again,
//! without requiring callers to have cluster access or `kubeseal` installed.
//!
//! This crate does not implement any cryptography. Every seal and unseal is
//! delegated to the `kubeseal` binary, which is invoked once per request.
//!
//! ## Architecture
//!
//! ```text
//! Client -> HTTP API -> codec -> staging -> kubeseal (subprocess)
//!                |                              |
//!                +-> scanner (*-sealed.yaml)    +-> stdout -> codec -> Client
//! ```
//!
//! ## Modules
//!
//! - [`application`]: HTTP server setup with Axum, body limits, and timeouts
//! - [`codec`]: YAML/JSON decoding and encoding of secret documents
//! - [`configuration`]: CLI argument parsing with clap
//! - [`constants`]: Configuration constants for the application
//! - [`engine`]: The sealing engine abstraction and the `kubeseal` adapter
//! - [`errors`]: Application error types with HTTP response mapping
//! - [`models`]: Document and response types with validation
//! - [`routes`]: HTTP route handlers
//! - [`scanner`]: Listing of sealed secret files on disk
//! - [`staging`]: Scoped temporary files handed to the engine
//!
//! ## Usage
//!
//! ```bash
//! sealed-secrets-api --port 5000 --private-key-path ./sealed-secrets-private.key
//! ```
//!
//! ## Security Considerations
//!
//! - Document names are validated as DNS-1123 subdomains and file names in
//!   paths must be plain file names, so neither can escape their directory
//! - Staged files are private to the process and removed on every exit path
//! - The engine is killed when it exceeds its timeout or the request is dropped
//! - Plaintext buffers are zeroized and secret values are never logged
//! - There is no authentication; bind to a trusted interface only

pub mod application;
pub mod codec;
pub mod configuration;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod models;
pub mod routes;
pub mod scanner;
pub mod staging;
