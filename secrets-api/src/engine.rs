// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Sealing engine adapter.
//!
//! The service never encrypts anything itself. [`SealingEngine`] abstracts the
//! external tool that does, and [`Kubeseal`] drives the `kubeseal` binary as a
//! subprocess.
//!
//! # Invocation
//!
//! 1. Key material referenced by the call is checked first; a missing file is
//!    reported as [`AppError::KeyNotFound`] without spawning anything
//! 2. The input document is encoded and staged in a private directory
//! 3. The engine is spawned with the staged file as standard input
//! 4. Standard output and standard error are collected while waiting for the
//!    process to exit, bounded by the configured timeout
//! 5. Standard output is decoded back into a document
//!
//! The staged file is removed when step 5 finishes or any step fails. A timed
//! out engine is killed and reaped before the error is returned.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use zeroize::Zeroizing;

use crate::codec;
use crate::configuration::ApiOptions;
use crate::errors::AppError;
use crate::models::{SealedSecretDocument, SecretDocument};
use crate::staging::{StagedFile, StagingArea};

/// Transforms secrets to and from their sealed form.
#[async_trait]
pub trait SealingEngine: Send + Sync {
    /// Encrypts `document` for the configured controller certificate.
    async fn seal(&self, document: &SecretDocument) -> Result<SealedSecretDocument, AppError>;

    /// Decrypts `document` with the private key at `private_key`.
    async fn unseal(
        &self,
        document: &SealedSecretDocument,
        private_key: &Path,
    ) -> Result<SecretDocument, AppError>;
}

/// [`SealingEngine`] backed by the `kubeseal` CLI.
#[derive(Debug)]
pub struct Kubeseal {
    binary: PathBuf,
    cert_path: Option<PathBuf>,
    timeout: Duration,
    staging: StagingArea,
}

impl Kubeseal {
    pub fn new(
        binary: impl Into<PathBuf>,
        cert_path: Option<PathBuf>,
        timeout: Duration,
        staging: StagingArea,
    ) -> Self {
        Self {
            binary: binary.into(),
            cert_path,
            timeout,
            staging,
        }
    }

    /// Builds the engine described by the command line options.
    ///
    /// # Errors
    ///
    /// Returns an error if the staging directory cannot be created.
    pub fn from_options(options: &ApiOptions) -> Result<Self, std::io::Error> {
        let staging = StagingArea::new(options.staging_dir.as_deref())?;
        Ok(Self::new(
            &options.kubeseal_path,
            options.cert_path.clone(),
            options.engine_timeout(),
            staging,
        ))
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Runs the engine once with `staged` as standard input and returns its
    /// standard output.
    ///
    /// # Errors
    ///
    /// - [`AppError::EngineUnavailable`] - the binary could not be started
    /// - [`AppError::EngineRejected`] - the process exited unsuccessfully
    /// - [`AppError::EngineTimeout`] - the process did not exit in time
    #[tracing::instrument(skip(self, staged))]
    async fn run(&self, args: &[&str], staged: &StagedFile) -> Result<Zeroizing<Vec<u8>>, AppError> {
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::from(staged.reader()?))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("[engine] failed to start {}: {:?}", self.binary.display(), e);
                AppError::EngineUnavailable(format!("{}: {}", self.binary.display(), e))
            })?;

        let mut stdout = child.stdout.take().ok_or(AppError::InternalServerError)?;
        let mut stderr = child.stderr.take().ok_or(AppError::InternalServerError)?;
        let mut out = Zeroizing::new(Vec::new());
        let mut err = Vec::new();

        // pipes are drained concurrently with the wait so a chatty engine
        // cannot block on a full pipe buffer
        let result = tokio::time::timeout(self.timeout, async {
            let (out_read, err_read, status) = tokio::join!(
                stdout.read_to_end(&mut out),
                stderr.read_to_end(&mut err),
                child.wait()
            );
            out_read?;
            err_read?;
            Ok::<_, std::io::Error>(status?)
        })
        .await;

        let status = match result {
            Ok(status) => status?,
            Err(_) => {
                tracing::warn!(
                    "[engine] {} timed out after {:?}, killing",
                    self.binary.display(),
                    self.timeout
                );
                if let Err(e) = child.kill().await {
                    tracing::error!("[engine] failed to kill engine: {:?}", e);
                }
                return Err(AppError::EngineTimeout(self.timeout));
            }
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&err).trim().to_string();
            tracing::warn!("[engine] exited with {:?}: {}", status.code(), stderr);
            return Err(AppError::EngineRejected(status.code(), stderr));
        }

        tracing::trace!("[engine] received {} bytes", out.len());

        Ok(out)
    }
}

#[async_trait]
impl SealingEngine for Kubeseal {
    #[tracing::instrument(skip(self, document), fields(name = %document.metadata.name, namespace = %document.metadata.namespace))]
    async fn seal(&self, document: &SecretDocument) -> Result<SealedSecretDocument, AppError> {
        let mut args = vec!["--format", "yaml"];
        if let Some(cert_path) = &self.cert_path {
            ensure_exists(cert_path)?;
            args.push("--cert");
            args.push(path_arg(cert_path)?);
        }

        let staged = self
            .staging
            .stage(&document.metadata.name, &codec::to_yaml(document)?)?;
        let output = self.run(&args, &staged).await?;
        let sealed = codec::parse_sealed(&output)?;

        if sealed.key_set() != document.key_set() {
            tracing::error!(
                "[engine] sealed keys {:?} do not match input keys {:?}",
                sealed.key_set(),
                document.key_set()
            );
            return Err(AppError::EngineOutputMismatch);
        }

        Ok(sealed)
    }

    #[tracing::instrument(skip(self, document), fields(name = %document.metadata.name, namespace = %document.metadata.namespace))]
    async fn unseal(
        &self,
        document: &SealedSecretDocument,
        private_key: &Path,
    ) -> Result<SecretDocument, AppError> {
        ensure_exists(private_key)?;
        let args = [
            "--recovery-unseal",
            "--recovery-private-key",
            path_arg(private_key)?,
            "--format",
            "yaml",
        ];

        let staged = self
            .staging
            .stage(&document.metadata.name, &codec::to_yaml(document)?)?;
        let output = self.run(&args, &staged).await?;

        codec::parse_secret(&output)
    }
}

#[inline]
fn ensure_exists(path: &Path) -> Result<(), AppError> {
    if !path.is_file() {
        tracing::error!("[engine] key material missing at {}", path.display());
        return Err(AppError::KeyNotFound(path.to_path_buf()));
    }
    Ok(())
}

#[inline]
fn path_arg(path: &Path) -> Result<&str, AppError> {
    path.to_str().ok_or_else(|| {
        tracing::error!("[engine] path is not valid UTF-8: {}", path.display());
        AppError::InternalServerError
    })
}
