// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Short-lived on-disk staging for documents handed to the sealing engine.
//!
//! Every document is written to its own file in a private directory. The file
//! is owned by a [`StagedFile`] guard and removed when the guard is dropped,
//! which covers normal returns, engine failures, timeouts and cancelled
//! requests alike. File names combine the document name with a random suffix
//! so concurrent requests for the same secret never share a file.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile, TempDir};

use crate::constants::{MAX_STAGED_NAME_LENGTH, STAGED_FILE_SUFFIX, STAGING_DIR_PREFIX};
use crate::errors::AppError;

/// Directory in which [`StagedFile`]s are created.
#[derive(Debug)]
pub struct StagingArea {
    root: PathBuf,
    /// Set when the directory was created by us and must go away with us.
    _owned: Option<TempDir>,
}

impl StagingArea {
    /// Uses `dir` when given (created if needed), otherwise a fresh private
    /// temporary directory that is removed when the area is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: Option<&Path>) -> Result<Self, std::io::Error> {
        match dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                restrict_permissions(dir)?;
                Ok(Self {
                    root: dir.to_path_buf(),
                    _owned: None,
                })
            }
            None => {
                let owned = Builder::new().prefix(STAGING_DIR_PREFIX).tempdir()?;
                Ok(Self {
                    root: owned.path().to_path_buf(),
                    _owned: Some(owned),
                })
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `contents` to a new, uniquely named file.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InternalServerError`] if the file cannot be
    /// created or written; a partially written file is removed.
    #[tracing::instrument(skip(self, contents))]
    pub fn stage(&self, name: &str, contents: &[u8]) -> Result<StagedFile, AppError> {
        let mut file = Builder::new()
            .prefix(&format!("{}-", truncate_name(name)))
            .suffix(STAGED_FILE_SUFFIX)
            .tempfile_in(&self.root)?;
        file.write_all(contents)?;
        file.flush()?;

        tracing::debug!("[staging] staged {}", file.path().display());

        Ok(StagedFile { file })
    }
}

/// A document on disk for the duration of one engine invocation.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Opens an independent read handle positioned at the start of the file,
    /// suitable as a child process's standard input.
    pub fn reader(&self) -> Result<File, AppError> {
        Ok(self.file.reopen()?)
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        tracing::debug!("[staging] releasing {}", self.file.path().display());
    }
}

/// Keeps staged file names well below the file system's name limit.
fn truncate_name(name: &str) -> &str {
    let mut end = name.len().min(MAX_STAGED_NAME_LENGTH);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name.get(..end).unwrap_or_default()
}

#[cfg(unix)]
fn restrict_permissions(dir: &Path) -> Result<(), std::io::Error> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn restrict_permissions(_dir: &Path) -> Result<(), std::io::Error> {
    Ok(())
}
