// SPDX-License-Identifier: MIT

//! Storage-level errors.

use std::path::PathBuf;
use thiserror::Error;

/// Failure touching a collection file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage I/O failed at {path}: {detail}")]
    Io { path: PathBuf, detail: String },

    #[error("collection file at {path} is corrupt: {detail}")]
    Corrupt { path: PathBuf, detail: String },
}

impl From<StoreError> for maestro_core::DomainError {
    fn from(err: StoreError) -> Self {
        maestro_core::DomainError::Storage(err.to_string())
    }
}
