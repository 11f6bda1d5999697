//! Error types for the memora application.
//!
//! Store mutations never fail for well-formed input; the variants here cover
//! the durable storage layer, configuration and the command-line surface.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the memora application.
#[derive(Error, Debug)]
pub enum MemoraError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A durable write did not reach disk. In-memory state is still valid.
    #[error("Changes may not survive a restart, failed to persist {path}: {message}")]
    PersistenceFailure { path: PathBuf, message: String },

    /// Note was not found when performing an operation.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}

impl MemoraError {
    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, MemoraError::PersistenceFailure { .. })
    }
}
