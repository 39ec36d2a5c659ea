use std::path::PathBuf;

use thiserror::Error;

use crate::notes::NoteError;
use crate::semantic::StoreError;

/// Domain-specific errors for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Could not parse frontmatter from {}", .0.display())]
    NotANote(PathBuf),

    #[error(transparent)]
    Notes(#[from] NoteError),

    #[error("Embedding failed: {0}")]
    Embedding(#[from] StoreError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
