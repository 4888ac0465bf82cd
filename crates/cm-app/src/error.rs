//! Error types for the cm-app service layer.

use std::path::PathBuf;

/// Application error shared by every front-end.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to read {path}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config validation failed: {0}")]
    Validation(String),

    #[error("Hub error: {0}")]
    Hub(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

/// Result type for cm-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<cm_project::ProjectError> for AppError {
    fn from(err: cm_project::ProjectError) -> Self {
        match err {
            cm_project::ProjectError::Validation(err) => AppError::Validation(err.to_string()),
            other => AppError::Config(other.to_string()),
        }
    }
}

impl From<cm_project::ValidationError> for AppError {
    fn from(err: cm_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<cm_hub::HubError> for AppError {
    fn from(err: cm_hub::HubError) -> Self {
        AppError::Hub(err.to_string())
    }
}
