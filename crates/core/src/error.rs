// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// NotFound at either layer (call target absent, nothing waiting)
    pub fn is_not_found(&self) -> bool {
        match self {
            AppError::Domain(e) => e.is_not_found(),
            AppError::NotFound(_) => true,
            _ => false,
        }
    }

    /// InvalidInput at either layer (empty ticket number, empty announcement)
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            AppError::Domain(crate::domain::DomainError::InvalidInput(_)) | AppError::Validation(_)
        )
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in infra-sqlite crate
// by converting to AppError::Database(String)
