// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Routing write referencing a queue that does not exist
    #[error("Queue not found: {queue_name}")]
    QueueNotFound { queue_name: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn queue_not_found(queue_name: impl Into<String>) -> Self {
        AppError::QueueNotFound {
            queue_name: queue_name.into(),
        }
    }

    /// True for both generic and routing-specific "not found" conditions
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_) | AppError::QueueNotFound { .. })
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in the infra-sql crate
// by converting to AppError::Database(String)
