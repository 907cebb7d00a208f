// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid queue definition for {name}: {reason}")]
    InvalidQueue { name: String, reason: String },

    #[error("Unknown config domain: {0}")]
    UnknownConfigDomain(String),

    #[error("Persisted value out of range: {0}")]
    OutOfRange(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
