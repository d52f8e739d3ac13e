use thiserror::Error;

#[derive(Error, Debug)]
pub enum DutyError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Capacity/duplicate races detected at write time. Recoverable: the
    /// caller re-queries and shows the corrected state.
    #[error("Booking conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type DutyResult<T> = Result<T, DutyError>;
