// Defines a custom error type and a result type alias for the service using the thiserror crate.
use thiserror::Error;

// Make the response module public
pub mod response;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    // The #[from] attribute automatically converts a redis::RedisError into an AppError::Redis using the From trait.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Export error: {0}")]
    Export(#[from] csv::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
