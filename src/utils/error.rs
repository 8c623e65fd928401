use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Certificate error: {0}")]
    Certificate(String),
    #[error("Signature error: {0}")]
    Signature(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DocumentError>;
