

use thiserror::Error;


#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Conversation memory error: {0}")]
    Memory(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}


pub type Result<T> = std::result::Result<T, PreprocessError>;
