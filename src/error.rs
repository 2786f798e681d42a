use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Frame error: {0}")]
    Frame(String),

    #[error("Intent error: {0}")]
    Intent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, AgentError>;
