//! Search worker error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Worker channel closed")]
    Channel,

    #[error("No legal move available")]
    NoMove,

    #[error("Worker reported failure: {0}")]
    Worker(String),

    #[error("Rules error: {0}")]
    Rules(#[from] chess_core::RulesError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
