//! Remote backend error types

use thiserror::Error;

/// Failure talking to a provider.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Provider returned HTTP {status}")]
    Http { status: u16 },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a single decision attempt was discarded. Always recovered by
/// retrying; never surfaced past the decision engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecisionFailure {
    #[error("Could not parse a move from the response")]
    ParseFailure,

    #[error("Move {0} is not legal here")]
    NotLegal(String),

    #[error("Rules rejected {0}")]
    RulesRejected(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl From<LlmError> for DecisionFailure {
    fn from(e: LlmError) -> Self {
        DecisionFailure::BackendUnavailable(e.to_string())
    }
}
