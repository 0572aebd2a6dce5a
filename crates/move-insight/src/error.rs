//! Insight error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InsightError {
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("Move not legal in position: {0}")]
    UnknownMove(String),
}
