//! Rules error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Invalid move notation: {0}")]
    InvalidNotation(String),

    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("No move to undo")]
    NothingToUndo,
}
