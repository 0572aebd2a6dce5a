//! Game engine error types

use thiserror::Error;

use chess_core::{PieceKind, RulesError};
use search_worker::SearchError;

/// Why a move could not be applied to the board.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("A promotion is waiting for its piece choice")]
    PromotionPending,

    #[error("No promotion is pending")]
    NoPendingPromotion,

    #[error("Promotion token does not match the pending promotion")]
    TokenMismatch,

    #[error("Cannot promote to {0}")]
    InvalidPromotionPiece(PieceKind),

    #[error("Piece registry out of sync: {0}")]
    Registry(String),
}

impl From<RulesError> for MoveError {
    fn from(e: RulesError) -> Self {
        MoveError::IllegalMove(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum GameError {
    #[error("It is not the player's turn")]
    NotPlayerTurn,

    #[error("The AI is not waiting to move")]
    NotAiTurn,

    #[error("The game is over")]
    GameOver,

    #[error("No game has been started")]
    NotStarted,

    #[error(transparent)]
    Move(#[from] MoveError),

    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),

    #[error("Local search failed: {0}")]
    Search(#[from] SearchError),

    #[error("History error: {0}")]
    History(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
