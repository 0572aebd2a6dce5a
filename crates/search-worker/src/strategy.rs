use async_trait::async_trait;
use chess::{Board, ChessMove};

use crate::error::SearchError;

/// Something that picks a move for the side to move.
#[async_trait]
pub trait SearchStrategy: Send {
    fn name(&self) -> &str;

    async fn choose_move(&mut self, board: &Board) -> Result<ChessMove, SearchError>;

    /// Called once when the worker stops.
    async fn shutdown(&mut self) {}
}
