//! Per-game record of every applied move, cleared when a new game starts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chess_core::MoveDescriptor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveMemory {
    /// 1-based ply index within the game.
    pub move_number: u32,
    /// Position after the move.
    pub fen: String,
    pub uci: String,
    pub san: String,
    /// Rationale from the remote model; empty for every other move.
    pub reasoning: String,
    pub is_capture: bool,
    pub is_check: bool,
    pub is_promotion: bool,
    pub is_castle: bool,
    pub timestamp: DateTime<Utc>,
}

impl MoveMemory {
    pub fn from_descriptor(
        move_number: u32,
        fen_after: impl Into<String>,
        descriptor: &MoveDescriptor,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            move_number,
            fen: fen_after.into(),
            uci: descriptor.uci(),
            san: descriptor.san.clone(),
            reasoning: reasoning.into(),
            is_capture: descriptor.is_capture(),
            is_check: descriptor.is_check(),
            is_promotion: descriptor.is_promotion(),
            is_castle: descriptor.is_castle(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_key_moment(&self) -> bool {
        self.is_capture || self.is_check || self.is_promotion || self.is_castle
    }
}

#[derive(Debug, Clone, Default)]
pub struct GameMemory {
    moves: Vec<MoveMemory>,
}

impl GameMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the memory for `descriptor`, numbering it after the last entry.
    pub fn record(&mut self, fen_after: &str, descriptor: &MoveDescriptor, reasoning: &str) -> &MoveMemory {
        let number = self.moves.len() as u32 + 1;
        self.moves
            .push(MoveMemory::from_descriptor(number, fen_after, descriptor, reasoning));
        &self.moves[self.moves.len() - 1]
    }

    pub fn moves(&self) -> &[MoveMemory] {
        &self.moves
    }

    pub fn last_moves(&self, count: usize) -> &[MoveMemory] {
        let start = self.moves.len().saturating_sub(count);
        &self.moves[start..]
    }

    pub fn key_moments(&self) -> Vec<&MoveMemory> {
        self.moves.iter().filter(|m| m.is_key_moment()).collect()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn clear(&mut self) {
        self.moves.clear();
    }
}
