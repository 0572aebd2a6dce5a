use serde::{Deserialize, Serialize};

use crate::types::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    White,
    Black,
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Checkmate,
    Stalemate,
    ThreefoldRepetition,
    InsufficientMaterial,
    FiftyMoveRule,
}

impl GameResult {
    pub fn winner(side: Side) -> GameResult {
        match side {
            Side::White => GameResult::White,
            Side::Black => GameResult::Black,
        }
    }

    /// PGN result token ("1-0", "0-1", "1/2-1/2").
    pub fn pgn_token(self) -> &'static str {
        match self {
            GameResult::White => "1-0",
            GameResult::Black => "0-1",
            GameResult::Draw => "1/2-1/2",
        }
    }

    /// End-of-game line shown to the human playing `player`.
    pub fn message_for(self, player: Side, reason: GameOverReason) -> String {
        match (self, reason) {
            (GameResult::Draw, GameOverReason::Stalemate) => "Draw by stalemate".to_string(),
            (GameResult::Draw, GameOverReason::ThreefoldRepetition) => {
                "Draw by threefold repetition".to_string()
            }
            (GameResult::Draw, GameOverReason::InsufficientMaterial) => {
                "Draw by insufficient material".to_string()
            }
            (GameResult::Draw, GameOverReason::FiftyMoveRule) => {
                "Draw by the fifty-move rule".to_string()
            }
            (GameResult::Draw, _) => "Draw".to_string(),
            (winner, _) if winner == GameResult::winner(player) => {
                "You won by checkmate!".to_string()
            }
            _ => "You lost by checkmate".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            GameResult::White.message_for(Side::White, GameOverReason::Checkmate),
            "You won by checkmate!"
        );
        assert_eq!(
            GameResult::White.message_for(Side::Black, GameOverReason::Checkmate),
            "You lost by checkmate"
        );
        assert_eq!(
            GameResult::Draw.message_for(Side::Black, GameOverReason::ThreefoldRepetition),
            "Draw by threefold repetition"
        );
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&GameOverReason::ThreefoldRepetition).unwrap();
        assert_eq!(json, "\"threefold_repetition\"");
        assert_eq!(serde_json::to_string(&GameResult::Draw).unwrap(), "\"draw\"");
    }
}
