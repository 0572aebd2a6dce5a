//! Classifies the player's move against the best-scoring alternative.

use std::str::FromStr;

use chess::{BitBoard, Board, ChessMove, Color, MoveGen, EMPTY};
use serde::{Deserialize, Serialize};
use tracing::debug;

use chess_core::notation::{parse_legal_uci, parse_san, to_san};
use chess_core::Square;

use crate::board_utils::{attacks, captured_piece, captures_on, piece_name, piece_value};
use crate::error::InsightError;
use crate::explain::explain;
use crate::scoring::score_move;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveQuality {
    Brilliant,
    Good,
    Inaccuracy,
    Blunder,
    MissedWin,
}

impl MoveQuality {
    /// Ordering used when a downgrade check competes with the score-based
    /// class: a check may only make the verdict harsher.
    fn severity(self) -> u8 {
        match self {
            MoveQuality::Brilliant => 0,
            MoveQuality::Good => 1,
            MoveQuality::Inaccuracy => 2,
            MoveQuality::MissedWin => 3,
            MoveQuality::Blunder => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MoveQuality::Brilliant => "brilliant",
            MoveQuality::Good => "good",
            MoveQuality::Inaccuracy => "inaccuracy",
            MoveQuality::Blunder => "blunder",
            MoveQuality::MissedWin => "missed_win",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveInsight {
    pub player_move: String,
    pub better_move: Option<String>,
    pub explanation: String,
    pub quality: MoveQuality,
}

/// A downgrade found by one of the follow-up checks.
struct Downgrade {
    quality: MoveQuality,
    explanation: String,
}

#[derive(Debug, Clone)]
pub struct MoveQualityEvaluator {
    /// Scores at or above this are brilliant when nothing beats them.
    pub brilliant_threshold: f64,
    /// Largest gap to the best move still counted as good.
    pub good_gap: f64,
    /// Largest gap still counted as an inaccuracy.
    pub inaccuracy_gap: f64,
    /// Best-move score that turns a large gap into a missed win.
    pub winning_threshold: f64,
}

impl Default for MoveQualityEvaluator {
    fn default() -> Self {
        Self {
            brilliant_threshold: 8.0,
            good_gap: 2.0,
            inaccuracy_gap: 5.0,
            winning_threshold: 8.0,
        }
    }
}

impl MoveQualityEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze `player_move` (UCI or SAN) played from the position `fen`.
    pub fn analyze(&self, fen: &str, player_move: &str) -> Result<MoveInsight, InsightError> {
        let board =
            Board::from_str(fen).map_err(|_| InsightError::InvalidPosition(fen.to_string()))?;
        let played = parse_legal_uci(&board, player_move)
            .ok()
            .or_else(|| parse_san(&board, player_move))
            .ok_or_else(|| InsightError::UnknownMove(player_move.to_string()))?;

        let scored: Vec<(ChessMove, f64)> = MoveGen::new_legal(&board)
            .map(|m| (m, score_move(&board, m)))
            .collect();

        let mut best = (played, f64::MIN);
        for &(m, score) in &scored {
            if score > best.1 {
                best = (m, score);
            }
        }
        let (best_move, best_score) = best;
        let player_score = scored
            .iter()
            .find(|(m, _)| *m == played)
            .map(|(_, s)| *s)
            .unwrap_or(0.0);

        let player_san = to_san(&board, played);
        let best_san = to_san(&board, best_move);
        let gap = best_score - player_score;

        debug!(player = %player_san, player_score, best = %best_san, best_score, "Scored move");

        let mut better_move = None;
        let mut explanation = String::new();
        let mut quality = if player_score >= best_score {
            if player_score >= self.brilliant_threshold {
                explanation = explain(&board, played, &player_san);
                MoveQuality::Brilliant
            } else {
                MoveQuality::Good
            }
        } else if gap <= self.good_gap {
            MoveQuality::Good
        } else {
            better_move = Some(best_san.clone());
            explanation = explain(&board, best_move, &best_san);
            if gap <= self.inaccuracy_gap {
                MoveQuality::Inaccuracy
            } else if best_score >= self.winning_threshold {
                MoveQuality::MissedWin
            } else {
                MoveQuality::Blunder
            }
        };

        // A blunder that hangs the moved piece is better explained by the
        // piece it loses than by the alternative.
        if matches!(
            quality,
            MoveQuality::Good | MoveQuality::Inaccuracy | MoveQuality::Blunder
        ) {
            if let Some(found) = hanging_piece(&board, played) {
                if found.quality.severity() >= quality.severity() {
                    quality = found.quality;
                }
                explanation = found.explanation;
                if best_move != played {
                    better_move = Some(best_san.clone());
                }
            }
        }

        if quality == MoveQuality::Good {
            if let Some(found) = abandoned_piece(&board, played) {
                quality = found.quality;
                explanation = found.explanation;
                if best_move != played {
                    better_move = Some(best_san);
                }
            }
        }

        Ok(MoveInsight {
            player_move: player_san,
            better_move,
            explanation,
            quality,
        })
    }
}

/// Can the opponent immediately take the moved piece with something cheaper?
fn hanging_piece(board: &Board, m: ChessMove) -> Option<Downgrade> {
    let moved = board.piece_on(m.get_source())?;
    let after = board.make_move_new(m);
    let dest = m.get_dest();

    let cheapest = captures_on(&after, dest)
        .into_iter()
        .filter_map(|c| after.piece_on(c.get_source()))
        .min_by_key(|p| piece_value(*p))?;

    let moved_value = piece_value(moved);
    if piece_value(cheapest) >= moved_value {
        return None;
    }

    let quality = if moved_value >= 5 {
        MoveQuality::Blunder
    } else {
        MoveQuality::Inaccuracy
    };
    Some(Downgrade {
        quality,
        explanation: format!(
            "Your {} on {} can be captured by their {}, losing material.",
            piece_name(moved),
            Square::from(dest),
            piece_name(cheapest)
        ),
    })
}

/// Did the move stop guarding a rook or queen the opponent can now win?
fn abandoned_piece(board: &Board, m: ChessMove) -> Option<Downgrade> {
    let mover: Color = board.side_to_move();
    let guarded_before = attacks(board, m.get_source());
    let after = board.make_move_new(m);

    for capture in MoveGen::new_legal(&after) {
        let target = capture.get_dest();
        if target == m.get_dest() || after.color_on(target) != Some(mover) {
            continue;
        }
        let (victim, attacker) = match (
            captured_piece(&after, capture),
            after.piece_on(capture.get_source()),
        ) {
            (Some(v), Some(a)) => (v, a),
            _ => continue,
        };
        if piece_value(victim) < 5 || piece_value(attacker) >= piece_value(victim) {
            continue;
        }
        if guarded_before & BitBoard::from_square(target) != EMPTY {
            return Some(Downgrade {
                quality: MoveQuality::Blunder,
                explanation: format!(
                    "Moving away left your {} on {} undefended!",
                    piece_name(victim),
                    Square::from(target)
                ),
            });
        }
    }
    None
}
