//! Heuristic move scoring. Higher is better for the side making the move.

use chess::{Board, BoardStatus, ChessMove, Piece};

use chess_core::{Side, Square};

use crate::board_utils::{captured_piece, captures_on, is_castling_move, is_defended, attackers, piece_value};
use crate::tactics::{is_fork, lines_up_two_targets, newly_hanging};

/// Score assigned to a mating move; dominates every other term.
pub const MATE_SCORE: f64 = 100.0;

pub const CHECK_BONUS: f64 = 3.0;
pub const HANGING_TARGET_BONUS: f64 = 1.5;
pub const FORK_BONUS: f64 = 4.0;
pub const LINE_BONUS: f64 = 3.0;
pub const CENTER_BONUS: f64 = 1.5;
pub const EXTENDED_CENTER_BONUS: f64 = 0.5;
pub const ADVANCED_PAWN_BONUS: f64 = 2.0;
pub const SEVENTH_RANK_PAWN_BONUS: f64 = 4.0;
pub const CASTLE_BONUS: f64 = 3.0;
pub const DEVELOPMENT_BONUS: f64 = 0.5;
pub const EXPOSURE_PENALTY: f64 = 0.8;

const CENTER: [&str; 4] = ["d4", "d5", "e4", "e5"];
const EXTENDED_CENTER: [&str; 12] = [
    "c3", "c4", "c5", "c6", "d3", "d6", "e3", "e6", "f3", "f4", "f5", "f6",
];

pub fn score_move(board: &Board, m: ChessMove) -> f64 {
    let mover = board.side_to_move();
    let side = Side::from(mover);
    let piece = board.piece_on(m.get_source()).unwrap_or(Piece::Pawn);
    let after = board.make_move_new(m);
    let from = Square::from(m.get_source());
    let to = Square::from(m.get_dest());

    let mut score = 0.0;

    if let Some(victim) = captured_piece(board, m) {
        let gained = piece_value(victim) as f64;
        let risked = piece_value(piece) as f64;
        if gained >= risked {
            score += 2.0 * gained + 1.0;
        } else if !captures_on(&after, m.get_dest()).is_empty() {
            score += gained - risked;
        } else {
            score += 2.0 * gained;
        }
    }

    if after.status() == BoardStatus::Checkmate {
        return MATE_SCORE;
    }
    if after.checkers().popcnt() > 0 {
        score += CHECK_BONUS;
    }

    score += HANGING_TARGET_BONUS * newly_hanging(board, &after, mover) as f64;

    if is_fork(&after, m.get_dest(), mover) {
        score += FORK_BONUS;
    }
    if lines_up_two_targets(&after, m.get_dest(), mover) {
        score += LINE_BONUS;
    }

    let dest = to.to_string();
    if matches!(piece, Piece::Knight | Piece::Bishop) {
        if CENTER.contains(&dest.as_str()) {
            score += CENTER_BONUS;
        } else if EXTENDED_CENTER.contains(&dest.as_str()) {
            score += EXTENDED_CENTER_BONUS;
        }
    }

    if piece == Piece::Pawn {
        let rank = to.relative_rank(side);
        if rank >= 6 {
            score += ADVANCED_PAWN_BONUS;
        }
        if rank == 7 {
            score += SEVENTH_RANK_PAWN_BONUS;
        }
    }

    if is_castling_move(board, m) {
        score += CASTLE_BONUS;
    }

    if !matches!(piece, Piece::Pawn | Piece::King) && from.rank() == side.back_rank() {
        score += DEVELOPMENT_BONUS;
    }

    let exposed = attackers(&after, !mover, m.get_dest()).popcnt() > 0
        && !is_defended(&after, mover, m.get_dest());
    if exposed {
        score -= EXPOSURE_PENALTY * piece_value(piece) as f64;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::notation::parse_legal_uci;
    use std::str::FromStr;

    fn score(fen: &str, uci: &str) -> f64 {
        let board = Board::from_str(fen).unwrap();
        let m = parse_legal_uci(&board, uci).unwrap();
        score_move(&board, m)
    }

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_opening_moves() {
        assert_eq!(score(START, "e2e4"), 0.0);
        // Development off the back rank plus an extended-centre square.
        assert_eq!(score(START, "g1f3"), 1.0);
    }

    #[test]
    fn test_mate_dominates() {
        assert_eq!(score("6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1", "d1d8"), MATE_SCORE);
    }

    #[test]
    fn test_winning_capture() {
        // Pawn takes an undefended knight: 2*3+1, no penalties.
        let value = score("4k3/8/8/3n4/4P3/8/8/4K3 w - - 0 1", "e4d5");
        assert_eq!(value, 7.0);
    }

    #[test]
    fn test_losing_capture_into_recapture() {
        // Queen grabs a pawn guarded by another pawn: 1 - 9, then exposed.
        let value = score("4k3/8/2p5/3p4/8/8/8/3QK3 w - - 0 1", "d1d5");
        assert!(value < -10.0, "got {value}");
    }

    #[test]
    fn test_castling_bonus() {
        let value = score("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1", "e1g1");
        assert!(value >= CASTLE_BONUS);
    }

    #[test]
    fn test_seventh_rank_pawn() {
        let value = score("4k3/8/1P6/8/8/8/8/4K3 w - - 0 1", "b6b7");
        assert_eq!(value, ADVANCED_PAWN_BONUS + SEVENTH_RANK_PAWN_BONUS);
    }

    #[test]
    fn test_knight_check_with_one_target_is_not_brilliant() {
        // Nc7+ hits the king and the a8 rook; only the check bonus applies.
        let value = score("r3k3/8/8/3N4/8/8/8/4K3 w - - 0 1", "d5c7");
        assert!(value >= CHECK_BONUS);
        assert!(value < CHECK_BONUS + FORK_BONUS, "got {value}");
        assert!(value < 8.0);
    }
}
