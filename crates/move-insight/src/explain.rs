//! Human-readable reasons for why a move is strong.

use chess::{Board, BoardStatus, ChessMove, Piece};

use chess_core::{Side, Square};

use crate::board_utils::{captured_piece, piece_name, piece_value};
use crate::tactics::{is_fork, lines_up_two_targets};

/// Explain `m` (whose SAN is `san`) from the strongest tactical signal down.
pub fn explain(board: &Board, m: ChessMove, san: &str) -> String {
    let mover = board.side_to_move();
    let piece = board.piece_on(m.get_source()).unwrap_or(Piece::Pawn);
    let victim = captured_piece(board, m);
    let after = board.make_move_new(m);

    if after.status() == BoardStatus::Checkmate {
        return format!("{san} leads to checkmate!");
    }

    if after.checkers().popcnt() > 0 {
        return match victim {
            Some(v) => format!(
                "{san} captures the {} with check, a powerful double threat.",
                piece_name(v)
            ),
            None => format!("{san} delivers check, forcing your opponent to respond."),
        };
    }

    if let Some(v) = victim {
        let gained = piece_value(v);
        let risked = piece_value(piece);
        if gained > risked {
            return format!(
                "{san} wins material by capturing a {} ({gained}) with your {} ({risked}).",
                piece_name(v),
                piece_name(piece)
            );
        }
        return format!("Capturing with {san} wins the {}.", piece_name(v));
    }

    if is_fork(&after, m.get_dest(), mover) {
        return format!("{san} creates a fork, attacking multiple pieces at once!");
    }

    if lines_up_two_targets(&after, m.get_dest(), mover) {
        return format!("{san} creates a pin or skewer along the line, trapping an opponent piece.");
    }

    if piece == Piece::Pawn && Square::from(m.get_dest()).relative_rank(Side::from(mover)) >= 6 {
        return format!("{san} pushes the pawn closer to promotion, a dangerous threat.");
    }

    format!("{san} was a stronger move in this position.")
}
