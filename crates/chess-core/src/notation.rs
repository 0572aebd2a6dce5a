//! UCI parsing and SAN rendering on top of the `chess` crate.

use chess::{Board, BoardStatus, ChessMove, MoveGen, Piece};

use crate::error::RulesError;
use crate::types::{PieceKind, Square};

/// Parse a UCI move string (`e2e4`, `e7e8q`) without checking legality.
pub fn parse_uci(uci: &str) -> Result<ChessMove, RulesError> {
    let uci = uci.trim();
    if !(4..=5).contains(&uci.len()) || !uci.is_ascii() {
        return Err(RulesError::InvalidNotation(uci.to_string()));
    }

    let from: Square = uci[0..2].parse()?;
    let to: Square = uci[2..4].parse()?;

    let promotion = match uci[4..].chars().next() {
        Some(c) => match PieceKind::from_letter(c) {
            Some(kind) if kind.is_promotion_target() => Some(Piece::from(kind)),
            _ => return Err(RulesError::InvalidNotation(uci.to_string())),
        },
        None => None,
    };

    Ok(ChessMove::new(from.to_chess(), to.to_chess(), promotion))
}

/// Parse a UCI move and require it to be legal on `board`.
pub fn parse_legal_uci(board: &Board, uci: &str) -> Result<ChessMove, RulesError> {
    let m = parse_uci(uci)?;
    if board.legal(m) {
        Ok(m)
    } else {
        Err(RulesError::IllegalMove(uci.trim().to_string()))
    }
}

/// Find the legal move whose SAN matches `san`, ignoring check markers.
pub fn parse_san(board: &Board, san: &str) -> Option<ChessMove> {
    let wanted = strip_suffix(san.trim());
    MoveGen::new_legal(board).find(|m| strip_suffix(&to_san(board, *m)) == wanted)
}

fn strip_suffix(san: &str) -> &str {
    san.trim_end_matches(['+', '#', '!', '?'])
}

/// Render a legal move in standard algebraic notation.
pub fn to_san(board: &Board, m: ChessMove) -> String {
    let src = m.get_source();
    let dst = m.get_dest();
    let piece = match board.piece_on(src) {
        Some(p) => p,
        None => return format!("{}{}", Square::from(src), Square::from(dst)),
    };

    let from = Square::from(src);
    let to = Square::from(dst);

    let mut san = String::new();
    let file_delta = (from.file() as i8 - to.file() as i8).abs();

    if piece == Piece::King && file_delta == 2 {
        san.push_str(if to.file() > from.file() { "O-O" } else { "O-O-O" });
    } else {
        let is_capture =
            board.piece_on(dst).is_some() || (piece == Piece::Pawn && from.file() != to.file());

        if piece == Piece::Pawn {
            if is_capture {
                san.push(from.file_char());
            }
        } else {
            san.push(PieceKind::from(piece).letter().to_ascii_uppercase());
            san.push_str(&disambiguation(board, m, piece));
        }

        if is_capture {
            san.push('x');
        }
        san.push_str(&to.to_string());

        if let Some(promo) = m.get_promotion() {
            san.push('=');
            san.push(PieceKind::from(promo).letter().to_ascii_uppercase());
        }
    }

    let after = board.make_move_new(m);
    if after.status() == BoardStatus::Checkmate {
        san.push('#');
    } else if after.checkers().popcnt() > 0 {
        san.push('+');
    }

    san
}

/// File, rank or full square needed to tell `m` apart from sibling moves.
fn disambiguation(board: &Board, m: ChessMove, piece: Piece) -> String {
    let from = Square::from(m.get_source());
    let rivals: Vec<Square> = MoveGen::new_legal(board)
        .filter(|other| {
            other.get_dest() == m.get_dest()
                && other.get_source() != m.get_source()
                && board.piece_on(other.get_source()) == Some(piece)
        })
        .map(|other| Square::from(other.get_source()))
        .collect();

    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|r| r.file() != from.file()) {
        from.file_char().to_string()
    } else if rivals.iter().all(|r| r.rank() != from.rank()) {
        from.rank_char().to_string()
    } else {
        from.to_string()
    }
}
