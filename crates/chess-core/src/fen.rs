//! FEN serialization and editing.
//!
//! The `chess` crate's board does not track move counters, so the rules
//! oracle keeps them itself and writes complete FEN strings through here.

use std::str::FromStr;

use chess::{Board, Color};

use crate::error::RulesError;
use crate::types::{PieceKind, Side, Square};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN into a board, returning the move counters alongside.
pub fn parse(fen: &str) -> Result<(Board, u32, u32), RulesError> {
    let board = Board::from_str(fen.trim()).map_err(|_| RulesError::InvalidFen(fen.to_string()))?;
    let (halfmove, fullmove) = counters(fen);
    Ok((board, halfmove, fullmove))
}

/// Halfmove clock and fullmove number, defaulting to `0 1`.
pub fn counters(fen: &str) -> (u32, u32) {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    let halfmove = fields.get(4).and_then(|v| v.parse().ok()).unwrap_or(0);
    let fullmove = fields
        .get(5)
        .and_then(|v| v.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1);
    (halfmove, fullmove)
}

/// Full six-field FEN for `board`.
pub fn write(board: &Board, halfmove: u32, fullmove: u32) -> String {
    let side = match board.side_to_move() {
        Color::White => 'w',
        Color::Black => 'b',
    };
    format!(
        "{} {} {} {} {} {}",
        placement(board),
        side,
        castling_field(board),
        en_passant_field(board),
        halfmove,
        fullmove
    )
}

/// Piece-placement field only.
pub fn placement(board: &Board) -> String {
    let mut grid = [None; 64];
    for index in 0..64 {
        if let Some(sq) = Square::from_index(index) {
            let chess_sq = sq.to_chess();
            if let (Some(piece), Some(color)) = (board.piece_on(chess_sq), board.color_on(chess_sq)) {
                grid[index] = Some((Side::from(color), PieceKind::from(piece)));
            }
        }
    }
    render_grid(&grid)
}

fn castling_field(board: &Board) -> String {
    let white = board.castle_rights(Color::White);
    let black = board.castle_rights(Color::Black);
    let mut field = String::new();
    if white.has_kingside() {
        field.push('K');
    }
    if white.has_queenside() {
        field.push('Q');
    }
    if black.has_kingside() {
        field.push('k');
    }
    if black.has_queenside() {
        field.push('q');
    }
    if field.is_empty() {
        field.push('-');
    }
    field
}

/// The `chess` crate stores the square of the capturable pawn; FEN wants
/// the square the capturing pawn lands on.
fn en_passant_field(board: &Board) -> String {
    let mover = Side::from(board.side_to_move());
    board
        .en_passant()
        .and_then(|pawn| Square::from(pawn).offset(0, mover.forward()))
        .map(|target| target.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Rewrite one square of a FEN's placement field, keeping every other field.
pub fn with_piece(
    fen: &str,
    square: Square,
    piece: Option<(Side, PieceKind)>,
) -> Result<String, RulesError> {
    let mut fields: Vec<String> = fen.split_whitespace().map(str::to_string).collect();
    let placement = fields
        .first()
        .ok_or_else(|| RulesError::InvalidFen(fen.to_string()))?;
    let mut grid = parse_grid(placement).ok_or_else(|| RulesError::InvalidFen(fen.to_string()))?;
    grid[square.index()] = piece;
    fields[0] = render_grid(&grid);
    Ok(fields.join(" "))
}

type Grid = [Option<(Side, PieceKind)>; 64];

fn parse_grid(placement: &str) -> Option<Grid> {
    let mut grid: Grid = [None; 64];
    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != 8 {
        return None;
    }
    for (row_idx, row) in rows.iter().enumerate() {
        let rank = 7 - row_idx as u8;
        let mut file = 0u8;
        for c in row.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as u8;
                continue;
            }
            let kind = PieceKind::from_letter(c)?;
            let side = if c.is_ascii_uppercase() { Side::White } else { Side::Black };
            let sq = Square::new(file, rank)?;
            grid[sq.index()] = Some((side, kind));
            file += 1;
        }
        if file != 8 {
            return None;
        }
    }
    Some(grid)
}

fn render_grid(grid: &Grid) -> String {
    let mut out = String::new();
    for rank in (0..8u8).rev() {
        let mut empty = 0;
        for file in 0..8u8 {
            let entry = Square::new(file, rank).and_then(|sq| grid[sq.index()]);
            match entry {
                Some((side, kind)) => {
                    if empty > 0 {
                        out.push_str(&empty.to_string());
                        empty = 0;
                    }
                    let letter = kind.letter();
                    out.push(match side {
                        Side::White => letter.to_ascii_uppercase(),
                        Side::Black => letter,
                    });
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            out.push_str(&empty.to_string());
        }
        if rank > 0 {
            out.push('/');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_position_round_trip() {
        let (board, halfmove, fullmove) = parse(START_FEN).unwrap();
        assert_eq!(write(&board, halfmove, fullmove), START_FEN);
    }

    #[test]
    fn test_counters_default() {
        assert_eq!(counters("8/8/8/8/8/8/8/8 w - -"), (0, 1));
        assert_eq!(counters(START_FEN), (0, 1));
    }

    #[test]
    fn test_with_piece_replaces_square() {
        let fen = "4k3/8/8/8/8/8/8/4K2Q w - - 0 1";
        let h1: Square = "h1".parse().unwrap();
        let edited = with_piece(fen, h1, Some((Side::White, PieceKind::Knight))).unwrap();
        assert_eq!(edited, "4k3/8/8/8/8/8/8/4K2N w - - 0 1");

        let cleared = with_piece(fen, h1, None).unwrap();
        assert_eq!(cleared, "4k3/8/8/8/8/8/8/4K3 w - - 0 1");
    }

    #[test]
    fn test_with_piece_rejects_bad_placement() {
        let a1: Square = "a1".parse().unwrap();
        assert!(with_piece("8/8/8 w - - 0 1", a1, None).is_err());
    }

    #[test]
    fn test_invalid_fen() {
        assert!(parse("not a fen").is_err());
    }
}
