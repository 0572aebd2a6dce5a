/// Board utility functions for move scoring

use chess::{BitBoard, Board, ChessMove, Color, MoveGen, Piece, Square, EMPTY};

use chess_core::PieceKind;

/// Piece value (king counts as 0)
pub fn piece_value(piece: Piece) -> i32 {
    PieceKind::from(piece).value()
}

pub fn piece_name(piece: Piece) -> &'static str {
    PieceKind::from(piece).name()
}

/// Is this a ray (sliding) piece type?
pub fn is_ray_piece(piece: Piece) -> bool {
    matches!(piece, Piece::Queen | Piece::Rook | Piece::Bishop)
}

/// Squares attacked by the piece standing on `square`
pub fn attacks(board: &Board, square: Square) -> BitBoard {
    let (piece, color) = match (board.piece_on(square), board.color_on(square)) {
        (Some(p), Some(c)) => (p, c),
        _ => return EMPTY,
    };
    let occupied = *board.combined();

    match piece {
        Piece::Pawn => pawn_attacks(square, color),
        Piece::Knight => chess::get_knight_moves(square),
        Piece::King => chess::get_king_moves(square),
        Piece::Bishop => chess::get_bishop_moves(square, occupied),
        Piece::Rook => chess::get_rook_moves(square, occupied),
        Piece::Queen => {
            chess::get_bishop_moves(square, occupied) | chess::get_rook_moves(square, occupied)
        }
    }
}

/// Pawn capture squares (diagonals only, not pushes)
pub fn pawn_attacks(square: Square, color: Color) -> BitBoard {
    let forward = match color {
        Color::White => square.up(),
        Color::Black => square.down(),
    };
    let mut result = EMPTY;
    if let Some(ahead) = forward {
        if let Some(left) = ahead.left() {
            result |= BitBoard::from_square(left);
        }
        if let Some(right) = ahead.right() {
            result |= BitBoard::from_square(right);
        }
    }
    result
}

/// All pieces of `color` that attack `square`
pub fn attackers(board: &Board, color: Color, square: Square) -> BitBoard {
    let occupied = *board.combined();
    let ours = *board.color_combined(color);
    let diagonal = *board.pieces(Piece::Bishop) | *board.pieces(Piece::Queen);
    let straight = *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);

    // Reverse lookups: what would attack us from `square` hits what attacks `square`
    let mut result = pawn_attacks(square, !color) & *board.pieces(Piece::Pawn);
    result |= chess::get_knight_moves(square) & *board.pieces(Piece::Knight);
    result |= chess::get_king_moves(square) & *board.pieces(Piece::King);
    result |= chess::get_bishop_moves(square, occupied) & diagonal;
    result |= chess::get_rook_moves(square, occupied) & straight;

    result & ours
}

/// Is the piece on `square` defended by `color`, directly or by a slider
/// standing behind one of the enemy attackers (x-ray)?
pub fn is_defended(board: &Board, color: Color, square: Square) -> bool {
    if attackers(board, color, square) != EMPTY {
        return true;
    }

    let occupied = *board.combined();
    for attacker_sq in attackers(board, !color, square) {
        if !board.piece_on(attacker_sq).is_some_and(is_ray_piece) {
            continue;
        }

        // Slide past the attacker as if it had already captured
        let without = occupied ^ BitBoard::from_square(attacker_sq);
        let ray = chess::line(square, attacker_sq);
        let diagonal = is_diagonal(square, attacker_sq);
        let reach = if diagonal {
            chess::get_bishop_moves(square, without)
        } else {
            chess::get_rook_moves(square, without)
        };
        let sliders = if diagonal {
            *board.pieces(Piece::Bishop) | *board.pieces(Piece::Queen)
        } else {
            *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen)
        };
        if reach & ray & sliders & *board.color_combined(color) != EMPTY {
            return true;
        }
    }

    false
}

fn is_diagonal(a: Square, b: Square) -> bool {
    let df = (a.get_file().to_index() as i32 - b.get_file().to_index() as i32).abs();
    let dr = (a.get_rank().to_index() as i32 - b.get_rank().to_index() as i32).abs();
    df == dr
}

/// Attacked by the enemy and not defended
pub fn is_hanging(board: &Board, color: Color, square: Square) -> bool {
    attackers(board, !color, square) != EMPTY && !is_defended(board, color, square)
}

/// The piece a move removes, including en passant victims
pub fn captured_piece(board: &Board, m: ChessMove) -> Option<Piece> {
    if let Some(victim) = board.piece_on(m.get_dest()) {
        return Some(victim);
    }
    let is_pawn = board.piece_on(m.get_source()) == Some(Piece::Pawn);
    let diagonal = m.get_source().get_file() != m.get_dest().get_file();
    (is_pawn && diagonal).then_some(Piece::Pawn)
}

/// Legal captures the side to move has on `square`
pub fn captures_on(board: &Board, square: Square) -> Vec<ChessMove> {
    MoveGen::new_legal(board)
        .filter(|m| m.get_dest() == square && captured_piece(board, *m).is_some())
        .collect()
}

/// Enemy pieces attacked by the piece on `square`, with their squares
pub fn attacked_targets(board: &Board, square: Square, pov: Color) -> Vec<(Piece, Square)> {
    attacks(board, square)
        .filter(|sq| board.color_on(*sq) == Some(!pov))
        .filter_map(|sq| board.piece_on(sq).map(|piece| (piece, sq)))
        .collect()
}

/// Is a move castling?
pub fn is_castling_move(board: &Board, m: ChessMove) -> bool {
    if board.piece_on(m.get_source()) != Some(Piece::King) {
        return false;
    }
    let from_file = m.get_source().get_file().to_index() as i32;
    let to_file = m.get_dest().get_file().to_index() as i32;
    (from_file - to_file).abs() > 1
}
