/// Tactical pattern detectors used by move scoring: hanging targets, forks,
/// and pin/skewer alignments

use chess::{Board, Color, Piece, Square};

use crate::board_utils::{attacked_targets, is_hanging, piece_value};

const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Opponent pieces that hang in `after` but did not hang in `before`
pub fn newly_hanging(before: &Board, after: &Board, mover: Color) -> usize {
    let enemy = !mover;
    let enemy_pieces = *after.color_combined(enemy) & !*after.pieces(Piece::King);

    enemy_pieces
        .filter(|sq| is_hanging(after, enemy, *sq))
        .filter(|sq| {
            let was_there = before.color_on(*sq) == Some(enemy);
            !(was_there && is_hanging(before, enemy, *sq))
        })
        .count()
}

/// Two or more enemy pieces worth at least a minor piece attacked from
/// `square`. The king is worth nothing here, so a check alone is no fork.
pub fn is_fork(after: &Board, square: Square, mover: Color) -> bool {
    attacked_targets(after, square, mover)
        .into_iter()
        .filter(|(piece, _)| piece_value(*piece) >= 3)
        .count()
        >= 2
}

/// Does the slider on `square` look through two enemy pieces along one of
/// its rays before meeting a friendly piece or the edge?
pub fn lines_up_two_targets(after: &Board, square: Square, mover: Color) -> bool {
    let directions: &[(i8, i8)] = match after.piece_on(square) {
        Some(Piece::Bishop) => &DIAGONALS,
        Some(Piece::Rook) => &ORTHOGONALS,
        Some(Piece::Queen) => &[
            (1, 1), (1, -1), (-1, 1), (-1, -1),
            (1, 0), (-1, 0), (0, 1), (0, -1),
        ],
        _ => return false,
    };

    let origin = chess_core::Square::from(square);
    directions.iter().any(|&(df, dr)| {
        let mut enemies = 0;
        let mut cursor = origin.offset(df, dr);
        while let Some(sq) = cursor {
            match after.color_on(sq.to_chess()) {
                Some(color) if color == mover => break,
                Some(_) => {
                    enemies += 1;
                    if enemies >= 2 {
                        return true;
                    }
                }
                None => {}
            }
            cursor = sq.offset(df, dr);
        }
        false
    })
}
