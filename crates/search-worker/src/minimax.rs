//! Built-in search: negamax with alpha-beta pruning over a material and
//! piece-placement evaluation. Deterministic for a given position and depth.

use async_trait::async_trait;
use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square};
use tracing::debug;

use crate::error::SearchError;
use crate::strategy::SearchStrategy;

const INF: i32 = 1_000_000;
const MATE: i32 = 100_000;

/// Centipawn values: pawn, knight, bishop, rook, queen, king.
const PIECE_CP: [i32; 6] = [100, 320, 330, 500, 900, 0];

fn piece_cp(piece: Piece) -> i32 {
    PIECE_CP[piece.to_index()]
}

pub struct NegamaxSearch {
    depth: u32,
}

impl NegamaxSearch {
    pub fn new(depth: u32) -> Self {
        Self { depth: depth.max(1) }
    }
}

#[async_trait]
impl SearchStrategy for NegamaxSearch {
    fn name(&self) -> &str {
        "negamax"
    }

    async fn choose_move(&mut self, board: &Board) -> Result<ChessMove, SearchError> {
        let board = *board;
        let depth = self.depth;
        tokio::task::spawn_blocking(move || best_move(&board, depth))
            .await
            .map_err(|e| SearchError::Engine(format!("Search task failed: {e}")))?
            .ok_or(SearchError::NoMove)
    }
}

/// Best move at `depth` plies, or `None` when the side to move has no moves.
pub fn best_move(board: &Board, depth: u32) -> Option<ChessMove> {
    let mut nodes = 0u64;
    let mut alpha = -INF;
    let mut best = None;

    for m in ordered_moves(board) {
        let score = -negamax(&board.make_move_new(m), depth.saturating_sub(1), -INF, -alpha, 1, &mut nodes);
        if best.is_none() || score > alpha {
            alpha = score;
            best = Some(m);
        }
    }

    debug!(depth, nodes, score = alpha, "Search finished");
    best
}

fn negamax(board: &Board, depth: u32, mut alpha: i32, beta: i32, ply: i32, nodes: &mut u64) -> i32 {
    *nodes += 1;
    match board.status() {
        BoardStatus::Checkmate => return -MATE + ply,
        BoardStatus::Stalemate => return 0,
        BoardStatus::Ongoing => {}
    }
    if depth == 0 {
        return evaluate(board);
    }

    let mut best = -INF;
    for m in ordered_moves(board) {
        let score = -negamax(&board.make_move_new(m), depth - 1, -beta, -alpha, ply + 1, nodes);
        best = best.max(score);
        alpha = alpha.max(score);
        if alpha >= beta {
            break;
        }
    }
    best
}

/// Captures first (most valuable victim, least valuable attacker), then
/// promotions, then the rest in generation order.
fn ordered_moves(board: &Board) -> Vec<ChessMove> {
    let mut moves: Vec<ChessMove> = MoveGen::new_legal(board).collect();
    moves.sort_by_key(|m| std::cmp::Reverse(order_score(board, *m)));
    moves
}

fn order_score(board: &Board, m: ChessMove) -> i32 {
    let mut score = 0;
    if let Some(victim) = board.piece_on(m.get_dest()) {
        let attacker = board.piece_on(m.get_source()).map(piece_cp).unwrap_or(0);
        score += 10_000 + piece_cp(victim) * 10 - attacker;
    }
    if let Some(promo) = m.get_promotion() {
        score += 8_000 + piece_cp(promo);
    }
    score
}

/// Static evaluation from the side to move's point of view.
fn evaluate(board: &Board) -> i32 {
    let white = side_score(board, Color::White);
    let black = side_score(board, Color::Black);
    match board.side_to_move() {
        Color::White => white - black,
        Color::Black => black - white,
    }
}

fn side_score(board: &Board, color: Color) -> i32 {
    let mut score = 0;
    for sq in *board.color_combined(color) {
        let piece = match board.piece_on(sq) {
            Some(p) => p,
            None => continue,
        };
        score += piece_cp(piece) + placement_bonus(piece, sq, color);
    }
    score
}

fn placement_bonus(piece: Piece, sq: Square, color: Color) -> i32 {
    let file = sq.get_file().to_index() as i32;
    let rank = sq.get_rank().to_index() as i32;
    let advance = match color {
        Color::White => rank,
        Color::Black => 7 - rank,
    };
    // Distance from the four centre squares, 0..=6
    let center_distance = (2 * file - 7).abs() / 2 + (2 * rank - 7).abs() / 2;

    match piece {
        Piece::Pawn => advance * 5 + if (3..=4).contains(&file) { advance * 3 } else { 0 },
        Piece::Knight => 15 - center_distance * 5,
        Piece::Bishop => 10 - center_distance * 3,
        Piece::Queen => 5 - center_distance,
        Piece::Rook => if advance == 6 { 15 } else { 0 },
        Piece::King => if advance == 0 && (file <= 2 || file >= 6) { 20 } else { 0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::notation::to_san;
    use std::str::FromStr;

    fn best_san(fen: &str, depth: u32) -> String {
        let board = Board::from_str(fen).unwrap();
        let m = best_move(&board, depth).unwrap();
        to_san(&board, m)
    }

    #[test]
    fn test_finds_mate_in_one() {
        assert_eq!(best_san("6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1", 2), "Rd8#");
    }

    #[test]
    fn test_takes_hanging_queen() {
        assert_eq!(best_san("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1", 2), "Rxd5");
    }

    #[test]
    fn test_no_move_when_mated() {
        let board = Board::from_str("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
        assert!(best_move(&board, 2).is_none());
    }

    #[test]
    fn test_deterministic() {
        let board = Board::default();
        assert_eq!(best_move(&board, 2), best_move(&board, 2));
    }

    #[tokio::test]
    async fn test_strategy_runs_off_thread() {
        let mut search = NegamaxSearch::new(2);
        let m = search.choose_move(&Board::default()).await.unwrap();
        assert!(Board::default().legal(m));
    }
}
