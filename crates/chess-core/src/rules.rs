//! The rules oracle: legality, move application and termination detection.

use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece};

use crate::error::RulesError;
use crate::fen;
use crate::notation;
use crate::outcome::{GameOverReason, GameResult};
use crate::pgn;
use crate::types::{MoveDescriptor, PieceKind, Side, SpecialFlag, Square};

/// Authoritative chess state. Everything that needs to know whether a move is
/// legal, or whether the game is over, asks an oracle.
pub trait RulesOracle: Send + Sync {
    fn legal_moves(&self) -> Vec<MoveDescriptor>;

    fn legal_moves_from(&self, square: Square) -> Vec<MoveDescriptor> {
        self.legal_moves()
            .into_iter()
            .filter(|m| m.from == square)
            .collect()
    }

    /// Apply a move given in UCI notation and return its descriptor.
    fn apply_move(&mut self, uci: &str) -> Result<MoveDescriptor, RulesError>;

    /// Take back the last applied move.
    fn undo(&mut self) -> Result<MoveDescriptor, RulesError>;

    /// Replace the position and clear history.
    fn load(&mut self, fen: &str) -> Result<(), RulesError>;

    fn piece_at(&self, square: Square) -> Option<(Side, PieceKind)>;
    fn fen(&self) -> String;
    fn turn(&self) -> Side;

    fn in_check(&self) -> bool;
    fn in_checkmate(&self) -> bool;
    fn in_stalemate(&self) -> bool;
    fn in_threefold_repetition(&self) -> bool;
    fn insufficient_material(&self) -> bool;
    fn fifty_move_rule(&self) -> bool;

    fn in_draw(&self) -> bool {
        self.in_stalemate()
            || self.in_threefold_repetition()
            || self.insufficient_material()
            || self.fifty_move_rule()
    }

    fn game_over(&self) -> bool {
        self.in_checkmate() || self.in_draw()
    }

    /// Result and reason once the game is over. A checkmated side to move
    /// loses; every other terminal condition is a draw.
    fn outcome(&self) -> Option<(GameResult, GameOverReason)> {
        if self.in_checkmate() {
            return Some((GameResult::winner(self.turn().opposite()), GameOverReason::Checkmate));
        }
        let reason = if self.in_stalemate() {
            GameOverReason::Stalemate
        } else if self.in_threefold_repetition() {
            GameOverReason::ThreefoldRepetition
        } else if self.insufficient_material() {
            GameOverReason::InsufficientMaterial
        } else if self.fifty_move_rule() {
            GameOverReason::FiftyMoveRule
        } else {
            return None;
        };
        Some((GameResult::Draw, reason))
    }

    /// SAN of every move applied since the last load.
    fn san_history(&self) -> Vec<String>;

    /// Numbered movetext of the history.
    fn pgn(&self) -> String;

    /// Independent copy for read-only consumers.
    fn fork(&self) -> Box<dyn RulesOracle>;
}

#[derive(Debug, Clone)]
struct Ply {
    board: Board,
    halfmove: u32,
    fullmove: u32,
    descriptor: MoveDescriptor,
}

/// [`RulesOracle`] backed by the `chess` crate's bitboards.
#[derive(Debug, Clone)]
pub struct ChessRules {
    board: Board,
    halfmove: u32,
    fullmove: u32,
    start_fullmove: u32,
    start_side: Side,
    history: Vec<Ply>,
}

impl Default for ChessRules {
    fn default() -> Self {
        Self::new()
    }
}

impl ChessRules {
    pub fn new() -> Self {
        Self {
            board: Board::default(),
            halfmove: 0,
            fullmove: 1,
            start_fullmove: 1,
            start_side: Side::White,
            history: Vec::new(),
        }
    }

    pub fn from_fen(fen_str: &str) -> Result<Self, RulesError> {
        let (board, halfmove, fullmove) = fen::parse(fen_str)?;
        Ok(Self {
            board,
            halfmove,
            fullmove,
            start_fullmove: fullmove,
            start_side: Side::from(board.side_to_move()),
            history: Vec::new(),
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    fn legal(&self) -> Vec<ChessMove> {
        MoveGen::new_legal(&self.board).collect()
    }
}

/// Describe a legal move on `board` before it is played.
pub fn describe(board: &Board, m: ChessMove) -> MoveDescriptor {
    let from = Square::from(m.get_source());
    let to = Square::from(m.get_dest());
    let piece = board.piece_on(m.get_source()).unwrap_or(Piece::Pawn);
    let side = Side::from(board.side_to_move());

    let is_castle = piece == Piece::King && (from.file() as i8 - to.file() as i8).abs() == 2;
    let is_en_passant =
        piece == Piece::Pawn && from.file() != to.file() && board.piece_on(m.get_dest()).is_none();

    let captured = if is_en_passant {
        Some(PieceKind::Pawn)
    } else {
        board.piece_on(m.get_dest()).map(PieceKind::from)
    };
    let promotion = m.get_promotion().map(PieceKind::from);

    let flag = if is_castle {
        if to.file() > from.file() {
            SpecialFlag::CastleKingside
        } else {
            SpecialFlag::CastleQueenside
        }
    } else if is_en_passant {
        SpecialFlag::EnPassant
    } else if promotion.is_some() {
        SpecialFlag::Promotion
    } else if captured.is_some() {
        SpecialFlag::Capture
    } else {
        SpecialFlag::None
    };

    MoveDescriptor {
        from,
        to,
        piece: PieceKind::from(piece),
        side,
        captured,
        promotion,
        flag,
        san: notation::to_san(board, m),
    }
}

impl RulesOracle for ChessRules {
    fn legal_moves(&self) -> Vec<MoveDescriptor> {
        self.legal()
            .into_iter()
            .map(|m| describe(&self.board, m))
            .collect()
    }

    fn legal_moves_from(&self, square: Square) -> Vec<MoveDescriptor> {
        let source = square.to_chess();
        self.legal()
            .into_iter()
            .filter(|m| m.get_source() == source)
            .map(|m| describe(&self.board, m))
            .collect()
    }

    fn apply_move(&mut self, uci: &str) -> Result<MoveDescriptor, RulesError> {
        let m = notation::parse_legal_uci(&self.board, uci)?;
        let descriptor = describe(&self.board, m);

        self.history.push(Ply {
            board: self.board,
            halfmove: self.halfmove,
            fullmove: self.fullmove,
            descriptor: descriptor.clone(),
        });

        self.halfmove = if descriptor.piece == PieceKind::Pawn || descriptor.is_capture() {
            0
        } else {
            self.halfmove + 1
        };
        if self.board.side_to_move() == Color::Black {
            self.fullmove += 1;
        }
        self.board = self.board.make_move_new(m);

        Ok(descriptor)
    }

    fn undo(&mut self) -> Result<MoveDescriptor, RulesError> {
        let ply = self.history.pop().ok_or(RulesError::NothingToUndo)?;
        self.board = ply.board;
        self.halfmove = ply.halfmove;
        self.fullmove = ply.fullmove;
        Ok(ply.descriptor)
    }

    fn load(&mut self, fen_str: &str) -> Result<(), RulesError> {
        *self = ChessRules::from_fen(fen_str)?;
        Ok(())
    }

    fn piece_at(&self, square: Square) -> Option<(Side, PieceKind)> {
        let sq = square.to_chess();
        let piece = self.board.piece_on(sq)?;
        let color = self.board.color_on(sq)?;
        Some((Side::from(color), PieceKind::from(piece)))
    }

    fn fen(&self) -> String {
        fen::write(&self.board, self.halfmove, self.fullmove)
    }

    fn turn(&self) -> Side {
        Side::from(self.board.side_to_move())
    }

    fn in_check(&self) -> bool {
        self.board.checkers().popcnt() > 0
    }

    fn in_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }

    fn in_stalemate(&self) -> bool {
        self.board.status() == BoardStatus::Stalemate
    }

    fn in_threefold_repetition(&self) -> bool {
        let current = self.board.get_hash();
        let seen = self
            .history
            .iter()
            .filter(|ply| ply.board.get_hash() == current)
            .count();
        seen + 1 >= 3
    }

    fn insufficient_material(&self) -> bool {
        let board = &self.board;
        let heavy = *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
        if heavy.popcnt() > 0 {
            return false;
        }

        let knights = board.pieces(Piece::Knight).popcnt();
        let bishops = *board.pieces(Piece::Bishop);

        match (knights, bishops.popcnt()) {
            (0, 0) | (1, 0) | (0, 1) => true,
            (0, _) => {
                // Any number of bishops, all on one square colour.
                let mut colours = bishops.map(|sq| Square::from(sq).is_light());
                match colours.next() {
                    Some(first) => colours.all(|c| c == first),
                    None => true,
                }
            }
            _ => false,
        }
    }

    fn fifty_move_rule(&self) -> bool {
        self.halfmove >= 100
    }

    fn san_history(&self) -> Vec<String> {
        self.history
            .iter()
            .map(|ply| ply.descriptor.san.clone())
            .collect()
    }

    fn pgn(&self) -> String {
        pgn::movetext(
            &self.san_history(),
            self.start_fullmove,
            self.start_side == Side::Black,
        )
    }

    fn fork(&self) -> Box<dyn RulesOracle> {
        Box::new(self.clone())
    }
}
