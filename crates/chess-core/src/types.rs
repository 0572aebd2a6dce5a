use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RulesError;

/// Side to move / piece colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::White => "white",
            Side::Black => "black",
        }
    }

    /// Rank index (0-based) of this side's back rank.
    pub fn back_rank(self) -> u8 {
        match self {
            Side::White => 0,
            Side::Black => 7,
        }
    }

    /// Rank step a pawn of this side advances by.
    pub fn forward(self) -> i8 {
        match self {
            Side::White => 1,
            Side::Black => -1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Side {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(Side::White),
            "black" | "b" => Ok(Side::Black),
            _ => Err(RulesError::InvalidNotation(s.to_string())),
        }
    }
}

impl From<chess::Color> for Side {
    fn from(color: chess::Color) -> Self {
        match color {
            chess::Color::White => Side::White,
            chess::Color::Black => Side::Black,
        }
    }
}

impl From<Side> for chess::Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => chess::Color::White,
            Side::Black => chess::Color::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Material value in pawns; the king is priceless and counts as 0.
    pub fn value(self) -> i32 {
        match self {
            PieceKind::Pawn => 1,
            PieceKind::Knight => 3,
            PieceKind::Bishop => 3,
            PieceKind::Rook => 5,
            PieceKind::Queen => 9,
            PieceKind::King => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        }
    }

    /// Lowercase letter used in UCI promotion suffixes and FEN (black).
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    pub fn from_letter(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    pub fn is_slider(self) -> bool {
        matches!(self, PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen)
    }

    /// Pieces a pawn may promote to.
    pub fn is_promotion_target(self) -> bool {
        matches!(
            self,
            PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen
        )
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<chess::Piece> for PieceKind {
    fn from(piece: chess::Piece) -> Self {
        match piece {
            chess::Piece::Pawn => PieceKind::Pawn,
            chess::Piece::Knight => PieceKind::Knight,
            chess::Piece::Bishop => PieceKind::Bishop,
            chess::Piece::Rook => PieceKind::Rook,
            chess::Piece::Queen => PieceKind::Queen,
            chess::Piece::King => PieceKind::King,
        }
    }
}

impl From<PieceKind> for chess::Piece {
    fn from(kind: PieceKind) -> Self {
        match kind {
            PieceKind::Pawn => chess::Piece::Pawn,
            PieceKind::Knight => chess::Piece::Knight,
            PieceKind::Bishop => chess::Piece::Bishop,
            PieceKind::Rook => chess::Piece::Rook,
            PieceKind::Queen => chess::Piece::Queen,
            PieceKind::King => chess::Piece::King,
        }
    }
}

/// Board square, 0 = a1 through 63 = h8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square(u8);

impl Square {
    /// Build from 0-based file and rank indices.
    pub fn new(file: u8, rank: u8) -> Option<Square> {
        (file < 8 && rank < 8).then_some(Square(rank * 8 + file))
    }

    pub fn from_index(index: usize) -> Option<Square> {
        (index < 64).then_some(Square(index as u8))
    }

    pub fn file(self) -> u8 {
        self.0 % 8
    }

    pub fn rank(self) -> u8 {
        self.0 / 8
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Relative rank 1..=8 from `side`'s point of view.
    pub fn relative_rank(self, side: Side) -> u8 {
        match side {
            Side::White => self.rank() + 1,
            Side::Black => 8 - self.rank(),
        }
    }

    pub fn offset(self, files: i8, ranks: i8) -> Option<Square> {
        let file = self.file() as i8 + files;
        let rank = self.rank() as i8 + ranks;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Square::new(file as u8, rank as u8)
        } else {
            None
        }
    }

    pub fn file_char(self) -> char {
        (b'a' + self.file()) as char
    }

    pub fn rank_char(self) -> char {
        (b'1' + self.rank()) as char
    }

    /// Light squares have an odd file+rank sum.
    pub fn is_light(self) -> bool {
        (self.file() + self.rank()) % 2 == 1
    }

    pub fn to_chess(self) -> chess::Square {
        chess::Square::make_square(
            chess::Rank::from_index(self.rank() as usize),
            chess::File::from_index(self.file() as usize),
        )
    }
}

impl From<chess::Square> for Square {
    fn from(sq: chess::Square) -> Self {
        Square(sq.to_index() as u8)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

impl FromStr for Square {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(RulesError::InvalidNotation(s.to_string()));
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::new(file, rank).ok_or_else(|| RulesError::InvalidNotation(s.to_string()))
    }
}

impl TryFrom<String> for Square {
    type Error = RulesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(sq: Square) -> Self {
        sq.to_string()
    }
}

/// What kind of special handling an applied move needs beyond "lift and drop".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpecialFlag {
    None,
    Capture,
    CastleKingside,
    CastleQueenside,
    EnPassant,
    Promotion,
}

/// One applied (or applicable) move with its side effects spelled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDescriptor {
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub side: Side,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub flag: SpecialFlag,
    pub san: String,
}

impl MoveDescriptor {
    /// Source+destination(+promotion letter), e.g. `e7e8q`.
    pub fn uci(&self) -> String {
        match self.promotion {
            Some(kind) => format!("{}{}{}", self.from, self.to, kind.letter()),
            None => format!("{}{}", self.from, self.to),
        }
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    pub fn is_check(&self) -> bool {
        self.san.ends_with('+') || self.san.ends_with('#')
    }

    pub fn is_checkmate(&self) -> bool {
        self.san.ends_with('#')
    }

    pub fn is_castle(&self) -> bool {
        matches!(
            self.flag,
            SpecialFlag::CastleKingside | SpecialFlag::CastleQueenside
        )
    }

    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    /// Square of the piece removed by this move, if any. Differs from `to`
    /// only for en passant.
    pub fn capture_square(&self) -> Option<Square> {
        match self.flag {
            SpecialFlag::EnPassant => self.to.offset(0, -self.side.forward()),
            _ if self.captured.is_some() => Some(self.to),
            _ => None,
        }
    }

    /// Rook source and destination for a castling move.
    pub fn rook_relocation(&self) -> Option<(Square, Square)> {
        let rank = self.side.back_rank();
        match self.flag {
            SpecialFlag::CastleKingside => Some((Square::new(7, rank)?, Square::new(5, rank)?)),
            SpecialFlag::CastleQueenside => Some((Square::new(0, rank)?, Square::new(3, rank)?)),
            _ => None,
        }
    }
}
