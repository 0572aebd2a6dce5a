//! Shared chess vocabulary: sides, pieces, squares, move descriptors and the
//! rules oracle every other crate plays through.

pub mod error;
pub mod fen;
pub mod notation;
pub mod outcome;
pub mod pgn;
pub mod rules;
pub mod types;

pub use error::RulesError;
pub use outcome::{GameOverReason, GameResult};
pub use rules::{ChessRules, RulesOracle};
pub use types::{MoveDescriptor, PieceKind, Side, SpecialFlag, Square};
