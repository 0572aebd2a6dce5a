//! Move quality evaluation: scores every legal move with a tactical
//! heuristic and classifies the move the player actually chose.

pub mod board_utils;
pub mod error;
pub mod evaluator;
pub mod explain;
pub mod scoring;
pub mod tactics;

pub use error::InsightError;
pub use evaluator::{MoveInsight, MoveQuality, MoveQualityEvaluator};
