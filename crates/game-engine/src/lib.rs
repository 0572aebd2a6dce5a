//! Game orchestration: turn flow between a human and the AI, the piece
//! registry kept in step with the rules, events, and game history.

pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod move_engine;
pub mod orchestrator;
pub mod pieces;
pub mod quality;

pub use config::GameConfig;
pub use error::{GameError, MoveError};
pub use events::{GameEvent, Listener, ListenerId, Listeners};
pub use history::{GameHistory, GameRecord, HistoryExport, PlayerProfile};
pub use move_engine::{MoveEngine, Mover, PromotionOutcome, PromotionToken};
pub use orchestrator::{
    rules_from_fen, standard_rules, AppliedMove, ChessGame, GameDeps, GamePhase, RulesFactory,
    TurnOutcome,
};
pub use pieces::{PieceEntity, PieceId, PieceRegistry};
pub use quality::{PlayerGameStats, QualityTracker};
