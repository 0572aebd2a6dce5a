//! Local search backend: a worker task reached over bounded channels that
//! answers "what would you play here?" with a UCI move.

pub mod config;
pub mod error;
pub mod minimax;
pub mod protocol;
pub mod strategy;
pub mod uci;
pub mod worker;

pub use config::SearchConfig;
pub use error::SearchError;
pub use minimax::NegamaxSearch;
pub use protocol::{SessionId, WorkerRequest, WorkerResponse};
pub use strategy::SearchStrategy;
pub use uci::{UciEngine, UciSearch};
pub use worker::{spawn_from_config, spawn_worker, SearchHandle};
