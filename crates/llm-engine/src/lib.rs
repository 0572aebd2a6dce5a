//! Remote decision backend: provider adapters, prompt budgeting, per-game
//! memory, and the retrying decision loop.

pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod memory;
pub mod prompts;
pub mod provider;
pub mod providers;
pub mod summarizer;
pub mod tokens;

pub use config::{LlmSettings, PlayStyle, ProviderKind};
pub use context::{BuiltPrompt, ContextManager};
pub use decision::{parse_response, RemoteDecisionEngine, RemoteMove, ThinkingEvent, ThinkingObserver};
pub use error::{DecisionFailure, LlmError};
pub use memory::{GameMemory, MoveMemory};
pub use provider::{LlmProvider, ProviderInfo, StreamChunk};
pub use providers::create_provider;
pub use tokens::{BudgetInfo, TokenBudget};
