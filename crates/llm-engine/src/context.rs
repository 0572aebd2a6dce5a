//! Prompt assembly under a token budget.
//!
//! The minimal prompt (position, side, legal moves, style) is always sent.
//! Memory summary and move history are added in that order, each only
//! while it still fits.

use tracing::debug;

use chess_core::{pgn, Side};

use crate::config::PlayStyle;
use crate::memory::MoveMemory;
use crate::prompts::{self, PromptRequest};
use crate::summarizer;
use crate::tokens::{self, BudgetInfo, TokenBudget};

const MEMORY_SHARE: f64 = 0.4;
const MEMORY_CAP: usize = 800;
const MEMORY_MIN: usize = 50;
const HISTORY_SHARE: f64 = 0.9;
const TRUNCATED_GROUPS: usize = 20;

/// Prompts actually sent plus the accounting behind them.
#[derive(Debug, Clone)]
pub struct BuiltPrompt {
    pub system_prompt: String,
    pub user_prompt: String,
    pub budget: TokenBudget,
}

impl BuiltPrompt {
    pub fn info(&self) -> BudgetInfo {
        self.budget.info()
    }
}

#[derive(Debug, Clone)]
pub struct ContextManager {
    model: String,
}

impl ContextManager {
    pub fn new(model: impl Into<String>) -> Self {
        Self { model: model.into() }
    }

    pub fn build(
        &self,
        fen: &str,
        side: Side,
        legal_moves: Vec<String>,
        style: PlayStyle,
        memories: &[MoveMemory],
        full_history: &str,
    ) -> BuiltPrompt {
        let budget = tokens::available_budget(&self.model);
        let mut request = PromptRequest {
            fen: fen.to_string(),
            side,
            legal_moves,
            style,
            memory_summary: None,
            history: None,
        };
        let mut used = tokens::estimate(&prompts::user_prompt(&request));

        let memory_allotment =
            ((budget.saturating_sub(used) as f64 * MEMORY_SHARE) as usize).min(MEMORY_CAP);
        if !memories.is_empty() && memory_allotment > MEMORY_MIN {
            let summary = summarizer::compress_reasonings(memories, memory_allotment);
            if !summary.is_empty() {
                request.memory_summary = Some(summary);
                used = tokens::estimate(&prompts::user_prompt(&request));
            }
        }

        let threshold = budget as f64 * HISTORY_SHARE;
        if !full_history.is_empty() {
            if ((used + tokens::estimate(full_history)) as f64) < threshold {
                request.history = Some(full_history.to_string());
                used = tokens::estimate(&prompts::user_prompt(&request));
            } else if let Some(truncated) = pgn::truncate_history(full_history, TRUNCATED_GROUPS) {
                if ((used + tokens::estimate(&truncated)) as f64) < threshold {
                    debug!(model = %self.model, "Move history truncated to fit budget");
                    request.history = Some(truncated);
                    used = tokens::estimate(&prompts::user_prompt(&request));
                } else {
                    debug!(model = %self.model, "Move history omitted");
                }
            }
        }

        BuiltPrompt {
            system_prompt: prompts::system_prompt().to_string(),
            user_prompt: prompts::user_prompt(&request),
            budget: TokenBudget::for_model(&self.model, used),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

    fn legal() -> Vec<String> {
        vec!["e7e5".into(), "c7c5".into(), "g8f6".into()]
    }

    fn memories(count: u32) -> Vec<MoveMemory> {
        (1..=count)
            .map(|n| MoveMemory {
                move_number: n,
                fen: String::new(),
                uci: "e2e4".into(),
                san: "e4".into(),
                reasoning: "keep the centre".into(),
                is_capture: false,
                is_check: false,
                is_promotion: false,
                is_castle: false,
                timestamp: Utc::now(),
            })
            .collect()
    }

    fn long_history(moves: usize) -> String {
        let sans: Vec<String> = (0..moves).map(|_| "Nf3".to_string()).collect();
        pgn::movetext(&sans, 1, false)
    }

    #[test]
    fn test_minimal_prompt_only() {
        let built = ContextManager::new("gpt-4o").build(FEN, Side::Black, legal(), PlayStyle::Balanced, &[], "");
        assert!(!built.user_prompt.contains("Game context"));
        assert!(!built.user_prompt.contains("Move history"));
        assert_eq!(built.info().used, tokens::estimate(&built.user_prompt));
        assert_eq!(built.info().budget, 126_800);
    }

    #[test]
    fn test_memory_and_full_history_fit() {
        let built = ContextManager::new("gpt-4o").build(
            FEN,
            Side::Black,
            legal(),
            PlayStyle::Aggressive,
            &memories(2),
            "1. e4",
        );
        assert!(built.user_prompt.contains("Game context: Move 1 (e4): keep the centre"));
        assert!(built.user_prompt.contains("Move history (PGN): 1. e4"));
    }

    #[test]
    fn test_history_truncated_when_large() {
        // roughly 70k tokens against a 30800-token budget
        let history = long_history(40_000);
        let built = ContextManager::new("unknown-model").build(
            FEN,
            Side::Black,
            legal(),
            PlayStyle::Balanced,
            &[],
            &history,
        );
        assert!(built.user_prompt.contains("Move history (PGN): [...] "));
        assert!(built.info().used < built.info().budget);
    }

    #[test]
    fn test_used_is_monotonic() {
        let manager = ContextManager::new("mixtral-8x7b-32768");
        let bare = manager.build(FEN, Side::Black, legal(), PlayStyle::Balanced, &[], "");
        let with_memory = manager.build(FEN, Side::Black, legal(), PlayStyle::Balanced, &memories(6), "");
        let with_both = manager.build(
            FEN,
            Side::Black,
            legal(),
            PlayStyle::Balanced,
            &memories(6),
            &long_history(30),
        );
        assert!(bare.info().used <= with_memory.info().used);
        assert!(with_memory.info().used <= with_both.info().used);
    }
}
