//! Cheap token accounting: four characters per token.

use serde::Serialize;

pub const RESPONSE_RESERVE: usize = 600;
pub const SYSTEM_PROMPT_RESERVE: usize = 600;
pub const DEFAULT_LIMIT: usize = 32_000;

/// Context window per known model id.
const MODEL_LIMITS: &[(&str, usize)] = &[
    ("gpt-4o", 128_000),
    ("gpt-4o-mini", 128_000),
    ("gpt-4-turbo", 128_000),
    ("o1-mini", 128_000),
    ("claude-sonnet-4-20250514", 200_000),
    ("claude-3-5-haiku-20241022", 200_000),
    ("gemini-2.0-flash", 1_000_000),
    ("gemini-1.5-pro", 2_000_000),
    ("llama-3.3-70b-versatile", 128_000),
    ("mixtral-8x7b-32768", 32_768),
    ("llama-3.1-8b-instant", 131_072),
];

/// `ceil(chars / 4)`.
pub fn estimate(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

pub fn model_limit(model: &str) -> usize {
    MODEL_LIMITS
        .iter()
        .find(|(id, _)| *id == model)
        .map(|(_, limit)| *limit)
        .unwrap_or(DEFAULT_LIMIT)
}

/// Tokens left for the user prompt once both reserves are taken out.
pub fn available_budget(model: &str) -> usize {
    model_limit(model).saturating_sub(RESPONSE_RESERVE + SYSTEM_PROMPT_RESERVE)
}

/// Full accounting for one decision request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenBudget {
    pub model_limit: usize,
    pub reserved_for_response: usize,
    pub reserved_for_system_prompt: usize,
    pub used: usize,
    pub remaining: usize,
}

impl TokenBudget {
    pub fn for_model(model: &str, used: usize) -> Self {
        let budget = available_budget(model);
        Self {
            model_limit: model_limit(model),
            reserved_for_response: RESPONSE_RESERVE,
            reserved_for_system_prompt: SYSTEM_PROMPT_RESERVE,
            used,
            remaining: budget.saturating_sub(used),
        }
    }

    pub fn budget(&self) -> usize {
        self.model_limit
            .saturating_sub(self.reserved_for_response + self.reserved_for_system_prompt)
    }

    pub fn info(&self) -> BudgetInfo {
        BudgetInfo {
            used: self.used,
            budget: self.budget(),
            remaining: self.remaining,
        }
    }
}

/// `{used, budget, remaining}` reported with every built prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetInfo {
    pub used: usize,
    pub budget: usize,
    pub remaining: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_rounds_up() {
        assert_eq!(estimate(""), 0);
        assert_eq!(estimate("abcd"), 1);
        assert_eq!(estimate("abcde"), 2);
        assert_eq!(estimate("éééé"), 1);
    }

    #[test]
    fn test_limits() {
        assert_eq!(model_limit("mixtral-8x7b-32768"), 32_768);
        assert_eq!(model_limit("something-new"), DEFAULT_LIMIT);
        assert_eq!(available_budget("gpt-4o"), 126_800);
    }

    #[test]
    fn test_budget_info() {
        let budget = TokenBudget::for_model("unknown", 800);
        let info = budget.info();
        assert_eq!(info.budget, 30_800);
        assert_eq!(info.remaining, 30_000);

        let over = TokenBudget::for_model("unknown", 40_000);
        assert_eq!(over.remaining, 0);
    }
}
