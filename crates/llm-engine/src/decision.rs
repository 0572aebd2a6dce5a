//! The remote decision loop: prompt, stream, parse, validate, retry.
//!
//! Attempts run strictly one after another. Each gets a fresh completion.
//! A decision that runs out of attempts returns `None` and the caller falls
//! back to local search.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use chess_core::{MoveDescriptor, RulesOracle};

use crate::config::{LlmSettings, PlayStyle};
use crate::context::ContextManager;
use crate::error::{DecisionFailure, LlmError};
use crate::memory::MoveMemory;
use crate::provider::{LlmProvider, StreamChunk};
use crate::providers::create_provider;

static FRAGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{[^}]*"move"\s*:\s*"([a-h][1-8][a-h][1-8][qrbn]?)"[^}]*\}"#).unwrap()
});
static BARE_MOVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([a-h][1-8][a-h][1-8][qrbn]?)\b").unwrap());

/// Progress of one decision, streamed to whoever is watching.
///
/// Per attempt: `Started`, any number of `Chunk`s in arrival order, then
/// exactly one of `Rejected` or `Committed`. `Exhausted` follows the last
/// rejected attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ThinkingEvent {
    Started { attempt: u32 },
    Chunk { attempt: u32, text: String },
    Rejected { attempt: u32, reason: String },
    Committed {
        attempt: u32,
        san: String,
        uci: String,
        reasoning: String,
    },
    Exhausted { attempts: u32 },
}

pub type ThinkingObserver = Arc<dyn Fn(&ThinkingEvent) + Send + Sync>;

/// A validated move proposal.
#[derive(Debug, Clone)]
pub struct RemoteMove {
    pub uci: String,
    pub san: String,
    pub reasoning: String,
    pub attempt: u32,
    pub descriptor: MoveDescriptor,
}

/// `{move, reasoning?}` pulled out of a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDecision {
    pub uci: String,
    pub reasoning: Option<String>,
}

impl ParsedDecision {
    fn from_json(value: &Value) -> Option<Self> {
        let uci = value.get("move")?.as_str()?.trim().to_ascii_lowercase();
        if uci.is_empty() {
            return None;
        }
        let reasoning = value
            .get("reasoning")
            .and_then(|r| r.as_str())
            .map(str::to_string);
        Some(Self { uci, reasoning })
    }
}

/// Strict JSON first, then an embedded `{"move": ...}` fragment, then any
/// bare UCI-looking token (whose reasoning is lost).
pub fn parse_response(text: &str) -> Option<ParsedDecision> {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        if let Some(parsed) = ParsedDecision::from_json(&value) {
            return Some(parsed);
        }
    }

    if let Some(fragment) = FRAGMENT_RE.find(text) {
        if let Some(parsed) = serde_json::from_str::<Value>(fragment.as_str())
            .ok()
            .and_then(|v| ParsedDecision::from_json(&v))
        {
            return Some(parsed);
        }
    }

    BARE_MOVE_RE.captures(text).map(|caps| ParsedDecision {
        uci: caps[1].to_string(),
        reasoning: None,
    })
}

pub struct RemoteDecisionEngine {
    provider: Box<dyn LlmProvider>,
    context: ContextManager,
    max_retries: u32,
    identity: String,
}

impl RemoteDecisionEngine {
    pub fn new(provider: Box<dyn LlmProvider>, max_retries: u32) -> Self {
        let identity = format!("{}/{}", provider.info().kind, provider.model());
        let context = ContextManager::new(provider.model());
        Self {
            provider,
            context,
            max_retries: max_retries.max(1),
            identity,
        }
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self, LlmError> {
        Ok(Self::new(create_provider(settings)?, settings.max_retries))
    }

    /// `provider/model`.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub async fn validate_credential(&self) -> bool {
        self.provider.validate_credential().await
    }

    /// Ask the model for a move in the position held by `rules`, which is a
    /// private snapshot: accepted moves are applied to it to confirm them.
    pub async fn decide(
        &self,
        memories: &[MoveMemory],
        mut rules: Box<dyn RulesOracle>,
        style: PlayStyle,
        observer: Option<&ThinkingObserver>,
    ) -> Option<RemoteMove> {
        let emit = |event: ThinkingEvent| {
            if let Some(observer) = observer {
                observer(&event);
            }
        };

        let acceptance: Vec<String> = rules.legal_moves().iter().map(MoveDescriptor::uci).collect();
        if acceptance.is_empty() {
            debug!("No legal moves, nothing to decide");
            return None;
        }

        let prompt = self.context.build(
            &rules.fen(),
            rules.turn(),
            acceptance.clone(),
            style,
            memories,
            &rules.pgn(),
        );
        let budget = prompt.info();
        info!(
            backend = %self.identity,
            used = budget.used,
            budget = budget.budget,
            remaining = budget.remaining,
            "Prompt built"
        );

        for attempt in 1..=self.max_retries {
            emit(ThinkingEvent::Started { attempt });

            match self
                .attempt(attempt, &prompt.system_prompt, &prompt.user_prompt, &acceptance, rules.as_mut(), observer)
                .await
            {
                Ok(chosen) => {
                    emit(ThinkingEvent::Committed {
                        attempt,
                        san: chosen.san.clone(),
                        uci: chosen.uci.clone(),
                        reasoning: chosen.reasoning.clone(),
                    });
                    info!(attempt, uci = %chosen.uci, backend = %self.identity, "Remote move accepted");
                    return Some(chosen);
                }
                Err(reason) => {
                    warn!(attempt, backend = %self.identity, reason = %reason, "Remote attempt discarded");
                    emit(ThinkingEvent::Rejected {
                        attempt,
                        reason: reason.to_string(),
                    });
                }
            }
        }

        warn!(attempts = self.max_retries, backend = %self.identity, "Remote backend exhausted");
        emit(ThinkingEvent::Exhausted {
            attempts: self.max_retries,
        });
        None
    }

    async fn attempt(
        &self,
        attempt: u32,
        system_prompt: &str,
        user_prompt: &str,
        acceptance: &[String],
        rules: &mut dyn RulesOracle,
        observer: Option<&ThinkingObserver>,
    ) -> Result<RemoteMove, DecisionFailure> {
        let mut on_chunk = |chunk: StreamChunk| {
            if chunk.done || chunk.text.is_empty() {
                return;
            }
            if let Some(observer) = observer {
                observer(&ThinkingEvent::Chunk {
                    attempt,
                    text: chunk.text,
                });
            }
        };

        let text = self
            .provider
            .complete(system_prompt, user_prompt, &mut on_chunk)
            .await?;
        debug!(attempt, chars = text.len(), "Completion received");

        let parsed = parse_response(&text).ok_or(DecisionFailure::ParseFailure)?;
        if !acceptance.contains(&parsed.uci) {
            return Err(DecisionFailure::NotLegal(parsed.uci));
        }

        let descriptor = rules
            .apply_move(&parsed.uci)
            .map_err(|e| DecisionFailure::RulesRejected(e.to_string()))?;

        Ok(RemoteMove {
            uci: descriptor.uci(),
            san: descriptor.san.clone(),
            reasoning: parsed.reasoning.unwrap_or_default(),
            attempt,
            descriptor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chess_core::ChessRules;

    use crate::config::ProviderKind;
    use crate::provider::ProviderInfo;

    /// Replays canned completions, one per call, streaming each in two halves.
    struct Scripted {
        replies: Mutex<VecDeque<Result<String, u16>>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<&str, u16>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(|r| r.map(str::to_string)).collect()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                kind: ProviderKind::OpenAi,
                name: "Scripted",
                models: vec![],
                default_model: "gpt-4o",
            }
        }

        fn model(&self) -> &str {
            "gpt-4o"
        }

        async fn complete(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            on_chunk: &mut (dyn FnMut(StreamChunk) + Send),
        ) -> Result<String, LlmError> {
            let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Err(503));
            let text = reply.map_err(|status| LlmError::Http { status })?;
            let mid = text.len() / 2;
            on_chunk(StreamChunk::text(&text[..mid]));
            on_chunk(StreamChunk::text(&text[mid..]));
            on_chunk(StreamChunk::done());
            Ok(text)
        }

        async fn validate_credential(&self) -> bool {
            true
        }
    }

    fn recorder() -> (ThinkingObserver, Arc<Mutex<Vec<ThinkingEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let observer: ThinkingObserver = Arc::new(move |e: &ThinkingEvent| sink.lock().unwrap().push(e.clone()));
        (observer, events)
    }

    fn after_e4() -> Box<dyn RulesOracle> {
        let mut rules = ChessRules::new();
        rules.apply_move("e2e4").unwrap();
        Box::new(rules)
    }

    #[test]
    fn test_parse_strict_json() {
        let parsed = parse_response(r#" {"move": "e7e5", "reasoning": "Mirror."} "#).unwrap();
        assert_eq!(parsed.uci, "e7e5");
        assert_eq!(parsed.reasoning.as_deref(), Some("Mirror."));
    }

    #[test]
    fn test_parse_embedded_fragment() {
        let text = "Sure!\n```json\n{\"move\": \"g8f6\", \"reasoning\": \"Develop.\"}\n```";
        let parsed = parse_response(text).unwrap();
        assert_eq!(parsed.uci, "g8f6");
        assert_eq!(parsed.reasoning.as_deref(), Some("Develop."));
    }

    #[test]
    fn test_parse_bare_token_loses_reasoning() {
        let parsed = parse_response("I think c7c5 is best here").unwrap();
        assert_eq!(parsed, ParsedDecision { uci: "c7c5".into(), reasoning: None });
        assert!(parse_response("no idea, resign?").is_none());
    }

    #[tokio::test]
    async fn test_commits_first_valid_attempt() {
        let engine = RemoteDecisionEngine::new(
            Box::new(Scripted::new(vec![
                Ok("garbage"),
                Ok(r#"{"move": "e2e4", "reasoning": "not mine"}"#),
                Ok(r#"{"move": "e7e5", "reasoning": "Claim the centre."}"#),
            ])),
            3,
        );
        let (observer, events) = recorder();
        let chosen = engine
            .decide(&[], after_e4(), PlayStyle::Balanced, Some(&observer))
            .await
            .unwrap();

        assert_eq!(chosen.uci, "e7e5");
        assert_eq!(chosen.san, "e5");
        assert_eq!(chosen.attempt, 3);
        assert_eq!(chosen.reasoning, "Claim the centre.");

        let events = events.lock().unwrap();
        let terminals: Vec<&ThinkingEvent> = events
            .iter()
            .filter(|e| !matches!(e, ThinkingEvent::Started { .. } | ThinkingEvent::Chunk { .. }))
            .collect();
        assert_eq!(terminals.len(), 3);
        assert!(matches!(terminals[0], ThinkingEvent::Rejected { attempt: 1, .. }));
        assert!(matches!(terminals[1], ThinkingEvent::Rejected { attempt: 2, .. }));
        assert!(matches!(terminals[2], ThinkingEvent::Committed { attempt: 3, .. }));
        assert!(matches!(events.last(), Some(ThinkingEvent::Committed { .. })));
    }

    #[tokio::test]
    async fn test_exhaustion_returns_none() {
        let engine = RemoteDecisionEngine::new(
            Box::new(Scripted::new(vec![Ok("hmm"), Err(500), Ok("{\"move\": 7}")])),
            3,
        );
        let (observer, events) = recorder();
        let chosen = engine.decide(&[], after_e4(), PlayStyle::Balanced, Some(&observer)).await;
        assert!(chosen.is_none());

        let events = events.lock().unwrap();
        assert_eq!(events.last(), Some(&ThinkingEvent::Exhausted { attempts: 3 }));
        let started = events.iter().filter(|e| matches!(e, ThinkingEvent::Started { .. })).count();
        assert_eq!(started, 3);
    }

    #[tokio::test]
    async fn test_chunks_precede_terminal_per_attempt() {
        let engine = RemoteDecisionEngine::new(
            Box::new(Scripted::new(vec![Ok(r#"{"move":"d7d5"}"#)])),
            3,
        );
        let (observer, events) = recorder();
        engine.decide(&[], after_e4(), PlayStyle::Balanced, Some(&observer)).await.unwrap();

        let events = events.lock().unwrap();
        assert!(matches!(events[0], ThinkingEvent::Started { attempt: 1 }));
        let streamed: String = events
            .iter()
            .filter_map(|e| match e {
                ThinkingEvent::Chunk { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(streamed, r#"{"move":"d7d5"}"#);
        assert!(matches!(events[events.len() - 1], ThinkingEvent::Committed { .. }));
    }

    #[test]
    fn test_identity() {
        let engine = RemoteDecisionEngine::new(Box::new(Scripted::new(vec![])), 0);
        assert_eq!(engine.identity(), "openai/gpt-4o");
        assert_eq!(engine.max_retries, 1);
    }
}
