#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chess::{Board, ChessMove};

use game_engine::{ChessGame, GameDeps, RulesFactory};
use llm_engine::config::ProviderKind;
use llm_engine::{LlmError, LlmProvider, PlayStyle, ProviderInfo, RemoteDecisionEngine, StreamChunk};
use move_insight::MoveQualityEvaluator;
use search_worker::{spawn_worker, NegamaxSearch, SearchError, SearchStrategy};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// White to move; Qd5 walks into the e6 pawn.
pub const QUEEN_HANG_FEN: &str = "4r1k1/5ppp/4p3/8/8/8/5PPP/3Q2K1 w - - 0 1";

/// White to move; Rd8 is mate.
pub const BACK_RANK_FEN: &str = "6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1";

/// White to move with both castling rights and clear paths.
pub const CASTLING_FEN: &str = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1";

/// White pawn one step from promotion, black still has material.
pub const PROMOTION_FEN: &str = "8/P5pk/8/8/8/8/7P/K7 w - - 0 1";

/// Provider stub that replays canned completions and counts calls.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
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
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().unwrap().pop_front();
        let text = reply.ok_or(LlmError::Http { status: 503 })?;
        on_chunk(StreamChunk::text(&text));
        on_chunk(StreamChunk::done());
        Ok(text)
    }

    async fn validate_credential(&self) -> bool {
        true
    }
}

/// Negamax at depth 1 that counts how often it was asked.
pub struct CountingSearch {
    inner: NegamaxSearch,
    pub calls: Arc<AtomicUsize>,
}

impl CountingSearch {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let search = Self {
            inner: NegamaxSearch::new(1),
            calls: calls.clone(),
        };
        (search, calls)
    }
}

#[async_trait]
impl SearchStrategy for CountingSearch {
    fn name(&self) -> &str {
        "counting"
    }

    async fn choose_move(&mut self, board: &Board) -> Result<ChessMove, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.choose_move(board).await
    }
}

pub struct Harness {
    pub game: ChessGame,
    pub search_calls: Arc<AtomicUsize>,
    pub provider_calls: Option<Arc<AtomicUsize>>,
}

/// Game wired to a counting local search and, when `replies` is given, a
/// scripted remote backend allowed `retries` attempts per decision.
pub fn harness(rules: RulesFactory, replies: Option<&[&str]>, retries: u32) -> Harness {
    let (search, search_calls) = CountingSearch::new();
    let (remote, provider_calls) = match replies {
        Some(replies) => {
            let provider = ScriptedProvider::new(replies);
            let calls = provider.calls.clone();
            let engine = RemoteDecisionEngine::new(Box::new(provider), retries);
            (Some(Arc::new(engine)), Some(calls))
        }
        None => (None, None),
    };

    let game = ChessGame::new(GameDeps {
        rules,
        remote,
        play_style: PlayStyle::Balanced,
        search: spawn_worker(search, 8),
        evaluator: Some(MoveQualityEvaluator::new()),
        history_capacity: 50,
    });

    Harness {
        game,
        search_calls,
        provider_calls,
    }
}

pub fn count(calls: &Arc<AtomicUsize>) -> usize {
    calls.load(Ordering::SeqCst)
}
