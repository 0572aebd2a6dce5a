//! The game state machine.
//!
//! ```text
//! Idle -> AwaitingPlayerMove -> ApplyingPlayerMove -> (PendingPromotion) ->
//!   AwaitingAiMove -> ApplyingAiMove -> (GameOver | AwaitingPlayerMove)
//! ```
//!
//! Termination is checked after every applied move. The remote model is
//! asked first when configured; if it gives up the local search worker is
//! asked exactly once, without leaving `AwaitingAiMove`.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use chess_core::{GameOverReason, GameResult, MoveDescriptor, PieceKind, RulesOracle, Side};
use llm_engine::{GameMemory, PlayStyle, RemoteDecisionEngine, ThinkingObserver};
use move_insight::{MoveInsight, MoveQualityEvaluator};
use search_worker::{SearchHandle, SessionId};

use crate::error::{GameError, MoveError};
use crate::events::{GameEvent, Listener, ListenerId, Listeners};
use crate::history::{self, GameHistory, GameRecord};
use crate::move_engine::{MoveEngine, Mover, PromotionOutcome, PromotionToken};
use crate::pieces::PieceRegistry;
use crate::quality::QualityTracker;

/// Builds a fresh rules oracle for every new game.
pub type RulesFactory = Box<dyn Fn() -> Box<dyn RulesOracle> + Send + Sync>;

pub fn standard_rules() -> RulesFactory {
    Box::new(|| Box::new(chess_core::ChessRules::new()))
}

pub struct GameDeps {
    pub rules: RulesFactory,
    /// Present only when the remote backend is enabled and has a credential.
    pub remote: Option<Arc<RemoteDecisionEngine>>,
    pub play_style: PlayStyle,
    pub search: SearchHandle,
    pub evaluator: Option<MoveQualityEvaluator>,
    pub history_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    Idle,
    AwaitingPlayerMove,
    ApplyingPlayerMove,
    PendingPromotion,
    AwaitingAiMove,
    ApplyingAiMove,
    GameOver,
}

/// One move as it landed on the board.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedMove {
    pub descriptor: MoveDescriptor,
    pub fen_after: String,
    pub insight: Option<MoveInsight>,
    /// Which backend produced an AI move; `None` for player moves.
    pub backend: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The player's pawn reached the last rank; call
    /// [`ChessGame::finalize_promotion`] with this token.
    PromotionPending { token: PromotionToken },
    /// Player and AI both moved; the player is on move again.
    Continue { player: AppliedMove, ai: AppliedMove },
    /// The game ended after the player's move or the AI's reply.
    Finished {
        player: AppliedMove,
        ai: Option<AppliedMove>,
        result: GameResult,
        reason: GameOverReason,
    },
}

pub struct ChessGame {
    rules_factory: RulesFactory,
    remote: Option<Arc<RemoteDecisionEngine>>,
    play_style: PlayStyle,
    search: SearchHandle,
    evaluator: Option<MoveQualityEvaluator>,

    engine: MoveEngine,
    phase: GamePhase,
    player_side: Side,
    session: SessionId,
    memory: GameMemory,
    quality: QualityTracker,
    history: GameHistory,
    listeners: Listeners,
    thinking: Option<ThinkingObserver>,
    record_written: bool,
    pending_fen_before: Option<String>,
    last_player_uci: Option<String>,
}

impl ChessGame {
    pub fn new(deps: GameDeps) -> Self {
        let engine = MoveEngine::new((deps.rules)());
        Self {
            rules_factory: deps.rules,
            remote: deps.remote,
            play_style: deps.play_style,
            search: deps.search,
            evaluator: deps.evaluator,
            engine,
            phase: GamePhase::Idle,
            player_side: Side::White,
            session: 0,
            memory: GameMemory::new(),
            quality: QualityTracker::default(),
            history: GameHistory::new(deps.history_capacity),
            listeners: Listeners::default(),
            thinking: None,
            record_written: false,
            pending_fen_before: None,
            last_player_uci: None,
        }
    }

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn set_thinking_observer(&mut self, observer: Option<ThinkingObserver>) {
        self.thinking = observer;
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn player_side(&self) -> Side {
        self.player_side
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn fen(&self) -> String {
        self.engine.rules().fen()
    }

    pub fn rules(&self) -> &dyn RulesOracle {
        self.engine.rules()
    }

    pub fn pieces(&self) -> &PieceRegistry {
        self.engine.pieces()
    }

    pub fn memory(&self) -> &GameMemory {
        &self.memory
    }

    pub fn history(&self) -> &GameHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut GameHistory {
        &mut self.history
    }

    /// Identity recorded on game records.
    pub fn backend_identity(&self) -> String {
        match &self.remote {
            Some(remote) => remote.identity().to_string(),
            None => self.local_identity(),
        }
    }

    fn local_identity(&self) -> String {
        format!("local/{}", self.search.name())
    }

    /// Start a new game with a random side for the player.
    pub async fn start(&mut self) -> Result<Option<AppliedMove>, GameError> {
        let side = if rand::random::<bool>() { Side::White } else { Side::Black };
        self.start_as(side).await
    }

    /// Start a new game with the player on `side`. Anything still in flight
    /// for the previous game is ignored from here on. Returns the AI's
    /// opening move when the AI moves first.
    pub async fn start_as(&mut self, side: Side) -> Result<Option<AppliedMove>, GameError> {
        self.session += 1;
        self.phase = GamePhase::Idle;
        self.engine = MoveEngine::new((self.rules_factory)());
        self.memory.clear();
        self.quality.reset();
        self.record_written = false;
        self.pending_fen_before = None;
        self.last_player_uci = None;
        self.player_side = side;

        let start_fen = self.fen();
        self.search.init(self.session, &start_fen, side.opposite()).await?;

        info!(
            session = self.session,
            player = %side,
            backend = %self.backend_identity(),
            "Game started"
        );
        self.listeners.emit(&GameEvent::GameStarted {
            player_color: side,
            session: self.session,
        });

        if self.check_termination().is_some() {
            return Ok(None);
        }

        if self.engine.rules().turn() == side {
            self.phase = GamePhase::AwaitingPlayerMove;
            self.listeners.emit(&GameEvent::TurnChanged { is_player_turn: true });
            Ok(None)
        } else {
            self.ai_turn().await.map(Some)
        }
    }

    /// Play the human's move and, unless it needs a promotion choice or ends
    /// the game, wait for the AI's reply.
    pub async fn play_move(&mut self, uci: &str) -> Result<TurnOutcome, GameError> {
        match self.phase {
            GamePhase::AwaitingPlayerMove => {}
            GamePhase::Idle => return Err(GameError::NotStarted),
            GamePhase::GameOver => return Err(GameError::GameOver),
            GamePhase::PendingPromotion => return Err(MoveError::PromotionPending.into()),
            _ => return Err(GameError::NotPlayerTurn),
        }

        let fen_before = self.fen();
        self.phase = GamePhase::ApplyingPlayerMove;
        let outcome = match self.engine.apply(uci, Mover::Human) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(uci, error = %e, "Player move rejected");
                self.phase = GamePhase::AwaitingPlayerMove;
                return Err(e.into());
            }
        };

        if let Some(PromotionOutcome::Pending(token)) = outcome.promotion {
            self.pending_fen_before = Some(fen_before);
            self.phase = GamePhase::PendingPromotion;
            return Ok(TurnOutcome::PromotionPending { token });
        }

        let player = self.after_player_move(&fen_before, outcome.descriptor);
        self.continue_turn(player).await
    }

    /// Complete a pending promotion and carry on with the turn.
    pub async fn finalize_promotion(
        &mut self,
        token: PromotionToken,
        kind: PieceKind,
    ) -> Result<TurnOutcome, GameError> {
        if self.phase != GamePhase::PendingPromotion {
            return Err(MoveError::NoPendingPromotion.into());
        }

        let done = self.engine.finalize_promotion(token, kind)?;
        let fen_before = self.pending_fen_before.take().unwrap_or_default();
        let uci = done.descriptor.uci();
        self.search
            .promote(self.session, self.player_side, kind, done.descriptor.to, &uci)
            .await?;

        let player = self.after_player_move(&fen_before, done.descriptor);
        self.continue_turn(player).await
    }

    fn after_player_move(&mut self, fen_before: &str, descriptor: MoveDescriptor) -> AppliedMove {
        let uci = descriptor.uci();
        let insight = self.evaluator.as_ref().and_then(|evaluator| {
            match evaluator.analyze(fen_before, &uci) {
                Ok(insight) => Some(insight),
                Err(e) => {
                    warn!(uci = %uci, error = %e, "Move analysis failed");
                    None
                }
            }
        });
        if let Some(insight) = &insight {
            self.quality.record(insight.quality);
        }

        let fen_after = self.fen();
        self.memory.record(&fen_after, &descriptor, "");
        self.last_player_uci = Some(uci.clone());
        debug!(session = self.session, uci = %uci, "Player move applied");

        self.listeners.emit(&GameEvent::PlayerMoveApplied {
            mv: descriptor.clone(),
            position_after: fen_after.clone(),
            move_number: self.memory.len() as u32,
            is_capture: descriptor.is_capture(),
            is_check: descriptor.is_check(),
            insight: insight.clone(),
        });

        AppliedMove {
            descriptor,
            fen_after,
            insight,
            backend: None,
        }
    }

    async fn continue_turn(&mut self, player: AppliedMove) -> Result<TurnOutcome, GameError> {
        if let Some((result, reason)) = self.check_termination() {
            return Ok(TurnOutcome::Finished {
                player,
                ai: None,
                result,
                reason,
            });
        }

        let ai = self.ai_turn().await?;
        match self.engine.rules().outcome() {
            Some((result, reason)) => Ok(TurnOutcome::Finished {
                player,
                ai: Some(ai),
                result,
                reason,
            }),
            None => Ok(TurnOutcome::Continue { player, ai }),
        }
    }

    /// Ask for the AI's move again after a failed attempt left the game in
    /// `AwaitingAiMove`. Whether the game ended shows in [`Self::phase`].
    pub async fn retry_ai_move(&mut self) -> Result<AppliedMove, GameError> {
        match self.phase {
            GamePhase::AwaitingAiMove => self.ai_turn().await,
            GamePhase::Idle => Err(GameError::NotStarted),
            GamePhase::GameOver => Err(GameError::GameOver),
            _ => Err(GameError::NotAiTurn),
        }
    }

    /// Produce, apply and announce the AI's move. On failure the board is
    /// unchanged and the game waits in `AwaitingAiMove` for a retry.
    async fn ai_turn(&mut self) -> Result<AppliedMove, GameError> {
        self.phase = GamePhase::AwaitingAiMove;
        self.listeners.emit(&GameEvent::TurnChanged { is_player_turn: false });

        match self.produce_ai_move().await {
            Ok(applied) => Ok(applied),
            Err(e) => {
                warn!(session = self.session, error = %e, "AI move failed, waiting for retry");
                self.phase = GamePhase::AwaitingAiMove;
                Err(e)
            }
        }
    }

    async fn produce_ai_move(&mut self) -> Result<AppliedMove, GameError> {
        let session = self.session;
        let mut applied = None;

        if let Some(remote) = self.remote.clone() {
            if let Some(chosen) = self.ask_remote(remote.clone()).await {
                self.phase = GamePhase::ApplyingAiMove;
                match self.engine.apply(&chosen.uci, Mover::Ai) {
                    Ok(outcome) => {
                        applied = Some((outcome.descriptor, chosen.reasoning, remote.identity().to_string()))
                    }
                    Err(e) => {
                        warn!(session, uci = %chosen.uci, error = %e, "Remote move failed to apply");
                        self.phase = GamePhase::AwaitingAiMove;
                    }
                }
            } else {
                warn!(session, "Remote backend gave up, falling back to local search");
            }
        }

        let (descriptor, reasoning, backend) = match applied {
            Some(applied) => applied,
            None => {
                let uci = self.ask_local().await?;
                self.phase = GamePhase::ApplyingAiMove;
                let outcome = self.engine.apply(&uci, Mover::Ai)?;
                (outcome.descriptor, String::new(), self.local_identity())
            }
        };

        let fen_after = self.fen();
        self.memory.record(&fen_after, &descriptor, &reasoning);
        info!(session, uci = %descriptor.uci(), san = %descriptor.san, backend = %backend, "AI move applied");

        self.listeners.emit(&GameEvent::AiMoveApplied {
            mv: descriptor.clone(),
            position_after: fen_after.clone(),
            move_number: self.memory.len() as u32,
            is_capture: descriptor.is_capture(),
            is_check: descriptor.is_check(),
            backend: backend.clone(),
        });

        if self.check_termination().is_none() {
            self.phase = GamePhase::AwaitingPlayerMove;
            self.listeners.emit(&GameEvent::TurnChanged { is_player_turn: true });
        }

        Ok(AppliedMove {
            descriptor,
            fen_after,
            insight: None,
            backend: Some(backend),
        })
    }

    /// Run the remote decision on its own task against a snapshot. If this
    /// future is dropped (a new game started) the task's answer goes nowhere.
    async fn ask_remote(&self, remote: Arc<RemoteDecisionEngine>) -> Option<llm_engine::RemoteMove> {
        let snapshot = self.engine.rules().fork();
        let memories = self.memory.moves().to_vec();
        let style = self.play_style;
        let observer = self.thinking.clone();

        let task = tokio::spawn(async move {
            remote
                .decide(&memories, snapshot, style, observer.as_ref())
                .await
        });
        match task.await {
            Ok(decided) => decided,
            Err(e) => {
                warn!(session = self.session, error = %e, "Remote decision task failed");
                None
            }
        }
    }

    /// One request to the search worker. Waits as long as the worker takes.
    async fn ask_local(&mut self) -> Result<String, GameError> {
        let session = self.session;
        let position = self.fen();
        self.search
            .request_move(session, &position, self.last_player_uci.as_deref())
            .await?;
        debug!(session, strategy = self.search.name(), "Waiting for local search");
        Ok(self.search.next_move(session).await?)
    }

    /// End the game if the oracle says it is over. The record is written
    /// once per game.
    fn check_termination(&mut self) -> Option<(GameResult, GameOverReason)> {
        let (result, reason) = self.engine.rules().outcome()?;
        self.phase = GamePhase::GameOver;

        if !self.record_written {
            self.record_written = true;
            let record = GameRecord {
                id: history::generate_id(),
                date: history::today(),
                result,
                pgn: self.engine.rules().pgn(),
                backend: self.backend_identity(),
                player_color: self.player_side,
                move_count: self.memory.len() as u32,
                summary: None,
                player_stats: (!self.quality.is_empty()).then(|| self.quality.stats()),
            };
            self.history.save(record);

            info!(session = self.session, result = ?result, reason = ?reason, "Game over");
            self.listeners.emit(&GameEvent::GameEnded {
                result,
                reason,
                player_color: self.player_side,
                message: result.message_for(self.player_side, reason),
            });
        }

        Some((result, reason))
    }
}

/// Rules factory starting every game from `fen`.
pub fn rules_from_fen(position: &str) -> Result<RulesFactory, GameError> {
    let position = position.to_string();
    // Validate once up front so the factory itself cannot fail.
    chess_core::ChessRules::from_fen(&position)?;
    Ok(Box::new(move || {
        match chess_core::ChessRules::from_fen(&position) {
            Ok(rules) => Box::new(rules) as Box<dyn RulesOracle>,
            Err(_) => Box::new(chess_core::ChessRules::new()),
        }
    }))
}
