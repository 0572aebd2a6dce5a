//! The worker task and the handle the orchestrator talks to it through.
//!
//! The worker owns its own board snapshot and never touches game state.
//! Requests tagged with a session older than the latest `init` are dropped,
//! and the handle discards replies for any session other than the one it is
//! waiting on.

use std::str::FromStr;

use chess::{Board, ChessMove};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use chess_core::{fen, PieceKind, Side, Square};

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::minimax::NegamaxSearch;
use crate::protocol::{SessionId, WorkerRequest, WorkerResponse};
use crate::strategy::SearchStrategy;
use crate::uci::{UciEngine, UciSearch};

/// Orchestrator side of the worker channels.
pub struct SearchHandle {
    requests: mpsc::Sender<WorkerRequest>,
    responses: mpsc::Receiver<WorkerResponse>,
    name: String,
}

impl SearchHandle {
    /// Strategy name, used as the backend identity.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn send(&self, request: WorkerRequest) -> Result<(), SearchError> {
        self.requests
            .send(request)
            .await
            .map_err(|_| SearchError::Channel)
    }

    pub async fn init(&self, session: SessionId, fen: &str, color: Side) -> Result<(), SearchError> {
        self.send(WorkerRequest::Init {
            session,
            fen: fen.to_string(),
            color,
        })
        .await
    }

    pub async fn request_move(
        &self,
        session: SessionId,
        fen: &str,
        player_move: Option<&str>,
    ) -> Result<(), SearchError> {
        self.send(WorkerRequest::AiMove {
            session,
            fen: fen.to_string(),
            player_move: player_move.map(str::to_string),
        })
        .await
    }

    pub async fn promote(
        &self,
        session: SessionId,
        color: Side,
        piece_kind: PieceKind,
        square: Square,
        uci: &str,
    ) -> Result<(), SearchError> {
        self.send(WorkerRequest::Promote {
            session,
            color,
            piece_kind,
            square,
            uci: uci.to_string(),
        })
        .await
    }

    /// Next raw response, whatever its session.
    pub async fn recv(&mut self) -> Option<WorkerResponse> {
        self.responses.recv().await
    }

    /// Wait for the move answering `session`. No timeout: the worker is
    /// expected to always reply.
    pub async fn next_move(&mut self, session: SessionId) -> Result<String, SearchError> {
        loop {
            let response = self.responses.recv().await.ok_or(SearchError::Channel)?;
            if response.session() != session {
                debug!(stale = response.session(), current = session, "Discarding stale worker reply");
                continue;
            }
            return match response {
                WorkerResponse::AiMovePerformed { ai_move, .. } => Ok(ai_move),
                WorkerResponse::Error { message, .. } => Err(SearchError::Worker(message)),
            };
        }
    }
}

/// Spawn a worker task driving `strategy` and return its handle.
pub fn spawn_worker<S>(strategy: S, capacity: usize) -> SearchHandle
where
    S: SearchStrategy + 'static,
{
    let capacity = capacity.max(1);
    let (request_tx, request_rx) = mpsc::channel(capacity);
    let (response_tx, response_rx) = mpsc::channel(capacity);
    let name = strategy.name().to_string();

    tokio::spawn(run(strategy, request_rx, response_tx));

    SearchHandle {
        requests: request_tx,
        responses: response_rx,
        name,
    }
}

/// Spawn the worker described by `config`: an external UCI engine when a
/// path is configured, the built-in negamax otherwise.
pub async fn spawn_from_config(config: &SearchConfig) -> Result<SearchHandle, SearchError> {
    match &config.engine_path {
        Some(path) => {
            let engine = UciEngine::new(path).await?;
            info!(path = %path, nodes = config.nodes, "UCI engine ready");
            Ok(spawn_worker(UciSearch::new(engine, config.nodes), config.queue_capacity))
        }
        None => {
            info!(depth = config.depth, "Using built-in negamax search");
            Ok(spawn_worker(NegamaxSearch::new(config.depth), config.queue_capacity))
        }
    }
}

struct WorkerState {
    session: SessionId,
    board: Option<Board>,
    color: Side,
}

async fn run<S: SearchStrategy>(
    mut strategy: S,
    mut requests: mpsc::Receiver<WorkerRequest>,
    responses: mpsc::Sender<WorkerResponse>,
) {
    let mut state = WorkerState {
        session: 0,
        board: None,
        color: Side::Black,
    };

    while let Some(request) = requests.recv().await {
        let session = request.session();
        if session < state.session {
            debug!(session, current = state.session, "Dropping request from an old session");
            continue;
        }

        let reply = match handle(&mut strategy, &mut state, request).await {
            Ok(Some(ai_move)) => Some(WorkerResponse::AiMovePerformed { session, ai_move }),
            Ok(None) => None,
            Err(e) => {
                warn!(session, error = %e, "Search request failed");
                Some(WorkerResponse::Error {
                    session,
                    message: e.to_string(),
                })
            }
        };

        if let Some(reply) = reply {
            if responses.send(reply).await.is_err() {
                debug!("Handle dropped, stopping worker");
                break;
            }
        }
    }

    strategy.shutdown().await;
    debug!(strategy = strategy.name(), "Worker stopped");
}

async fn handle<S: SearchStrategy>(
    strategy: &mut S,
    state: &mut WorkerState,
    request: WorkerRequest,
) -> Result<Option<String>, SearchError> {
    match request {
        WorkerRequest::Init { session, fen, color } => {
            let (board, _, _) = fen::parse(&fen)?;
            state.session = session;
            state.board = Some(board);
            state.color = color;
            debug!(session, color = %color, "Worker initialised");
            Ok(None)
        }
        WorkerRequest::AiMove {
            session,
            fen,
            player_move,
        } => {
            let (board, _, _) = fen::parse(&fen)?;
            if Side::from(board.side_to_move()) != state.color {
                debug!(session, "Asked to move for the other side");
            }
            debug!(session, player_move = ?player_move, "Searching");
            let chosen: ChessMove = strategy.choose_move(&board).await?;
            state.session = session;
            state.board = Some(board.make_move_new(chosen));
            Ok(Some(chosen.to_string()))
        }
        WorkerRequest::Promote {
            session,
            color,
            piece_kind,
            square,
            uci,
        } => {
            let Some(board) = state.board else {
                return Err(SearchError::Worker("Promotion before init".into()));
            };
            let current = fen::write(&board, 0, 1);
            let edited = fen::with_piece(&current, square, Some((color, piece_kind)))?;
            state.board = Some(
                Board::from_str(&edited).map_err(|_| SearchError::Worker(format!("Bad board after {uci}")))?,
            );
            state.session = session;
            debug!(session, square = %square, piece = %piece_kind, "Promotion recorded");
            Ok(None)
        }
    }
}
