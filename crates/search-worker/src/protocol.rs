//! Messages exchanged with the search worker. Every message carries the
//! session it belongs to so replies for an abandoned game can be dropped.

use serde::{Deserialize, Serialize};

use chess_core::{PieceKind, Side, Square};

pub type SessionId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerRequest {
    /// New game: the worker plays `color` from `fen`.
    Init {
        session: SessionId,
        #[serde(rename = "position")]
        fen: String,
        color: Side,
    },
    /// Produce a move for the side to move in `fen`.
    #[serde(rename_all = "camelCase")]
    AiMove {
        session: SessionId,
        #[serde(rename = "position")]
        fen: String,
        player_move: Option<String>,
    },
    /// The human finished a promotion on `square`.
    #[serde(rename_all = "camelCase")]
    Promote {
        session: SessionId,
        color: Side,
        piece_kind: PieceKind,
        square: Square,
        #[serde(rename = "move")]
        uci: String,
    },
}

impl WorkerRequest {
    pub fn session(&self) -> SessionId {
        match self {
            WorkerRequest::Init { session, .. }
            | WorkerRequest::AiMove { session, .. }
            | WorkerRequest::Promote { session, .. } => *session,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerResponse {
    #[serde(rename_all = "camelCase")]
    AiMovePerformed { session: SessionId, ai_move: String },
    Error { session: SessionId, message: String },
}

impl WorkerResponse {
    pub fn session(&self) -> SessionId {
        match self {
            WorkerResponse::AiMovePerformed { session, .. }
            | WorkerResponse::Error { session, .. } => *session,
        }
    }
}
