//! External engine over the UCI protocol (async I/O)

use async_trait::async_trait;
use chess::{Board, ChessMove};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use chess_core::{fen, notation};

use crate::error::SearchError;
use crate::strategy::SearchStrategy;

/// Outcome of one `go` command
#[derive(Debug, Clone)]
pub struct UciResult {
    /// Centipawn score from the side to move's perspective
    pub cp: Option<i32>,
    /// Mate in N moves (negative = side to move gets mated)
    pub mate: Option<i32>,
    /// Best move in UCI notation
    pub best_move: String,
}

/// A running UCI engine process
pub struct UciEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl UciEngine {
    /// Spawn the engine and complete the UCI handshake
    pub async fn new(path: &str) -> Result<Self, SearchError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| SearchError::Engine(format!("Failed to spawn {path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| SearchError::Engine("Engine stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| SearchError::Engine("Engine stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout,
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;
        engine.send("setoption name Threads value 1").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    async fn send(&mut self, cmd: &str) -> Result<(), SearchError> {
        debug!(cmd, "UCI <");
        self.stdin.write_all(format!("{cmd}\n").as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, SearchError> {
        let mut line = String::new();
        let read = self.stdout.read_line(&mut line).await?;
        if read == 0 {
            return Err(SearchError::Engine("Engine closed its output".into()));
        }
        let trimmed = line.trim().to_string();
        debug!(line = %trimmed, "UCI >");
        Ok(trimmed)
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), SearchError> {
        loop {
            if self.read_line().await? == expected {
                return Ok(());
            }
        }
    }

    /// Search `fen` for `nodes` nodes and report the chosen move
    pub async fn best_move(&mut self, fen: &str, nodes: u32) -> Result<UciResult, SearchError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go nodes {nodes}")).await?;

        let mut result = UciResult {
            cp: None,
            mate: None,
            best_move: String::new(),
        };

        loop {
            let line = self.read_line().await?;
            if line.starts_with("info") && line.contains(" pv ") {
                if let Some(cp) = parse_cp(&line) {
                    result.cp = Some(cp);
                    result.mate = None;
                }
                if let Some(mate) = parse_mate(&line) {
                    result.mate = Some(mate);
                    result.cp = None;
                }
            } else if line.starts_with("bestmove") {
                result.best_move = parse_bestmove(&line).ok_or(SearchError::NoMove)?;
                break;
            }
        }

        Ok(result)
    }

    /// Send quit and wait for the process to exit
    pub async fn quit(&mut self) -> Result<(), SearchError> {
        self.send("quit").await?;
        let status = self.process.wait().await?;
        debug!(%status, "UCI engine exited");
        Ok(())
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        let _ = self.process.start_kill();
    }
}

/// [`SearchStrategy`] that asks an external UCI engine
pub struct UciSearch {
    engine: UciEngine,
    nodes: u32,
}

impl UciSearch {
    pub fn new(engine: UciEngine, nodes: u32) -> Self {
        Self { engine, nodes }
    }
}

#[async_trait]
impl SearchStrategy for UciSearch {
    fn name(&self) -> &str {
        "uci"
    }

    async fn choose_move(&mut self, board: &Board) -> Result<ChessMove, SearchError> {
        let position = fen::write(board, 0, 1);
        let result = self.engine.best_move(&position, self.nodes).await?;
        debug!(best = %result.best_move, cp = ?result.cp, mate = ?result.mate, "Engine answered");
        Ok(notation::parse_legal_uci(board, &result.best_move)?)
    }

    async fn shutdown(&mut self) {
        if let Err(e) = self.engine.quit().await {
            warn!(error = %e, "UCI engine did not quit cleanly");
        }
    }
}

fn field_after<T: std::str::FromStr>(line: &str, key: &str) -> Option<T> {
    let mut parts = line.split_whitespace();
    parts.find(|part| *part == key)?;
    parts.next()?.parse().ok()
}

/// Parse centipawn score from an info line
fn parse_cp(line: &str) -> Option<i32> {
    field_after(line, "cp")
}

/// Parse mate score from an info line
fn parse_mate(line: &str) -> Option<i32> {
    field_after(line, "mate")
}

/// Parse the move from a `bestmove` line; `(none)` means no legal move
fn parse_bestmove(line: &str) -> Option<String> {
    field_after::<String>(line, "bestmove").filter(|m| m != "(none)")
}
