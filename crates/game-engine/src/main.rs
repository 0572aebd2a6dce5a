//! `gambit`: play against the AI from a terminal.
//!
//! Moves are typed in UCI (`e2e4`, `e7e8`). A pawn reaching the last rank
//! asks for the promotion piece. `new` starts another game, `retry` asks the
//! AI again after it failed to move, `quit` exits.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use chess_core::PieceKind;
use game_engine::{
    standard_rules, ChessGame, GameConfig, GameDeps, GameError, GameEvent, GameHistory, GamePhase,
    TurnOutcome,
};
use llm_engine::{RemoteDecisionEngine, ThinkingEvent, ThinkingObserver};
use move_insight::MoveQualityEvaluator;
use search_worker::spawn_from_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let _ = dotenvy::dotenv();

    let config = GameConfig::from_env()?;
    let search = spawn_from_config(&config.search).await?;

    let remote = if config.llm.is_usable() {
        match RemoteDecisionEngine::from_settings(&config.llm) {
            Ok(engine) => {
                if !engine.validate_credential().await {
                    warn!(backend = engine.identity(), "Credential check failed, moves may fall back to local search");
                }
                Some(Arc::new(engine))
            }
            Err(e) => {
                warn!(error = %e, "Remote backend disabled");
                None
            }
        }
    } else {
        None
    };

    let mut game = ChessGame::new(GameDeps {
        rules: standard_rules(),
        remote,
        play_style: config.llm.play_style,
        search,
        evaluator: config.insights_enabled.then(MoveQualityEvaluator::new),
        history_capacity: config.history_capacity,
    });

    if let Some(path) = &config.history_path {
        load_history(game.history_mut(), path).await;
    }
    if let Some(summary) = game.history().last_game_summary() {
        println!("{summary}");
    }

    game.subscribe(Box::new(print_event));
    let observer: ThinkingObserver = Arc::new(|event: &ThinkingEvent| match event {
        ThinkingEvent::Rejected { attempt, reason } => {
            eprintln!("  (attempt {attempt} rejected: {reason})")
        }
        ThinkingEvent::Committed { reasoning, .. } if !reasoning.is_empty() => {
            println!("  AI: {reasoning}")
        }
        _ => {}
    });
    game.set_thinking_observer(Some(observer));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    start_game(&mut game).await;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => continue,
            "quit" | "exit" => break,
            "new" => {
                start_game(&mut game).await;
                continue;
            }
            "retry" => {
                if let Err(e) = game.retry_ai_move().await {
                    report(&game, &e);
                }
                continue;
            }
            "fen" => {
                println!("{}", game.fen());
                continue;
            }
            _ => {}
        }

        let outcome = match game.play_move(input).await {
            Ok(outcome) => outcome,
            Err(e) => {
                report(&game, &e);
                continue;
            }
        };

        if let TurnOutcome::PromotionPending { token } = outcome {
            let kind = ask_promotion(&mut lines).await?;
            if let Err(e) = game.finalize_promotion(token, kind).await {
                report(&game, &e);
            }
        }
    }

    if let Some(path) = &config.history_path {
        let json = game.history().export_json()?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("writing history to {}", path.display()))?;
        info!(path = %path.display(), games = game.history().len(), "History saved");
    }

    Ok(())
}

async fn start_game(game: &mut ChessGame) {
    match game.start().await {
        Ok(_) => println!("You play {}.", game.player_side()),
        Err(e) => report(game, &e),
    }
}

fn report(game: &ChessGame, error: &GameError) {
    println!("{error}");
    if game.phase() == GamePhase::AwaitingAiMove {
        println!("The AI could not move. Type `retry` to ask again.");
    }
}

async fn load_history(history: &mut GameHistory, path: &std::path::Path) {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            info!(path = %path.display(), error = %e, "No history loaded");
            return;
        }
    };
    match history.import_json(&text) {
        Ok(count) => info!(path = %path.display(), count, "History loaded"),
        Err(e) => warn!(path = %path.display(), error = %e, "History file rejected"),
    }
}

async fn ask_promotion(lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<PieceKind> {
    loop {
        println!("Promote to (q, r, b, n)?");
        let Some(line) = lines.next_line().await? else {
            return Ok(PieceKind::Queen);
        };
        let choice = line
            .trim()
            .chars()
            .next()
            .and_then(|c| PieceKind::from_letter(c.to_ascii_lowercase()))
            .filter(|kind| kind.is_promotion_target());
        if let Some(kind) = choice {
            return Ok(kind);
        }
    }
}

fn print_event(event: &GameEvent) {
    match event {
        GameEvent::PlayerMoveApplied { mv, insight, .. } => {
            match insight {
                Some(insight) => println!("You: {} ({}) {}", mv.san, insight.quality.as_str(), insight.explanation),
                None => println!("You: {}", mv.san),
            }
        }
        GameEvent::AiMoveApplied { mv, backend, .. } => println!("AI: {} [{backend}]", mv.san),
        GameEvent::GameEnded { message, .. } => println!("{message}"),
        GameEvent::GameStarted { .. } | GameEvent::TurnChanged { .. } => {}
    }
}
