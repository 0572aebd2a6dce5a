//! Move quality classification on concrete positions, end to end through
//! the orchestrator where the player's move is applied.

mod common;

use common::*;
use game_engine::{rules_from_fen, GameEvent, TurnOutcome};
use move_insight::{MoveQuality, MoveQualityEvaluator};

use chess_core::Side;
use std::sync::{Arc, Mutex};

#[test]
fn test_central_pawn_push_is_good() {
    let insight = MoveQualityEvaluator::new().analyze(START_FEN, "e2e4").unwrap();
    assert_eq!(insight.quality, MoveQuality::Good);
    assert!(insight.better_move.is_none());
}

#[test]
fn test_queen_walking_into_pawn_is_blunder() {
    let insight = MoveQualityEvaluator::new().analyze(QUEEN_HANG_FEN, "d1d5").unwrap();
    assert_eq!(insight.quality, MoveQuality::Blunder);
    assert!(insight.explanation.contains("pawn"), "{}", insight.explanation);
    assert!(insight.explanation.contains("d5"));
    assert!(insight.better_move.is_some());
}

#[test]
fn test_ignoring_mate_in_one_is_missed_win() {
    let insight = MoveQualityEvaluator::new().analyze(BACK_RANK_FEN, "h2h3").unwrap();
    assert_eq!(insight.quality, MoveQuality::MissedWin);
    assert_eq!(insight.better_move.as_deref(), Some("Rd8#"));
}

#[test]
fn test_analysis_is_deterministic() {
    let evaluator = MoveQualityEvaluator::new();
    for (fen, mv) in [(START_FEN, "g1f3"), (QUEEN_HANG_FEN, "d1d5"), (BACK_RANK_FEN, "h2h3")] {
        assert_eq!(evaluator.analyze(fen, mv).unwrap(), evaluator.analyze(fen, mv).unwrap());
    }
}

#[tokio::test]
async fn test_player_move_event_carries_insight() {
    let mut h = harness(rules_from_fen(QUEEN_HANG_FEN).unwrap(), None, 3);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    h.game.subscribe(Box::new(move |event: &GameEvent| {
        if let GameEvent::PlayerMoveApplied { insight, .. } = event {
            sink.lock().unwrap().push(insight.clone());
        }
    }));

    h.game.start_as(Side::White).await.unwrap();
    let turn = h.game.play_move("d1d5").await.unwrap();
    let TurnOutcome::Continue { player, .. } = turn else {
        panic!("game should continue");
    };

    let insight = player.insight.unwrap();
    assert_eq!(insight.quality, MoveQuality::Blunder);
    assert_eq!(seen.lock().unwrap().as_slice(), &[Some(insight)]);
}

#[tokio::test]
async fn test_record_carries_quality_stats() {
    let mut h = harness(rules_from_fen(BACK_RANK_FEN).unwrap(), None, 3);
    h.game.start_as(Side::White).await.unwrap();
    h.game.play_move("d1d8").await.unwrap();

    let record = &h.game.history().records()[0];
    let stats = record.player_stats.unwrap();
    assert_eq!(stats.brilliant_moves, 1);
    assert_eq!(stats.accuracy, 100);
    assert!(record.player_won());
}
