//! Remote-first move selection with the local search as fallback.

mod common;

use std::sync::{Arc, Mutex};

use chess_core::Side;
use common::*;
use game_engine::{standard_rules, GamePhase, TurnOutcome};
use llm_engine::ThinkingEvent;

#[tokio::test]
async fn test_remote_move_is_used_when_valid() {
    let reply = r#"{"move": "e7e5", "reasoning": "Meet the centre head on."}"#;
    let mut h = harness(standard_rules(), Some(&[reply]), 3);
    h.game.start_as(Side::White).await.unwrap();

    let turn = h.game.play_move("e2e4").await.unwrap();
    let TurnOutcome::Continue { ai, .. } = turn else {
        panic!("game should continue");
    };
    assert_eq!(ai.descriptor.uci(), "e7e5");
    assert_eq!(ai.backend.as_deref(), Some("openai/gpt-4o"));
    assert_eq!(count(&h.search_calls), 0);

    let last = h.game.memory().moves().last().unwrap();
    assert_eq!(last.reasoning, "Meet the centre head on.");
    assert_eq!(h.game.phase(), GamePhase::AwaitingPlayerMove);
}

#[tokio::test]
async fn test_three_malformed_replies_fall_back_once() {
    let junk = ["I would rather not say.", "{\"thoughts\": 1}", "..."];
    let mut h = harness(standard_rules(), Some(&junk), 3);

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    h.game.set_thinking_observer(Some(Arc::new(move |e: &ThinkingEvent| {
        sink.lock().unwrap().push(e.clone());
    })));

    h.game.start_as(Side::White).await.unwrap();
    let turn = h.game.play_move("d2d4").await.unwrap();
    let TurnOutcome::Continue { ai, .. } = turn else {
        panic!("game should continue");
    };

    assert_eq!(count(h.provider_calls.as_ref().unwrap()), 3);
    assert_eq!(count(&h.search_calls), 1);
    assert_eq!(ai.backend.as_deref(), Some("local/counting"));
    assert_eq!(ai.descriptor.side, Side::Black);

    let events = events.lock().unwrap();
    let rejected = events
        .iter()
        .filter(|e| matches!(e, ThinkingEvent::Rejected { .. }))
        .count();
    assert_eq!(rejected, 3);
    assert!(matches!(events.last(), Some(ThinkingEvent::Exhausted { attempts: 3 })));
}

#[tokio::test]
async fn test_illegal_remote_move_is_retried() {
    let replies = [
        r#"{"move": "e2e4", "reasoning": "Not my pawn."}"#,
        r#"{"move": "g8f6", "reasoning": "Develop."}"#,
    ];
    let mut h = harness(standard_rules(), Some(&replies), 3);
    h.game.start_as(Side::White).await.unwrap();

    let TurnOutcome::Continue { ai, .. } = h.game.play_move("e2e4").await.unwrap() else {
        panic!("game should continue");
    };
    assert_eq!(ai.descriptor.uci(), "g8f6");
    assert_eq!(count(h.provider_calls.as_ref().unwrap()), 2);
    assert_eq!(count(&h.search_calls), 0);
}

#[tokio::test]
async fn test_without_remote_only_local_search_runs() {
    let mut h = harness(standard_rules(), None, 3);
    h.game.start_as(Side::Black).await.unwrap();
    assert_eq!(count(&h.search_calls), 1);
    assert_eq!(h.game.backend_identity(), "local/counting");
}
