//! Whole-game invariants: record bookkeeping, prompt budgets, and the
//! acceptance set of remote decisions.

mod common;

use chess_core::{ChessRules, GameOverReason, GameResult, MoveDescriptor, RulesOracle, Side};
use common::*;
use game_engine::{standard_rules, GameHistory, GamePhase, TurnOutcome};
use llm_engine::{ContextManager, GameMemory, MoveMemory, PlayStyle, RemoteDecisionEngine};

#[tokio::test]
async fn test_fools_mate_writes_one_record_matching_memory() {
    let replies = [
        r#"{"move": "f2f3", "reasoning": "Open the diagonal."}"#,
        r#"{"move": "g2g4", "reasoning": "Grab space."}"#,
    ];
    let mut h = harness(standard_rules(), Some(&replies), 3);

    let opening = h.game.start_as(Side::Black).await.unwrap().unwrap();
    assert_eq!(opening.descriptor.uci(), "f2f3");

    h.game.play_move("e7e5").await.unwrap();
    let turn = h.game.play_move("d8h4").await.unwrap();
    match turn {
        TurnOutcome::Finished { result, reason, ai, .. } => {
            assert_eq!(result, GameResult::Black);
            assert_eq!(reason, GameOverReason::Checkmate);
            assert!(ai.is_none());
        }
        _ => panic!("expected checkmate"),
    }

    assert_eq!(h.game.phase(), GamePhase::GameOver);
    assert_eq!(h.game.history().len(), 1);
    let record = &h.game.history().records()[0];
    assert_eq!(record.move_count as usize, h.game.memory().len());
    assert_eq!(record.move_count, 4);
    assert_eq!(record.backend, "openai/gpt-4o");
    assert_eq!(record.player_color, Side::Black);
    assert!(record.player_won());
    assert!(record.pgn.contains("Qh4#"), "{}", record.pgn);
    assert_eq!(count(&h.search_calls), 0);
}

#[tokio::test]
async fn test_history_survives_export_and_import() {
    let mut h = harness(game_engine::rules_from_fen(BACK_RANK_FEN).unwrap(), None, 3);
    h.game.start_as(Side::White).await.unwrap();
    h.game.play_move("d1d8").await.unwrap();

    let json = h.game.history().export_json().unwrap();
    let mut restored = GameHistory::new(50);
    assert_eq!(restored.import_json(&json).unwrap(), 1);
    assert_eq!(restored.records(), h.game.history().records());
    assert_eq!(restored.profile().wins, 1);
    assert!(restored.last_game_summary().unwrap().contains("1 moves"));
}

#[test]
fn test_prompt_budget_never_shrinks_as_context_is_added() {
    let context = ContextManager::new("gpt-4o");
    let mut rules = ChessRules::new();
    let mut memory = GameMemory::new();

    for uci in ["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6", "b5a4", "g8f6"] {
        let descriptor = rules.apply_move(uci).unwrap();
        memory.record(&rules.fen(), &descriptor, "A reasonable developing move.");

        let fen = rules.fen();
        let legal: Vec<String> = rules.legal_moves().iter().map(MoveDescriptor::uci).collect();
        let build = |memories: &[MoveMemory], history: &str| {
            context
                .build(&fen, rules.turn(), legal.clone(), PlayStyle::Balanced, memories, history)
                .info()
        };

        let bare = build(&[], "");
        let with_memory = build(memory.moves(), "");
        let with_both = build(memory.moves(), &rules.pgn());

        assert!(bare.used <= with_memory.used);
        assert!(with_memory.used <= with_both.used);
        assert!(with_both.used <= with_both.budget);
        assert_eq!(with_both.remaining, with_both.budget - with_both.used);
    }
}

#[tokio::test]
async fn test_committed_remote_move_is_always_legal() {
    let replies = [
        "Let me play e2e4 again",
        r#"{"move": "e1e2"}"#,
        r#"{"move": "b8c6", "reasoning": "Knight out."}"#,
    ];
    let engine = RemoteDecisionEngine::new(Box::new(ScriptedProvider::new(&replies)), 3);

    let mut rules = ChessRules::new();
    rules.apply_move("e2e4").unwrap();
    let legal: Vec<String> = rules.legal_moves().iter().map(MoveDescriptor::uci).collect();

    let chosen = engine
        .decide(&[], rules.fork(), PlayStyle::Aggressive, None)
        .await
        .unwrap();
    assert!(legal.contains(&chosen.uci));
    assert_eq!(chosen.uci, "b8c6");
    assert_eq!(chosen.attempt, 3);
    // The live position is untouched by the decision.
    assert_eq!(rules.san_history(), vec!["e4".to_string()]);
}
