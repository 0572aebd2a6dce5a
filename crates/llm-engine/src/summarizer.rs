//! Compresses a game's move memories into a short context paragraph.

use crate::memory::MoveMemory;
use crate::tokens;

const RECENT_IN_FULL: usize = 3;
const OPENING_PLIES: usize = 10;
const MIDDLEGAME_END: usize = 30;
const MAX_KEY_EVENTS: usize = 10;

/// Last three rationales verbatim, everything older folded into phase
/// descriptions and key events, hard-cut at `max_tokens * 4` characters.
pub fn compress_reasonings(moves: &[MoveMemory], max_tokens: usize) -> String {
    let split = moves.len().saturating_sub(RECENT_IN_FULL);
    let (older, recent) = moves.split_at(split);

    let recent_text = recent
        .iter()
        .filter(|m| !m.reasoning.is_empty())
        .map(|m| format!("Move {} ({}): {}", m.move_number, m.san, m.reasoning))
        .collect::<Vec<_>>()
        .join("\n");

    if tokens::estimate(&recent_text) >= max_tokens {
        return truncate_chars(&recent_text, max_tokens * 4);
    }

    let older_summary = summarize_moves(older);
    let combined = if older_summary.is_empty() {
        recent_text
    } else {
        format!("{older_summary}\n\nRecent analysis:\n{recent_text}")
    };

    if tokens::estimate(&combined) > max_tokens {
        truncate_chars(&combined, max_tokens * 4)
    } else {
        combined
    }
}

/// Opening and middlegame phase lines plus the newest key events.
pub fn summarize_moves(moves: &[MoveMemory]) -> String {
    if moves.is_empty() {
        return String::new();
    }

    let opening = &moves[..moves.len().min(OPENING_PLIES)];
    let middlegame: &[MoveMemory] = if moves.len() > OPENING_PLIES {
        &moves[OPENING_PLIES..moves.len().min(MIDDLEGAME_END)]
    } else {
        &[]
    };

    let mut parts = Vec::new();
    if !opening.is_empty() {
        parts.push(format!(
            "Opening (moves 1-{}): {}",
            opening.len(),
            describe_phase(opening)
        ));
    }
    if !middlegame.is_empty() {
        let start = opening.len() + 1;
        let end = start + middlegame.len() - 1;
        parts.push(format!(
            "Middlegame (moves {start}-{end}): {}",
            describe_phase(middlegame)
        ));
    }

    let events = key_events(moves);
    if !events.is_empty() {
        parts.push(format!("Key events: {}", events.join("; ")));
    }

    parts.join(". ")
}

fn describe_phase(moves: &[MoveMemory]) -> String {
    let captures = moves.iter().filter(|m| m.is_capture).count();
    let checks = moves.iter().filter(|m| m.is_check).count();
    let sans = moves.iter().map(|m| m.san.as_str()).collect::<Vec<_>>().join(" ");

    let mut parts = vec![sans];
    if captures > 0 {
        parts.push(format!("{captures} captures"));
    }
    if checks > 0 {
        parts.push(format!("{checks} checks"));
    }
    parts.join(", ")
}

fn key_events(moves: &[MoveMemory]) -> Vec<String> {
    let mut events = Vec::new();
    for m in moves {
        if m.is_capture {
            events.push(format!("Move {}: {} (capture)", m.move_number, m.san));
        }
        if m.is_check {
            events.push(format!("Move {}: {} (check)", m.move_number, m.san));
        }
        if m.san.contains("O-O") {
            events.push(format!("Move {}: {} (castle)", m.move_number, m.san));
        }
    }
    let start = events.len().saturating_sub(MAX_KEY_EVENTS);
    events.split_off(start)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
