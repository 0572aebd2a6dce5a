//! Prompt text sent to every provider.

use chess_core::Side;

use crate::config::PlayStyle;

pub fn system_prompt() -> &'static str {
    r#"You are a chess engine playing a game. You will receive the board position in FEN notation, move history, legal moves in UCI format, and optionally a game memory summary.

You MUST respond with EXACTLY this JSON format and nothing else:
{"move": "<uci_move>", "reasoning": "<your brief analysis>"}

Rules:
- The move MUST be one of the legal moves provided. Never invent moves.
- UCI format: source_square + destination_square (e.g., "e2e4", "g1f3").
- For pawn promotion, append the piece letter (e.g., "e7e8q" for queen).
- Keep reasoning concise: 2-3 sentences max covering your key considerations.
- Do not wrap in markdown code blocks. Return raw JSON only."#
}

pub fn style_instruction(style: PlayStyle) -> &'static str {
    match style {
        PlayStyle::Aggressive => {
            "Play aggressively. Prefer attacking moves, sacrifices, central control, and king-side attacks."
        }
        PlayStyle::Defensive => {
            "Play defensively. Prefer solid positional play, piece safety, and careful development."
        }
        PlayStyle::Balanced => {
            "Play the objectively strongest move. Balance tactics and positional considerations."
        }
    }
}

/// Inputs to the user prompt. Optional sections are left out when `None`.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub fen: String,
    pub side: Side,
    pub legal_moves: Vec<String>,
    pub style: PlayStyle,
    pub memory_summary: Option<String>,
    pub history: Option<String>,
}

pub fn user_prompt(request: &PromptRequest) -> String {
    let mut parts = vec![
        format!("Position (FEN): {}", request.fen),
        format!("You are playing as: {}", request.side.name()),
        format!("Legal moves (UCI): {}", request.legal_moves.join(", ")),
    ];
    if let Some(summary) = request.memory_summary.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("Game context: {summary}"));
    }
    if let Some(history) = request.history.as_deref().filter(|h| !h.is_empty()) {
        parts.push(format!("Move history (PGN): {history}"));
    }
    parts.push(format!("Style: {}", style_instruction(request.style)));
    parts.push("Respond with JSON only.".to_string());
    parts.join("\n")
}
