//! PGN movetext utilities, regex based.

use std::sync::LazyLock;

use regex::Regex;

static MOVE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.+\s*").unwrap());

/// Marker put in front of truncated history.
pub const ELISION: &str = "[...] ";

/// Render SAN moves as numbered movetext (`1. e4 e5 2. Nf3`).
///
/// `first_fullmove` is the move number of the first SAN; `black_first`
/// marks histories that begin with a black move (`1... e5`).
pub fn movetext(sans: &[String], first_fullmove: u32, black_first: bool) -> String {
    let mut out = String::new();
    let mut number = first_fullmove.max(1);
    let mut white_to_move = !black_first;

    for (i, san) in sans.iter().enumerate() {
        if white_to_move {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&format!("{number}. {san}"));
        } else {
            if i == 0 {
                out.push_str(&format!("{number}... {san}"));
            } else {
                out.push(' ');
                out.push_str(san);
            }
            number += 1;
        }
        white_to_move = !white_to_move;
    }

    out
}

/// Keep the last `keep` numbered move groups, prefixed with an elision
/// marker. `None` when there is nothing to keep.
pub fn truncate_history(pgn: &str, keep: usize) -> Option<String> {
    let groups: Vec<&str> = MOVE_NUMBER_RE
        .split(pgn)
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .collect();
    if groups.is_empty() {
        return None;
    }
    let start = groups.len().saturating_sub(keep);
    Some(format!("{ELISION}{}", groups[start..].join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sans(moves: &[&str]) -> Vec<String> {
        moves.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_movetext_from_start() {
        let text = movetext(&sans(&["e4", "e5", "Nf3"]), 1, false);
        assert_eq!(text, "1. e4 e5 2. Nf3");
    }

    #[test]
    fn test_movetext_black_first() {
        let text = movetext(&sans(&["e5", "Nf3", "Nc6"]), 4, true);
        assert_eq!(text, "4... e5 5. Nf3 Nc6");
    }

    #[test]
    fn test_truncate_keeps_last_groups() {
        let moves: Vec<String> = (0..30).flat_map(|_| sans(&["Nf3", "Nf6", "Ng1", "Ng8"])).collect();
        let pgn = movetext(&moves, 1, false);
        let truncated = truncate_history(&pgn, 20).unwrap();
        assert!(truncated.starts_with(ELISION));
        let kept: Vec<&str> = truncated[ELISION.len()..].split_whitespace().collect();
        assert_eq!(kept.len(), 40);
        assert_eq!(&kept[..2], ["Nf3", "Nf6"]);
        assert_eq!(&kept[38..], ["Ng1", "Ng8"]);
        assert!(truncate_history("", 20).is_none());
    }
}
