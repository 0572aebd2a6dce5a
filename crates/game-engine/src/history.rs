//! Finished games, newest first, with JSON export and import.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use chess_core::{GameResult, Side};

use crate::error::GameError;
use crate::quality::PlayerGameStats;

pub const DEFAULT_CAPACITY: usize = 50;
pub const EXPORT_VERSION: u32 = 1;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub result: GameResult,
    pub pgn: String,
    /// `provider/model`, or `local/<strategy>` when no remote model played.
    pub backend: String,
    pub player_color: Side,
    pub move_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_stats: Option<PlayerGameStats>,
}

impl GameRecord {
    pub fn player_won(&self) -> bool {
        self.result == GameResult::winner(self.player_color)
    }

    pub fn player_lost(&self) -> bool {
        self.result == GameResult::winner(self.player_color.opposite())
    }
}

/// `game_<unix-millis>_<6 base36 chars>`
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = (0..6)
        .map(|_| ID_ALPHABET[rand::random::<usize>() % ID_ALPHABET.len()] as char)
        .collect();
    format!("game_{millis}_{suffix}")
}

pub fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

fn id_millis(id: &str) -> i64 {
    id.split('_').nth(1).and_then(|m| m.parse().ok()).unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub total_games: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub average_accuracy: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryExport {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub records: Vec<GameRecord>,
    #[serde(default)]
    pub profile: Option<PlayerProfile>,
}

#[derive(Debug, Clone)]
pub struct GameHistory {
    records: Vec<GameRecord>,
    capacity: usize,
}

impl Default for GameHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl GameHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Newest first.
    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&GameRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Insert at the front, evicting the oldest beyond capacity.
    pub fn save(&mut self, record: GameRecord) {
        debug!(id = %record.id, "Saving game record");
        self.records.insert(0, record);
        self.records.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn last_game_summary(&self) -> Option<String> {
        let last = self.records.first()?;
        let outcome = match last.result {
            GameResult::Draw => "ended in a draw".to_string(),
            winner => format!("{} won", winner_name(winner)),
        };
        let mut line = format!(
            "Last game ({}): {} moves, {}. Backend: {}.",
            last.date, last.move_count, outcome, last.backend
        );
        if let Some(summary) = &last.summary {
            line.push(' ');
            line.push_str(summary);
        }
        Some(line)
    }

    pub fn profile(&self) -> PlayerProfile {
        let mut profile = PlayerProfile {
            total_games: self.records.len() as u32,
            ..PlayerProfile::default()
        };
        for record in &self.records {
            if record.player_won() {
                profile.wins += 1;
            } else if record.player_lost() {
                profile.losses += 1;
            } else {
                profile.draws += 1;
            }
        }
        let accuracies: Vec<u32> = self
            .records
            .iter()
            .filter_map(|r| r.player_stats.map(|s| s.accuracy))
            .collect();
        if !accuracies.is_empty() {
            let total: u32 = accuracies.iter().sum();
            profile.average_accuracy = (total as f64 / accuracies.len() as f64).round() as u32;
        }
        profile
    }

    pub fn export_json(&self) -> Result<String, GameError> {
        let export = HistoryExport {
            version: EXPORT_VERSION,
            exported_at: Utc::now(),
            records: self.records.clone(),
            profile: Some(self.profile()),
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Merge an export into this history. Records already present (by id)
    /// are skipped. Returns how many were added.
    pub fn import_json(&mut self, text: &str) -> Result<usize, GameError> {
        let export: HistoryExport = serde_json::from_str(text)?;
        if export.version != EXPORT_VERSION {
            return Err(GameError::History(format!(
                "unsupported export version {}",
                export.version
            )));
        }

        let mut added = 0;
        for record in export.records {
            if self.get(&record.id).is_none() {
                self.records.push(record);
                added += 1;
            }
        }
        self.records
            .sort_by(|a, b| id_millis(&b.id).cmp(&id_millis(&a.id)));
        self.records.truncate(self.capacity);
        info!(added, total = self.records.len(), "History imported");
        Ok(added)
    }
}

fn winner_name(result: GameResult) -> &'static str {
    match result {
        GameResult::White => "white",
        GameResult::Black => "black",
        GameResult::Draw => "nobody",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, result: GameResult, accuracy: Option<u32>) -> GameRecord {
        GameRecord {
            id: id.to_string(),
            date: "2026-10-18".into(),
            result,
            pgn: "1. e4 e5".into(),
            backend: "local/negamax".into(),
            player_color: Side::White,
            move_count: 2,
            summary: None,
            player_stats: accuracy.map(|a| PlayerGameStats {
                accuracy: a,
                ..PlayerGameStats::default()
            }),
        }
    }

    #[test]
    fn test_generate_id_shape() {
        let id = generate_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "game");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_fifo_eviction() {
        let mut history = GameHistory::new(2);
        history.save(record("game_1_a", GameResult::White, None));
        history.save(record("game_2_b", GameResult::Black, None));
        history.save(record("game_3_c", GameResult::Draw, None));
        assert_eq!(history.len(), 2);
        assert_eq!(history.records()[0].id, "game_3_c");
        assert!(history.get("game_1_a").is_none());
        assert_eq!(
            history.last_game_summary().unwrap(),
            "Last game (2026-10-18): 2 moves, ended in a draw. Backend: local/negamax."
        );
    }

    #[test]
    fn test_profile() {
        let mut history = GameHistory::default();
        history.save(record("game_1_a", GameResult::White, Some(80)));
        history.save(record("game_2_b", GameResult::Black, Some(61)));
        history.save(record("game_3_c", GameResult::Draw, None));
        let profile = history.profile();
        assert_eq!(profile.total_games, 3);
        assert_eq!((profile.wins, profile.losses, profile.draws), (1, 1, 1));
        assert_eq!(profile.average_accuracy, 71);
    }

    #[test]
    fn test_export_import_merge() {
        let mut source = GameHistory::default();
        source.save(record("game_100_a", GameResult::White, None));
        source.save(record("game_300_c", GameResult::Black, None));
        let exported = source.export_json().unwrap();

        let mut target = GameHistory::default();
        target.save(record("game_200_b", GameResult::Draw, None));
        target.save(record("game_300_c", GameResult::Black, None));
        assert_eq!(target.import_json(&exported).unwrap(), 1);

        let ids: Vec<&str> = target.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["game_300_c", "game_200_b", "game_100_a"]);
    }

    #[test]
    fn test_import_rejects_version() {
        let text = r#"{"version":2,"exportedAt":"2026-10-18T00:00:00Z","records":[]}"#;
        let mut history = GameHistory::default();
        assert!(matches!(history.import_json(text), Err(GameError::History(_))));
        assert!(matches!(history.import_json("nope"), Err(GameError::Json(_))));
    }
}
