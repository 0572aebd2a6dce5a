//! Per-game tally of the player's move qualities.

use serde::{Deserialize, Serialize};

use move_insight::MoveQuality;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerGameStats {
    pub brilliant_moves: u32,
    pub blunders: u32,
    pub missed_wins: u32,
    pub longest_good_streak: u32,
    /// 0-100, rounded mean of per-move weights.
    pub accuracy: u32,
}

fn weight(quality: MoveQuality) -> u32 {
    match quality {
        MoveQuality::Brilliant => 100,
        MoveQuality::Good => 80,
        MoveQuality::Inaccuracy => 50,
        MoveQuality::MissedWin => 20,
        MoveQuality::Blunder => 10,
    }
}

#[derive(Debug, Clone, Default)]
pub struct QualityTracker {
    qualities: Vec<MoveQuality>,
    current_streak: u32,
    best_streak: u32,
}

impl QualityTracker {
    pub fn record(&mut self, quality: MoveQuality) {
        self.qualities.push(quality);
        if matches!(quality, MoveQuality::Brilliant | MoveQuality::Good) {
            self.current_streak += 1;
            self.best_streak = self.best_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }
    }

    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    pub fn is_empty(&self) -> bool {
        self.qualities.is_empty()
    }

    pub fn stats(&self) -> PlayerGameStats {
        let count = |q: MoveQuality| self.qualities.iter().filter(|x| **x == q).count() as u32;
        PlayerGameStats {
            brilliant_moves: count(MoveQuality::Brilliant),
            blunders: count(MoveQuality::Blunder),
            missed_wins: count(MoveQuality::MissedWin),
            longest_good_streak: self.best_streak,
            accuracy: self.accuracy(),
        }
    }

    fn accuracy(&self) -> u32 {
        if self.qualities.is_empty() {
            return 0;
        }
        let total: u32 = self.qualities.iter().map(|q| weight(*q)).sum();
        (total as f64 / self.qualities.len() as f64).round() as u32
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats() {
        let mut tracker = QualityTracker::default();
        for q in [
            MoveQuality::Good,
            MoveQuality::Brilliant,
            MoveQuality::Good,
            MoveQuality::Blunder,
            MoveQuality::Good,
            MoveQuality::MissedWin,
        ] {
            tracker.record(q);
        }
        let stats = tracker.stats();
        assert_eq!(stats.brilliant_moves, 1);
        assert_eq!(stats.blunders, 1);
        assert_eq!(stats.missed_wins, 1);
        assert_eq!(stats.longest_good_streak, 3);
        // (80 + 100 + 80 + 10 + 80 + 20) / 6 = 61.67
        assert_eq!(stats.accuracy, 62);
        assert_eq!(tracker.current_streak(), 0);

        tracker.reset();
        assert!(tracker.is_empty());
        assert_eq!(tracker.stats(), PlayerGameStats::default());
    }
}
