//! Cumulative performance statistics.
//!
//! [`PerformanceStats`] lives for the whole session and is only mutated by
//! [`PerformanceStats::record`] at the end of a graded round. Accuracy is
//! always derived from the attempt counters, never adjusted on its own.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::engine;
use crate::model::{StatsSnapshot, Tier};

/// Points needed per level.
pub const POINTS_PER_LEVEL: u32 = 100;

/// Streak that unlocks [`Achievement::StreakMaster`].
pub const STREAK_MASTER_THRESHOLD: u32 = 5;

/// Elapsed seconds under which a correct answer unlocks
/// [`Achievement::QuickAnalyzer`].
pub const QUICK_ANALYZER_SECS: u32 = 10;

/// Session milestones, each unlocked at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    FirstLog,
    StreakMaster,
    QuickAnalyzer,
}

impl Achievement {
    pub fn title(self) -> &'static str {
        match self {
            Achievement::FirstLog => "First Log",
            Achievement::StreakMaster => "Streak Master",
            Achievement::QuickAnalyzer => "Quick Analyzer",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Achievement::FirstLog => "Completed your first log analysis",
            Achievement::StreakMaster => "Five correct answers in a row",
            Achievement::QuickAnalyzer => "Correct answer in under 10 seconds",
        }
    }
}

/// One graded round, as seen by the statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub correct: bool,
    pub points: u32,
    /// Seconds between the round starting and the answer being submitted.
    pub elapsed_secs: u32,
}

/// Cross-round statistics for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub score: u32,
    pub streak: u32,
    pub best_streak: u32,
    /// Percentage in `0..=100`.
    pub accuracy: u32,
    pub level: u32,
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub achievements: BTreeSet<Achievement>,
}

impl Default for PerformanceStats {
    fn default() -> Self {
        Self {
            score: 0,
            streak: 0,
            best_streak: 0,
            accuracy: 100,
            level: 1,
            total_attempts: 0,
            correct_attempts: 0,
            achievements: BTreeSet::new(),
        }
    }
}

impl PerformanceStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tier for the next round.
    pub fn next_tier(&self) -> Tier {
        engine::next_difficulty(self.score, self.streak, self.accuracy)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            score: self.score,
            streak: self.streak,
            accuracy: self.accuracy,
        }
    }

    /// Fold one graded round into the statistics.
    ///
    /// Returns the achievements unlocked by this round.
    pub fn record(&mut self, attempt: Attempt) -> Vec<Achievement> {
        self.score = self.score.saturating_add(attempt.points);
        self.total_attempts += 1;
        if attempt.correct {
            self.streak += 1;
            self.correct_attempts += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }
        self.accuracy = accuracy_percent(self.correct_attempts, self.total_attempts);

        while self.score >= self.level * POINTS_PER_LEVEL {
            self.level += 1;
        }

        let mut unlocked = Vec::new();
        let mut unlock = |achievement: Achievement, earned: bool| {
            if earned && self.achievements.insert(achievement) {
                unlocked.push(achievement);
            }
        };
        unlock(Achievement::FirstLog, true);
        unlock(
            Achievement::StreakMaster,
            self.streak >= STREAK_MASTER_THRESHOLD,
        );
        unlock(
            Achievement::QuickAnalyzer,
            attempt.correct && attempt.elapsed_secs < QUICK_ANALYZER_SECS,
        );
        unlocked
    }
}

/// `round(correct / total * 100)`, or 100 before the first attempt.
pub fn accuracy_percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 100;
    }
    (correct as f64 / total as f64 * 100.0).round() as u32
}
