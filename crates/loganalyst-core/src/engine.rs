//! Adaptive difficulty and scoring formulas.
//!
//! Every function here is a pure function of its inputs. The weights and
//! thresholds are fixed:
//!
//! index = 0.3 * score + 10 * streak + 0.4 * accuracy
//!
//! | index        | tier   | time budget | base points |
//! |--------------|--------|-------------|-------------|
//! | < 50         | easy   | 60s         | 10          |
//! | 50 ..< 150   | medium | 45s         | 25          |
//! | >= 150       | hard   | 30s         | 50          |

use crate::model::Tier;

const SCORE_WEIGHT: f64 = 0.3;
const STREAK_WEIGHT: f64 = 10.0;
const ACCURACY_WEIGHT: f64 = 0.4;

const MEDIUM_THRESHOLD: f64 = 50.0;
const HARD_THRESHOLD: f64 = 150.0;

/// Bonus points per second left on the clock.
const TIME_BONUS_PER_SECOND: f64 = 0.5;

/// Weighted performance index the tier is derived from.
pub fn performance_index(score: u32, streak: u32, accuracy: u32) -> f64 {
    SCORE_WEIGHT * score as f64 + STREAK_WEIGHT * streak as f64 + ACCURACY_WEIGHT * accuracy as f64
}

/// Pick the tier for the next round from cumulative performance.
pub fn next_difficulty(score: u32, streak: u32, accuracy: u32) -> Tier {
    let index = performance_index(score, streak, accuracy);
    if index < MEDIUM_THRESHOLD {
        Tier::Easy
    } else if index < HARD_THRESHOLD {
        Tier::Medium
    } else {
        Tier::Hard
    }
}

/// Seconds the user gets to answer at a tier.
pub fn time_budget(tier: Tier) -> u32 {
    match tier {
        Tier::Easy => 60,
        Tier::Medium => 45,
        Tier::Hard => 30,
    }
}

/// Points for a correct answer before the time bonus.
pub fn base_points(tier: Tier) -> u32 {
    match tier {
        Tier::Easy => 10,
        Tier::Medium => 25,
        Tier::Hard => 50,
    }
}

/// Points awarded for an answer.
///
/// Incorrect answers score nothing. Correct answers score the tier's base
/// points plus half a point per remaining second, rounded down.
pub fn awarded_points(tier: Tier, seconds_remaining: u32, is_correct: bool) -> u32 {
    if !is_correct {
        return 0;
    }
    let bonus = (seconds_remaining as f64 * TIME_BONUS_PER_SECOND).floor() as u32;
    base_points(tier) + bonus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_starts_easy() {
        assert!((performance_index(0, 0, 100) - 40.0).abs() < f64::EPSILON);
        assert_eq!(next_difficulty(0, 0, 100), Tier::Easy);
    }

    #[test]
    fn strong_session_is_medium_just_below_hard() {
        let index = performance_index(200, 5, 90);
        assert!((index - 146.0).abs() < 1e-9, "got {index}");
        assert_eq!(next_difficulty(200, 5, 90), Tier::Medium);
    }

    #[test]
    fn thresholds_are_inclusive_on_the_upper_tier() {
        // 0.4 * 100 + 10 * 1 = 50
        assert_eq!(next_difficulty(0, 1, 100), Tier::Medium);
        // 10 * 15 = 150
        assert_eq!(next_difficulty(0, 15, 0), Tier::Hard);
        assert_eq!(next_difficulty(0, 14, 0), Tier::Medium);
    }

    #[test]
    fn next_difficulty_is_monotonic_in_each_argument() {
        for a in (0..=100).step_by(5) {
            for b in 0..20 {
                let mut prev = next_difficulty(0, a, b);
                for s in (0..=800).step_by(7) {
                    let tier = next_difficulty(s, a, b);
                    assert!(tier >= prev, "score {s}, streak {a}, accuracy {b}");
                    prev = tier;
                }

                let mut prev = next_difficulty(a * 3, 0, b);
                for k in 0..30 {
                    let tier = next_difficulty(a * 3, k, b);
                    assert!(tier >= prev);
                    prev = tier;
                }

                let mut prev = next_difficulty(a * 3, b, 0);
                for acc in 0..=100 {
                    let tier = next_difficulty(a * 3, b, acc);
                    assert!(tier >= prev);
                    prev = tier;
                }
            }
        }
    }

    #[test]
    fn time_budget_per_tier() {
        assert_eq!(time_budget(Tier::Easy), 60);
        assert_eq!(time_budget(Tier::Medium), 45);
        assert_eq!(time_budget(Tier::Hard), 30);
    }

    #[test]
    fn incorrect_answers_score_nothing() {
        for tier in Tier::ALL {
            for t in [0, 1, 30, 60, 1000] {
                assert_eq!(awarded_points(tier, t, false), 0);
            }
        }
    }

    #[test]
    fn correct_answer_points() {
        assert_eq!(awarded_points(Tier::Easy, 20, true), 20);
        assert_eq!(awarded_points(Tier::Hard, 1, true), 50);
        assert_eq!(awarded_points(Tier::Medium, 45, true), 47);
        assert_eq!(awarded_points(Tier::Easy, 0, true), 10);
    }

    #[test]
    fn full_budget_points_per_tier() {
        assert_eq!(awarded_points(Tier::Easy, time_budget(Tier::Easy), true), 40);
        assert_eq!(awarded_points(Tier::Medium, time_budget(Tier::Medium), true), 47);
        assert_eq!(awarded_points(Tier::Hard, time_budget(Tier::Hard), true), 65);
    }
}
