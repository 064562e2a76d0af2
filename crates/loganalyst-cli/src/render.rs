//! Terminal screens for the interactive session.

use std::io::{self, Write};

use comfy_table::{Cell, Table};

use loganalyst_core::model::mitigation_label;
use loganalyst_core::statistics::PerformanceStats;
use loganalyst_core::{Feedback, RoundState, Tier};

const RULE: &str = "------------------------------------------------------------";

pub fn welcome(out: &mut impl Write, degraded: bool) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "  Adaptive Log Analyst")?;
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        "Read each security log, pick the ATT&CK technique it shows and the"
    )?;
    writeln!(
        out,
        "mitigation you would apply. Difficulty adapts to your performance."
    )?;
    writeln!(out)?;
    writeln!(out, "Commands while playing:")?;
    writeln!(out, "  c <n>   select technique n")?;
    writeln!(out, "  m <n>   select mitigation n")?;
    writeln!(out, "  s       submit your answer")?;
    writeln!(out, "  q       quit")?;
    if degraded {
        writeln!(out)?;
        writeln!(
            out,
            "OFFLINE MODE: practising with built-in logs; answers are not graded by the service."
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Press Enter to start.")?;
    out.flush()
}

fn stats_bar(stats: &PerformanceStats, tier: Tier) -> String {
    format!(
        "Score: {} | Streak: {} | Accuracy: {}% | Level: {} | Tier: {}",
        stats.score, stats.streak, stats.accuracy, stats.level, tier
    )
}

fn technique_text(id: &str) -> &str {
    id
}

/// Human-readable mitigation, falling back to the identifier.
pub fn mitigation_text(id: &str) -> &str {
    mitigation_label(id).unwrap_or(id)
}

pub fn round(out: &mut impl Write, round: &RoundState, stats: &PerformanceStats) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "Round {}  |  {}", round.number, stats_bar(stats, round.tier))?;
    if round.degraded {
        writeln!(out, "OFFLINE MODE")?;
    }
    writeln!(out, "{RULE}")?;

    let log = &round.challenge.log;
    writeln!(out, "[{}] {} ({})", log.severity, log.source, log.timestamp)?;
    writeln!(out, "{}", log.raw)?;
    for (key, value) in &log.metadata {
        match value.as_str() {
            Some(text) => writeln!(out, "  {key}: {text}")?,
            None => writeln!(out, "  {key}: {value}")?,
        }
    }

    writeln!(out)?;
    writeln!(out, "Techniques:")?;
    for (i, option) in round.challenge.classification_options.iter().enumerate() {
        writeln!(
            out,
            "  {}. {:<10} {} ({})",
            i + 1,
            option.id,
            option.name,
            option.tactic
        )?;
    }
    writeln!(out, "Mitigations:")?;
    for (i, id) in round.challenge.mitigation_options.iter().enumerate() {
        writeln!(out, "  {}. {}", i + 1, mitigation_text(id))?;
    }
    writeln!(out)?;
    writeln!(out, "Time remaining: {}s", round.remaining_secs)?;
    out.flush()
}

pub fn remaining(out: &mut impl Write, secs: u32) -> io::Result<()> {
    writeln!(out, "Time remaining: {secs}s")?;
    out.flush()
}

fn verdict(feedback: &Feedback) -> &'static str {
    if feedback.time_expired {
        "Time expired"
    } else if feedback.correct {
        "Correct"
    } else {
        "Incorrect"
    }
}

fn answer_line(chosen: Option<&str>, correct: &str, render: fn(&str) -> &str) -> String {
    let chosen = chosen.map(render).unwrap_or("(none)");
    format!("you chose {chosen}; correct: {}", render(correct))
}

pub fn feedback(out: &mut impl Write, feedback: &Feedback, stats: &PerformanceStats) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "Round {}: {}", feedback.round, verdict(feedback))?;
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        "Technique:  {}",
        answer_line(
            feedback.selected_classification.as_deref(),
            &feedback.correct_classification,
            technique_text
        )
    )?;
    writeln!(
        out,
        "Mitigation: {}",
        answer_line(
            feedback.selected_mitigation.as_deref(),
            &feedback.correct_mitigation,
            mitigation_text
        )
    )?;
    writeln!(out, "Points: +{}", feedback.points)?;
    if !feedback.explanation.is_empty() {
        writeln!(out, "{}", feedback.explanation)?;
    }
    for achievement in &feedback.achievements {
        writeln!(
            out,
            "Achievement unlocked: {} ({})",
            achievement.title(),
            achievement.description()
        )?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Score: {} | Streak: {} | Accuracy: {}% | Level: {}",
        stats.score, stats.streak, stats.accuracy, stats.level
    )?;
    writeln!(out, "Press Enter for the next log, or q to quit.")?;
    out.flush()
}

pub fn summary(out: &mut impl Write, stats: &PerformanceStats, degraded: bool) -> io::Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Session", ""]);
    table.add_row(vec![
        Cell::new("Rounds"),
        Cell::new(stats.total_attempts),
    ]);
    table.add_row(vec![
        Cell::new("Correct"),
        Cell::new(stats.correct_attempts),
    ]);
    table.add_row(vec![
        Cell::new("Accuracy"),
        Cell::new(format!("{}%", stats.accuracy)),
    ]);
    table.add_row(vec![Cell::new("Score"), Cell::new(stats.score)]);
    table.add_row(vec![Cell::new("Best streak"), Cell::new(stats.best_streak)]);
    table.add_row(vec![Cell::new("Level"), Cell::new(stats.level)]);
    let achievements = stats
        .achievements
        .iter()
        .map(|a| a.title())
        .collect::<Vec<_>>()
        .join(", ");
    table.add_row(vec![
        Cell::new("Achievements"),
        Cell::new(if achievements.is_empty() {
            "-".to_string()
        } else {
            achievements
        }),
    ]);
    table.add_row(vec![
        Cell::new("Mode"),
        Cell::new(if degraded { "offline" } else { "online" }),
    ]);

    writeln!(out)?;
    writeln!(out, "{table}")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use loganalyst_core::statistics::Achievement;

    fn sample_feedback() -> Feedback {
        Feedback {
            round: 2,
            tier: Tier::Medium,
            correct: false,
            time_expired: false,
            points: 0,
            selected_classification: Some("T1055".into()),
            correct_classification: "T1059.001".into(),
            selected_mitigation: None,
            correct_mitigation: "isolate_host".into(),
            explanation: "Encoded PowerShell.".into(),
            graded_locally: false,
            grading_failed: false,
            achievements: vec![Achievement::FirstLog],
        }
    }

    fn render_to_string(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn feedback_shows_verdict_and_answers() {
        let text = render_to_string(|out| {
            feedback(out, &sample_feedback(), &PerformanceStats::new())
        });
        assert!(text.contains("Round 2: Incorrect"));
        assert!(text.contains("you chose T1055; correct: T1059.001"));
        assert!(text.contains("you chose (none); correct: Isolate infected host from network"));
        assert!(text.contains("Achievement unlocked: First Log"));
    }

    #[test]
    fn expired_round_says_so() {
        let mut fb = sample_feedback();
        fb.time_expired = true;
        fb.correct = true;
        let text = render_to_string(|out| feedback(out, &fb, &PerformanceStats::new()));
        assert!(text.contains("Time expired"));
    }

    #[test]
    fn unknown_mitigation_is_shown_verbatim() {
        assert_eq!(mitigation_text("reimage_fleet"), "reimage_fleet");
        assert_ne!(mitigation_text("block_ip"), "block_ip");
    }

    #[test]
    fn welcome_mentions_offline_mode_only_when_degraded() {
        assert!(render_to_string(|out| welcome(out, true)).contains("OFFLINE MODE"));
        assert!(!render_to_string(|out| welcome(out, false)).contains("OFFLINE MODE"));
    }

    #[test]
    fn summary_lists_totals() {
        let mut stats = PerformanceStats::new();
        stats.total_attempts = 3;
        stats.correct_attempts = 2;
        stats.accuracy = 67;
        let text = render_to_string(|out| summary(out, &stats, true));
        assert!(text.contains("67%"));
        assert!(text.contains("offline"));
    }
}
