//! Core data model types for loganalyst.
//!
//! These are the types shared by the engine, the round controller, and the
//! classification service implementations: difficulty tiers, challenges,
//! grading results, and the wire shapes exchanged with the service.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Difficulty tier of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Easy,
    Medium,
    Hard,
}

impl Tier {
    /// All tiers in ascending order.
    pub const ALL: [Tier; 3] = [Tier::Easy, Tier::Medium, Tier::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Easy => "easy",
            Tier::Medium => "medium",
            Tier::Hard => "hard",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Tier::Easy),
            "medium" => Ok(Tier::Medium),
            "hard" => Ok(Tier::Hard),
            other => Err(format!("unknown difficulty tier: '{other}'")),
        }
    }
}

/// A simulated security log line shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogArtifact {
    pub id: u32,
    /// The raw log line as a SIEM would show it.
    pub raw: String,
    /// System that emitted the log (e.g. "SSH Server").
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub timestamp: String,
    /// Structured fields extracted from the raw line.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// A selectable ATT&CK technique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationOption {
    /// Technique id (e.g. "T1110").
    pub id: String,
    pub name: String,
    /// ATT&CK tactic the technique belongs to.
    pub tactic: String,
}

/// Everything presented to the user for one round.
#[derive(Debug, Clone, PartialEq)]
pub struct Challenge {
    pub log: LogArtifact,
    pub classification_options: Vec<ClassificationOption>,
    /// Mitigation action identifiers (e.g. "block_ip").
    pub mitigation_options: Vec<String>,
    /// Seconds allowed to answer.
    pub time_budget: u32,
}

impl Challenge {
    pub fn has_classification(&self, id: &str) -> bool {
        self.classification_options.iter().any(|o| o.id == id)
    }

    pub fn has_mitigation(&self, id: &str) -> bool {
        self.mitigation_options.iter().any(|m| m == id)
    }
}

/// Shown in place of a correct answer the grader did not supply.
pub const UNKNOWN_ANSWER: &str = "Unknown";

/// The outcome of grading one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeResult {
    #[serde(rename = "is_correct")]
    pub correct: bool,
    pub points: u32,
    #[serde(rename = "correct_mitre", deserialize_with = "answer_or_unknown")]
    pub correct_classification: String,
    #[serde(deserialize_with = "answer_or_unknown")]
    pub correct_mitigation: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub explanation: String,
    #[serde(rename = "is_mitre_correct", default)]
    pub classification_correct: Option<bool>,
    #[serde(rename = "is_mitigation_correct", default)]
    pub mitigation_correct: Option<bool>,
}

// The grader sends `null` for answers and explanations it has no value for.
fn answer_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(|| UNKNOWN_ANSWER.to_string()))
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Snapshot of the statistics the service receives with a fetch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub score: u32,
    pub streak: u32,
    pub accuracy: u32,
}

/// Request for a new challenge at a given tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub difficulty: Tier,
    pub session_id: String,
    pub stats: StatsSnapshot,
}

/// Request to grade the user's two selections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRequest {
    pub session_id: String,
    #[serde(rename = "selected_mitre")]
    pub selected_classification: Option<String>,
    pub selected_mitigation: Option<String>,
    pub time_remaining: u32,
    pub difficulty: Tier,
    /// Set when the countdown ran out before the user submitted.
    #[serde(default)]
    pub time_expired: bool,
}

/// Human-readable description of a mitigation action identifier.
pub fn mitigation_label(id: &str) -> Option<&'static str> {
    match id {
        "block_ip" => Some("Block IP address at firewall level"),
        "implement_mfa" => Some("Implement Multi-Factor Authentication"),
        "isolate_host" => Some("Isolate infected host from network"),
        "forensic_analysis" => Some("Perform forensic analysis and memory dump"),
        "remove_persistence" => Some("Remove persistence mechanisms"),
        "block_c2" => Some("Block C2 communication channels"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_parses_case_insensitively() {
        assert_eq!("Medium".parse::<Tier>().unwrap(), Tier::Medium);
        assert_eq!(" hard ".parse::<Tier>().unwrap(), Tier::Hard);
        assert!("extreme".parse::<Tier>().is_err());
    }

    #[test]
    fn tier_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Easy).unwrap(), "\"easy\"");
    }

    #[test]
    fn grade_result_reads_service_field_names() {
        let json = serde_json::json!({
            "is_correct": true,
            "is_mitre_correct": true,
            "is_mitigation_correct": true,
            "correct_mitre": "T1110",
            "correct_mitigation": "implement_mfa",
            "points": 35,
            "explanation": "Brute force."
        });
        let result: GradeResult = serde_json::from_value(json).unwrap();
        assert!(result.correct);
        assert_eq!(result.points, 35);
        assert_eq!(result.correct_classification, "T1110");
        assert_eq!(result.classification_correct, Some(true));
    }

    #[test]
    fn grade_result_accepts_null_answers() {
        let json = serde_json::json!({
            "is_correct": false,
            "points": 0,
            "correct_mitre": null,
            "correct_mitigation": null,
            "explanation": null
        });
        let result: GradeResult = serde_json::from_value(json).unwrap();
        assert!(!result.correct);
        assert_eq!(result.correct_classification, UNKNOWN_ANSWER);
        assert_eq!(result.correct_mitigation, UNKNOWN_ANSWER);
        assert_eq!(result.explanation, "");
        assert_eq!(result.classification_correct, None);
    }

    #[test]
    fn grade_result_without_explanation() {
        let json = serde_json::json!({
            "is_correct": true,
            "points": 20,
            "correct_mitre": "T1046",
            "correct_mitigation": "block_ip"
        });
        let result: GradeResult = serde_json::from_value(json).unwrap();
        assert_eq!(result.explanation, "");
        assert_eq!(result.correct_mitigation, "block_ip");
    }

    #[test]
    fn grade_request_uses_service_field_names() {
        let req = GradeRequest {
            session_id: "user_abc".into(),
            selected_classification: Some("T1046".into()),
            selected_mitigation: None,
            time_remaining: 12,
            difficulty: Tier::Easy,
            time_expired: false,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["selected_mitre"], "T1046");
        assert!(value["selected_mitigation"].is_null());
        assert_eq!(value["difficulty"], "easy");
    }

    #[test]
    fn mitigation_labels() {
        assert_eq!(
            mitigation_label("block_c2"),
            Some("Block C2 communication channels")
        );
        assert_eq!(mitigation_label("reboot"), None);
    }
}
