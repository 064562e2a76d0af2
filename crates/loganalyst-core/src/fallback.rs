//! Built-in challenge table and the local stand-in for the classification
//! service.
//!
//! [`LocalService`] is what a degraded session talks to. It draws challenges
//! pseudorandomly from a small static table keyed by tier, and its grading is
//! a stub that always reports the answer as correct.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::engine;
use crate::model::{
    Challenge, ClassificationOption, FetchRequest, GradeRequest, GradeResult, LogArtifact, Tier,
};
use crate::traits::ClassificationService;

/// One canned log with its expected answer.
#[derive(Debug)]
pub struct FallbackEntry {
    pub id: u32,
    pub raw: &'static str,
    pub source: &'static str,
    pub severity: &'static str,
    pub timestamp: &'static str,
    pub metadata: &'static [(&'static str, &'static str)],
    pub technique: &'static str,
    pub mitigation: &'static str,
    pub explanation: &'static str,
}

impl FallbackEntry {
    pub fn artifact(&self) -> LogArtifact {
        LogArtifact {
            id: self.id,
            raw: self.raw.to_string(),
            source: self.source.to_string(),
            severity: self.severity.to_string(),
            timestamp: self.timestamp.to_string(),
            metadata: self
                .metadata
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
                .collect(),
        }
    }
}

const EASY_LOGS: &[FallbackEntry] = &[
    FallbackEntry {
        id: 1,
        raw: "2024-03-15 14:23:45 [ALERT] Failed login attempt from IP 192.168.1.105 - User: admin - Attempts: 5",
        source: "SSH Server",
        severity: "Medium",
        timestamp: "2024-03-15 14:23:45",
        metadata: &[
            ("ip", "192.168.1.105"),
            ("user", "admin"),
            ("service", "SSH"),
            ("attempts", "5"),
        ],
        technique: "T1110",
        mitigation: "implement_mfa",
        explanation: "Failed login attempts indicate a brute force attack. The attacker is trying multiple passwords to gain unauthorized access.",
    },
    FallbackEntry {
        id: 2,
        raw: "2024-03-15 10:15:23 [WARNING] Unusual port scanning activity detected from 10.0.0.50 targeting ports 1-1000",
        source: "IDS/IPS",
        severity: "Medium",
        timestamp: "2024-03-15 10:15:23",
        metadata: &[
            ("ip", "10.0.0.50"),
            ("ports", "1-1000"),
            ("service", "Network"),
            ("pattern", "Sequential"),
        ],
        technique: "T1046",
        mitigation: "block_ip",
        explanation: "Port scanning is a reconnaissance technique used to discover open services on a target system.",
    },
];

const MEDIUM_LOGS: &[FallbackEntry] = &[
    FallbackEntry {
        id: 3,
        raw: "2024-03-15 16:45:12 [CRITICAL] PowerShell execution with encoded command: powershell.exe -NoP -NonI -W Hidden -Enc WwBTAHkAcw==",
        source: "EDR System",
        severity: "High",
        timestamp: "2024-03-15 16:45:12",
        metadata: &[
            ("process", "powershell.exe"),
            ("flags", "-NoP -NonI -W Hidden"),
            ("encoding", "Base64"),
            ("parent", "winword.exe"),
        ],
        technique: "T1059.001",
        mitigation: "isolate_host",
        explanation: "Encoded PowerShell commands are often used by attackers to evade detection and execute malicious payloads.",
    },
    FallbackEntry {
        id: 4,
        raw: "2024-03-15 09:30:45 [ALERT] Suspicious registry modification: HKLM\\Software\\Microsoft\\Windows\\CurrentVersion\\Run - Added: UpdateCheck.exe",
        source: "Sysmon",
        severity: "High",
        timestamp: "2024-03-15 09:30:45",
        metadata: &[
            ("registry", "HKLM\\Software\\Microsoft\\Windows\\CurrentVersion\\Run"),
            ("action", "Added"),
            ("value", "UpdateCheck.exe"),
            ("process", "cmd.exe"),
        ],
        technique: "T1547.001",
        mitigation: "remove_persistence",
        explanation: "Registry modifications to Run keys establish persistence, ensuring malware executes on system startup.",
    },
];

const HARD_LOGS: &[FallbackEntry] = &[
    FallbackEntry {
        id: 5,
        raw: "2024-03-15 22:10:33 [CRITICAL] Process injection detected: svchost.exe -> lsass.exe | Memory allocation in remote process",
        source: "EDR System",
        severity: "Critical",
        timestamp: "2024-03-15 22:10:33",
        metadata: &[
            ("source_process", "svchost.exe"),
            ("target_process", "lsass.exe"),
            ("technique", "Process Injection"),
            ("risk", "Credential Dumping"),
        ],
        technique: "T1003.001",
        mitigation: "forensic_analysis",
        explanation: "Process injection into LSASS is a common technique for stealing credentials from memory.",
    },
    FallbackEntry {
        id: 6,
        raw: "2024-03-15 03:25:18 [CRITICAL] C2 Communication: Periodic beaconing to 185.220.101.45:443 | Jitter: 10%",
        source: "Network Monitor",
        severity: "Critical",
        timestamp: "2024-03-15 03:25:18",
        metadata: &[
            ("destination", "185.220.101.45:443"),
            ("pattern", "Beaconing"),
            ("jitter", "10%"),
            ("user_agent", "Mozilla/5.0"),
        ],
        technique: "T1071.001",
        mitigation: "block_c2",
        explanation: "Periodic beaconing to external IPs indicates active command and control communication.",
    },
];

/// `(id, name, tactic)` triples offered at each tier.
const EASY_TECHNIQUES: &[(&str, &str, &str)] = &[
    ("T1110", "Brute Force", "Credential Access"),
    ("T1046", "Network Service Discovery", "Discovery"),
    ("T1090", "Proxy", "Command and Control"),
    ("T1078", "Valid Accounts", "Initial Access"),
];

const MEDIUM_TECHNIQUES: &[(&str, &str, &str)] = &[
    ("T1059.001", "PowerShell", "Execution"),
    ("T1547.001", "Registry Run Keys", "Persistence"),
    ("T1055", "Process Injection", "Defense Evasion"),
    ("T1070", "Indicator Removal", "Defense Evasion"),
];

const HARD_TECHNIQUES: &[(&str, &str, &str)] = &[
    ("T1003.001", "LSASS Memory", "Credential Access"),
    ("T1071.001", "Web Protocols", "Command and Control"),
    ("T1486", "Data Encrypted for Impact", "Impact"),
    ("T1027", "Obfuscated Files", "Defense Evasion"),
];

const EASY_MITIGATIONS: &[&str] = &[
    "block_ip",
    "implement_mfa",
    "isolate_host",
    "forensic_analysis",
];
const MEDIUM_MITIGATIONS: &[&str] = &[
    "isolate_host",
    "remove_persistence",
    "block_ip",
    "forensic_analysis",
];
const HARD_MITIGATIONS: &[&str] = &[
    "forensic_analysis",
    "block_c2",
    "isolate_host",
    "remove_persistence",
];

/// Canned logs for a tier.
pub fn logs_for(tier: Tier) -> &'static [FallbackEntry] {
    match tier {
        Tier::Easy => EASY_LOGS,
        Tier::Medium => MEDIUM_LOGS,
        Tier::Hard => HARD_LOGS,
    }
}

/// Technique options offered at a tier.
pub fn techniques_for(tier: Tier) -> Vec<ClassificationOption> {
    let table = match tier {
        Tier::Easy => EASY_TECHNIQUES,
        Tier::Medium => MEDIUM_TECHNIQUES,
        Tier::Hard => HARD_TECHNIQUES,
    };
    table
        .iter()
        .map(|(id, name, tactic)| ClassificationOption {
            id: id.to_string(),
            name: name.to_string(),
            tactic: tactic.to_string(),
        })
        .collect()
}

/// Mitigation identifiers offered at a tier.
pub fn mitigations_for(tier: Tier) -> Vec<String> {
    let table = match tier {
        Tier::Easy => EASY_MITIGATIONS,
        Tier::Medium => MEDIUM_MITIGATIONS,
        Tier::Hard => HARD_MITIGATIONS,
    };
    table.iter().map(|m| m.to_string()).collect()
}

/// Local classification service backed by the built-in table.
pub struct LocalService {
    rng: Mutex<StdRng>,
    /// Entry served by the last fetch.
    current: Mutex<Option<&'static FallbackEntry>>,
}

impl LocalService {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A service whose challenge selection is reproducible.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            current: Mutex::new(None),
        }
    }

    fn pick(&self, tier: Tier) -> &'static FallbackEntry {
        let logs = logs_for(tier);
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        logs.choose(&mut *rng).unwrap_or(&logs[0])
    }

    /// Draw a challenge for `tier` and remember it for grading.
    pub fn draw(&self, tier: Tier) -> Challenge {
        let entry = self.pick(tier);
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(entry);
        tracing::debug!(log_id = entry.id, %tier, "serving fallback challenge");

        Challenge {
            log: entry.artifact(),
            classification_options: techniques_for(tier),
            mitigation_options: mitigations_for(tier),
            time_budget: engine::time_budget(tier),
        }
    }
}

impl Default for LocalService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClassificationService for LocalService {
    fn name(&self) -> &str {
        "local"
    }

    async fn fetch_challenge(&self, request: &FetchRequest) -> anyhow::Result<Challenge> {
        Ok(self.draw(request.difficulty))
    }

    /// Always reports a correct answer; points follow the engine formula and
    /// drop to zero when the clock ran out.
    async fn grade(&self, request: &GradeRequest) -> anyhow::Result<GradeResult> {
        let current = *self.current.lock().unwrap_or_else(|e| e.into_inner());
        let points = if request.time_expired {
            0
        } else {
            engine::awarded_points(request.difficulty, request.time_remaining, true)
        };

        let correct_classification = request
            .selected_classification
            .clone()
            .or_else(|| current.map(|e| e.technique.to_string()))
            .unwrap_or_default();
        let correct_mitigation = request
            .selected_mitigation
            .clone()
            .or_else(|| current.map(|e| e.mitigation.to_string()))
            .unwrap_or_default();

        let mut explanation =
            String::from("Graded locally while the classification service is unavailable.");
        if let Some(entry) = current {
            explanation.push(' ');
            explanation.push_str(entry.explanation);
        }

        Ok(GradeResult {
            correct: true,
            points,
            correct_classification,
            correct_mitigation,
            explanation,
            classification_correct: None,
            mitigation_correct: None,
        })
    }
}
