//! Round controller.
//!
//! Drives one question/answer cycle at a time through the
//! `welcome -> playing -> feedback -> playing -> ...` state machine. The
//! controller picks the tier from the cumulative statistics, fetches a
//! challenge from the active classification service, counts down the time
//! budget (one [`RoundController::tick`] per second), grades the answer, and
//! folds the result back into the statistics.
//!
//! The session starts online. The first failed fetch switches it to degraded
//! mode for good: from then on challenges come from the built-in table and
//! grading is stubbed locally.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::engine;
use crate::error::{ControllerError, ServiceError};
use crate::fallback::LocalService;
use crate::model::{Challenge, FetchRequest, GradeRequest, GradeResult, Tier, UNKNOWN_ANSWER};
use crate::statistics::{Achievement, Attempt, PerformanceStats};
use crate::traits::ClassificationService;

/// Default bound on every service call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Shown when the online grading call fails.
pub const GRADING_FAILED_EXPLANATION: &str = "Could not grade this answer. Please try again.";

/// Where the controller is in the round lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Welcome,
    Playing,
    Feedback,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Welcome => "welcome",
            Phase::Playing => "playing",
            Phase::Feedback => "feedback",
        })
    }
}

/// Which classification service backs the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    Online,
    Degraded,
}

/// Configuration for the round controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Bound on each fetch/grade call.
    pub request_timeout: Duration,
    /// Skip the remote service entirely.
    pub start_degraded: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            start_degraded: false,
        }
    }
}

/// State of the round in progress. Discarded when the next round starts.
#[derive(Debug, Clone)]
pub struct RoundState {
    /// 1-based round counter.
    pub number: u64,
    pub challenge: Challenge,
    pub tier: Tier,
    /// Seconds the round started with.
    pub budget_secs: u32,
    pub remaining_secs: u32,
    pub selected_classification: Option<String>,
    pub selected_mitigation: Option<String>,
    /// The challenge came from the local table.
    pub degraded: bool,
}

/// Everything shown after a round is graded.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub round: u64,
    pub tier: Tier,
    pub correct: bool,
    pub time_expired: bool,
    pub points: u32,
    pub selected_classification: Option<String>,
    pub correct_classification: String,
    pub selected_mitigation: Option<String>,
    pub correct_mitigation: String,
    pub explanation: String,
    /// Graded by the local stub.
    pub graded_locally: bool,
    /// The online grading call failed.
    pub grading_failed: bool,
    /// Achievements unlocked by this round.
    pub achievements: Vec<Achievement>,
}

/// Result of a countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No round is being played; the tick was ignored.
    Idle,
    /// Seconds left in the round.
    Running(u32),
    /// The clock hit zero and the round was submitted.
    Expired,
}

/// A fresh session identifier, attached to every outbound request.
pub fn new_session_id() -> String {
    format!("user_{}", Uuid::new_v4().simple())
}

/// The round lifecycle state machine.
pub struct RoundController {
    remote: Arc<dyn ClassificationService>,
    local: Arc<LocalService>,
    session_id: String,
    config: ControllerConfig,
    mode: ServiceMode,
    phase: Phase,
    stats: PerformanceStats,
    round: Option<RoundState>,
    feedback: Option<Feedback>,
    rounds_started: u64,
}

impl RoundController {
    pub fn new(
        remote: Arc<dyn ClassificationService>,
        local: Arc<LocalService>,
        config: ControllerConfig,
    ) -> Self {
        let mode = if config.start_degraded {
            ServiceMode::Degraded
        } else {
            ServiceMode::Online
        };
        Self {
            remote,
            local,
            session_id: new_session_id(),
            config,
            mode,
            phase: Phase::Welcome,
            stats: PerformanceStats::new(),
            round: None,
            feedback: None,
            rounds_started: 0,
        }
    }

    /// Replace the generated session identifier.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> ServiceMode {
        self.mode
    }

    pub fn is_degraded(&self) -> bool {
        self.mode == ServiceMode::Degraded
    }

    pub fn stats(&self) -> &PerformanceStats {
        &self.stats
    }

    /// The current round, while playing.
    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref().filter(|_| self.phase == Phase::Playing)
    }

    /// Feedback for the last graded round, while in the feedback phase.
    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref().filter(|_| self.phase == Phase::Feedback)
    }

    fn service(&self) -> Arc<dyn ClassificationService> {
        match self.mode {
            ServiceMode::Online => Arc::clone(&self.remote),
            ServiceMode::Degraded => self.local.clone(),
        }
    }

    async fn bounded<T, F>(&self, call: F) -> anyhow::Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.config.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                let millis = self.config.request_timeout.as_millis() as u64;
                Err(ServiceError::Timeout(millis).into())
            }
        }
    }

    /// Start a new round from `welcome` or `feedback`.
    ///
    /// Never fails because of the service: a failed fetch degrades the
    /// session and the round is served from the local table instead.
    pub async fn start_round(&mut self) -> Result<&RoundState, ControllerError> {
        if self.phase == Phase::Playing {
            return Err(ControllerError::InvalidTransition {
                action: "start a round",
                phase: self.phase,
            });
        }

        let tier = self.stats.next_tier();
        let request = FetchRequest {
            difficulty: tier,
            session_id: self.session_id.clone(),
            stats: self.stats.snapshot(),
        };

        let service = self.service();
        let challenge = match self.bounded(service.fetch_challenge(&request)).await {
            Ok(challenge) => challenge,
            Err(e) => {
                if self.mode == ServiceMode::Online {
                    tracing::warn!(
                        service = service.name(),
                        "challenge fetch failed, switching to offline mode: {e:#}"
                    );
                    self.mode = ServiceMode::Degraded;
                } else {
                    tracing::warn!("local challenge fetch failed: {e:#}");
                }
                self.local.draw(tier)
            }
        };

        let budget_secs = if challenge.time_budget == 0 {
            engine::time_budget(tier)
        } else {
            challenge.time_budget
        };

        self.rounds_started += 1;
        tracing::info!(
            round = self.rounds_started,
            %tier,
            log_id = challenge.log.id,
            degraded = self.is_degraded(),
            "round started"
        );

        self.feedback = None;
        self.phase = Phase::Playing;
        Ok(self.round.insert(RoundState {
            number: self.rounds_started,
            challenge,
            tier,
            budget_secs,
            remaining_secs: budget_secs,
            selected_classification: None,
            selected_mitigation: None,
            degraded: self.mode == ServiceMode::Degraded,
        }))
    }

    fn playing_round(&mut self, action: &'static str) -> Result<&mut RoundState, ControllerError> {
        let phase = self.phase;
        match self.round.as_mut() {
            Some(round) if phase == Phase::Playing => Ok(round),
            _ => Err(ControllerError::InvalidTransition { action, phase }),
        }
    }

    /// Choose the technique for the current round.
    pub fn select_classification(&mut self, id: &str) -> Result<(), ControllerError> {
        let round = self.playing_round("select a technique")?;
        if !round.challenge.has_classification(id) {
            return Err(ControllerError::UnknownClassification(id.to_string()));
        }
        round.selected_classification = Some(id.to_string());
        Ok(())
    }

    /// Choose the mitigation for the current round.
    pub fn select_mitigation(&mut self, id: &str) -> Result<(), ControllerError> {
        let round = self.playing_round("select a mitigation")?;
        if !round.challenge.has_mitigation(id) {
            return Err(ControllerError::UnknownMitigation(id.to_string()));
        }
        round.selected_mitigation = Some(id.to_string());
        Ok(())
    }

    /// Explicit submission. Both selections must be made.
    pub async fn submit(&mut self) -> Result<&Feedback, ControllerError> {
        let round = self.playing_round("submit")?;
        if round.selected_classification.is_none() || round.selected_mitigation.is_none() {
            return Err(ControllerError::IncompleteSelection);
        }
        let round = round.clone();
        Ok(self.grade_round(round, false).await)
    }

    /// One second of the countdown. Submits automatically when it hits zero.
    pub async fn tick(&mut self) -> TickOutcome {
        let Ok(round) = self.playing_round("tick") else {
            return TickOutcome::Idle;
        };
        round.remaining_secs = round.remaining_secs.saturating_sub(1);
        if round.remaining_secs > 0 {
            return TickOutcome::Running(round.remaining_secs);
        }

        tracing::info!(round = round.number, "time expired, submitting");
        let round = round.clone();
        self.grade_round(round, true).await;
        TickOutcome::Expired
    }

    async fn grade_round(&mut self, round: RoundState, time_expired: bool) -> &Feedback {
        let remaining = if time_expired { 0 } else { round.remaining_secs };
        let request = GradeRequest {
            session_id: self.session_id.clone(),
            selected_classification: round.selected_classification.clone(),
            selected_mitigation: round.selected_mitigation.clone(),
            time_remaining: remaining,
            difficulty: round.tier,
            time_expired,
        };

        let service: Arc<dyn ClassificationService> = if round.degraded {
            self.local.clone()
        } else {
            Arc::clone(&self.remote)
        };

        let (result, grading_failed) = match self.bounded(service.grade(&request)).await {
            Ok(result) if round.degraded => (result, false),
            Ok(result) => (clamp_remote_points(result, round.tier, round.budget_secs), false),
            Err(e) => {
                tracing::warn!(service = service.name(), "grading failed: {e:#}");
                (grading_failure(), true)
            }
        };

        let elapsed_secs = round.budget_secs.saturating_sub(remaining);
        let achievements = self.stats.record(Attempt {
            correct: result.correct,
            points: result.points,
            elapsed_secs,
        });

        tracing::info!(
            round = round.number,
            correct = result.correct,
            points = result.points,
            score = self.stats.score,
            "round graded"
        );

        self.phase = Phase::Feedback;
        self.feedback.insert(Feedback {
            round: round.number,
            tier: round.tier,
            correct: result.correct,
            time_expired,
            points: result.points,
            selected_classification: round.selected_classification,
            correct_classification: result.correct_classification,
            selected_mitigation: round.selected_mitigation,
            correct_mitigation: result.correct_mitigation,
            explanation: result.explanation,
            graded_locally: round.degraded,
            grading_failed,
            achievements,
        })
    }
}

/// Keep service-supplied points within what the engine could award for a
/// correct answer with the round's whole budget left.
fn clamp_remote_points(mut result: GradeResult, tier: Tier, budget_secs: u32) -> GradeResult {
    let max = engine::awarded_points(tier, budget_secs, true);
    let clamped = if result.correct {
        result.points.min(max)
    } else {
        0
    };
    if clamped != result.points {
        tracing::debug!(reported = result.points, clamped, %tier, "clamped service points");
        result.points = clamped;
    }
    result
}

fn grading_failure() -> GradeResult {
    GradeResult {
        correct: false,
        points: 0,
        correct_classification: UNKNOWN_ANSWER.to_string(),
        correct_mitigation: UNKNOWN_ANSWER.to_string(),
        explanation: GRADING_FAILED_EXPLANATION.to_string(),
        classification_correct: None,
        mitigation_correct: None,
    }
}
