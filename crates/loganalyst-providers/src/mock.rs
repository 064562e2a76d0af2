//! Mock classification service for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use loganalyst_core::engine;
use loganalyst_core::fallback;
use loganalyst_core::model::{
    Challenge, ClassificationOption, FetchRequest, GradeRequest, GradeResult,
};
use loganalyst_core::traits::ClassificationService;
use loganalyst_core::ServiceError;

/// A scripted classification service.
///
/// Serves the built-in challenge for the requested tier and grades answers
/// against a fixed expected technique/mitigation pair. Fetching and grading
/// can each be made to fail or stall.
pub struct MockService {
    expected_classification: String,
    expected_mitigation: String,
    points: u32,
    fail_fetch: bool,
    fail_grade: bool,
    delay: Option<Duration>,
    fetch_count: AtomicU32,
    grade_count: AtomicU32,
    last_grade: Mutex<Option<GradeRequest>>,
}

impl MockService {
    pub fn new(expected_classification: &str, expected_mitigation: &str, points: u32) -> Self {
        Self {
            expected_classification: expected_classification.to_string(),
            expected_mitigation: expected_mitigation.to_string(),
            points,
            fail_fetch: false,
            fail_grade: false,
            delay: None,
            fetch_count: AtomicU32::new(0),
            grade_count: AtomicU32::new(0),
            last_grade: Mutex::new(None),
        }
    }

    /// Every fetch fails with a network error.
    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    /// Every grade fails with an API error.
    pub fn failing_grade(mut self) -> Self {
        self.fail_grade = true;
        self
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    pub fn grade_count(&self) -> u32 {
        self.grade_count.load(Ordering::Relaxed)
    }

    pub fn last_grade(&self) -> Option<GradeRequest> {
        self.last_grade
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn stall(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ClassificationService for MockService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_challenge(&self, request: &FetchRequest) -> anyhow::Result<Challenge> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        self.stall().await;
        if self.fail_fetch {
            return Err(ServiceError::NetworkError("mock fetch failure".into()).into());
        }

        let tier = request.difficulty;
        let mut challenge = Challenge {
            log: fallback::logs_for(tier)[0].artifact(),
            classification_options: fallback::techniques_for(tier),
            mitigation_options: fallback::mitigations_for(tier),
            time_budget: engine::time_budget(tier),
        };
        if !challenge.has_classification(&self.expected_classification) {
            challenge
                .classification_options
                .push(ClassificationOption {
                    id: self.expected_classification.clone(),
                    name: "Expected".into(),
                    tactic: "Test".into(),
                });
        }
        if !challenge.has_mitigation(&self.expected_mitigation) {
            challenge
                .mitigation_options
                .push(self.expected_mitigation.clone());
        }
        Ok(challenge)
    }

    async fn grade(&self, request: &GradeRequest) -> anyhow::Result<GradeResult> {
        self.grade_count.fetch_add(1, Ordering::Relaxed);
        *self.last_grade.lock().unwrap_or_else(|e| e.into_inner()) = Some(request.clone());
        self.stall().await;
        if self.fail_grade {
            return Err(ServiceError::ApiError {
                status: 503,
                message: "mock grade failure".into(),
            }
            .into());
        }

        let classification_correct =
            request.selected_classification.as_deref() == Some(self.expected_classification.as_str());
        let mitigation_correct =
            request.selected_mitigation.as_deref() == Some(self.expected_mitigation.as_str());
        let correct = classification_correct && mitigation_correct && !request.time_expired;

        Ok(GradeResult {
            correct,
            points: if correct { self.points } else { 0 },
            correct_classification: self.expected_classification.clone(),
            correct_mitigation: self.expected_mitigation.clone(),
            explanation: "mock explanation".into(),
            classification_correct: Some(classification_correct),
            mitigation_correct: Some(mitigation_correct),
        })
    }
}
