//! HTTP client for the remote classification service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use loganalyst_core::engine;
use loganalyst_core::model::{
    Challenge, ClassificationOption, FetchRequest, GradeRequest, GradeResult, LogArtifact,
};
use loganalyst_core::traits::ClassificationService;
use loganalyst_core::ServiceError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// The classification service reached over HTTP.
pub struct RemoteService {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl RemoteService {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base = if base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;

        Ok(Self {
            base_url: base.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_timeout() {
            ServiceError::Timeout(self.timeout.as_millis() as u64)
        } else if e.is_connect() {
            ServiceError::NetworkError(format!(
                "classification service not reachable at {}",
                self.base_url
            ))
        } else {
            ServiceError::NetworkError(e.to_string())
        }
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::ApiError {
                status,
                message: body,
            });
        }
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&body).map_err(|e| ServiceError::MalformedResponse(e.to_string()))
    }

    /// `GET /health`.
    #[instrument(skip(self))]
    pub async fn health(&self) -> anyhow::Result<HealthStatus> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Ok(self.read_json(response).await?)
    }

    /// `GET /leaderboard`.
    #[instrument(skip(self))]
    pub async fn leaderboard(&self) -> anyhow::Result<Vec<LeaderboardEntry>> {
        let response = self
            .client
            .get(format!("{}/leaderboard", self.base_url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let body: LeaderboardResponse = self.read_json(response).await?;
        Ok(body.leaderboard)
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// One row of the leaderboard.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub name: String,
    pub score: u32,
    pub accuracy: u32,
}

#[derive(Deserialize)]
struct LeaderboardResponse {
    leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Deserialize)]
struct ChallengeResponse {
    #[serde(default)]
    log: Option<LogArtifact>,
    #[serde(default)]
    mitre_options: Vec<ClassificationOption>,
    #[serde(default)]
    mitigation_options: Vec<String>,
    #[serde(default)]
    time_limit: Option<u32>,
}

#[async_trait]
impl ClassificationService for RemoteService {
    fn name(&self) -> &str {
        "remote"
    }

    #[instrument(skip(self, request), fields(difficulty = %request.difficulty))]
    async fn fetch_challenge(&self, request: &FetchRequest) -> anyhow::Result<Challenge> {
        let response = self
            .client
            .post(format!("{}/get-log", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let body: ChallengeResponse = self.read_json(response).await?;
        let Some(log) = body.log else {
            return Err(ServiceError::MalformedResponse("missing 'log'".into()).into());
        };
        if body.mitre_options.is_empty() {
            return Err(ServiceError::MalformedResponse("no technique options".into()).into());
        }
        if body.mitigation_options.is_empty() {
            return Err(ServiceError::MalformedResponse("no mitigation options".into()).into());
        }

        let time_budget = match body.time_limit {
            Some(secs) if secs > 0 => secs,
            _ => engine::time_budget(request.difficulty),
        };
        tracing::debug!(log_id = log.id, time_budget, "challenge received");

        Ok(Challenge {
            log,
            classification_options: body.mitre_options,
            mitigation_options: body.mitigation_options,
            time_budget,
        })
    }

    #[instrument(skip(self, request), fields(difficulty = %request.difficulty))]
    async fn grade(&self, request: &GradeRequest) -> anyhow::Result<GradeResult> {
        let response = self
            .client
            .post(format!("{}/validate", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let result: GradeResult = self.read_json(response).await?;
        tracing::debug!(correct = result.correct, points = result.points, "answer graded");
        Ok(result)
    }
}
