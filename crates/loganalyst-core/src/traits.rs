//! The classification service capability.
//!
//! The round controller talks to exactly one implementation at a time: the
//! remote service while online, and [`crate::fallback::LocalService`] once the
//! session has degraded.

use async_trait::async_trait;

use crate::model::{Challenge, FetchRequest, GradeRequest, GradeResult};

/// Source of challenges and judge of answers.
#[async_trait]
pub trait ClassificationService: Send + Sync {
    /// Human-readable service name (e.g. "remote").
    fn name(&self) -> &str;

    /// Produce a challenge at the requested tier.
    async fn fetch_challenge(&self, request: &FetchRequest) -> anyhow::Result<Challenge>;

    /// Grade the user's selections for the current challenge.
    async fn grade(&self, request: &GradeRequest) -> anyhow::Result<GradeResult>;
}
