//! loganalyst-providers: classification service clients.
//!
//! Implements the `ClassificationService` trait over HTTP, plus a scripted
//! mock for tests, and loads the configuration that points at the service.

pub mod config;
pub mod mock;
pub mod remote;

pub use config::{create_service, load_config_from, AnalystConfig, ServiceConfig};
pub use remote::{HealthStatus, LeaderboardEntry, RemoteService};
