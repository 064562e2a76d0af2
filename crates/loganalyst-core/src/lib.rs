//! loganalyst-core: adaptive difficulty engine and round controller.
//!
//! This crate defines the data model, the scoring formulas, the cumulative
//! statistics, the classification service trait with its local fallback, and
//! the round lifecycle that the rest of loganalyst builds on.

pub mod controller;
pub mod countdown;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod model;
pub mod statistics;
pub mod traits;

pub use controller::{
    ControllerConfig, Feedback, Phase, RoundController, RoundState, ServiceMode, TickOutcome,
};
pub use error::{ControllerError, ServiceError};
pub use model::Tier;
