//! CRM Core Library
//!
//! Domain models and the pipeline engine for the field-service CRM: stage
//! registry, stage assignment, deal derivation, drag guards and metrics.

pub mod backfill;
pub mod client;
pub mod config;
pub mod deal;
pub mod error;
pub mod history;
pub mod metrics;
pub mod quote;
pub mod request;
pub mod resolver;
pub mod stage;
pub mod store;
pub mod validator;
pub mod verdict;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use verdict::Verdict;
