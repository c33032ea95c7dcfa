//! Credit application scoring: deterministic lending policy in front of
//! machine-learned approval, amount, and risk models.

pub mod config;
pub mod error;
pub mod scoring;
pub mod telemetry;
