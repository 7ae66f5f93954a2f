//! Jobly core: configuration, telemetry, and the employer-side hiring pipeline board.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
