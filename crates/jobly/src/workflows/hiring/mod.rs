//! Employer-side hiring workflows.

pub mod pipeline;
