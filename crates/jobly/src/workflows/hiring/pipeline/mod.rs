//! Hiring pipeline board: stage columns of applicants for one tenant.
//!
//! The client-side [`PipelineStageModel`] owns the board and moves applicants between stages
//! optimistically. It talks to the server through a [`PipelineGateway`]; the server side of that
//! conversation is [`PipelineService`] behind [`pipeline_router`].

pub mod board;
pub mod domain;
pub mod gateway;
pub mod http;
pub mod model;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use board::{Pipeline, PipelineIntegrityError, PipelineSnapshot, Placement, StageColumn};
pub use domain::{
    ApplicantCard, ApplicantId, CandidateSummary, ContextError, JobFilter, JobId, JobReference,
    JobSummary, Stage, StageCatalog, StageId, TenantContext, TenantId, UserId,
};
pub use gateway::{GatewayError, PipelineGateway, ServiceGateway};
pub use http::HttpPipelineGateway;
pub use model::{BeginMove, LoadError, MoveOutcome, PendingMove, PipelineStageModel};
pub use repository::{PipelineRepository, RepositoryError};
pub use router::{pipeline_router, StatusUpdateRequest, StatusUpdateView};
pub use service::{PipelineService, PipelineServiceError};
