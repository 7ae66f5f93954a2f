use std::sync::Arc;

use async_trait::async_trait;

use super::board::PipelineSnapshot;
use super::domain::{ApplicantId, JobFilter, StageId, TenantContext};
use super::repository::{PipelineRepository, RepositoryError};
use super::service::{PipelineService, PipelineServiceError};

/// Server round-trips the board depends on.
#[async_trait]
pub trait PipelineGateway: Send + Sync {
    async fn fetch_pipeline(
        &self,
        ctx: &TenantContext,
        filter: &JobFilter,
    ) -> Result<PipelineSnapshot, GatewayError>;

    async fn update_status(
        &self,
        ctx: &TenantContext,
        applicant_id: &ApplicantId,
        status: &StageId,
    ) -> Result<(), GatewayError>;
}

/// Why a round-trip did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("caller identity was rejected")]
    Unauthorized,
    #[error("resource not found")]
    NotFound,
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("request abandoned before it settled")]
    Cancelled,
}

/// In-process gateway calling the pipeline service directly.
pub struct ServiceGateway<R> {
    service: Arc<PipelineService<R>>,
}

impl<R> ServiceGateway<R>
where
    R: PipelineRepository + 'static,
{
    pub fn new(service: Arc<PipelineService<R>>) -> Self {
        Self { service }
    }
}

impl From<PipelineServiceError> for GatewayError {
    fn from(err: PipelineServiceError) -> Self {
        match err {
            PipelineServiceError::Repository(RepositoryError::NotFound) => Self::NotFound,
            PipelineServiceError::Repository(RepositoryError::Unavailable(reason)) => {
                Self::Transport(reason)
            }
            other @ PipelineServiceError::UnknownStage(_) => Self::Rejected(other.to_string()),
        }
    }
}

#[async_trait]
impl<R> PipelineGateway for ServiceGateway<R>
where
    R: PipelineRepository + 'static,
{
    async fn fetch_pipeline(
        &self,
        ctx: &TenantContext,
        filter: &JobFilter,
    ) -> Result<PipelineSnapshot, GatewayError> {
        Ok(self.service.board(ctx, filter)?)
    }

    async fn update_status(
        &self,
        ctx: &TenantContext,
        applicant_id: &ApplicantId,
        status: &StageId,
    ) -> Result<(), GatewayError> {
        self.service.update_status(ctx, applicant_id, status)?;
        Ok(())
    }
}
