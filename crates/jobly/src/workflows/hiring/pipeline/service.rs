use std::collections::HashMap;
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use tracing::{info, warn};

use super::board::{Pipeline, PipelineSnapshot};
use super::domain::{
    ApplicantCard, ApplicantId, JobFilter, JobId, JobSummary, Stage, StageCatalog, StageId,
    TenantContext,
};
use super::repository::{PipelineRepository, RepositoryError};

/// Server side of the board: builds snapshots and applies stage changes.
pub struct PipelineService<R> {
    repository: Arc<R>,
}

impl<R> PipelineService<R>
where
    R: PipelineRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Build the full board for a tenant, optionally scoped to one job.
    pub fn board(
        &self,
        ctx: &TenantContext,
        filter: &JobFilter,
    ) -> Result<PipelineSnapshot, PipelineServiceError> {
        let tenant = ctx.tenant_id();
        let stages = self.stages_for(ctx)?;

        let mut cards = self.repository.applicants(tenant, filter)?;
        cards.retain(|card| filter.admits(&card.job.id));
        cards.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let mut pipeline = Pipeline::new(&stages);
        for card in cards {
            let stage = card.status.clone();
            if let Err(card) = pipeline.insert_at(&stage, usize::MAX, card) {
                warn!(
                    tenant = %tenant.0,
                    applicant = %card.id,
                    status = %card.status,
                    "applicant status does not match a configured stage; left off the board"
                );
            }
        }

        let jobs = self.job_summaries(ctx)?;

        Ok(PipelineSnapshot {
            pipeline,
            stages,
            jobs,
        })
    }

    fn stages_for(&self, ctx: &TenantContext) -> Result<Vec<Stage>, PipelineServiceError> {
        let stages = self.repository.stages(ctx.tenant_id())?;
        if stages.is_empty() {
            return Ok(StageCatalog::standard());
        }
        Ok(stages)
    }

    fn job_summaries(&self, ctx: &TenantContext) -> Result<Vec<JobSummary>, PipelineServiceError> {
        let tenant = ctx.tenant_id();
        let mut counts: HashMap<JobId, u32> = HashMap::new();
        for card in self.repository.applicants(tenant, &JobFilter::All)? {
            *counts.entry(card.job.id).or_default() += 1;
        }

        Ok(self
            .repository
            .jobs(tenant)?
            .into_iter()
            .map(|job| JobSummary {
                applicant_count: counts.get(&job.id).copied().unwrap_or_default(),
                id: job.id,
                title: job.title,
            })
            .collect())
    }

    /// Move an application record to another stage, stamping `updated_at`.
    pub fn update_status(
        &self,
        ctx: &TenantContext,
        applicant_id: &ApplicantId,
        status: &StageId,
    ) -> Result<ApplicantCard, PipelineServiceError> {
        let tenant = ctx.tenant_id();
        let stages = self.stages_for(ctx)?;
        if !stages.iter().any(|stage| &stage.id == status) {
            return Err(PipelineServiceError::UnknownStage(status.clone()));
        }

        let mut card = self
            .repository
            .fetch(tenant, applicant_id)?
            .ok_or(RepositoryError::NotFound)?;

        let previous = std::mem::replace(&mut card.status, status.clone());
        card.updated_at = Utc::now();
        self.repository.update(tenant, card.clone())?;

        info!(
            tenant = %tenant.0,
            user = %ctx.user_id().0,
            applicant = %applicant_id,
            from = %previous,
            to = %status,
            "applicant stage updated"
        );

        Ok(card)
    }
}

/// Error raised by the pipeline service.
#[derive(Debug, thiserror::Error)]
pub enum PipelineServiceError {
    #[error("unknown pipeline stage '{0}'")]
    UnknownStage(StageId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PipelineServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownStage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Repository(RepositoryError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
