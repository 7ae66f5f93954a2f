use super::domain::{ApplicantCard, ApplicantId, JobFilter, JobReference, Stage, TenantId};

/// Storage abstraction over application records, scoped by tenant on every call.
pub trait PipelineRepository: Send + Sync {
    /// Configured funnel for the tenant. Empty means "use the standard catalog".
    fn stages(&self, tenant: &TenantId) -> Result<Vec<Stage>, RepositoryError>;
    fn jobs(&self, tenant: &TenantId) -> Result<Vec<JobReference>, RepositoryError>;
    fn applicants(
        &self,
        tenant: &TenantId,
        filter: &JobFilter,
    ) -> Result<Vec<ApplicantCard>, RepositoryError>;
    fn fetch(
        &self,
        tenant: &TenantId,
        id: &ApplicantId,
    ) -> Result<Option<ApplicantCard>, RepositoryError>;
    fn update(&self, tenant: &TenantId, card: ApplicantCard) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
