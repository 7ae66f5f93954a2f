use chrono::{DateTime, Duration, Utc};
use jobly::workflows::hiring::pipeline::{
    ApplicantCard, ApplicantId, CandidateSummary, JobFilter, JobId, JobReference,
    PipelineRepository, RepositoryError, Stage, StageId, TenantId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

pub(crate) const DEMO_TENANT: &str = "acme";
pub(crate) const DEMO_USER: &str = "recruiter-1";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
struct TenantRecords {
    stages: Vec<Stage>,
    jobs: Vec<JobReference>,
    applicants: Vec<ApplicantCard>,
}

/// Process-local stand-in for the application database.
#[derive(Default, Clone)]
pub(crate) struct InMemoryPipelineRepository {
    tenants: Arc<Mutex<HashMap<TenantId, TenantRecords>>>,
}

impl InMemoryPipelineRepository {
    /// One tenant with two open roles and a handful of candidates spread over the funnel.
    pub(crate) fn seeded(now: DateTime<Utc>) -> Self {
        let backend = JobReference {
            id: JobId("job-backend".to_string()),
            title: "Senior Backend Engineer".to_string(),
            company: "Acme Robotics".to_string(),
        };
        let design = JobReference {
            id: JobId("job-design".to_string()),
            title: "Product Designer".to_string(),
            company: "Acme Robotics".to_string(),
        };

        let seed = [
            ("app-001", "Priya Raman", "Distributed systems engineer", &backend, "new", 1),
            ("app-002", "Marcus Chen", "Backend developer", &backend, "new", 3),
            ("app-003", "Sofia Alvarez", "UX and interaction designer", &design, "reviewing", 2),
            ("app-004", "Tomás Novak", "Site reliability engineer", &backend, "shortlisted", 6),
            ("app-005", "Amara Okafor", "Design systems lead", &design, "interview", 4),
            ("app-006", "Lena Fischer", "Rust and Go engineer", &backend, "offered", 8),
        ];

        let applicants = seed
            .into_iter()
            .map(|(id, name, headline, job, status, hours_ago)| {
                let updated_at = now - Duration::hours(hours_ago);
                ApplicantCard {
                    id: ApplicantId(id.to_string()),
                    candidate: CandidateSummary {
                        name: name.to_string(),
                        email: format!(
                            "{}@candidates.example",
                            name.to_lowercase().replace(' ', ".")
                        ),
                        avatar: None,
                        headline: Some(headline.to_string()),
                        skills: Vec::new(),
                    },
                    job: job.clone(),
                    status: StageId::new(status),
                    applied_at: updated_at - Duration::days(3),
                    updated_at,
                }
            })
            .collect();

        let repository = Self::default();
        repository
            .tenants
            .lock()
            .expect("repository mutex poisoned")
            .insert(
                TenantId(DEMO_TENANT.to_string()),
                TenantRecords {
                    stages: Vec::new(),
                    jobs: vec![backend, design],
                    applicants,
                },
            );
        repository
    }
}

impl PipelineRepository for InMemoryPipelineRepository {
    fn stages(&self, tenant: &TenantId) -> Result<Vec<Stage>, RepositoryError> {
        let guard = self.tenants.lock().expect("repository mutex poisoned");
        Ok(guard
            .get(tenant)
            .map(|records| records.stages.clone())
            .unwrap_or_default())
    }

    fn jobs(&self, tenant: &TenantId) -> Result<Vec<JobReference>, RepositoryError> {
        let guard = self.tenants.lock().expect("repository mutex poisoned");
        Ok(guard
            .get(tenant)
            .map(|records| records.jobs.clone())
            .unwrap_or_default())
    }

    fn applicants(
        &self,
        tenant: &TenantId,
        filter: &JobFilter,
    ) -> Result<Vec<ApplicantCard>, RepositoryError> {
        let guard = self.tenants.lock().expect("repository mutex poisoned");
        Ok(guard
            .get(tenant)
            .map(|records| {
                records
                    .applicants
                    .iter()
                    .filter(|card| filter.admits(&card.job.id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn fetch(
        &self,
        tenant: &TenantId,
        id: &ApplicantId,
    ) -> Result<Option<ApplicantCard>, RepositoryError> {
        let guard = self.tenants.lock().expect("repository mutex poisoned");
        Ok(guard.get(tenant).and_then(|records| {
            records
                .applicants
                .iter()
                .find(|card| &card.id == id)
                .cloned()
        }))
    }

    fn update(&self, tenant: &TenantId, card: ApplicantCard) -> Result<(), RepositoryError> {
        let mut guard = self.tenants.lock().expect("repository mutex poisoned");
        let slot = guard
            .get_mut(tenant)
            .and_then(|records| {
                records
                    .applicants
                    .iter_mut()
                    .find(|existing| existing.id == card.id)
            })
            .ok_or(RepositoryError::NotFound)?;
        *slot = card;
        Ok(())
    }
}
