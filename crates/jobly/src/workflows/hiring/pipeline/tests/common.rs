use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::{oneshot, Notify};

use crate::config::PipelineConfig;
use crate::workflows::hiring::pipeline::board::{Pipeline, PipelineSnapshot};
use crate::workflows::hiring::pipeline::domain::{
    ApplicantCard, ApplicantId, CandidateSummary, JobFilter, JobId, JobReference, Stage,
    StageCatalog, StageId, TenantContext, TenantId,
};
use crate::workflows::hiring::pipeline::gateway::{GatewayError, PipelineGateway};
use crate::workflows::hiring::pipeline::model::PipelineStageModel;
use crate::workflows::hiring::pipeline::repository::{PipelineRepository, RepositoryError};

pub(super) fn stage(id: &str) -> StageId {
    StageId::new(id)
}

pub(super) fn applicant(id: &str) -> ApplicantId {
    ApplicantId(id.to_string())
}

pub(super) fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, day, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn ctx() -> TenantContext {
    TenantContext::new("acme", "recruiter-1").expect("valid context")
}

pub(super) fn backend_job() -> JobReference {
    JobReference {
        id: JobId("job-backend".to_string()),
        title: "Backend Engineer".to_string(),
        company: "Acme".to_string(),
    }
}

pub(super) fn design_job() -> JobReference {
    JobReference {
        id: JobId("job-design".to_string()),
        title: "Product Designer".to_string(),
        company: "Acme".to_string(),
    }
}

pub(super) fn card(id: &str, name: &str, status: &str, job: JobReference, day: u32) -> ApplicantCard {
    ApplicantCard {
        id: applicant(id),
        candidate: CandidateSummary {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            avatar: None,
            headline: Some("Engineer".to_string()),
            skills: vec!["rust".to_string()],
        },
        job,
        status: stage(status),
        applied_at: at(1),
        updated_at: at(day),
    }
}

pub(super) fn two_stages() -> Vec<Stage> {
    vec![
        Stage::new("new", "New", "blue"),
        Stage::new("interview", "Interview", "indigo"),
    ]
}

/// `{new: [A(id=1)], interview: []}`
pub(super) fn single_applicant_snapshot() -> PipelineSnapshot {
    PipelineSnapshot {
        pipeline: Pipeline::from_columns(vec![
            (
                stage("new"),
                vec![card("1", "Ada Lovelace", "new", backend_job(), 2)],
            ),
            (stage("interview"), Vec::new()),
        ]),
        stages: two_stages(),
        jobs: Vec::new(),
    }
}

pub(super) fn standard_snapshot() -> PipelineSnapshot {
    let stages = StageCatalog::standard();
    let pipeline = Pipeline::from_columns(stages.iter().map(|stage| {
        let cards = match stage.id.as_str() {
            "new" => vec![
                card("a1", "Ada Lovelace", "new", backend_job(), 5),
                card("a2", "Grace Hopper", "new", design_job(), 4),
            ],
            "reviewing" => vec![card("a3", "Alan Turing", "reviewing", backend_job(), 3)],
            "interview" => vec![
                card("a4", "Barbara Liskov", "interview", backend_job(), 6),
                card("a5", "Edsger Dijkstra", "interview", design_job(), 2),
            ],
            _ => Vec::new(),
        };
        (stage.id.clone(), cards)
    }));

    PipelineSnapshot {
        pipeline,
        stages,
        jobs: Vec::new(),
    }
}

pub(super) fn fast_config() -> PipelineConfig {
    PipelineConfig {
        request_timeout: Duration::from_millis(50),
    }
}

pub(super) async fn loaded_model<G>(gateway: Arc<G>) -> PipelineStageModel<G>
where
    G: PipelineGateway + 'static,
{
    let model = PipelineStageModel::new(gateway, fast_config());
    model
        .load(&ctx(), JobFilter::All)
        .await
        .expect("initial load succeeds");
    model
}

pub(super) fn assert_single_residency(pipeline: &Pipeline) {
    pipeline.validate().expect("every applicant sits in exactly one stage");
}

/// Gateway answering from canned results and recording every call.
pub(super) struct ScriptedGateway {
    snapshot: Mutex<Result<PipelineSnapshot, GatewayError>>,
    updates: Mutex<VecDeque<Result<(), GatewayError>>>,
    calls: Mutex<Vec<(ApplicantId, StageId)>>,
}

impl ScriptedGateway {
    pub(super) fn new(snapshot: PipelineSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Ok(snapshot)),
            updates: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn set_snapshot(&self, snapshot: Result<PipelineSnapshot, GatewayError>) {
        *self.snapshot.lock().expect("snapshot mutex poisoned") = snapshot;
    }

    pub(super) fn push_update(&self, result: Result<(), GatewayError>) {
        self.updates
            .lock()
            .expect("update mutex poisoned")
            .push_back(result);
    }

    pub(super) fn calls(&self) -> Vec<(ApplicantId, StageId)> {
        self.calls.lock().expect("call mutex poisoned").clone()
    }
}

#[async_trait]
impl PipelineGateway for ScriptedGateway {
    async fn fetch_pipeline(
        &self,
        _ctx: &TenantContext,
        _filter: &JobFilter,
    ) -> Result<PipelineSnapshot, GatewayError> {
        self.snapshot.lock().expect("snapshot mutex poisoned").clone()
    }

    async fn update_status(
        &self,
        _ctx: &TenantContext,
        applicant_id: &ApplicantId,
        status: &StageId,
    ) -> Result<(), GatewayError> {
        self.calls
            .lock()
            .expect("call mutex poisoned")
            .push((applicant_id.clone(), status.clone()));
        self.updates
            .lock()
            .expect("update mutex poisoned")
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

/// Gateway whose stage updates block until the test releases them.
pub(super) struct GatedGateway {
    snapshot: PipelineSnapshot,
    pub(super) entered: Notify,
    gates: Mutex<VecDeque<oneshot::Receiver<Result<(), GatewayError>>>>,
}

impl GatedGateway {
    pub(super) fn new(snapshot: PipelineSnapshot) -> Self {
        Self {
            snapshot,
            entered: Notify::new(),
            gates: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a gate for the next update; send on the returned sender to settle it.
    pub(super) fn gate(&self) -> oneshot::Sender<Result<(), GatewayError>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().expect("gate mutex poisoned").push_back(rx);
        tx
    }
}

#[async_trait]
impl PipelineGateway for GatedGateway {
    async fn fetch_pipeline(
        &self,
        _ctx: &TenantContext,
        _filter: &JobFilter,
    ) -> Result<PipelineSnapshot, GatewayError> {
        Ok(self.snapshot.clone())
    }

    async fn update_status(
        &self,
        _ctx: &TenantContext,
        _applicant_id: &ApplicantId,
        _status: &StageId,
    ) -> Result<(), GatewayError> {
        let gate = self.gates.lock().expect("gate mutex poisoned").pop_front();
        self.entered.notify_one();
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(GatewayError::Transport("gate dropped".to_string()))),
            None => Ok(()),
        }
    }
}

/// Gateway whose board fetches block until the test hands over a snapshot.
#[derive(Default)]
pub(super) struct GatedFetchGateway {
    pub(super) entered: Notify,
    fetches: Mutex<VecDeque<oneshot::Receiver<Result<PipelineSnapshot, GatewayError>>>>,
}

impl GatedFetchGateway {
    /// Queue a gate for the next fetch; send on the returned sender to answer it.
    pub(super) fn gate(&self) -> oneshot::Sender<Result<PipelineSnapshot, GatewayError>> {
        let (tx, rx) = oneshot::channel();
        self.fetches
            .lock()
            .expect("fetch mutex poisoned")
            .push_back(rx);
        tx
    }
}

#[async_trait]
impl PipelineGateway for GatedFetchGateway {
    async fn fetch_pipeline(
        &self,
        _ctx: &TenantContext,
        _filter: &JobFilter,
    ) -> Result<PipelineSnapshot, GatewayError> {
        let gate = self.fetches.lock().expect("fetch mutex poisoned").pop_front();
        self.entered.notify_one();
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(GatewayError::Transport("gate dropped".to_string()))),
            None => Err(GatewayError::NotFound),
        }
    }

    async fn update_status(
        &self,
        _ctx: &TenantContext,
        _applicant_id: &ApplicantId,
        _status: &StageId,
    ) -> Result<(), GatewayError> {
        Ok(())
    }
}

/// Gateway whose stage updates never resolve.
pub(super) struct StalledGateway {
    pub(super) snapshot: PipelineSnapshot,
}

#[async_trait]
impl PipelineGateway for StalledGateway {
    async fn fetch_pipeline(
        &self,
        _ctx: &TenantContext,
        _filter: &JobFilter,
    ) -> Result<PipelineSnapshot, GatewayError> {
        Ok(self.snapshot.clone())
    }

    async fn update_status(
        &self,
        _ctx: &TenantContext,
        _applicant_id: &ApplicantId,
        _status: &StageId,
    ) -> Result<(), GatewayError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    stages: Arc<Mutex<HashMap<TenantId, Vec<Stage>>>>,
    jobs: Arc<Mutex<HashMap<TenantId, Vec<JobReference>>>>,
    records: Arc<Mutex<HashMap<TenantId, Vec<ApplicantCard>>>>,
}

impl MemoryRepository {
    pub(super) fn seeded() -> Self {
        let repository = Self::default();
        let acme = TenantId("acme".to_string());
        repository
            .jobs
            .lock()
            .expect("job mutex poisoned")
            .insert(acme.clone(), vec![backend_job(), design_job()]);
        repository.records.lock().expect("record mutex poisoned").insert(
            acme,
            vec![
                card("a1", "Ada Lovelace", "new", backend_job(), 3),
                card("a2", "Grace Hopper", "new", design_job(), 5),
                card("a3", "Alan Turing", "interview", backend_job(), 4),
                card("a9", "Ghost Stage", "archived", backend_job(), 6),
            ],
        );
        repository.records.lock().expect("record mutex poisoned").insert(
            TenantId("globex".to_string()),
            vec![card("g1", "Hank Scorpio", "new", design_job(), 2)],
        );
        repository
    }

    pub(super) fn with_stages(self, tenant: &str, stages: Vec<Stage>) -> Self {
        self.stages
            .lock()
            .expect("stage mutex poisoned")
            .insert(TenantId(tenant.to_string()), stages);
        self
    }

    pub(super) fn record(&self, tenant: &str, id: &str) -> Option<ApplicantCard> {
        self.records
            .lock()
            .expect("record mutex poisoned")
            .get(&TenantId(tenant.to_string()))
            .and_then(|cards| cards.iter().find(|card| card.id.0 == id).cloned())
    }
}

impl PipelineRepository for MemoryRepository {
    fn stages(&self, tenant: &TenantId) -> Result<Vec<Stage>, RepositoryError> {
        let guard = self.stages.lock().expect("stage mutex poisoned");
        Ok(guard.get(tenant).cloned().unwrap_or_default())
    }

    fn jobs(&self, tenant: &TenantId) -> Result<Vec<JobReference>, RepositoryError> {
        let guard = self.jobs.lock().expect("job mutex poisoned");
        Ok(guard.get(tenant).cloned().unwrap_or_default())
    }

    fn applicants(
        &self,
        tenant: &TenantId,
        filter: &JobFilter,
    ) -> Result<Vec<ApplicantCard>, RepositoryError> {
        let guard = self.records.lock().expect("record mutex poisoned");
        Ok(guard
            .get(tenant)
            .map(|cards| {
                cards
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
        let guard = self.records.lock().expect("record mutex poisoned");
        Ok(guard
            .get(tenant)
            .and_then(|cards| cards.iter().find(|card| &card.id == id).cloned()))
    }

    fn update(&self, tenant: &TenantId, card: ApplicantCard) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("record mutex poisoned");
        let slot = guard
            .get_mut(tenant)
            .and_then(|cards| cards.iter_mut().find(|existing| existing.id == card.id))
            .ok_or(RepositoryError::NotFound)?;
        *slot = card;
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl PipelineRepository for UnavailableRepository {
    fn stages(&self, _tenant: &TenantId) -> Result<Vec<Stage>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn jobs(&self, _tenant: &TenantId) -> Result<Vec<JobReference>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn applicants(
        &self,
        _tenant: &TenantId,
        _filter: &JobFilter,
    ) -> Result<Vec<ApplicantCard>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(
        &self,
        _tenant: &TenantId,
        _id: &ApplicantId,
    ) -> Result<Option<ApplicantCard>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _tenant: &TenantId, _card: ApplicantCard) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
