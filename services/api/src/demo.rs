use crate::infra::{InMemoryPipelineRepository, DEMO_TENANT, DEMO_USER};
use async_trait::async_trait;
use chrono::Utc;
use clap::Args;
use jobly::config::PipelineConfig;
use jobly::error::AppError;
use jobly::workflows::hiring::pipeline::{
    ApplicantId, GatewayError, JobFilter, MoveOutcome, Pipeline, PipelineGateway,
    PipelineSnapshot, PipelineService, PipelineStageModel, ServiceGateway, Stage, StageId,
    TenantContext,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Stage the server refuses to move applicants into, to show a rollback.
    #[arg(long, default_value = "hired")]
    pub(crate) fail_stage: String,
    /// Restrict the board to one job posting.
    #[arg(long)]
    pub(crate) job: Option<String>,
    /// Free-text filter applied to the final board view.
    #[arg(long)]
    pub(crate) search: Option<String>,
}

/// Scripted moves the demo walks through, in order.
const DEMO_MOVES: [(&str, &str, MoveKind); 4] = [
    ("app-001", "reviewing", MoveKind::Drag),
    ("app-004", "interview", MoveKind::QuickAction),
    ("app-006", "hired", MoveKind::Drag),
    ("app-002", "archived", MoveKind::QuickAction),
];

#[derive(Debug, Clone, Copy)]
enum MoveKind {
    Drag,
    QuickAction,
}

/// In-process gateway that refuses status changes into one stage.
struct RefusingGateway<G> {
    inner: G,
    refused: StageId,
}

#[async_trait]
impl<G> PipelineGateway for RefusingGateway<G>
where
    G: PipelineGateway,
{
    async fn fetch_pipeline(
        &self,
        ctx: &TenantContext,
        filter: &JobFilter,
    ) -> Result<PipelineSnapshot, GatewayError> {
        self.inner.fetch_pipeline(ctx, filter).await
    }

    async fn update_status(
        &self,
        ctx: &TenantContext,
        applicant_id: &ApplicantId,
        status: &StageId,
    ) -> Result<(), GatewayError> {
        if status == &self.refused {
            return Err(GatewayError::Rejected(format!(
                "moves into '{}' are closed for this requisition",
                status
            )));
        }
        self.inner.update_status(ctx, applicant_id, status).await
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        fail_stage,
        job,
        search,
    } = args;

    let repository = Arc::new(InMemoryPipelineRepository::seeded(Utc::now()));
    let service = Arc::new(PipelineService::new(repository));
    let gateway = RefusingGateway {
        inner: ServiceGateway::new(service),
        refused: StageId::new(fail_stage),
    };
    let model = PipelineStageModel::new(Arc::new(gateway), PipelineConfig::default());
    let ctx = TenantContext::new(DEMO_TENANT, DEMO_USER)?;

    println!("Hiring pipeline demo");
    model
        .load(&ctx, JobFilter::from_query(job.as_deref()))
        .await?;

    println!("\nJobs");
    for summary in model.jobs() {
        println!(
            "  {:<28} {} applicant(s)",
            summary.title, summary.applicant_count
        );
    }
    render_board("Loaded board", &model.stages(), &model.pipeline());

    for (applicant, target, kind) in DEMO_MOVES {
        let applicant_id = ApplicantId(applicant.to_string());
        let target = StageId::new(target);
        let outcome = match kind {
            MoveKind::Drag => model.move_applicant(&ctx, &applicant_id, &target).await,
            MoveKind::QuickAction => model.quick_action(&ctx, &applicant_id, &target).await,
        };
        println!(
            "\n{:?} {} -> {}: {}",
            kind,
            applicant_id,
            target,
            describe(&outcome)
        );
    }

    render_board("Board after moves", &model.stages(), &model.pipeline());

    if let Some(query) = search {
        let title = format!("Search results for '{query}'");
        render_board(&title, &model.stages(), &model.view(&query));
    }

    Ok(())
}

fn describe(outcome: &MoveOutcome) -> String {
    match outcome {
        MoveOutcome::Confirmed => "confirmed by the server".to_string(),
        MoveOutcome::RolledBack { reason } => format!("rolled back ({reason})"),
        MoveOutcome::Unchanged => "already in that stage".to_string(),
        MoveOutcome::NotFound => "not on the current board".to_string(),
        MoveOutcome::UnknownStage => "no such stage; nothing changed".to_string(),
        MoveOutcome::InFlight => "previous move still in flight".to_string(),
    }
}

fn render_board(title: &str, stages: &[Stage], pipeline: &Pipeline) {
    println!("\n{title}");
    for stage in stages {
        let cards = pipeline.column(&stage.id).unwrap_or_default();
        println!("  {} [{}] ({})", stage.label, stage.color, cards.len());
        for card in cards {
            println!(
                "    - {:<18} {:<26} {}",
                card.candidate.name,
                card.job.title,
                card.updated_at.format("%Y-%m-%d %H:%M")
            );
        }
    }
}
