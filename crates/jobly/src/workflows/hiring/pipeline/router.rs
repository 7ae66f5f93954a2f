use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{ApplicantId, JobFilter, StageId, TenantContext};
use super::repository::PipelineRepository;
use super::service::PipelineService;
use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BoardQuery {
    #[serde(default)]
    pub(crate) user_id: Option<String>,
    #[serde(default)]
    pub(crate) job: Option<String>,
}

/// Body of a stage change request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    pub status: StageId,
}

/// Acknowledgement returned after a stage change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateView {
    pub applicant_id: ApplicantId,
    pub status: StageId,
    pub updated_at: DateTime<Utc>,
}

/// Router builder exposing the board fetch and the stage change endpoint.
pub fn pipeline_router<R>(service: Arc<PipelineService<R>>) -> Router
where
    R: PipelineRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/tenants/:tenant_id/pipeline",
            get(board_handler::<R>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/pipeline/applicants/:applicant_id/status",
            put(status_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn board_handler<R>(
    State(service): State<Arc<PipelineService<R>>>,
    Path(tenant_id): Path<String>,
    Query(query): Query<BoardQuery>,
) -> Response
where
    R: PipelineRepository + 'static,
{
    let ctx = match TenantContext::new(tenant_id, query.user_id.unwrap_or_default()) {
        Ok(ctx) => ctx,
        Err(error) => return AppError::from(error).into_response(),
    };
    let filter = JobFilter::from_query(query.job.as_deref());

    match service.board(&ctx, &filter) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => AppError::from(error).into_response(),
    }
}

pub(crate) async fn status_handler<R>(
    State(service): State<Arc<PipelineService<R>>>,
    Path((tenant_id, applicant_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<StatusUpdateRequest>,
) -> Response
where
    R: PipelineRepository + 'static,
{
    let ctx = match TenantContext::new(tenant_id, request.user_id.unwrap_or_default()) {
        Ok(ctx) => ctx,
        Err(error) => return AppError::from(error).into_response(),
    };
    let applicant_id = ApplicantId(applicant_id);

    match service.update_status(&ctx, &applicant_id, &request.status) {
        Ok(card) => {
            let view = StatusUpdateView {
                applicant_id: card.id,
                status: card.status,
                updated_at: card.updated_at,
            };
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => {
            let payload = json!({
                "applicant_id": applicant_id.0,
                "error": error.to_string(),
            });
            (error.status_code(), axum::Json(payload)).into_response()
        }
    }
}
