use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;

use super::board::PipelineSnapshot;
use super::domain::{ApplicantId, JobFilter, StageId, TenantContext};
use super::gateway::{GatewayError, PipelineGateway};
use super::router::StatusUpdateRequest;

/// JSON client for the routes served by [`super::pipeline_router`].
#[derive(Debug, Clone)]
pub struct HttpPipelineGateway {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpPipelineGateway {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| GatewayError::Transport(format!("invalid base url '{base_url}': {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::Transport(format!(
                "base url '{base_url}' cannot carry a path"
            )));
        }
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Transport("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn check(response: Response) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GatewayError::Unauthorized),
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound),
            _ => {
                let detail = match response.json::<ErrorBody>().await {
                    Ok(body) => body.error,
                    Err(_) => status.to_string(),
                };
                Err(GatewayError::Rejected(detail))
            }
        }
    }
}

fn transport(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Transport(err.to_string())
    }
}

#[async_trait]
impl PipelineGateway for HttpPipelineGateway {
    async fn fetch_pipeline(
        &self,
        ctx: &TenantContext,
        filter: &JobFilter,
    ) -> Result<PipelineSnapshot, GatewayError> {
        let url = self.endpoint(&["api", "v1", "tenants", &ctx.tenant_id().0, "pipeline"])?;
        let mut request = self
            .client
            .get(url)
            .query(&[("user_id", ctx.user_id().0.as_str())]);
        if let Some(job) = filter.as_query() {
            request = request.query(&[("job", job)]);
        }

        let response = Self::check(request.send().await.map_err(transport)?).await?;
        response.json::<PipelineSnapshot>().await.map_err(transport)
    }

    async fn update_status(
        &self,
        ctx: &TenantContext,
        applicant_id: &ApplicantId,
        status: &StageId,
    ) -> Result<(), GatewayError> {
        let url = self.endpoint(&[
            "api",
            "v1",
            "tenants",
            &ctx.tenant_id().0,
            "pipeline",
            "applicants",
            &applicant_id.0,
            "status",
        ])?;
        let body = StatusUpdateRequest {
            user_id: Some(ctx.user_id().0.clone()),
            status: status.clone(),
        };

        let response = self
            .client
            .put(url)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await?;
        Ok(())
    }
}
