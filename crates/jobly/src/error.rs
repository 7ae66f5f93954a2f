use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::hiring::pipeline::{ContextError, LoadError, PipelineServiceError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Pipeline(PipelineServiceError),
    Board(LoadError),
    Context(ContextError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Pipeline(err) => write!(f, "pipeline error: {}", err),
            AppError::Board(err) => write!(f, "board error: {}", err),
            AppError::Context(err) => write!(f, "request context error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Pipeline(err) => Some(err),
            AppError::Board(err) => Some(err),
            AppError::Context(err) => Some(err),
        }
    }
}

impl AppError {
    /// HTTP status reported when this error ends a request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Pipeline(err) => err.status_code(),
            AppError::Board(_) => StatusCode::BAD_GATEWAY,
            AppError::Context(_) => StatusCode::UNAUTHORIZED,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<PipelineServiceError> for AppError {
    fn from(value: PipelineServiceError) -> Self {
        Self::Pipeline(value)
    }
}

impl From<LoadError> for AppError {
    fn from(value: LoadError) -> Self {
        Self::Board(value)
    }
}

impl From<ContextError> for AppError {
    fn from(value: ContextError) -> Self {
        Self::Context(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::hiring::pipeline::{GatewayError, RepositoryError, StageId};

    #[test]
    fn pipeline_errors_keep_their_own_status() {
        let unknown: AppError = PipelineServiceError::UnknownStage(StageId::new("archived")).into();
        assert_eq!(unknown.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let offline: AppError =
            PipelineServiceError::from(RepositoryError::Unavailable("db".to_string())).into();
        assert_eq!(offline.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn board_and_context_failures_map_to_gateway_and_auth_statuses() {
        let board: AppError = LoadError::from(GatewayError::Timeout).into();
        assert_eq!(board.status_code(), StatusCode::BAD_GATEWAY);
        assert!(board.to_string().starts_with("board error"));

        let context: AppError = ContextError::MissingUser.into();
        let response = context.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
