use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::parents::ParentRequestError;
use crate::workflows::vacancy::applications::ApplicationServiceError;
use crate::workflows::vacancy::CatalogError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Process-level failures raised while bootstrapping, serving, or scripting the workflows.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Catalog(CatalogError),
    Applications(ApplicationServiceError),
    Parents(ParentRequestError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Catalog(err) => write!(f, "vacancy catalog error: {}", err),
            AppError::Applications(err) => write!(f, "application lifecycle error: {}", err),
            AppError::Parents(err) => write!(f, "parent request error: {}", err),
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
            AppError::Catalog(err) => Some(err),
            AppError::Applications(err) => Some(err),
            AppError::Parents(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Catalog(err) => return err.into_response(),
            AppError::Applications(err) => return err.into_response(),
            AppError::Parents(err) => return err.into_response(),
            _ => {}
        }
        tracing::error!(error = %self, "request failed with process-level error");
        let body = Json(json!({
            "success": false,
            "error": "internal",
            "message": "internal server error",
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
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

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<ApplicationServiceError> for AppError {
    fn from(value: ApplicationServiceError) -> Self {
        Self::Applications(value)
    }
}

impl From<ParentRequestError> for AppError {
    fn from(value: ParentRequestError) -> Self {
        Self::Parents(value)
    }
}
