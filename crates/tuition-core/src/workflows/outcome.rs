//! Shared response envelopes and the stable error discriminators clients match on.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::store::RepositoryError;

/// Message returned for every storage failure. Internal detail stays in the logs.
pub const PERSISTENCE_MESSAGE: &str = "persistence temporarily unavailable; retry the request";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    NotOpen,
    DuplicateApplication,
    CapacityExceeded,
    AlreadyResolved,
    VacancyClosed,
    InvalidRequest,
    PersistenceFailure,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::NotOpen => "not_open",
            Self::DuplicateApplication => "duplicate_application",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::AlreadyResolved => "already_resolved",
            Self::VacancyClosed => "vacancy_closed",
            Self::InvalidRequest => "invalid_request",
            Self::PersistenceFailure => "persistence_failure",
        }
    }

    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NotOpen
            | Self::DuplicateApplication
            | Self::CapacityExceeded
            | Self::AlreadyResolved
            | Self::VacancyClosed => StatusCode::CONFLICT,
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::PersistenceFailure => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Storage failures surface as `not_found` when the document vanished mid-call, otherwise
/// as a retryable persistence failure.
pub(crate) fn repository_kind(error: &RepositoryError) -> ErrorKind {
    match error {
        RepositoryError::NotFound => ErrorKind::NotFound,
        _ => ErrorKind::PersistenceFailure,
    }
}

pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Response {
    let body = json!({
        "success": false,
        "error": kind.label(),
        "message": message.into(),
    });
    (kind.status_code(), axum::Json(body)).into_response()
}

/// Map an error to its envelope, logging storage detail instead of returning it.
pub(crate) fn error_response<E>(kind: ErrorKind, error: &E) -> Response
where
    E: std::fmt::Display,
{
    if kind == ErrorKind::PersistenceFailure {
        tracing::error!(error = %error, "request failed on persistence");
        return failure(kind, PERSISTENCE_MESSAGE);
    }
    failure(kind, error.to_string())
}

pub fn success<T: Serialize>(status: StatusCode, data: T) -> Response {
    let body = json!({
        "success": true,
        "data": data,
    });
    (status, axum::Json(body)).into_response()
}
