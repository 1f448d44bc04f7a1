//! Actor identity handed over by the upstream authentication layer.
//!
//! Token verification happens before requests reach this service; handlers only read the
//! resulting account id from a trusted header.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::workflows::vacancy::applications::domain::TeacherId;
use crate::workflows::vacancy::domain::AdminId;

pub const TEACHER_HEADER: &str = "x-teacher-id";
pub const ADMIN_HEADER: &str = "x-admin-id";

/// Authenticated teacher making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherIdentity(pub TeacherId);

/// Authenticated admin making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity(pub AdminId);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unauthenticated {
    header: &'static str,
}

impl IntoResponse for Unauthenticated {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": "unauthenticated",
            "message": format!("missing {} header", self.header),
        });
        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

fn header_value(parts: &Parts, header: &'static str) -> Result<String, Unauthenticated> {
    parts
        .headers
        .get(header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(Unauthenticated { header })
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for TeacherIdentity
where
    S: Send + Sync,
{
    type Rejection = Unauthenticated;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_value(parts, TEACHER_HEADER).map(|id| Self(TeacherId(id)))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminIdentity
where
    S: Send + Sync,
{
    type Rejection = Unauthenticated;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_value(parts, ADMIN_HEADER).map(|id| Self(AdminId(id)))
    }
}
