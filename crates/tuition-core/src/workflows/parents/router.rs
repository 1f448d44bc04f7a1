use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ParentRequestDraft, ParentRequestId, ParentStatus};
use super::service::{ParentRequestError, ParentRequestService};
use crate::identity::AdminIdentity;
use crate::store::PersistenceGateway;
use crate::workflows::outcome::{error_response, success};
use crate::workflows::vacancy::domain::VacancyId;

pub fn parent_router<S>(service: Arc<ParentRequestService<S>>) -> Router
where
    S: PersistenceGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/parents",
            get(list_handler::<S>).post(submit_handler::<S>),
        )
        .route(
            "/api/v1/parents/:parent_id",
            get(get_handler::<S>).delete(delete_handler::<S>),
        )
        .route("/api/v1/parents/:parent_id/status", put(status_handler::<S>))
        .route(
            "/api/v1/parents/:parent_id/vacancy",
            put(link_handler::<S>),
        )
        .route(
            "/api/v1/parents/:parent_id/rejections",
            put(rejection_handler::<S>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct StatusChange {
    status: ParentStatus,
}

#[derive(Debug, Deserialize)]
struct VacancyLinkRequest {
    vacancy_id: VacancyId,
    #[serde(default)]
    status: Option<ParentStatus>,
}

impl IntoResponse for ParentRequestError {
    fn into_response(self) -> Response {
        error_response(self.kind(), &self)
    }
}

async fn submit_handler<S>(
    State(service): State<Arc<ParentRequestService<S>>>,
    Json(draft): Json<ParentRequestDraft>,
) -> Response
where
    S: PersistenceGateway + 'static,
{
    match service.submit(draft) {
        Ok(request) => success(StatusCode::CREATED, request),
        Err(err) => err.into_response(),
    }
}

async fn list_handler<S>(
    State(service): State<Arc<ParentRequestService<S>>>,
    AdminIdentity(_admin): AdminIdentity,
) -> Response
where
    S: PersistenceGateway + 'static,
{
    match service.list() {
        Ok(requests) => success(StatusCode::OK, requests),
        Err(err) => err.into_response(),
    }
}

async fn get_handler<S>(
    State(service): State<Arc<ParentRequestService<S>>>,
    AdminIdentity(_admin): AdminIdentity,
    Path(parent_id): Path<String>,
) -> Response
where
    S: PersistenceGateway + 'static,
{
    match service.get(&ParentRequestId(parent_id)) {
        Ok(request) => success(StatusCode::OK, request),
        Err(err) => err.into_response(),
    }
}

async fn status_handler<S>(
    State(service): State<Arc<ParentRequestService<S>>>,
    AdminIdentity(_admin): AdminIdentity,
    Path(parent_id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Response
where
    S: PersistenceGateway + 'static,
{
    match service.set_status(&ParentRequestId(parent_id), change.status) {
        Ok(request) => success(StatusCode::OK, request),
        Err(err) => err.into_response(),
    }
}

async fn link_handler<S>(
    State(service): State<Arc<ParentRequestService<S>>>,
    AdminIdentity(_admin): AdminIdentity,
    Path(parent_id): Path<String>,
    Json(link): Json<VacancyLinkRequest>,
) -> Response
where
    S: PersistenceGateway + 'static,
{
    match service.link_vacancy(&ParentRequestId(parent_id), link.vacancy_id, link.status) {
        Ok(request) => success(StatusCode::OK, request),
        Err(err) => err.into_response(),
    }
}

async fn rejection_handler<S>(
    State(service): State<Arc<ParentRequestService<S>>>,
    AdminIdentity(_admin): AdminIdentity,
    Path(parent_id): Path<String>,
) -> Response
where
    S: PersistenceGateway + 'static,
{
    match service.record_rejection(&ParentRequestId(parent_id)) {
        Ok(request) => success(StatusCode::OK, request),
        Err(err) => err.into_response(),
    }
}

async fn delete_handler<S>(
    State(service): State<Arc<ParentRequestService<S>>>,
    AdminIdentity(_admin): AdminIdentity,
    Path(parent_id): Path<String>,
) -> Response
where
    S: PersistenceGateway + 'static,
{
    let id = ParentRequestId(parent_id);
    match service.delete(&id) {
        Ok(()) => success(StatusCode::OK, json!({ "id": id })),
        Err(err) => err.into_response(),
    }
}
