use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{post, put},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{ApplicationId, ApplicationStatus};
use super::service::{ApplicationServiceError, VacancyApplicationService};
use crate::identity::{AdminIdentity, TeacherIdentity};
use crate::notifications::NotificationPublisher;
use crate::store::PersistenceGateway;
use crate::workflows::outcome::{error_response, success};
use crate::workflows::vacancy::catalog::populate;
use crate::workflows::vacancy::domain::VacancyId;

/// Router exposing the apply and resolve endpoints.
pub fn application_router<S, N>(service: Arc<VacancyApplicationService<S, N>>) -> Router
where
    S: PersistenceGateway + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/vacancies/:vacancy_id/applications",
            post(apply_handler::<S, N>),
        )
        .route(
            "/api/v1/vacancies/:vacancy_id/applications/:application_id/status",
            put(resolve_handler::<S, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct Decision {
    pub(crate) status: ApplicationStatus,
}

impl IntoResponse for ApplicationServiceError {
    fn into_response(self) -> Response {
        error_response(self.kind(), &self)
    }
}

pub(crate) async fn apply_handler<S, N>(
    State(service): State<Arc<VacancyApplicationService<S, N>>>,
    TeacherIdentity(teacher): TeacherIdentity,
    Path(vacancy_id): Path<String>,
) -> Response
where
    S: PersistenceGateway + 'static,
    N: NotificationPublisher + 'static,
{
    match service.apply(&VacancyId(vacancy_id), teacher) {
        Ok(application) => success(StatusCode::CREATED, application),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn resolve_handler<S, N>(
    State(service): State<Arc<VacancyApplicationService<S, N>>>,
    AdminIdentity(admin): AdminIdentity,
    Path((vacancy_id, application_id)): Path<(String, String)>,
    Json(decision): Json<Decision>,
) -> Response
where
    S: PersistenceGateway + 'static,
    N: NotificationPublisher + 'static,
{
    tracing::debug!(
        admin_id = %admin,
        application_id = %application_id,
        status = decision.status.label(),
        "resolving application"
    );
    let result = service
        .resolve(
            &VacancyId(vacancy_id),
            &ApplicationId(application_id),
            decision.status,
        )
        .await;
    match result {
        Ok(vacancy) => success(StatusCode::OK, populate(service.store().as_ref(), &vacancy)),
        Err(err) => err.into_response(),
    }
}
