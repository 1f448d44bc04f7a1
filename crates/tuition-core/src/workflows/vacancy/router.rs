use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::catalog::{CatalogError, VacancyCatalogService};
use super::domain::{VacancyDraft, VacancyId, VacancyPatch, VacancyStatus, VacancyView};
use crate::identity::{AdminIdentity, TeacherIdentity};
use crate::store::PersistenceGateway;
use crate::workflows::outcome::{error_response, success};

/// Admin vacancy management plus the teacher listings.
pub fn catalog_router<S>(service: Arc<VacancyCatalogService<S>>) -> Router
where
    S: PersistenceGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/vacancies",
            get(list_handler::<S>).post(create_handler::<S>),
        )
        .route("/api/v1/vacancies/featured", get(featured_handler::<S>))
        .route("/api/v1/vacancies/available", get(available_handler::<S>))
        .route(
            "/api/v1/vacancies/:vacancy_id",
            get(get_handler::<S>)
                .put(update_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .route(
            "/api/v1/vacancies/:vacancy_id/status",
            patch(status_handler::<S>),
        )
        .route(
            "/api/v1/vacancies/:vacancy_id/applicants",
            get(applicants_handler::<S>),
        )
        .route(
            "/api/v1/vacancies/:vacancy_id/applicants/viewed",
            patch(viewed_handler::<S>),
        )
        .route(
            "/api/v1/teachers/me/applications",
            get(my_applications_handler::<S>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct StatusChange {
    status: VacancyStatus,
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        error_response(self.kind(), &self)
    }
}

async fn create_handler<S>(
    State(service): State<Arc<VacancyCatalogService<S>>>,
    AdminIdentity(admin): AdminIdentity,
    Json(draft): Json<VacancyDraft>,
) -> Response
where
    S: PersistenceGateway + 'static,
{
    match service.create_vacancy(admin, draft) {
        Ok(vacancy) => success(StatusCode::CREATED, service.view(&vacancy)),
        Err(err) => err.into_response(),
    }
}

async fn list_handler<S>(State(service): State<Arc<VacancyCatalogService<S>>>) -> Response
where
    S: PersistenceGateway + 'static,
{
    match service.list_vacancies() {
        Ok(vacancies) => {
            let views: Vec<VacancyView> = vacancies
                .iter()
                .map(|vacancy| service.view(vacancy))
                .collect();
            success(StatusCode::OK, views)
        }
        Err(err) => err.into_response(),
    }
}

async fn featured_handler<S>(State(service): State<Arc<VacancyCatalogService<S>>>) -> Response
where
    S: PersistenceGateway + 'static,
{
    match service.featured_vacancies() {
        Ok(summaries) => success(StatusCode::OK, summaries),
        Err(err) => err.into_response(),
    }
}

async fn available_handler<S>(
    State(service): State<Arc<VacancyCatalogService<S>>>,
    TeacherIdentity(teacher): TeacherIdentity,
) -> Response
where
    S: PersistenceGateway + 'static,
{
    match service.available_for_teacher(&teacher) {
        Ok(summaries) => success(StatusCode::OK, summaries),
        Err(err) => err.into_response(),
    }
}

async fn get_handler<S>(
    State(service): State<Arc<VacancyCatalogService<S>>>,
    Path(vacancy_id): Path<String>,
) -> Response
where
    S: PersistenceGateway + 'static,
{
    match service.get_vacancy(&VacancyId(vacancy_id)) {
        Ok(vacancy) => success(StatusCode::OK, service.view(&vacancy)),
        Err(err) => err.into_response(),
    }
}

async fn update_handler<S>(
    State(service): State<Arc<VacancyCatalogService<S>>>,
    AdminIdentity(_admin): AdminIdentity,
    Path(vacancy_id): Path<String>,
    Json(patch): Json<VacancyPatch>,
) -> Response
where
    S: PersistenceGateway + 'static,
{
    match service.update_vacancy(&VacancyId(vacancy_id), patch) {
        Ok(vacancy) => success(StatusCode::OK, service.view(&vacancy)),
        Err(err) => err.into_response(),
    }
}

async fn status_handler<S>(
    State(service): State<Arc<VacancyCatalogService<S>>>,
    AdminIdentity(_admin): AdminIdentity,
    Path(vacancy_id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Response
where
    S: PersistenceGateway + 'static,
{
    match service.set_vacancy_status(&VacancyId(vacancy_id), change.status) {
        Ok(vacancy) => success(StatusCode::OK, service.view(&vacancy)),
        Err(err) => err.into_response(),
    }
}

async fn delete_handler<S>(
    State(service): State<Arc<VacancyCatalogService<S>>>,
    AdminIdentity(_admin): AdminIdentity,
    Path(vacancy_id): Path<String>,
) -> Response
where
    S: PersistenceGateway + 'static,
{
    let id = VacancyId(vacancy_id);
    match service.delete_vacancy(&id) {
        Ok(()) => success(StatusCode::OK, json!({ "id": id })),
        Err(err) => err.into_response(),
    }
}

async fn applicants_handler<S>(
    State(service): State<Arc<VacancyCatalogService<S>>>,
    AdminIdentity(_admin): AdminIdentity,
    Path(vacancy_id): Path<String>,
) -> Response
where
    S: PersistenceGateway + 'static,
{
    match service.applicants(&VacancyId(vacancy_id)) {
        Ok(applicants) => success(StatusCode::OK, applicants),
        Err(err) => err.into_response(),
    }
}

async fn viewed_handler<S>(
    State(service): State<Arc<VacancyCatalogService<S>>>,
    AdminIdentity(_admin): AdminIdentity,
    Path(vacancy_id): Path<String>,
) -> Response
where
    S: PersistenceGateway + 'static,
{
    match service.mark_applicants_viewed(&VacancyId(vacancy_id)) {
        Ok(viewed_at) => success(
            StatusCode::OK,
            json!({ "admin_last_viewed_applicants_at": viewed_at }),
        ),
        Err(err) => err.into_response(),
    }
}

async fn my_applications_handler<S>(
    State(service): State<Arc<VacancyCatalogService<S>>>,
    TeacherIdentity(teacher): TeacherIdentity,
) -> Response
where
    S: PersistenceGateway + 'static,
{
    match service.applications_for_teacher(&teacher) {
        Ok(applications) => success(StatusCode::OK, applications),
        Err(err) => err.into_response(),
    }
}
