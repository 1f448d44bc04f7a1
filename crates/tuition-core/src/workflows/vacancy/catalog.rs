use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::applications::domain::{ApplicantView, TeacherApplicationView, TeacherId};
use super::applications::lifecycle::LifecycleViolation;
use super::domain::{
    AdminId, Vacancy, VacancyDraft, VacancyId, VacancyPatch, VacancyStatus, VacancySummary,
    VacancyView,
};
use super::repository::TeacherDirectory;
use crate::config::LifecycleConfig;
use crate::store::{retry_on_conflict, ConflictAware, PersistenceGateway, RepositoryError};
use crate::workflows::outcome::{repository_kind, ErrorKind};
use crate::workflows::parents::domain::ParentRequestId;

/// Admin management of vacancy postings and the teacher-facing listings built on them.
pub struct VacancyCatalogService<S> {
    store: Arc<S>,
    conflict_retries: u32,
}

impl<S> VacancyCatalogService<S>
where
    S: PersistenceGateway + 'static,
{
    pub fn new(store: Arc<S>, config: &LifecycleConfig) -> Self {
        Self {
            store,
            conflict_retries: config.conflict_retries,
        }
    }

    pub fn create_vacancy(
        &self,
        admin: AdminId,
        draft: VacancyDraft,
    ) -> Result<Vacancy, CatalogError> {
        let missing = draft.missing_fields();
        if !missing.is_empty() {
            return Err(CatalogError::Invalid(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        if let Some(parent_id) = &draft.parent_id {
            if self.store.find_parent(parent_id)?.is_none() {
                return Err(CatalogError::ParentNotFound(parent_id.clone()));
            }
        }

        let vacancy = self
            .store
            .insert_vacancy(Vacancy::open(draft, admin, Utc::now()))?;
        tracing::info!(
            vacancy_id = %vacancy.id,
            created_by = %vacancy.created_by,
            "vacancy created"
        );
        Ok(vacancy)
    }

    /// Every vacancy, newest first.
    pub fn list_vacancies(&self) -> Result<Vec<Vacancy>, CatalogError> {
        let mut vacancies = self.store.list_vacancies()?;
        vacancies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(vacancies)
    }

    pub fn featured_vacancies(&self) -> Result<Vec<VacancySummary>, CatalogError> {
        Ok(self
            .list_vacancies()?
            .iter()
            .filter(|vacancy| vacancy.featured && vacancy.status == VacancyStatus::Open)
            .map(Vacancy::summary)
            .collect())
    }

    pub fn get_vacancy(&self, id: &VacancyId) -> Result<Vacancy, CatalogError> {
        self.store
            .find_vacancy(id)?
            .ok_or_else(|| CatalogError::VacancyNotFound(id.clone()))
    }

    pub fn update_vacancy(
        &self,
        id: &VacancyId,
        patch: VacancyPatch,
    ) -> Result<Vacancy, CatalogError> {
        let blanked = patch.blanked_fields();
        if !blanked.is_empty() {
            return Err(CatalogError::Invalid(format!(
                "required fields cannot be blank: {}",
                blanked.join(", ")
            )));
        }

        let updated = self.modify(id, |vacancy| {
            vacancy.apply_patch(patch.clone(), Utc::now());
            Ok(())
        })?;
        tracing::info!(vacancy_id = %updated.id, "vacancy details updated");
        Ok(updated)
    }

    /// Admin open/close toggle. `pending` is reserved and cannot be set here.
    pub fn set_vacancy_status(
        &self,
        id: &VacancyId,
        status: VacancyStatus,
    ) -> Result<Vacancy, CatalogError> {
        if status == VacancyStatus::Pending {
            return Err(CatalogError::Invalid(
                "status must be either open or closed".to_string(),
            ));
        }

        let updated = self.modify(id, |vacancy| {
            vacancy
                .change_status(status, Utc::now())
                .map_err(CatalogError::from)
        })?;
        tracing::info!(
            vacancy_id = %updated.id,
            status = status.label(),
            "vacancy status changed"
        );
        Ok(updated)
    }

    pub fn delete_vacancy(&self, id: &VacancyId) -> Result<(), CatalogError> {
        if !self.store.delete_vacancy(id)? {
            return Err(CatalogError::VacancyNotFound(id.clone()));
        }
        tracing::info!(vacancy_id = %id, "vacancy deleted");
        Ok(())
    }

    pub fn mark_applicants_viewed(&self, id: &VacancyId) -> Result<DateTime<Utc>, CatalogError> {
        let now = Utc::now();
        let updated = self.modify(id, |vacancy| {
            vacancy.admin_last_viewed_applicants_at = Some(now);
            Ok(())
        })?;
        Ok(updated.admin_last_viewed_applicants_at.unwrap_or(now))
    }

    pub fn applicants(&self, id: &VacancyId) -> Result<Vec<ApplicantView>, CatalogError> {
        let vacancy = self.get_vacancy(id)?;
        Ok(populate(self.store.as_ref(), &vacancy).applications)
    }

    /// Open vacancies with room left that `teacher` has not applied to yet.
    pub fn available_for_teacher(
        &self,
        teacher: &TeacherId,
    ) -> Result<Vec<VacancySummary>, CatalogError> {
        Ok(self
            .list_vacancies()?
            .iter()
            .filter(|vacancy| {
                vacancy.status == VacancyStatus::Open
                    && vacancy.has_capacity()
                    && !vacancy.has_applied(teacher)
            })
            .map(Vacancy::summary)
            .collect())
    }

    pub fn applications_for_teacher(
        &self,
        teacher: &TeacherId,
    ) -> Result<Vec<TeacherApplicationView>, CatalogError> {
        let mut views: Vec<TeacherApplicationView> = self
            .list_vacancies()?
            .iter()
            .flat_map(|vacancy| {
                vacancy
                    .applications
                    .iter()
                    .filter(|application| &application.teacher_id == teacher)
                    .map(|application| TeacherApplicationView {
                        application_id: application.id.clone(),
                        status: application.status,
                        applied_at: application.applied_at,
                        vacancy: vacancy.summary(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        views.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(views)
    }

    pub fn view(&self, vacancy: &Vacancy) -> VacancyView {
        populate(self.store.as_ref(), vacancy)
    }

    fn modify<F>(&self, id: &VacancyId, mut change: F) -> Result<Vacancy, CatalogError>
    where
        F: FnMut(&mut Vacancy) -> Result<(), CatalogError>,
    {
        retry_on_conflict(self.conflict_retries, || {
            let mut vacancy = self.get_vacancy(id)?;
            change(&mut vacancy)?;
            Ok(self.store.conditional_update_vacancy(vacancy)?)
        })
    }
}

/// Attach teacher display names to a vacancy's applications.
///
/// A failed lookup degrades to an unnamed applicant rather than failing the read.
pub fn populate<D>(directory: &D, vacancy: &Vacancy) -> VacancyView
where
    D: TeacherDirectory + ?Sized,
{
    let applications = vacancy
        .applications
        .iter()
        .map(|application| {
            let name = directory
                .teacher_name(&application.teacher_id)
                .unwrap_or_else(|err| {
                    tracing::warn!(
                        teacher_id = %application.teacher_id,
                        error = %err,
                        "teacher lookup failed"
                    );
                    None
                });
            ApplicantView::new(application, name)
        })
        .collect();
    VacancyView::new(vacancy, applications)
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("vacancy {0} not found")]
    VacancyNotFound(VacancyId),
    #[error("parent request {0} not found")]
    ParentNotFound(ParentRequestId),
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::VacancyNotFound(_) | Self::ParentNotFound(_) => ErrorKind::NotFound,
            Self::Invalid(_) => ErrorKind::InvalidRequest,
            Self::Lifecycle(violation) => violation.kind(),
            Self::Repository(err) => repository_kind(err),
        }
    }
}

impl ConflictAware for CatalogError {
    fn is_version_conflict(&self) -> bool {
        matches!(self, Self::Repository(err) if err.is_version_conflict())
    }
}
