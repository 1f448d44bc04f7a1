use std::sync::Arc;

use chrono::Utc;

use super::domain::{Application, ApplicationId, ApplicationStatus, TeacherId};
use super::lifecycle::LifecycleViolation;
use crate::config::LifecycleConfig;
use crate::notifications::{publish_best_effort, NotificationEvent, NotificationPublisher};
use crate::store::{retry_on_conflict, ConflictAware, PersistenceGateway, RepositoryError};
use crate::workflows::outcome::{repository_kind, ErrorKind};
use crate::workflows::vacancy::domain::{Vacancy, VacancyId};

/// Display name used when the directory has no entry for an applicant.
pub const UNKNOWN_TEACHER: &str = "Unknown Teacher";

/// Lifecycle engine for teacher applications: apply, resolve, and the acceptance cascade.
pub struct VacancyApplicationService<S, N> {
    pub(super) store: Arc<S>,
    pub(super) notifier: Arc<N>,
    pub(super) config: LifecycleConfig,
}

impl<S, N> VacancyApplicationService<S, N>
where
    S: PersistenceGateway + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: LifecycleConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Append a pending application for `teacher_id`.
    ///
    /// The open, duplicate, and capacity checks run against the version that is written back,
    /// so a lost race replays them against fresh state instead of overfilling the vacancy.
    pub fn apply(
        &self,
        vacancy_id: &VacancyId,
        teacher_id: TeacherId,
    ) -> Result<Application, ApplicationServiceError> {
        let (vacancy, application) = retry_on_conflict(self.config.conflict_retries, || {
            let mut vacancy = self.load(vacancy_id)?;
            let application = vacancy.admit(teacher_id.clone(), Utc::now())?;
            let committed = self.store.conditional_update_vacancy(vacancy)?;
            Ok::<_, ApplicationServiceError>((committed, application))
        })?;

        tracing::info!(
            vacancy_id = %vacancy.id,
            application_id = %application.id,
            teacher_id = %application.teacher_id,
            applicants = vacancy.applications.len(),
            "application submitted"
        );

        let teacher_name = self.teacher_name(&application.teacher_id);
        publish_best_effort(
            self.notifier.as_ref(),
            NotificationEvent::NewApplication {
                teacher_id: application.teacher_id.clone(),
                teacher_name,
                vacancy_title: vacancy.title.clone(),
                vacancy_id: vacancy.id.clone(),
                application_id: application.id.clone(),
            },
        );

        Ok(application)
    }

    /// Record an admin decision on one application.
    ///
    /// Accepting closes the vacancy, rejects the remaining pending applications, and marks a
    /// linked parent request done. Any other decision changes only the target application.
    pub async fn resolve(
        &self,
        vacancy_id: &VacancyId,
        application_id: &ApplicationId,
        decision: ApplicationStatus,
    ) -> Result<Vacancy, ApplicationServiceError> {
        match decision {
            ApplicationStatus::Accepted => self.accept(vacancy_id, application_id).await,
            other => self.mark(vacancy_id, application_id, other),
        }
    }

    fn mark(
        &self,
        vacancy_id: &VacancyId,
        application_id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Vacancy, ApplicationServiceError> {
        let committed = retry_on_conflict(self.config.conflict_retries, || {
            let mut vacancy = self.load(vacancy_id)?;
            vacancy.mark_application(application_id, status, Utc::now())?;
            Ok::<_, ApplicationServiceError>(self.store.conditional_update_vacancy(vacancy)?)
        })?;

        tracing::info!(
            vacancy_id = %committed.id,
            application_id = %application_id,
            status = status.label(),
            "application status updated"
        );
        Ok(committed)
    }

    async fn accept(
        &self,
        vacancy_id: &VacancyId,
        application_id: &ApplicationId,
    ) -> Result<Vacancy, ApplicationServiceError> {
        let committed = retry_on_conflict(self.config.conflict_retries, || {
            let mut vacancy = self.load(vacancy_id)?;
            vacancy.accept(application_id, Utc::now())?;
            Ok::<_, ApplicationServiceError>(self.store.conditional_update_vacancy(vacancy)?)
        })?;

        tracing::info!(
            vacancy_id = %committed.id,
            application_id = %application_id,
            "application accepted, vacancy closed"
        );

        let committed = self.reject_siblings(committed, application_id);
        let committed = match committed.parent_id.clone() {
            Some(parent_id) => self.sync_parent(committed, parent_id).await,
            None => committed,
        };

        match self.store.find_vacancy(vacancy_id) {
            Ok(Some(current)) => Ok(current),
            Ok(None) => {
                tracing::warn!(vacancy_id = %vacancy_id, "vacancy vanished after acceptance");
                Ok(committed)
            }
            Err(err) => {
                tracing::warn!(
                    vacancy_id = %vacancy_id,
                    error = %err,
                    "reload after acceptance failed, returning committed copy"
                );
                Ok(committed)
            }
        }
    }

    /// Reject the other pending applications. The acceptance is already committed, so a
    /// failure here is logged and the last committed copy is returned.
    fn reject_siblings(&self, committed: Vacancy, keep: &ApplicationId) -> Vacancy {
        let mut snapshot = Some(committed.clone());
        let outcome = retry_on_conflict(self.config.conflict_retries, || {
            let mut vacancy = match snapshot.take() {
                Some(vacancy) => vacancy,
                None => self.load(&committed.id)?,
            };
            let rejected = vacancy.reject_pending_except(keep, Utc::now());
            if rejected == 0 {
                return Ok((vacancy, 0));
            }
            let stored = self.store.conditional_update_vacancy(vacancy)?;
            Ok::<_, ApplicationServiceError>((stored, rejected))
        });

        match outcome {
            Ok((vacancy, rejected)) => {
                if rejected > 0 {
                    tracing::info!(
                        vacancy_id = %vacancy.id,
                        rejected,
                        "remaining pending applications rejected"
                    );
                }
                vacancy
            }
            Err(err) => {
                tracing::warn!(
                    vacancy_id = %committed.id,
                    error = %err,
                    "failed to reject remaining applications after acceptance"
                );
                committed
            }
        }
    }

    pub(super) fn load(&self, vacancy_id: &VacancyId) -> Result<Vacancy, ApplicationServiceError> {
        self.store
            .find_vacancy(vacancy_id)?
            .ok_or_else(|| ApplicationServiceError::VacancyNotFound(vacancy_id.clone()))
    }

    fn teacher_name(&self, teacher_id: &TeacherId) -> String {
        match self.store.teacher_name(teacher_id) {
            Ok(Some(name)) => name,
            Ok(None) => UNKNOWN_TEACHER.to_string(),
            Err(err) => {
                tracing::warn!(teacher_id = %teacher_id, error = %err, "teacher lookup failed");
                UNKNOWN_TEACHER.to_string()
            }
        }
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("vacancy {0} not found")]
    VacancyNotFound(VacancyId),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ApplicationServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::VacancyNotFound(_) => ErrorKind::NotFound,
            Self::Lifecycle(violation) => violation.kind(),
            Self::Repository(err) => repository_kind(err),
        }
    }
}

impl ConflictAware for ApplicationServiceError {
    fn is_version_conflict(&self) -> bool {
        matches!(self, Self::Repository(err) if err.is_version_conflict())
    }
}
