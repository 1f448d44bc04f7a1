use std::sync::Arc;

use chrono::Utc;

use super::domain::{ParentRequest, ParentRequestDraft, ParentRequestId, ParentStatus};
use crate::config::LifecycleConfig;
use crate::store::{retry_on_conflict, ConflictAware, PersistenceGateway, RepositoryError};
use crate::workflows::outcome::{repository_kind, ErrorKind};
use crate::workflows::vacancy::domain::VacancyId;

/// Parent tuition requests from submission through to the vacancy that fills them.
pub struct ParentRequestService<S> {
    store: Arc<S>,
    conflict_retries: u32,
}

impl<S> ParentRequestService<S>
where
    S: PersistenceGateway + 'static,
{
    pub fn new(store: Arc<S>, config: &LifecycleConfig) -> Self {
        Self {
            store,
            conflict_retries: config.conflict_retries,
        }
    }

    pub fn submit(&self, draft: ParentRequestDraft) -> Result<ParentRequest, ParentRequestError> {
        let problems = draft.problems();
        if !problems.is_empty() {
            return Err(ParentRequestError::Invalid(problems.join("; ")));
        }

        let request = self
            .store
            .insert_parent(ParentRequest::submitted(draft, Utc::now()))?;
        tracing::info!(
            parent_id = %request.id,
            application_number = request.application_number,
            "parent request submitted"
        );
        Ok(request)
    }

    /// Every request, newest submission first.
    pub fn list(&self) -> Result<Vec<ParentRequest>, ParentRequestError> {
        let mut requests = self.store.list_parents()?;
        requests.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(requests)
    }

    pub fn get(&self, id: &ParentRequestId) -> Result<ParentRequest, ParentRequestError> {
        self.store
            .find_parent(id)?
            .ok_or_else(|| ParentRequestError::NotFound(id.clone()))
    }

    /// Admin status change. `done` is only ever set by an accepted application.
    pub fn set_status(
        &self,
        id: &ParentRequestId,
        status: ParentStatus,
    ) -> Result<ParentRequest, ParentRequestError> {
        refuse_done(status)?;
        let updated = self.modify(id, |request| {
            request.status = status;
            Ok(())
        })?;
        tracing::info!(parent_id = %id, status = status.label(), "parent request status changed");
        Ok(updated)
    }

    pub fn link_vacancy(
        &self,
        id: &ParentRequestId,
        vacancy_id: VacancyId,
        status: Option<ParentStatus>,
    ) -> Result<ParentRequest, ParentRequestError> {
        if let Some(status) = status {
            refuse_done(status)?;
        }
        if self.store.find_vacancy(&vacancy_id)?.is_none() {
            return Err(ParentRequestError::VacancyNotFound(vacancy_id));
        }

        let updated = self.modify(id, |request| {
            request.link_vacancy(vacancy_id.clone(), status, Utc::now());
            Ok(())
        })?;
        tracing::info!(
            parent_id = %id,
            vacancy_id = %vacancy_id,
            "parent request linked to vacancy"
        );
        Ok(updated)
    }

    /// Count a teacher rejection. The request gives up once the limit is reached.
    pub fn record_rejection(
        &self,
        id: &ParentRequestId,
    ) -> Result<ParentRequest, ParentRequestError> {
        let updated = self.modify(id, |request| {
            request.record_rejection();
            Ok(())
        })?;
        tracing::info!(
            parent_id = %id,
            rejected_count = updated.vacancy_details.rejected_count,
            status = updated.status.label(),
            "parent request rejection recorded"
        );
        Ok(updated)
    }

    pub fn delete(&self, id: &ParentRequestId) -> Result<(), ParentRequestError> {
        if !self.store.delete_parent(id)? {
            return Err(ParentRequestError::NotFound(id.clone()));
        }
        tracing::info!(parent_id = %id, "parent request deleted");
        Ok(())
    }

    fn modify<F>(&self, id: &ParentRequestId, mut change: F) -> Result<ParentRequest, ParentRequestError>
    where
        F: FnMut(&mut ParentRequest) -> Result<(), ParentRequestError>,
    {
        retry_on_conflict(self.conflict_retries, || {
            let mut request = self.get(id)?;
            change(&mut request)?;
            Ok(self.store.conditional_update_parent(request)?)
        })
    }
}

fn refuse_done(status: ParentStatus) -> Result<(), ParentRequestError> {
    if status == ParentStatus::Done {
        return Err(ParentRequestError::Invalid(
            "done is set automatically when an application is accepted".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ParentRequestError {
    #[error("parent request {0} not found")]
    NotFound(ParentRequestId),
    #[error("vacancy {0} not found")]
    VacancyNotFound(VacancyId),
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ParentRequestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::VacancyNotFound(_) => ErrorKind::NotFound,
            Self::Invalid(_) => ErrorKind::InvalidRequest,
            Self::Repository(err) => repository_kind(err),
        }
    }
}

impl ConflictAware for ParentRequestError {
    fn is_version_conflict(&self) -> bool {
        matches!(self, Self::Repository(err) if err.is_version_conflict())
    }
}
