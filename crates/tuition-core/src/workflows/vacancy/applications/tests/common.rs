use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::config::{LifecycleConfig, ParentSyncConfig};
use crate::notifications::{NotificationError, NotificationEvent, NotificationPublisher};
use crate::store::{InMemoryStore, RepositoryError};
use crate::workflows::parents::domain::{
    ParentRequest, ParentRequestDraft, ParentRequestId, ParentStatus,
};
use crate::workflows::parents::repository::ParentRequestRepository;
use crate::workflows::vacancy::applications::domain::{Application, ApplicationId, TeacherId};
use crate::workflows::vacancy::applications::VacancyApplicationService;
use crate::workflows::vacancy::domain::{
    AdminId, GenderPreference, Vacancy, VacancyDraft, VacancyId,
};
use crate::workflows::vacancy::repository::{TeacherDirectory, VacancyRepository};

pub(super) fn config() -> LifecycleConfig {
    LifecycleConfig {
        conflict_retries: 8,
        parent_sync: ParentSyncConfig {
            attempts: 3,
            backoff: Duration::from_millis(1),
        },
        reconcile_interval: Duration::ZERO,
    }
}

pub(super) fn teacher(index: usize) -> TeacherId {
    TeacherId(format!("teacher-{index}"))
}

pub(super) fn seed_parent(store: &InMemoryStore) -> ParentRequest {
    store
        .insert_parent(ParentRequest::submitted(
            ParentRequestDraft {
                parent_name: "Sunita Karki".to_string(),
                phone: "9801234567".to_string(),
                address: "Patan".to_string(),
                salary: Some("8000".to_string()),
                preferred_teacher: GenderPreference::Female,
                grade: "Grade 7".to_string(),
                subjects: vec!["Maths".to_string()],
                preferred_time: "6-7 PM".to_string(),
            },
            Utc::now(),
        ))
        .expect("parent stored")
}

pub(super) fn seed_vacancy(store: &InMemoryStore, parent_id: Option<ParentRequestId>) -> Vacancy {
    store
        .insert_vacancy(Vacancy::open(
            VacancyDraft {
                title: "Grade 7 Maths".to_string(),
                subject: "Maths".to_string(),
                description: "Evening home tuition".to_string(),
                salary: "8000".to_string(),
                parent_id,
                ..VacancyDraft::default()
            },
            AdminId("admin-1".to_string()),
            Utc::now(),
        ))
        .expect("vacancy stored")
}

/// Append pending applications from `teacher(0)..teacher(count)` straight into the store.
pub(super) fn seed_applications(
    store: &InMemoryStore,
    vacancy_id: &VacancyId,
    count: usize,
) -> Vec<Application> {
    let mut vacancy = current(store, vacancy_id);
    let applications = (0..count)
        .map(|index| vacancy.admit(teacher(index), Utc::now()).expect("admitted"))
        .collect();
    store
        .conditional_update_vacancy(vacancy)
        .expect("applications stored");
    applications
}

pub(super) fn current(store: &InMemoryStore, vacancy_id: &VacancyId) -> Vacancy {
    store
        .find_vacancy(vacancy_id)
        .expect("find succeeds")
        .expect("vacancy present")
}

pub(super) fn parent(store: &InMemoryStore, parent_id: &ParentRequestId) -> ParentRequest {
    store
        .find_parent(parent_id)
        .expect("find succeeds")
        .expect("parent present")
}

pub(super) fn service_over<S>(
    store: Arc<S>,
) -> (
    Arc<VacancyApplicationService<S, RecordingNotifier>>,
    Arc<RecordingNotifier>,
)
where
    S: crate::store::PersistenceGateway + 'static,
{
    let notifier = Arc::new(RecordingNotifier::default());
    let service = Arc::new(VacancyApplicationService::new(
        store,
        notifier.clone(),
        config(),
    ));
    (service, notifier)
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingNotifier {
    pub(super) fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().expect("lock").clone()
    }

    pub(super) fn labels(&self) -> Vec<&'static str> {
        self.events().iter().map(NotificationEvent::label).collect()
    }
}

impl NotificationPublisher for RecordingNotifier {
    fn publish(&self, event: NotificationEvent) -> Result<usize, NotificationError> {
        self.events.lock().expect("lock").push(event);
        Ok(1)
    }
}

pub(super) struct FailingNotifier;

impl NotificationPublisher for FailingNotifier {
    fn publish(&self, _event: NotificationEvent) -> Result<usize, NotificationError> {
        Err(NotificationError::Transport("pusher offline".to_string()))
    }
}

/// Store double that injects races and outages around an in-memory store.
#[derive(Default)]
pub(super) struct FaultyStore {
    pub(super) inner: InMemoryStore,
    rival: Mutex<Option<TeacherId>>,
    rival_acceptance: Mutex<Option<ApplicationId>>,
    parent_failures: AtomicU32,
    parent_calls: AtomicU32,
    vacancy_writes: AtomicUsize,
    vacancy_write_limit: Option<usize>,
    unavailable: bool,
}

impl FaultyStore {
    pub(super) fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Commit an application from `rival` just before the next vacancy write lands.
    pub(super) fn with_rival(self, rival: TeacherId) -> Self {
        *self.rival.lock().expect("lock") = Some(rival);
        self
    }

    /// Commit an acceptance of `application` just before the next vacancy write lands.
    pub(super) fn with_rival_acceptance(self, application: ApplicationId) -> Self {
        *self.rival_acceptance.lock().expect("lock") = Some(application);
        self
    }

    /// Fail the next `failures` parent status writes.
    pub(super) fn failing_parent_writes(self, failures: u32) -> Self {
        self.parent_failures.store(failures, Ordering::SeqCst);
        self
    }

    /// Let `limit` vacancy writes through, then fail every later one.
    pub(super) fn failing_vacancy_writes_after(mut self, limit: usize) -> Self {
        self.vacancy_write_limit = Some(limit);
        self
    }

    pub(super) fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub(super) fn parent_calls(&self) -> u32 {
        self.parent_calls.load(Ordering::SeqCst)
    }

    pub(super) fn heal_parent_writes(&self) {
        self.parent_failures.store(0, Ordering::SeqCst);
    }

    fn outage(&self) -> Result<(), RepositoryError> {
        if self.unavailable {
            return Err(RepositoryError::Unavailable("primary offline".to_string()));
        }
        Ok(())
    }
}

impl VacancyRepository for FaultyStore {
    fn insert_vacancy(&self, vacancy: Vacancy) -> Result<Vacancy, RepositoryError> {
        self.outage()?;
        self.inner.insert_vacancy(vacancy)
    }

    fn find_vacancy(&self, id: &VacancyId) -> Result<Option<Vacancy>, RepositoryError> {
        self.outage()?;
        self.inner.find_vacancy(id)
    }

    fn list_vacancies(&self) -> Result<Vec<Vacancy>, RepositoryError> {
        self.outage()?;
        self.inner.list_vacancies()
    }

    fn conditional_update_vacancy(&self, vacancy: Vacancy) -> Result<Vacancy, RepositoryError> {
        self.outage()?;
        let rival = self.rival.lock().expect("lock").take();
        if let Some(rival) = rival {
            let mut competing = self
                .inner
                .find_vacancy(&vacancy.id)?
                .ok_or(RepositoryError::NotFound)?;
            if competing.admit(rival, Utc::now()).is_ok() {
                self.inner.conditional_update_vacancy(competing)?;
            }
        }
        let acceptance = self.rival_acceptance.lock().expect("lock").take();
        if let Some(application) = acceptance {
            let mut competing = self
                .inner
                .find_vacancy(&vacancy.id)?
                .ok_or(RepositoryError::NotFound)?;
            if competing.accept(&application, Utc::now()).is_ok() {
                self.inner.conditional_update_vacancy(competing)?;
            }
        }

        let writes = self.vacancy_writes.fetch_add(1, Ordering::SeqCst);
        if self.vacancy_write_limit.is_some_and(|limit| writes >= limit) {
            return Err(RepositoryError::Timeout);
        }
        self.inner.conditional_update_vacancy(vacancy)
    }

    fn delete_vacancy(&self, id: &VacancyId) -> Result<bool, RepositoryError> {
        self.outage()?;
        self.inner.delete_vacancy(id)
    }
}

impl ParentRequestRepository for FaultyStore {
    fn insert_parent(&self, request: ParentRequest) -> Result<ParentRequest, RepositoryError> {
        self.outage()?;
        self.inner.insert_parent(request)
    }

    fn find_parent(&self, id: &ParentRequestId) -> Result<Option<ParentRequest>, RepositoryError> {
        self.outage()?;
        self.inner.find_parent(id)
    }

    fn list_parents(&self) -> Result<Vec<ParentRequest>, RepositoryError> {
        self.outage()?;
        self.inner.list_parents()
    }

    fn conditional_update_parent(
        &self,
        request: ParentRequest,
    ) -> Result<ParentRequest, RepositoryError> {
        self.outage()?;
        self.inner.conditional_update_parent(request)
    }

    fn update_parent_status(
        &self,
        id: &ParentRequestId,
        status: ParentStatus,
    ) -> Result<Option<ParentRequest>, RepositoryError> {
        self.outage()?;
        self.parent_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.parent_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.parent_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(RepositoryError::Unavailable("parents shard offline".to_string()));
        }
        self.inner.update_parent_status(id, status)
    }

    fn delete_parent(&self, id: &ParentRequestId) -> Result<bool, RepositoryError> {
        self.outage()?;
        self.inner.delete_parent(id)
    }
}

impl TeacherDirectory for FaultyStore {
    fn teacher_name(&self, id: &TeacherId) -> Result<Option<String>, RepositoryError> {
        self.outage()?;
        self.inner.teacher_name(id)
    }
}
