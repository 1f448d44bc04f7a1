use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::RepositoryError;
use crate::workflows::parents::domain::{ParentRequest, ParentRequestId, ParentStatus};
use crate::workflows::parents::repository::ParentRequestRepository;
use crate::workflows::vacancy::applications::domain::TeacherId;
use crate::workflows::vacancy::domain::{Vacancy, VacancyId};
use crate::workflows::vacancy::repository::{TeacherDirectory, VacancyRepository};

/// Process-local document store with the same per-document guarantees as the real gateway.
///
/// Each collection sits behind its own mutex and no guard outlives a single call, so every
/// operation is atomic for one document and nothing spans two.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    vacancies: Arc<Mutex<HashMap<VacancyId, Vacancy>>>,
    parents: Arc<Mutex<HashMap<ParentRequestId, ParentRequest>>>,
    teachers: Arc<Mutex<HashMap<TeacherId, String>>>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{name} collection lock poisoned")))
}

impl InMemoryStore {
    /// Seed the teacher directory. Accounts live elsewhere; this only mirrors display names.
    pub fn register_teacher(&self, id: TeacherId, name: impl Into<String>) {
        if let Ok(mut guard) = lock(&self.teachers, "teacher") {
            guard.insert(id, name.into());
        }
    }
}

impl VacancyRepository for InMemoryStore {
    fn insert_vacancy(&self, vacancy: Vacancy) -> Result<Vacancy, RepositoryError> {
        let mut guard = lock(&self.vacancies, "vacancy")?;
        if guard.contains_key(&vacancy.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(vacancy.id.clone(), vacancy.clone());
        Ok(vacancy)
    }

    fn find_vacancy(&self, id: &VacancyId) -> Result<Option<Vacancy>, RepositoryError> {
        let guard = lock(&self.vacancies, "vacancy")?;
        Ok(guard.get(id).cloned())
    }

    fn list_vacancies(&self) -> Result<Vec<Vacancy>, RepositoryError> {
        let guard = lock(&self.vacancies, "vacancy")?;
        Ok(guard.values().cloned().collect())
    }

    fn conditional_update_vacancy(&self, mut vacancy: Vacancy) -> Result<Vacancy, RepositoryError> {
        let mut guard = lock(&self.vacancies, "vacancy")?;
        let stored = guard.get_mut(&vacancy.id).ok_or(RepositoryError::NotFound)?;
        if stored.version != vacancy.version {
            return Err(RepositoryError::VersionConflict {
                expected: vacancy.version,
                actual: stored.version,
            });
        }
        vacancy.version += 1;
        *stored = vacancy.clone();
        Ok(vacancy)
    }

    fn delete_vacancy(&self, id: &VacancyId) -> Result<bool, RepositoryError> {
        let mut guard = lock(&self.vacancies, "vacancy")?;
        Ok(guard.remove(id).is_some())
    }
}

impl ParentRequestRepository for InMemoryStore {
    fn insert_parent(&self, mut request: ParentRequest) -> Result<ParentRequest, RepositoryError> {
        let mut guard = lock(&self.parents, "parent")?;
        if guard.contains_key(&request.id) {
            return Err(RepositoryError::Conflict);
        }
        let last = guard
            .values()
            .map(|existing| existing.application_number)
            .max()
            .unwrap_or(0);
        request.application_number = last + 1;
        guard.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn find_parent(&self, id: &ParentRequestId) -> Result<Option<ParentRequest>, RepositoryError> {
        let guard = lock(&self.parents, "parent")?;
        Ok(guard.get(id).cloned())
    }

    fn list_parents(&self) -> Result<Vec<ParentRequest>, RepositoryError> {
        let guard = lock(&self.parents, "parent")?;
        Ok(guard.values().cloned().collect())
    }

    fn conditional_update_parent(
        &self,
        mut request: ParentRequest,
    ) -> Result<ParentRequest, RepositoryError> {
        let mut guard = lock(&self.parents, "parent")?;
        let stored = guard.get_mut(&request.id).ok_or(RepositoryError::NotFound)?;
        if stored.version != request.version {
            return Err(RepositoryError::VersionConflict {
                expected: request.version,
                actual: stored.version,
            });
        }
        request.version += 1;
        *stored = request.clone();
        Ok(request)
    }

    fn update_parent_status(
        &self,
        id: &ParentRequestId,
        status: ParentStatus,
    ) -> Result<Option<ParentRequest>, RepositoryError> {
        let mut guard = lock(&self.parents, "parent")?;
        Ok(guard.get_mut(id).map(|stored| {
            stored.status = status;
            stored.version += 1;
            stored.clone()
        }))
    }

    fn delete_parent(&self, id: &ParentRequestId) -> Result<bool, RepositoryError> {
        let mut guard = lock(&self.parents, "parent")?;
        Ok(guard.remove(id).is_some())
    }
}

impl TeacherDirectory for InMemoryStore {
    fn teacher_name(&self, id: &TeacherId) -> Result<Option<String>, RepositoryError> {
        let guard = lock(&self.teachers, "teacher")?;
        Ok(guard.get(id).cloned())
    }
}
