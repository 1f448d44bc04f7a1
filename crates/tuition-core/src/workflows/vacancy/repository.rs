use super::applications::domain::TeacherId;
use super::domain::{Vacancy, VacancyId};
use crate::store::RepositoryError;

/// Document storage for vacancies and their nested applications.
///
/// Every method is atomic for the single vacancy it touches and nothing wider.
pub trait VacancyRepository: Send + Sync {
    fn insert_vacancy(&self, vacancy: Vacancy) -> Result<Vacancy, RepositoryError>;
    fn find_vacancy(&self, id: &VacancyId) -> Result<Option<Vacancy>, RepositoryError>;
    fn list_vacancies(&self) -> Result<Vec<Vacancy>, RepositoryError>;
    /// Replace the stored vacancy only if its version still equals `vacancy.version`.
    ///
    /// Returns the committed copy with its version bumped, `VersionConflict` when another
    /// writer got there first, or `NotFound` when the vacancy was deleted.
    fn conditional_update_vacancy(&self, vacancy: Vacancy) -> Result<Vacancy, RepositoryError>;
    fn delete_vacancy(&self, id: &VacancyId) -> Result<bool, RepositoryError>;
}

/// Read-only lookup of teacher display names owned by the accounts service.
pub trait TeacherDirectory: Send + Sync {
    fn teacher_name(&self, id: &TeacherId) -> Result<Option<String>, RepositoryError>;
}
