//! Persistence gateway contracts shared by every workflow, and the in-memory gateway.

mod memory;

pub use memory::InMemoryStore;

use crate::workflows::parents::repository::ParentRequestRepository;
use crate::workflows::vacancy::repository::{TeacherDirectory, VacancyRepository};

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("stale write: expected version {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("repository call timed out")]
    Timeout,
}

impl RepositoryError {
    /// Failures a client may simply retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Timeout | Self::VersionConflict { .. }
        )
    }
}

/// Everything the lifecycle engine needs from storage in one bound.
pub trait PersistenceGateway:
    VacancyRepository + ParentRequestRepository + TeacherDirectory
{
}

impl<T> PersistenceGateway for T where
    T: VacancyRepository + ParentRequestRepository + TeacherDirectory
{
}

/// Errors that can report a lost optimistic-concurrency race.
pub trait ConflictAware {
    fn is_version_conflict(&self) -> bool;
}

impl ConflictAware for RepositoryError {
    fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Replay a read-check-write sequence while it keeps losing version races.
///
/// `retries` bounds the replays, so the operation runs at most `retries + 1` times. The last
/// conflict is returned to the caller once the budget is spent.
pub fn retry_on_conflict<T, E, F>(retries: u32, mut operation: F) -> Result<T, E>
where
    E: ConflictAware,
    F: FnMut() -> Result<T, E>,
{
    let mut replays = 0;
    loop {
        match operation() {
            Err(err) if err.is_version_conflict() && replays < retries => {
                replays += 1;
                tracing::debug!(replays, "version conflict, replaying against fresh state");
            }
            outcome => return outcome,
        }
    }
}
