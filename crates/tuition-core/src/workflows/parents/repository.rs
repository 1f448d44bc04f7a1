use super::domain::{ParentRequest, ParentRequestId, ParentStatus};
use crate::store::RepositoryError;

/// Document storage for parent tuition requests.
pub trait ParentRequestRepository: Send + Sync {
    /// Persist a new request, assigning the next free `application_number` atomically.
    fn insert_parent(&self, request: ParentRequest) -> Result<ParentRequest, RepositoryError>;
    fn find_parent(&self, id: &ParentRequestId) -> Result<Option<ParentRequest>, RepositoryError>;
    fn list_parents(&self) -> Result<Vec<ParentRequest>, RepositoryError>;
    /// Version-checked replace, same contract as the vacancy variant.
    fn conditional_update_parent(
        &self,
        request: ParentRequest,
    ) -> Result<ParentRequest, RepositoryError>;
    /// Unconditional single-field status write. `Ok(None)` when the request is gone.
    fn update_parent_status(
        &self,
        id: &ParentRequestId,
        status: ParentStatus,
    ) -> Result<Option<ParentRequest>, RepositoryError>;
    fn delete_parent(&self, id: &ParentRequestId) -> Result<bool, RepositoryError>;
}
