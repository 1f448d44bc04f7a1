//! Parent tuition requests.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{ParentRequest, ParentRequestDraft, ParentRequestId, ParentStatus};
pub use router::parent_router;
pub use service::{ParentRequestError, ParentRequestService};
