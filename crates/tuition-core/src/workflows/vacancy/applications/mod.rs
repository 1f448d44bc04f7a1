//! Teacher applications to vacancies: intake, admin resolution, and the acceptance cascade.

pub mod cascade;
pub mod domain;
pub mod lifecycle;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use cascade::ReconcileReport;
pub use domain::{
    ApplicantView, Application, ApplicationId, ApplicationStatus, TeacherApplicationView,
    TeacherId,
};
pub use lifecycle::{LifecycleViolation, MAX_APPLICATIONS};
pub use router::application_router;
pub use service::{ApplicationServiceError, VacancyApplicationService, UNKNOWN_TEACHER};
