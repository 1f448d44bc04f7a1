//! State transitions of a vacancy's application list.
//!
//! Every method here mutates an in-memory copy only. Callers commit the result with a single
//! conditional update so that each check and the write it guards land atomically.

use chrono::{DateTime, Utc};

use super::domain::{Application, ApplicationId, ApplicationStatus, TeacherId};
use crate::workflows::outcome::ErrorKind;
use crate::workflows::vacancy::domain::{Vacancy, VacancyStatus};

/// Maximum number of applications a vacancy holds, whatever their status.
pub const MAX_APPLICATIONS: usize = 5;

/// Entity-state rules that end the current call without mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleViolation {
    #[error("vacancy is not open for applications")]
    NotOpen,
    #[error("teacher has already applied to this vacancy")]
    DuplicateApplication,
    #[error("vacancy has reached the maximum of {} applications", MAX_APPLICATIONS)]
    CapacityExceeded,
    #[error("vacancy already has an accepted application")]
    AlreadyResolved,
    #[error("cannot accept an application for a closed vacancy")]
    VacancyClosed,
    #[error("application {0} not found in vacancy")]
    UnknownApplication(ApplicationId),
}

impl LifecycleViolation {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotOpen => ErrorKind::NotOpen,
            Self::DuplicateApplication => ErrorKind::DuplicateApplication,
            Self::CapacityExceeded => ErrorKind::CapacityExceeded,
            Self::AlreadyResolved => ErrorKind::AlreadyResolved,
            Self::VacancyClosed => ErrorKind::VacancyClosed,
            Self::UnknownApplication(_) => ErrorKind::NotFound,
        }
    }
}

impl Vacancy {
    pub fn application(&self, id: &ApplicationId) -> Option<&Application> {
        self.applications.iter().find(|application| &application.id == id)
    }

    pub fn accepted_application(&self) -> Option<&Application> {
        self.applications
            .iter()
            .find(|application| application.status == ApplicationStatus::Accepted)
    }

    pub fn has_applied(&self, teacher_id: &TeacherId) -> bool {
        self.applications
            .iter()
            .any(|application| &application.teacher_id == teacher_id)
    }

    pub fn has_capacity(&self) -> bool {
        self.applications.len() < MAX_APPLICATIONS
    }

    /// Append a pending application for `teacher_id`.
    ///
    /// Checks run in a fixed order: open, duplicate, capacity.
    pub fn admit(
        &mut self,
        teacher_id: TeacherId,
        now: DateTime<Utc>,
    ) -> Result<Application, LifecycleViolation> {
        if self.status != VacancyStatus::Open {
            return Err(LifecycleViolation::NotOpen);
        }
        if self.has_applied(&teacher_id) {
            return Err(LifecycleViolation::DuplicateApplication);
        }
        if !self.has_capacity() {
            return Err(LifecycleViolation::CapacityExceeded);
        }

        let application = Application::pending(teacher_id, now);
        self.applications.push(application.clone());
        self.updated_at = now;
        Ok(application)
    }

    /// Accept `application_id` and close the vacancy in the same change.
    pub fn accept(
        &mut self,
        application_id: &ApplicationId,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleViolation> {
        let index = self.position(application_id)?;

        let other_accepted = self.applications.iter().any(|application| {
            application.status == ApplicationStatus::Accepted && &application.id != application_id
        });
        if other_accepted {
            return Err(LifecycleViolation::AlreadyResolved);
        }
        if self.status == VacancyStatus::Closed {
            return Err(LifecycleViolation::VacancyClosed);
        }

        self.applications[index].status = ApplicationStatus::Accepted;
        self.status = VacancyStatus::Closed;
        self.updated_at = now;
        Ok(())
    }

    /// Reject every pending application other than `keep`. Returns how many changed.
    pub fn reject_pending_except(&mut self, keep: &ApplicationId, now: DateTime<Utc>) -> usize {
        let mut rejected = 0;
        for application in &mut self.applications {
            if &application.id != keep && application.status == ApplicationStatus::Pending {
                application.status = ApplicationStatus::Rejected;
                rejected += 1;
            }
        }
        if rejected > 0 {
            self.updated_at = now;
        }
        rejected
    }

    /// Set a non-accepting status on one application. No cascade.
    pub(crate) fn mark_application(
        &mut self,
        application_id: &ApplicationId,
        status: ApplicationStatus,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleViolation> {
        debug_assert_ne!(status, ApplicationStatus::Accepted);
        let index = self.position(application_id)?;
        self.applications[index].status = status;
        self.updated_at = now;
        Ok(())
    }

    /// Admin open/close toggle. A vacancy that holds an accepted application stays closed.
    pub fn change_status(
        &mut self,
        status: VacancyStatus,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleViolation> {
        if status != VacancyStatus::Closed && self.accepted_application().is_some() {
            return Err(LifecycleViolation::AlreadyResolved);
        }
        self.status = status;
        self.updated_at = now;
        Ok(())
    }

    fn position(&self, application_id: &ApplicationId) -> Result<usize, LifecycleViolation> {
        self.applications
            .iter()
            .position(|application| &application.id == application_id)
            .ok_or_else(|| LifecycleViolation::UnknownApplication(application_id.clone()))
    }
}
