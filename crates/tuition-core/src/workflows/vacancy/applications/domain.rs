use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflows::vacancy::domain::VacancySummary;

/// Identifier of an application, unique within its vacancy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-owning reference to a teacher account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeacherId(pub String);

impl fmt::Display for TeacherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// A teacher's bid for a vacancy. Lives only inside its vacancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub teacher_id: TeacherId,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

impl Application {
    pub fn pending(teacher_id: TeacherId, applied_at: DateTime<Utc>) -> Self {
        Self {
            id: ApplicationId::generate(),
            teacher_id,
            status: ApplicationStatus::Pending,
            applied_at,
        }
    }
}

/// Application populated with the teacher's display name for admin screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicantView {
    pub application_id: ApplicationId,
    pub teacher_id: TeacherId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

impl ApplicantView {
    pub fn new(application: &Application, teacher_name: Option<String>) -> Self {
        Self {
            application_id: application.id.clone(),
            teacher_id: application.teacher_id.clone(),
            teacher_name,
            status: application.status,
            applied_at: application.applied_at,
        }
    }
}

/// One of a teacher's own applications with the posting it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherApplicationView {
    pub application_id: ApplicationId,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub vacancy: VacancySummary,
}
