use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::applications::domain::{ApplicantView, Application};
use crate::workflows::parents::domain::{ParentRequestId, ParentStatus};

/// Identifier wrapper for vacancy postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VacancyId(pub String);

impl VacancyId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for VacancyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the admin account that owns a posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdminId(pub String);

impl fmt::Display for AdminId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacancyStatus {
    Open,
    Closed,
    Pending,
}

impl VacancyStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Pending => "pending",
        }
    }
}

/// Teacher gender requested by a posting or a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenderPreference {
    Male,
    Female,
    #[default]
    Any,
}

/// Marker left on a vacancy whose parent status cascade has not landed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingParentSync {
    pub parent_id: ParentRequestId,
    pub target_status: ParentStatus,
    pub attempts: u32,
    pub last_error: String,
    pub recorded_at: DateTime<Utc>,
}

pub(crate) const UNSPECIFIED: &str = "Not specified";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vacancy {
    pub id: VacancyId,
    pub title: String,
    pub subject: String,
    pub class_level: String,
    pub time: String,
    pub location: String,
    pub gender: GenderPreference,
    pub description: String,
    pub salary: String,
    pub status: VacancyStatus,
    pub featured: bool,
    pub created_by: AdminId,
    pub parent_id: Option<ParentRequestId>,
    pub admin_last_viewed_applicants_at: Option<DateTime<Utc>>,
    pub applications: Vec<Application>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by the store on every committed write; conditional updates compare against it.
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_parent_sync: Option<PendingParentSync>,
}

impl Vacancy {
    /// Build a freshly opened posting from an admin draft.
    pub fn open(draft: VacancyDraft, created_by: AdminId, now: DateTime<Utc>) -> Self {
        Self {
            id: VacancyId::generate(),
            title: draft.title.trim().to_string(),
            subject: draft.subject.trim().to_string(),
            class_level: or_unspecified(draft.class_level),
            time: or_unspecified(draft.time),
            location: or_unspecified(draft.location),
            gender: draft.gender.unwrap_or_default(),
            description: draft.description.trim().to_string(),
            salary: draft.salary.trim().to_string(),
            status: VacancyStatus::Open,
            featured: draft.featured,
            created_by,
            parent_id: draft.parent_id,
            admin_last_viewed_applicants_at: None,
            applications: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
            pending_parent_sync: None,
        }
    }

    pub fn summary(&self) -> VacancySummary {
        VacancySummary {
            id: self.id.clone(),
            title: self.title.clone(),
            subject: self.subject.clone(),
            class_level: self.class_level.clone(),
            time: self.time.clone(),
            location: self.location.clone(),
            gender: self.gender,
            description: self.description.clone(),
            salary: self.salary.clone(),
            status: self.status,
            featured: self.featured,
            applicant_count: self.applications.len(),
        }
    }

    /// Apply the descriptive subset of a patch. Status and applications are never touched here.
    pub fn apply_patch(&mut self, patch: VacancyPatch, now: DateTime<Utc>) {
        let VacancyPatch {
            title,
            subject,
            class_level,
            time,
            location,
            gender,
            description,
            salary,
            featured,
        } = patch;

        if let Some(title) = title {
            self.title = title.trim().to_string();
        }
        if let Some(subject) = subject {
            self.subject = subject.trim().to_string();
        }
        if let Some(class_level) = class_level {
            self.class_level = or_unspecified(Some(class_level));
        }
        if let Some(time) = time {
            self.time = or_unspecified(Some(time));
        }
        if let Some(location) = location {
            self.location = or_unspecified(Some(location));
        }
        if let Some(gender) = gender {
            self.gender = gender;
        }
        if let Some(description) = description {
            self.description = description.trim().to_string();
        }
        if let Some(salary) = salary {
            self.salary = salary.trim().to_string();
        }
        if let Some(featured) = featured {
            self.featured = featured;
        }
        self.updated_at = now;
    }
}

fn or_unspecified(value: Option<String>) -> String {
    match value.map(|value| value.trim().to_string()) {
        Some(value) if !value.is_empty() => value,
        _ => UNSPECIFIED.to_string(),
    }
}

/// Admin input for a new posting.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VacancyDraft {
    pub title: String,
    pub subject: String,
    #[serde(default)]
    pub class_level: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub gender: Option<GenderPreference>,
    pub description: String,
    pub salary: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub parent_id: Option<ParentRequestId>,
}

impl VacancyDraft {
    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("title", &self.title),
            ("subject", &self.subject),
            ("description", &self.description),
            ("salary", &self.salary),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Partial update of the descriptive fields of a posting.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VacancyPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub class_level: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub gender: Option<GenderPreference>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
}

impl VacancyPatch {
    /// Required fields may be changed but not blanked.
    pub fn blanked_fields(&self) -> Vec<&'static str> {
        [
            ("title", &self.title),
            ("subject", &self.subject),
            ("description", &self.description),
            ("salary", &self.salary),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_some_and(|value| value.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }
}

/// Public listing shape used by featured, available, and per-teacher views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VacancySummary {
    pub id: VacancyId,
    pub title: String,
    pub subject: String,
    pub class_level: String,
    pub time: String,
    pub location: String,
    pub gender: GenderPreference,
    pub description: String,
    pub salary: String,
    pub status: VacancyStatus,
    pub featured: bool,
    pub applicant_count: usize,
}

/// A vacancy with its applications populated with teacher details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VacancyView {
    #[serde(flatten)]
    pub summary: VacancySummary,
    pub created_by: AdminId,
    pub parent_id: Option<ParentRequestId>,
    pub admin_last_viewed_applicants_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub applications: Vec<ApplicantView>,
}

impl VacancyView {
    pub fn new(vacancy: &Vacancy, applications: Vec<ApplicantView>) -> Self {
        Self {
            summary: vacancy.summary(),
            created_by: vacancy.created_by.clone(),
            parent_id: vacancy.parent_id.clone(),
            admin_last_viewed_applicants_at: vacancy.admin_last_viewed_applicants_at,
            created_at: vacancy.created_at,
            updated_at: vacancy.updated_at,
            applications,
        }
    }
}
