use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflows::vacancy::domain::{GenderPreference, VacancyId};

/// Rejections after which a request is given up on.
pub const REJECTION_LIMIT: u32 = 5;

/// Subjects a single request may ask for.
pub const MAX_SUBJECTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentRequestId(pub String);

impl ParentRequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ParentRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentStatus {
    New,
    Pending,
    Done,
    NotDone,
}

impl ParentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ParentStatus::New => "new",
            ParentStatus::Pending => "pending",
            ParentStatus::Done => "done",
            ParentStatus::NotDone => "not_done",
        }
    }
}

/// Link between a request and the vacancy created to fill it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VacancyLink {
    pub vacancy_id: Option<VacancyId>,
    pub rejected_count: u32,
    pub linked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRequest {
    pub id: ParentRequestId,
    /// Human-facing sequence number. Zero until the store assigns one on insert.
    pub application_number: u64,
    pub parent_name: String,
    pub phone: String,
    pub address: String,
    pub salary: Option<String>,
    pub preferred_teacher: GenderPreference,
    pub grade: String,
    pub subjects: Vec<String>,
    pub preferred_time: String,
    pub submitted_at: DateTime<Utc>,
    pub status: ParentStatus,
    pub vacancy_details: VacancyLink,
    pub version: u64,
}

impl ParentRequest {
    pub fn submitted(draft: ParentRequestDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: ParentRequestId::generate(),
            application_number: 0,
            parent_name: draft.parent_name.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            address: draft.address.trim().to_string(),
            salary: draft
                .salary
                .map(|salary| salary.trim().to_string())
                .filter(|salary| !salary.is_empty()),
            preferred_teacher: draft.preferred_teacher,
            grade: draft.grade.trim().to_string(),
            subjects: draft
                .subjects
                .into_iter()
                .map(|subject| subject.trim().to_string())
                .collect(),
            preferred_time: draft.preferred_time.trim().to_string(),
            submitted_at: now,
            status: ParentStatus::New,
            vacancy_details: VacancyLink::default(),
            version: 0,
        }
    }

    /// Count one more teacher rejection; the fifth one gives the request up.
    pub fn record_rejection(&mut self) {
        self.vacancy_details.rejected_count += 1;
        if self.vacancy_details.rejected_count >= REJECTION_LIMIT {
            self.status = ParentStatus::NotDone;
        }
    }

    pub fn link_vacancy(
        &mut self,
        vacancy_id: VacancyId,
        status: Option<ParentStatus>,
        now: DateTime<Utc>,
    ) {
        self.vacancy_details.vacancy_id = Some(vacancy_id);
        self.vacancy_details.linked_at = Some(now);
        if let Some(status) = status {
            self.status = status;
        }
    }
}

/// Parent-submitted tuition request form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRequestDraft {
    pub parent_name: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub salary: Option<String>,
    pub preferred_teacher: GenderPreference,
    pub grade: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    pub preferred_time: String,
}

impl ParentRequestDraft {
    /// Human-readable validation problems, empty when the draft is acceptable.
    pub fn problems(&self) -> Vec<String> {
        let mut problems: Vec<String> = [
            ("parent_name", &self.parent_name),
            ("phone", &self.phone),
            ("address", &self.address),
            ("grade", &self.grade),
            ("preferred_time", &self.preferred_time),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| format!("{name} is required"))
        .collect();

        let subjects = self
            .subjects
            .iter()
            .filter(|subject| !subject.trim().is_empty())
            .count();
        if subjects == 0 || subjects > MAX_SUBJECTS || subjects != self.subjects.len() {
            problems.push(format!("select between 1 and {MAX_SUBJECTS} subjects"));
        }

        problems
    }
}
