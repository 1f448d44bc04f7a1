//! Real-time notification fan-out.
//!
//! Publishing is fire-and-forget: delivery is at most once, subscribers that are not
//! connected miss the event, and a failed publish never changes the outcome of the call
//! that triggered it.

mod broadcast;

pub use broadcast::{event_router, BroadcastNotifier};

use serde::{Deserialize, Serialize};

use crate::workflows::parents::domain::{ParentRequestId, ParentStatus};
use crate::workflows::vacancy::applications::domain::{ApplicationId, TeacherId};
use crate::workflows::vacancy::domain::VacancyId;

/// Event payloads pushed to connected clients as `{ "type": ..., "data": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationEvent {
    #[serde(rename_all = "camelCase")]
    NewApplication {
        teacher_id: TeacherId,
        teacher_name: String,
        vacancy_title: String,
        vacancy_id: VacancyId,
        application_id: ApplicationId,
    },
    #[serde(rename_all = "camelCase")]
    ParentStatusUpdated {
        parent_id: ParentRequestId,
        new_status: ParentStatus,
        vacancy_id: VacancyId,
    },
}

impl NotificationEvent {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NewApplication { .. } => "NEW_APPLICATION",
            Self::ParentStatusUpdated { .. } => "PARENT_STATUS_UPDATED",
        }
    }
}

/// Outbound notification hook.
pub trait NotificationPublisher: Send + Sync {
    /// Hand the event to the channel. Returns how many subscribers it reached.
    fn publish(&self, event: NotificationEvent) -> Result<usize, NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Publish and log the outcome. Failures stop here.
pub fn publish_best_effort<N>(notifier: &N, event: NotificationEvent)
where
    N: NotificationPublisher + ?Sized,
{
    let label = event.label();
    match notifier.publish(event) {
        Ok(receivers) => tracing::debug!(event = label, receivers, "notification published"),
        Err(err) => tracing::warn!(event = label, error = %err, "notification publish failed"),
    }
}
