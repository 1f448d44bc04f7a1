//! Parent request follow-up of an accepted application.
//!
//! The vacancy commit is authoritative. The parent write that follows it is retried with
//! backoff, and when it still fails a marker is left on the vacancy so a later
//! reconciliation pass can finish the job.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;

use super::service::{ApplicationServiceError, VacancyApplicationService};
use crate::notifications::{publish_best_effort, NotificationEvent, NotificationPublisher};
use crate::store::{retry_on_conflict, PersistenceGateway, RepositoryError};
use crate::workflows::parents::domain::{ParentRequestId, ParentStatus};
use crate::workflows::vacancy::domain::{PendingParentSync, Vacancy, VacancyId};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Vacancies that carried a marker.
    pub examined: usize,
    pub applied: usize,
    pub still_pending: usize,
    /// Markers cleared because their parent request no longer exists.
    pub dropped: usize,
}

enum ParentWrite {
    Applied,
    Missing,
}

impl<S, N> VacancyApplicationService<S, N>
where
    S: PersistenceGateway + 'static,
    N: NotificationPublisher + 'static,
{
    /// Mark the vacancy's parent request done after an acceptance.
    pub(super) async fn sync_parent(&self, vacancy: Vacancy, parent_id: ParentRequestId) -> Vacancy {
        let target = ParentStatus::Done;
        match self.write_parent_with_backoff(&parent_id, target).await {
            Ok(ParentWrite::Applied) => {
                tracing::info!(
                    vacancy_id = %vacancy.id,
                    parent_id = %parent_id,
                    status = target.label(),
                    "parent request status updated"
                );
                self.announce_parent_status(&parent_id, target, &vacancy.id);
                vacancy
            }
            Ok(ParentWrite::Missing) => {
                tracing::warn!(
                    vacancy_id = %vacancy.id,
                    parent_id = %parent_id,
                    "linked parent request no longer exists, skipping cascade"
                );
                vacancy
            }
            Err(err) => {
                tracing::error!(
                    vacancy_id = %vacancy.id,
                    parent_id = %parent_id,
                    attempts = self.config.parent_sync.attempts,
                    error = %err,
                    "parent status cascade failed, leaving reconciliation marker"
                );
                let marker = PendingParentSync {
                    parent_id,
                    target_status: target,
                    attempts: self.config.parent_sync.attempts.max(1),
                    last_error: err.to_string(),
                    recorded_at: Utc::now(),
                };
                self.record_marker(vacancy, marker)
            }
        }
    }

    /// Retry every outstanding parent cascade once.
    pub async fn reconcile_parent_sync(&self) -> Result<ReconcileReport, RepositoryError> {
        let mut report = ReconcileReport::default();
        let pending: Vec<(VacancyId, PendingParentSync)> = self
            .store
            .list_vacancies()?
            .into_iter()
            .filter_map(|vacancy| vacancy.pending_parent_sync.map(|marker| (vacancy.id, marker)))
            .collect();

        for (vacancy_id, marker) in pending {
            report.examined += 1;
            match self
                .store
                .update_parent_status(&marker.parent_id, marker.target_status)
            {
                Ok(Some(_)) => {
                    report.applied += 1;
                    tracing::info!(
                        vacancy_id = %vacancy_id,
                        parent_id = %marker.parent_id,
                        "reconciled parent request status"
                    );
                    self.clear_marker(&vacancy_id, &marker);
                    self.announce_parent_status(&marker.parent_id, marker.target_status, &vacancy_id);
                }
                Ok(None) => {
                    report.dropped += 1;
                    tracing::warn!(
                        vacancy_id = %vacancy_id,
                        parent_id = %marker.parent_id,
                        "dropping reconciliation marker for missing parent request"
                    );
                    self.clear_marker(&vacancy_id, &marker);
                }
                Err(err) => {
                    report.still_pending += 1;
                    tracing::warn!(
                        vacancy_id = %vacancy_id,
                        parent_id = %marker.parent_id,
                        error = %err,
                        "parent request still unreachable"
                    );
                    self.bump_marker(&vacancy_id, &marker, &err);
                }
            }
        }

        Ok(report)
    }

    /// Run reconciliation on a fixed interval. A zero interval disables it.
    pub fn spawn_parent_reconciler(self: &Arc<Self>, interval: Duration) -> Option<JoinHandle<()>> {
        if interval.is_zero() {
            return None;
        }
        let service = Arc::clone(self);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match service.reconcile_parent_sync().await {
                    Ok(report) if report.examined > 0 => {
                        tracing::info!(
                            examined = report.examined,
                            applied = report.applied,
                            still_pending = report.still_pending,
                            dropped = report.dropped,
                            "parent reconciliation pass finished"
                        );
                    }
                    Ok(_) => {}
                    Err(err) => tracing::warn!(error = %err, "parent reconciliation pass failed"),
                }
            }
        }))
    }

    async fn write_parent_with_backoff(
        &self,
        parent_id: &ParentRequestId,
        status: ParentStatus,
    ) -> Result<ParentWrite, RepositoryError> {
        let attempts = self.config.parent_sync.attempts.max(1);
        let mut delay = self.config.parent_sync.backoff;
        let mut attempt = 1;
        loop {
            match self.store.update_parent_status(parent_id, status) {
                Ok(Some(_)) => return Ok(ParentWrite::Applied),
                Ok(None) => return Ok(ParentWrite::Missing),
                Err(err) if attempt < attempts => {
                    tracing::warn!(
                        parent_id = %parent_id,
                        attempt,
                        error = %err,
                        "parent status write failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn record_marker(&self, committed: Vacancy, marker: PendingParentSync) -> Vacancy {
        let outcome = retry_on_conflict(self.config.conflict_retries, || {
            let mut vacancy = self.load(&committed.id)?;
            vacancy.pending_parent_sync = Some(marker.clone());
            Ok::<_, ApplicationServiceError>(self.store.conditional_update_vacancy(vacancy)?)
        });
        match outcome {
            Ok(vacancy) => vacancy,
            Err(err) => {
                tracing::error!(
                    vacancy_id = %committed.id,
                    parent_id = %marker.parent_id,
                    error = %err,
                    "reconciliation marker could not be persisted"
                );
                committed
            }
        }
    }

    fn clear_marker(&self, vacancy_id: &VacancyId, marker: &PendingParentSync) {
        self.rewrite_marker(vacancy_id, marker, |_| None);
    }

    fn bump_marker(&self, vacancy_id: &VacancyId, marker: &PendingParentSync, err: &RepositoryError) {
        let last_error = err.to_string();
        self.rewrite_marker(vacancy_id, marker, |current| {
            Some(PendingParentSync {
                attempts: current.attempts + 1,
                last_error: last_error.clone(),
                ..current.clone()
            })
        });
    }

    /// Replace the marker only while it still targets the same parent request.
    fn rewrite_marker<F>(&self, vacancy_id: &VacancyId, marker: &PendingParentSync, next: F)
    where
        F: Fn(&PendingParentSync) -> Option<PendingParentSync>,
    {
        let outcome = retry_on_conflict(self.config.conflict_retries, || {
            let mut vacancy = self.load(vacancy_id)?;
            let current = match &vacancy.pending_parent_sync {
                Some(current) if current.parent_id == marker.parent_id => current.clone(),
                _ => return Ok(()),
            };
            vacancy.pending_parent_sync = next(&current);
            self.store.conditional_update_vacancy(vacancy)?;
            Ok::<_, ApplicationServiceError>(())
        });
        if let Err(err) = outcome {
            tracing::warn!(
                vacancy_id = %vacancy_id,
                error = %err,
                "failed to update reconciliation marker"
            );
        }
    }

    fn announce_parent_status(
        &self,
        parent_id: &ParentRequestId,
        status: ParentStatus,
        vacancy_id: &VacancyId,
    ) {
        publish_best_effort(
            self.notifier.as_ref(),
            NotificationEvent::ParentStatusUpdated {
                parent_id: parent_id.clone(),
                new_status: status,
                vacancy_id: vacancy_id.clone(),
            },
        );
    }
}
