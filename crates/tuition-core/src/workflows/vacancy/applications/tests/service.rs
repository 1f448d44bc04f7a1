use super::common::*;
use std::sync::Arc;

use crate::notifications::NotificationEvent;
use crate::store::InMemoryStore;
use crate::workflows::outcome::ErrorKind;
use crate::workflows::parents::domain::ParentStatus;
use crate::workflows::parents::repository::ParentRequestRepository;
use crate::workflows::vacancy::applications::domain::{ApplicationId, ApplicationStatus};
use crate::workflows::vacancy::applications::{
    ApplicationServiceError, LifecycleViolation, VacancyApplicationService, UNKNOWN_TEACHER,
};
use crate::workflows::vacancy::domain::{VacancyId, VacancyStatus};
use crate::workflows::vacancy::repository::VacancyRepository;

#[test]
fn apply_appends_a_pending_application_and_announces_it() {
    let store = InMemoryStore::default();
    store.register_teacher(teacher(1), "Bikash Tamang");
    let vacancy = seed_vacancy(&store, None);
    let (service, notifier) = service_over(Arc::new(store.clone()));

    let application = service.apply(&vacancy.id, teacher(1)).expect("applied");

    assert_eq!(application.status, ApplicationStatus::Pending);
    let stored = current(&store, &vacancy.id);
    assert_eq!(stored.applications, vec![application.clone()]);
    assert_eq!(stored.version, vacancy.version + 1);
    assert_eq!(
        notifier.events(),
        vec![NotificationEvent::NewApplication {
            teacher_id: teacher(1),
            teacher_name: "Bikash Tamang".to_string(),
            vacancy_title: "Grade 7 Maths".to_string(),
            vacancy_id: vacancy.id.clone(),
            application_id: application.id,
        }]
    );
}

#[test]
fn apply_names_unregistered_teachers_unknown() {
    let store = InMemoryStore::default();
    let vacancy = seed_vacancy(&store, None);
    let (service, notifier) = service_over(Arc::new(store));

    service.apply(&vacancy.id, teacher(4)).expect("applied");

    match notifier.events().as_slice() {
        [NotificationEvent::NewApplication { teacher_name, .. }] => {
            assert_eq!(teacher_name, UNKNOWN_TEACHER)
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

#[test]
fn duplicate_apply_leaves_the_count_unchanged() {
    let store = InMemoryStore::default();
    let vacancy = seed_vacancy(&store, None);
    let (service, notifier) = service_over(Arc::new(store.clone()));

    service.apply(&vacancy.id, teacher(1)).expect("first apply");
    let err = service
        .apply(&vacancy.id, teacher(1))
        .expect_err("duplicate rejected");

    assert!(matches!(
        err,
        ApplicationServiceError::Lifecycle(LifecycleViolation::DuplicateApplication)
    ));
    assert_eq!(err.kind(), ErrorKind::DuplicateApplication);
    assert_eq!(current(&store, &vacancy.id).applications.len(), 1);
    assert_eq!(notifier.events().len(), 1);
}

#[test]
fn apply_reports_missing_closed_and_full_vacancies() {
    let store = InMemoryStore::default();
    let full = seed_vacancy(&store, None);
    seed_applications(&store, &full.id, 5);
    let closed = seed_vacancy(&store, None);
    let mut closing = current(&store, &closed.id);
    closing.status = VacancyStatus::Closed;
    store.conditional_update_vacancy(closing).expect("closed");
    let (service, _) = service_over(Arc::new(store.clone()));

    let missing = service
        .apply(&VacancyId("missing".to_string()), teacher(9))
        .expect_err("missing");
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let not_open = service.apply(&closed.id, teacher(9)).expect_err("closed");
    assert_eq!(not_open.kind(), ErrorKind::NotOpen);

    let full_err = service.apply(&full.id, teacher(9)).expect_err("full");
    assert_eq!(full_err.kind(), ErrorKind::CapacityExceeded);
    assert_eq!(current(&store, &full.id).applications.len(), 5);
}

#[test]
fn notification_failure_does_not_fail_apply() {
    let store = InMemoryStore::default();
    let vacancy = seed_vacancy(&store, None);
    let service = VacancyApplicationService::new(
        Arc::new(store.clone()),
        Arc::new(FailingNotifier),
        config(),
    );

    let application = service.apply(&vacancy.id, teacher(1)).expect("applied");

    assert_eq!(
        current(&store, &vacancy.id).applications,
        vec![application]
    );
}

#[test]
fn lost_race_replays_checks_against_fresh_state() {
    let store = InMemoryStore::default();
    let vacancy = seed_vacancy(&store, None);
    seed_applications(&store, &vacancy.id, 4);
    let racing = FaultyStore::new(store.clone()).with_rival(teacher(50));
    let (service, _) = service_over(Arc::new(racing));

    let err = service
        .apply(&vacancy.id, teacher(60))
        .expect_err("rival took the last slot");

    assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
    let stored = current(&store, &vacancy.id);
    assert_eq!(stored.applications.len(), 5);
    assert!(stored.has_applied(&teacher(50)));
    assert!(!stored.has_applied(&teacher(60)));
}

#[test]
fn lost_race_with_room_left_still_commits() {
    let store = InMemoryStore::default();
    let vacancy = seed_vacancy(&store, None);
    seed_applications(&store, &vacancy.id, 2);
    let racing = FaultyStore::new(store.clone()).with_rival(teacher(50));
    let (service, _) = service_over(Arc::new(racing));

    service.apply(&vacancy.id, teacher(60)).expect("applied");

    let stored = current(&store, &vacancy.id);
    assert_eq!(stored.applications.len(), 4);
    assert!(stored.has_applied(&teacher(50)));
    assert!(stored.has_applied(&teacher(60)));
}

#[test]
fn storage_outage_surfaces_as_persistence_failure() {
    let store = InMemoryStore::default();
    let vacancy = seed_vacancy(&store, None);
    let (service, notifier) = service_over(Arc::new(FaultyStore::new(store).unavailable()));

    let err = service
        .apply(&vacancy.id, teacher(1))
        .expect_err("store offline");
    assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
    assert!(notifier.events().is_empty());
}

#[tokio::test]
async fn reject_changes_only_the_target_application() {
    let store = InMemoryStore::default();
    let parent_request = seed_parent(&store);
    let vacancy = seed_vacancy(&store, Some(parent_request.id.clone()));
    let applications = seed_applications(&store, &vacancy.id, 3);
    let (service, notifier) = service_over(Arc::new(store.clone()));

    let updated = service
        .resolve(&vacancy.id, &applications[1].id, ApplicationStatus::Rejected)
        .await
        .expect("rejected");

    let statuses: Vec<_> = updated.applications.iter().map(|app| app.status).collect();
    assert_eq!(
        statuses,
        vec![
            ApplicationStatus::Pending,
            ApplicationStatus::Rejected,
            ApplicationStatus::Pending
        ]
    );
    assert_eq!(updated.status, VacancyStatus::Open);
    assert_eq!(parent(&store, &parent_request.id).status, ParentStatus::New);
    assert!(notifier.events().is_empty());
}

#[tokio::test]
async fn accept_cascades_through_vacancy_and_parent() {
    let store = InMemoryStore::default();
    let parent_request = seed_parent(&store);
    let vacancy = seed_vacancy(&store, Some(parent_request.id.clone()));
    let applications = seed_applications(&store, &vacancy.id, 3);
    let (service, notifier) = service_over(Arc::new(store.clone()));

    let resolved = service
        .resolve(&vacancy.id, &applications[1].id, ApplicationStatus::Accepted)
        .await
        .expect("accepted");

    assert_eq!(resolved.status, VacancyStatus::Closed);
    let statuses: Vec<_> = resolved.applications.iter().map(|app| app.status).collect();
    assert_eq!(
        statuses,
        vec![
            ApplicationStatus::Rejected,
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected
        ]
    );
    assert_eq!(resolved, current(&store, &vacancy.id));
    assert_eq!(parent(&store, &parent_request.id).status, ParentStatus::Done);
    assert_eq!(
        notifier.events(),
        vec![NotificationEvent::ParentStatusUpdated {
            parent_id: parent_request.id.clone(),
            new_status: ParentStatus::Done,
            vacancy_id: vacancy.id.clone(),
        }]
    );

    let before = current(&store, &vacancy.id);
    let err = service
        .resolve(&vacancy.id, &applications[0].id, ApplicationStatus::Accepted)
        .await
        .expect_err("sibling cannot be accepted");
    assert_eq!(err.kind(), ErrorKind::AlreadyResolved);
    assert_eq!(current(&store, &vacancy.id), before);
}

#[tokio::test]
async fn accepting_the_winner_again_is_vacancy_closed() {
    let store = InMemoryStore::default();
    let vacancy = seed_vacancy(&store, None);
    let applications = seed_applications(&store, &vacancy.id, 1);
    let (service, _) = service_over(Arc::new(store.clone()));

    service
        .resolve(&vacancy.id, &applications[0].id, ApplicationStatus::Accepted)
        .await
        .expect("accepted");
    let err = service
        .resolve(&vacancy.id, &applications[0].id, ApplicationStatus::Accepted)
        .await
        .expect_err("already closed");

    assert_eq!(err.kind(), ErrorKind::VacancyClosed);
}

#[tokio::test]
async fn accept_that_loses_the_race_replays_against_the_winner() {
    let store = InMemoryStore::default();
    let vacancy = seed_vacancy(&store, None);
    let applications = seed_applications(&store, &vacancy.id, 2);
    let racing = FaultyStore::new(store.clone()).with_rival_acceptance(applications[0].id.clone());
    let (service, notifier) = service_over(Arc::new(racing));

    let err = service
        .resolve(&vacancy.id, &applications[1].id, ApplicationStatus::Accepted)
        .await
        .expect_err("rival accepted first");

    assert_eq!(err.kind(), ErrorKind::AlreadyResolved);
    let stored = current(&store, &vacancy.id);
    assert_eq!(stored.status, VacancyStatus::Closed);
    let statuses: Vec<_> = stored.applications.iter().map(|app| app.status).collect();
    assert_eq!(
        statuses,
        vec![ApplicationStatus::Accepted, ApplicationStatus::Pending]
    );
    assert!(notifier.events().is_empty());
}

#[tokio::test]
async fn resolve_reports_unknown_vacancies_and_applications() {
    let store = InMemoryStore::default();
    let vacancy = seed_vacancy(&store, None);
    let (service, _) = service_over(Arc::new(store));

    let err = service
        .resolve(
            &VacancyId("missing".to_string()),
            &ApplicationId("missing".to_string()),
            ApplicationStatus::Accepted,
        )
        .await
        .expect_err("no vacancy");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = service
        .resolve(
            &vacancy.id,
            &ApplicationId("missing".to_string()),
            ApplicationStatus::Rejected,
        )
        .await
        .expect_err("no application");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn sibling_rejection_failure_keeps_the_acceptance() {
    let store = InMemoryStore::default();
    let vacancy = seed_vacancy(&store, None);
    let applications = seed_applications(&store, &vacancy.id, 2);
    let faulty = FaultyStore::new(store.clone()).failing_vacancy_writes_after(1);
    let (service, _) = service_over(Arc::new(faulty));

    let resolved = service
        .resolve(&vacancy.id, &applications[0].id, ApplicationStatus::Accepted)
        .await
        .expect("primary effect committed");

    assert_eq!(resolved.status, VacancyStatus::Closed);
    let statuses: Vec<_> = current(&store, &vacancy.id)
        .applications
        .iter()
        .map(|app| app.status)
        .collect();
    assert_eq!(
        statuses,
        vec![ApplicationStatus::Accepted, ApplicationStatus::Pending]
    );
}

#[tokio::test]
async fn dangling_parent_reference_is_skipped() {
    let store = InMemoryStore::default();
    let parent_request = seed_parent(&store);
    let vacancy = seed_vacancy(&store, Some(parent_request.id.clone()));
    let applications = seed_applications(&store, &vacancy.id, 1);
    store.delete_parent(&parent_request.id).expect("parent deleted");
    let (service, notifier) = service_over(Arc::new(store.clone()));

    let resolved = service
        .resolve(&vacancy.id, &applications[0].id, ApplicationStatus::Accepted)
        .await
        .expect("accepted");

    assert_eq!(resolved.status, VacancyStatus::Closed);
    assert!(resolved.pending_parent_sync.is_none());
    assert!(notifier.events().is_empty());
}
