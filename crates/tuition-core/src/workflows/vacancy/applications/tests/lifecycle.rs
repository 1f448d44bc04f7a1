use super::common::*;
use chrono::Utc;

use crate::store::InMemoryStore;
use crate::workflows::outcome::ErrorKind;
use crate::workflows::vacancy::applications::domain::{ApplicationId, ApplicationStatus};
use crate::workflows::vacancy::applications::lifecycle::{LifecycleViolation, MAX_APPLICATIONS};
use crate::workflows::vacancy::domain::VacancyStatus;

fn open_vacancy() -> crate::workflows::vacancy::domain::Vacancy {
    let store = InMemoryStore::default();
    seed_vacancy(&store, None)
}

#[test]
fn admit_checks_open_before_duplicate_before_capacity() {
    let mut vacancy = open_vacancy();
    for index in 0..MAX_APPLICATIONS {
        vacancy.admit(teacher(index), Utc::now()).expect("admitted");
    }

    assert_eq!(
        vacancy.admit(teacher(0), Utc::now()),
        Err(LifecycleViolation::DuplicateApplication)
    );
    assert_eq!(
        vacancy.admit(teacher(99), Utc::now()),
        Err(LifecycleViolation::CapacityExceeded)
    );

    vacancy.status = VacancyStatus::Closed;
    assert_eq!(
        vacancy.admit(teacher(0), Utc::now()),
        Err(LifecycleViolation::NotOpen)
    );
    assert_eq!(vacancy.applications.len(), MAX_APPLICATIONS);
}

#[test]
fn pending_vacancies_do_not_take_applications() {
    let mut vacancy = open_vacancy();
    vacancy.status = VacancyStatus::Pending;
    assert_eq!(
        vacancy.admit(teacher(1), Utc::now()),
        Err(LifecycleViolation::NotOpen)
    );
    assert!(vacancy.applications.is_empty());
}

#[test]
fn accept_closes_and_blocks_later_accepts() {
    let mut vacancy = open_vacancy();
    let first = vacancy.admit(teacher(1), Utc::now()).expect("admitted");
    let second = vacancy.admit(teacher(2), Utc::now()).expect("admitted");

    vacancy.accept(&first.id, Utc::now()).expect("accepted");
    assert_eq!(vacancy.status, VacancyStatus::Closed);
    assert_eq!(
        vacancy.accepted_application().map(|app| app.id.clone()),
        Some(first.id.clone())
    );

    let before = vacancy.clone();
    assert_eq!(
        vacancy.accept(&second.id, Utc::now()),
        Err(LifecycleViolation::AlreadyResolved)
    );
    assert_eq!(
        vacancy.accept(&first.id, Utc::now()),
        Err(LifecycleViolation::VacancyClosed)
    );
    assert_eq!(vacancy, before);
}

#[test]
fn accept_on_a_closed_vacancy_without_winner_is_vacancy_closed() {
    let mut vacancy = open_vacancy();
    let application = vacancy.admit(teacher(1), Utc::now()).expect("admitted");
    vacancy
        .change_status(VacancyStatus::Closed, Utc::now())
        .expect("closed");

    assert_eq!(
        vacancy.accept(&application.id, Utc::now()),
        Err(LifecycleViolation::VacancyClosed)
    );
    assert_eq!(
        vacancy.application(&application.id).map(|app| app.status),
        Some(ApplicationStatus::Pending)
    );
}

#[test]
fn reject_pending_except_spares_the_winner_and_resolved_entries() {
    let mut vacancy = open_vacancy();
    let winner = vacancy.admit(teacher(1), Utc::now()).expect("admitted");
    let loser = vacancy.admit(teacher(2), Utc::now()).expect("admitted");
    let earlier = vacancy.admit(teacher(3), Utc::now()).expect("admitted");
    vacancy
        .mark_application(&earlier.id, ApplicationStatus::Rejected, Utc::now())
        .expect("marked");

    vacancy.accept(&winner.id, Utc::now()).expect("accepted");
    assert_eq!(vacancy.reject_pending_except(&winner.id, Utc::now()), 1);

    let statuses: Vec<_> = vacancy.applications.iter().map(|app| app.status).collect();
    assert_eq!(
        statuses,
        vec![
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected,
            ApplicationStatus::Rejected
        ]
    );
    assert_eq!(
        vacancy.application(&loser.id).map(|app| app.status),
        Some(ApplicationStatus::Rejected)
    );
    assert_eq!(vacancy.reject_pending_except(&winner.id, Utc::now()), 0);
}

#[test]
fn unknown_applications_read_as_not_found() {
    let mut vacancy = open_vacancy();
    let missing = ApplicationId("missing".to_string());
    let violation = vacancy
        .accept(&missing, Utc::now())
        .expect_err("no such application");
    assert_eq!(violation, LifecycleViolation::UnknownApplication(missing));
    assert_eq!(violation.kind(), ErrorKind::NotFound);
}

#[test]
fn resolved_vacancies_cannot_be_reopened() {
    let mut vacancy = open_vacancy();
    let application = vacancy.admit(teacher(1), Utc::now()).expect("admitted");
    vacancy.accept(&application.id, Utc::now()).expect("accepted");

    assert_eq!(
        vacancy.change_status(VacancyStatus::Open, Utc::now()),
        Err(LifecycleViolation::AlreadyResolved)
    );
    assert_eq!(vacancy.status, VacancyStatus::Closed);
}
