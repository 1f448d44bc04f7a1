use crate::infra::Services;
use clap::Args;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;
use tuition_core::config::{LifecycleConfig, NotificationConfig};
use tuition_core::error::AppError;
use tuition_core::notifications::{BroadcastNotifier, NotificationEvent};
use tuition_core::workflows::parents::{ParentRequestDraft, ParentStatus};
use tuition_core::workflows::vacancy::applications::{
    ApplicationStatus, TeacherId, UNKNOWN_TEACHER,
};
use tuition_core::workflows::vacancy::domain::{AdminId, GenderPreference};
use tuition_core::workflows::vacancy::VacancyDraft;

const TEACHER_NAMES: [&str; 6] = [
    "Anita Gurung",
    "Bishal Karki",
    "Chandra Thapa",
    "Dipa Shrestha",
    "Elina Magar",
    "Firoj Ansari",
];

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of teachers that try to apply to the vacancy
    #[arg(long, default_value_t = 6)]
    pub(crate) teachers: usize,
    /// Which applicant (1-based, in application order) the admin accepts
    #[arg(long, default_value_t = 2)]
    pub(crate) accept: usize,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let services = Services::in_memory(
        &LifecycleConfig::default(),
        BroadcastNotifier::new(&NotificationConfig::default()),
    );
    let mut events = services.notifier.subscribe();
    let admin = AdminId("admin-demo".to_string());

    println!("Tuition vacancy lifecycle demo");

    let request = services
        .parents
        .submit(ParentRequestDraft {
            parent_name: "Kamala Poudel".to_string(),
            phone: "9801234567".to_string(),
            address: "Lalitpur".to_string(),
            salary: Some("8000".to_string()),
            preferred_teacher: GenderPreference::Any,
            grade: "Grade 8".to_string(),
            subjects: vec!["Mathematics".to_string(), "Science".to_string()],
            preferred_time: "6-7 PM".to_string(),
        })?;
    println!(
        "\nParent request #{} from {} ({:?})",
        request.application_number, request.parent_name, request.status
    );

    let vacancy = services
        .catalog
        .create_vacancy(
            admin.clone(),
            VacancyDraft {
                title: "Grade 8 Maths and Science".to_string(),
                subject: "Mathematics".to_string(),
                class_level: Some(request.grade.clone()),
                time: Some(request.preferred_time.clone()),
                location: Some(request.address.clone()),
                description: "Home tuition five days a week".to_string(),
                salary: "8000".to_string(),
                featured: true,
                parent_id: Some(request.id.clone()),
                ..VacancyDraft::default()
            },
        )?;
    let request = services
        .parents
        .link_vacancy(&request.id, vacancy.id.clone(), Some(ParentStatus::Pending))?;
    println!(
        "Vacancy {} published and linked, parent now {:?}",
        vacancy.id, request.status
    );

    println!("\nApplications");
    for index in 0..args.teachers {
        let teacher = TeacherId(format!("teacher-{}", index + 1));
        let name = TEACHER_NAMES[index % TEACHER_NAMES.len()];
        services.store.register_teacher(teacher.clone(), name);
        match services.applications.apply(&vacancy.id, teacher) {
            Ok(application) => println!("- {name}: {:?}", application.status),
            Err(err) => println!("- {name}: refused ({})", err.kind().label()),
        }
    }
    match services
        .applications
        .apply(&vacancy.id, TeacherId("teacher-1".to_string()))
    {
        Ok(_) => println!("- repeat application unexpectedly accepted"),
        Err(err) => println!("- repeat application refused ({})", err.kind().label()),
    }

    let current = services.catalog.get_vacancy(&vacancy.id)?;
    let Some(chosen) = args
        .accept
        .checked_sub(1)
        .and_then(|index| current.applications.get(index))
    else {
        println!(
            "\nNo applicant #{} to accept ({} applications on file)",
            args.accept,
            current.applications.len()
        );
        drain(&mut events);
        return Ok(());
    };

    let resolved = services
        .applications
        .resolve(&vacancy.id, &chosen.id, ApplicationStatus::Accepted)
        .await?;
    let view = services.catalog.view(&resolved);
    println!(
        "\nAdmin accepted {}; vacancy {:?}",
        chosen.teacher_id, view.summary.status
    );
    for applicant in &view.applications {
        let name = applicant.teacher_name.as_deref().unwrap_or(UNKNOWN_TEACHER);
        println!("- {name}: {:?}", applicant.status);
    }

    let request = services.parents.get(&request.id)?;
    println!(
        "Parent request #{} is now {:?}",
        request.application_number, request.status
    );
    if let Some(marker) = &resolved.pending_parent_sync {
        println!(
            "Parent sync pending after {} attempts: {}",
            marker.attempts, marker.last_error
        );
    }

    drain(&mut events);
    Ok(())
}

fn drain(events: &mut Receiver<NotificationEvent>) {
    println!("\nNotifications");
    loop {
        match events.try_recv() {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => println!("- {} {json}", event.label()),
                Err(err) => println!("- {} (unprintable: {err})", event.label()),
            },
            Err(TryRecvError::Lagged(skipped)) => println!("- {skipped} events dropped"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}
