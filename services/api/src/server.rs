use crate::cli::ServeArgs;
use crate::infra::{AppState, Services};
use crate::routes::with_workflow_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use tuition_core::config::AppConfig;
use tuition_core::error::AppError;
use tuition_core::notifications::BroadcastNotifier;
use tuition_core::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let services = Services::in_memory(
        &config.lifecycle,
        BroadcastNotifier::new(&config.notifications),
    );
    let reconciler = services
        .applications
        .spawn_parent_reconciler(config.lifecycle.reconcile_interval);
    if reconciler.is_none() {
        info!("parent sync reconciliation disabled");
    }

    let app = with_workflow_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "tuition marketplace api ready");

    let served = axum::serve(listener, app).await;
    if let Some(handle) = reconciler {
        handle.abort();
    }
    served?;
    Ok(())
}
