use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tuition_core::config::LifecycleConfig;
use tuition_core::notifications::BroadcastNotifier;
use tuition_core::store::InMemoryStore;
use tuition_core::workflows::parents::ParentRequestService;
use tuition_core::workflows::vacancy::applications::VacancyApplicationService;
use tuition_core::workflows::vacancy::VacancyCatalogService;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Services wired over one shared store and notifier.
pub(crate) struct Services {
    pub(crate) store: Arc<InMemoryStore>,
    pub(crate) notifier: Arc<BroadcastNotifier>,
    pub(crate) catalog: Arc<VacancyCatalogService<InMemoryStore>>,
    pub(crate) applications: Arc<VacancyApplicationService<InMemoryStore, BroadcastNotifier>>,
    pub(crate) parents: Arc<ParentRequestService<InMemoryStore>>,
}

impl Services {
    pub(crate) fn in_memory(lifecycle: &LifecycleConfig, notifier: BroadcastNotifier) -> Self {
        let store = Arc::new(InMemoryStore::default());
        let notifier = Arc::new(notifier);
        Self {
            catalog: Arc::new(VacancyCatalogService::new(store.clone(), lifecycle)),
            applications: Arc::new(VacancyApplicationService::new(
                store.clone(),
                notifier.clone(),
                lifecycle.clone(),
            )),
            parents: Arc::new(ParentRequestService::new(store.clone(), lifecycle)),
            store,
            notifier,
        }
    }
}
