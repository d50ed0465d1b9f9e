use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family, gauge::Gauge},
    registry::Registry,
};
use tracing::warn;

/// Registers the dashboard's request metrics under `appdash`, along with the Kubernetes client
/// metrics under `kube` and process metrics under `process`.
pub fn register(prom: &mut Registry) -> (HttpMetrics, kubert::RuntimeMetrics) {
    let http = HttpMetrics::register(prom.sub_registry_with_prefix("appdash"));
    let runtime = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));
    if let Err(error) = kubert_prometheus_process::register(prom.sub_registry_with_prefix("process"))
    {
        warn!(%error, "Process metrics cannot be monitored");
    }
    (http, runtime)
}

#[derive(Clone, Debug)]
pub struct HttpMetrics {
    requests: Family<RequestLabels, Counter>,
    join_failures: Counter,
    namespaces: Gauge,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
struct RequestLabels {
    route: &'static str,
    status: u16,
}

// === impl HttpMetrics ===

impl HttpMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let requests = Family::<RequestLabels, Counter>::default();
        reg.register(
            "http_requests",
            "Total number of HTTP requests served, by route and status code",
            requests.clone(),
        );

        let join_failures = Counter::default();
        reg.register(
            "join_failures",
            "Total number of namespace queries that failed to join watched resources",
            join_failures.clone(),
        );

        let namespaces = Gauge::default();
        reg.register(
            "namespaces",
            "Number of namespaces accessible to the dashboard",
            namespaces.clone(),
        );

        Self {
            requests,
            join_failures,
            namespaces,
        }
    }

    pub(crate) fn request(&self, route: &'static str, status: u16) {
        self.requests
            .get_or_create(&RequestLabels { route, status })
            .inc();
    }

    pub(crate) fn join_failed(&self) {
        self.join_failures.inc();
    }

    pub fn set_namespaces(&self, n: usize) {
        self.namespaces.set(n as i64);
    }
}
