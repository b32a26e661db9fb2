use axum::{routing::get, Router};
use axum_prometheus::metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use axum_prometheus::PrometheusMetricLayer;
use std::sync::OnceLock;

// The recorder is process-global; installing twice panics. Routers built
// after the first share the same registry.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Prometheus middleware layer plus the `/metrics` exposition route.
/// Counters and histograms recorded through the `metrics` facade elsewhere in
/// the crate flow into the same registry.
pub fn setup_metrics() -> (PrometheusMetricLayer<'static>, Router) {
    let handle = METRICS_HANDLE
        .get_or_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install metrics recorder")
        })
        .clone();
    let router = Router::new().route("/metrics", get(move || async move { handle.render() }));
    (PrometheusMetricLayer::new(), router)
}
