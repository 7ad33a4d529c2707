//! Prometheus export for the `metrics` facade.
//!
//! The recorder is process-global. The first caller installs it and every
//! later caller gets a handle to the same one.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Cheap clone of the installed recorder, rendered on demand.
#[derive(Clone)]
pub struct MetricsHandle(PrometheusHandle);

impl MetricsHandle {
    pub fn render(&self) -> String {
        self.0.render()
    }
}

/// Install the Prometheus recorder once per process.
///
/// Returns `None` when another recorder was installed first, in which case
/// metrics still flow to that recorder but cannot be rendered here.
pub fn init_metrics() -> Option<MetricsHandle> {
    METRICS_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Prometheus recorder not installed");
                None
            }
        })
        .clone()
        .map(MetricsHandle)
}
