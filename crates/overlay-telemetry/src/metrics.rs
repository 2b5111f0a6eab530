//! Configuration load metrics.
//!
//! Recording goes through the `metrics` facade and costs nothing until a
//! recorder is installed. [`init_metrics`] installs a Prometheus exporter.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `overlay_config_loads_total` | Counter | `source`, `kind`, `outcome` | Source load attempts |
//! | `overlay_config_entries_merged_total` | Counter | `source` | Entries written to the store |
//! | `overlay_config_load_duration_seconds` | Histogram | `kind` | Fetch and parse latency |

use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Counter of load attempts.
pub const LOADS_TOTAL: &str = "overlay_config_loads_total";

/// Counter of entries merged.
pub const ENTRIES_MERGED_TOTAL: &str = "overlay_config_entries_merged_total";

/// Histogram of load latency.
pub const LOAD_DURATION_SECONDS: &str = "overlay_config_load_duration_seconds";

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether to install the Prometheus exporter.
    pub enabled: bool,

    /// Address to expose metrics on (e.g., "127.0.0.1:9090").
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Install the Prometheus exporter and describe the standard metrics.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparsable address and
/// `TelemetryError::MetricsInit` if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr = config
        .addr
        .parse::<SocketAddr>()
        .map_err(|e| TelemetryError::InvalidAddress {
            addr: config.addr.clone(),
            reason: e.to_string(),
        })?;

    let handle = PrometheusBuilder::new()
        .with_http_listener(addr)
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);

    describe_counter!(LOADS_TOTAL, "Configuration source load attempts by outcome");
    describe_counter!(ENTRIES_MERGED_TOTAL, "Configuration entries written to the store");
    describe_histogram!(LOAD_DURATION_SECONDS, "Configuration source fetch and parse duration");

    Ok(())
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` if the exporter is not installed.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Outcome label for a source load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Entries were merged.
    Loaded,
    /// The source did not exist.
    NotFound,
    /// The source existed but could not be fetched or parsed.
    Failed,
}

impl LoadOutcome {
    /// Label value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::NotFound => "not_found",
            Self::Failed => "failed",
        }
    }
}

/// Records one load attempt.
pub fn record_source_load(source: &str, kind: &'static str, outcome: LoadOutcome) {
    counter!(
        LOADS_TOTAL,
        "source" => source.to_string(),
        "kind" => kind,
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Records how long fetching and parsing a source took.
pub fn record_load_duration(kind: &'static str, duration: Duration) {
    histogram!(LOAD_DURATION_SECONDS, "kind" => kind).record(duration.as_secs_f64());
}

/// Records entries written by one merge.
pub fn record_entries_merged(source: &str, entries: usize) {
    counter!(ENTRIES_MERGED_TOTAL, "source" => source.to_string()).increment(entries as u64);
}
