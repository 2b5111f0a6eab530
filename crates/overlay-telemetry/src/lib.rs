//! Logging and metrics for the debug overlay.
//!
//! - **Logging**: `tracing-subscriber` with pretty or JSON output
//! - **Metrics**: counters and histograms for configuration loads, with an
//!   optional Prometheus exporter
//!
//! # Example
//!
//! ```rust,ignore
//! use overlay_telemetry::{init_logging, init_metrics, LogConfig, MetricsConfig};
//!
//! init_logging(&LogConfig::production())?;
//! init_metrics(&MetricsConfig::default())?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogOutput};
pub use self::metrics::{
    init_metrics, record_entries_merged, record_load_duration, record_source_load, render_metrics,
    LoadOutcome, MetricsConfig,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
