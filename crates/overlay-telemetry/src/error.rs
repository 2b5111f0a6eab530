//! Telemetry error types.

use thiserror::Error;

/// Errors raised while installing logging or metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log filter directive did not parse.
    #[error("invalid log filter {filter:?}: {reason}")]
    InvalidFilter {
        /// Directive as given.
        filter: String,
        /// Parser message.
        reason: String,
    },

    /// A global tracing subscriber is already installed.
    #[error("logging already initialized: {0}")]
    LoggingInit(String),

    /// The metrics exporter address did not parse.
    #[error("invalid metrics address {addr:?}: {reason}")]
    InvalidAddress {
        /// Address as given.
        addr: String,
        /// Parser message.
        reason: String,
    },

    /// The Prometheus recorder could not be installed.
    #[error("metrics exporter failed to start: {0}")]
    MetricsInit(String),
}
