//! Structured logging setup.
//!
//! One `tracing-subscriber` registry: an `EnvFilter` in front of a single
//! `fmt` layer whose shape comes from [`LogOutput`]. Output goes to stderr so
//! stdout stays free for whatever the host prints.
//!
//! ```rust,ignore
//! use overlay_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(source = "defaults", entries = 12, "configuration source merged");
//! ```

use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Shape of each log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    /// Multi-line, human-oriented.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `overlay_config=debug,reqwest=warn`.
    pub filter: String,
    /// Line format.
    pub output: LogOutput,
    /// Include file and line of each event.
    pub source_location: bool,
    /// Colour the output. Ignored for JSON.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            output: LogOutput::Pretty,
            source_location: false,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Debug level, pretty, with source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            filter: "debug".to_string(),
            source_location: true,
            ..Self::default()
        }
    }

    /// Info level as JSON.
    #[must_use]
    pub fn production() -> Self {
        Self {
            output: LogOutput::Json,
            ansi: false,
            ..Self::default()
        }
    }

    /// Replace the filter directive.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// `TelemetryError::InvalidFilter` for a bad directive and
/// `TelemetryError::LoggingInit` when a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = create_env_filter(&config.filter)?;

    tracing_subscriber::registry()
        .with(fmt_layer(config).with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Parse an `EnvFilter` directive.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if the directive does not parse.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter {
        filter: filter.to_string(),
        reason: e.to_string(),
    })
}

fn fmt_layer<S>(config: &LogConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    match config.output {
        LogOutput::Pretty => layer.pretty().with_ansi(config.ansi).boxed(),
        LogOutput::Compact => layer.compact().with_ansi(config.ansi).boxed(),
        LogOutput::Json => layer.json().with_ansi(false).boxed(),
    }
}
