//! Settings manifest schema.
//!
//! The manifest declares the ordered source list plus the knobs for remote
//! fetching, hot-reload and logging. It is read once before any source loads.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::loader::LoaderOptions;
use crate::source::{SourceDescriptor, SourceLocation};

/// Root settings document.
///
/// # Example
///
/// ```
/// use overlay_config::OverlaySettings;
///
/// let settings = OverlaySettings::default();
/// assert!(settings.sources.is_empty());
/// assert_eq!(settings.remote.timeout_ms, 5000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct OverlaySettings {
    /// Remote fetch settings.
    #[serde(default)]
    pub remote: RemoteSettings,

    /// Local source hot-reload settings.
    #[serde(default)]
    pub watch: WatchSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Sources in load order.
    #[serde(default)]
    pub sources: Vec<SourceSettings>,
}

impl OverlaySettings {
    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if:
    /// - A source name is empty or repeated
    /// - A source location is empty
    /// - A remote location is not an `http://` or `https://` URL
    /// - The remote timeout is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.remote.timeout_ms == 0 {
            return Err(ConfigError::validation("remote.timeout_ms must be greater than 0"));
        }

        let mut names = HashSet::new();
        for (index, source) in self.sources.iter().enumerate() {
            if source.name.trim().is_empty() {
                return Err(ConfigError::validation(format!(
                    "sources[{index}].name must not be empty"
                )));
            }
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::validation(format!(
                    "duplicate source name: {}",
                    source.name
                )));
            }
            if source.location.trim().is_empty() {
                return Err(ConfigError::validation(format!(
                    "sources[{index}].location must not be empty"
                )));
            }
            if source.kind == SourceKindSetting::Remote
                && !(source.location.starts_with("http://")
                    || source.location.starts_with("https://"))
            {
                return Err(ConfigError::validation(format!(
                    "source {} must use an http:// or https:// location",
                    source.name
                )));
            }
        }

        Ok(())
    }

    /// Build descriptors for every source, in declaration order.
    pub fn descriptors(&self) -> Vec<SourceDescriptor> {
        self.sources.iter().map(SourceSettings::to_descriptor).collect()
    }

    /// Loader options derived from the `[remote]` section.
    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            timeout: Duration::from_millis(self.remote.timeout_ms),
            user_agent: self.remote.user_agent.clone(),
        }
    }
}

/// Remote fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RemoteSettings {
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_user_agent() -> String {
    LoaderOptions::default().user_agent
}

/// Hot-reload settings for local sources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WatchSettings {
    /// Reload local sources when their file changes.
    #[serde(default)]
    pub enabled: bool,

    /// Changes to the same file within this window are coalesced.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    500
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `overlay_config=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Kind of a declared source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKindSetting {
    /// Local JSON file.
    Local,
    /// Remote JSON endpoint.
    Remote,
}

/// One `[[sources]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SourceSettings {
    /// Diagnostic name, unique within the manifest.
    pub name: String,

    /// Source kind.
    pub kind: SourceKindSetting,

    /// File path or URL.
    pub location: String,

    /// Prefix for every key from this source.
    #[serde(default)]
    pub prefix: String,
}

impl SourceSettings {
    /// Build the runtime descriptor.
    pub fn to_descriptor(&self) -> SourceDescriptor {
        let location = match self.kind {
            SourceKindSetting::Local => SourceLocation::Local(self.location.clone().into()),
            SourceKindSetting::Remote => SourceLocation::Remote(self.location.clone()),
        };
        SourceDescriptor::new(self.name.clone(), location).with_prefix(self.prefix.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceKind;

    fn source(name: &str, kind: SourceKindSetting, location: &str) -> SourceSettings {
        SourceSettings {
            name: name.to_string(),
            kind,
            location: location.to_string(),
            prefix: String::new(),
        }
    }

    #[test]
    fn test_default_settings_are_valid() {
        let settings = OverlaySettings::default();
        assert!(settings.validate().is_ok());
        assert!(!settings.watch.enabled);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_descriptors_preserve_order_and_prefix() {
        let mut settings = OverlaySettings::default();
        settings.sources.push(source("defaults", SourceKindSetting::Local, "hud.json"));
        let mut live = source("live", SourceKindSetting::Remote, "http://localhost/hud.json");
        live.prefix = "live_".to_string();
        settings.sources.push(live);

        let descriptors = settings.descriptors();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].name(), "defaults");
        assert_eq!(descriptors[0].kind(), SourceKind::Local);
        assert_eq!(descriptors[1].kind(), SourceKind::Remote);
        assert_eq!(descriptors[1].prefix(), "live_");
    }

    #[test]
    fn test_validate_duplicate_names() {
        let mut settings = OverlaySettings::default();
        settings.sources.push(source("a", SourceKindSetting::Local, "a.json"));
        settings.sources.push(source("a", SourceKindSetting::Local, "b.json"));
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate source name"));
    }

    #[test]
    fn test_validate_remote_scheme() {
        let mut settings = OverlaySettings::default();
        settings.sources.push(source("live", SourceKindSetting::Remote, "ftp://host/hud.json"));
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_empty_location() {
        let mut settings = OverlaySettings::default();
        settings.sources.push(source("a", SourceKindSetting::Local, "  "));
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut settings = OverlaySettings::default();
        settings.remote.timeout_ms = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_loader_options() {
        let mut settings = OverlaySettings::default();
        settings.remote.timeout_ms = 1500;
        let options = settings.loader_options();
        assert_eq!(options.timeout, Duration::from_millis(1500));
    }
}
