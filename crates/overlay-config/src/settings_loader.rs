//! Settings loader with layered approach.
//!
//! This module provides the [`SettingsLoader`] for building [`OverlaySettings`]
//! from defaults, a manifest file, and environment variables.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::settings::{LogFormat, OverlaySettings};
use crate::store::parse_bool;

/// Settings loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values
/// 2. Manifest file (TOML or JSON)
/// 3. Environment variables (`PREFIX__SECTION__KEY`)
///
/// Sources can only be declared in the manifest; environment variables tune
/// the scalar sections.
///
/// # Example
///
/// ```no_run
/// use overlay_config::SettingsLoader;
///
/// # fn main() -> Result<(), overlay_config::ConfigError> {
/// let settings = SettingsLoader::new()
///     .with_file("overlay.toml")?
///     .with_env_prefix("OVERLAY")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct SettingsLoader {
    settings: OverlaySettings,
    env_prefix: Option<String>,
}

impl SettingsLoader {
    /// Create a loader starting from default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a manifest file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, in an
    /// unsupported format, or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.settings = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load settings from a manifest file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load settings from a string in the given format (`"toml"` or `"json"`).
    ///
    /// # Example
    ///
    /// ```
    /// use overlay_config::SettingsLoader;
    ///
    /// let toml = r#"
    ///     [[sources]]
    ///     name = "defaults"
    ///     kind = "local"
    ///     location = "hud.json"
    /// "#;
    ///
    /// let settings = SettingsLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(settings.sources[0].name, "defaults");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.settings = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation(format!(
                    "unsupported settings format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// With prefix `OVERLAY`:
    /// - `OVERLAY__REMOTE__TIMEOUT_MS=2000`
    /// - `OVERLAY__LOGGING__LEVEL=debug`
    /// - `OVERLAY__WATCH__ENABLED=true`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file into the process environment, if present.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        // A missing .env file is not an error.
        let _ = dotenvy::dotenv();
        self
    }

    /// Apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or the final
    /// settings fail validation.
    pub fn load(mut self) -> Result<OverlaySettings, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: HashMap<String, String> = env::vars()
                .filter(|(k, _)| k.starts_with(&prefix))
                .collect();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.settings.validate()?;
        Ok(self.settings)
    }

    fn parse_file(content: &str, path: &Path) -> Result<OverlaySettings, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation(format!(
                "unsupported settings file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            // Shares the prefix text but not the separator, e.g. OVERLAYS_HOME.
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();

        match parts.as_slice() {
            ["REMOTE", "TIMEOUT_MS"] => {
                self.settings.remote.timeout_ms = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse(key, "expected integer"))?;
            }
            ["REMOTE", "USER_AGENT"] => {
                self.settings.remote.user_agent = value.to_string();
            }
            ["WATCH", "ENABLED"] => {
                self.settings.watch.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse(key, "expected boolean"))?;
            }
            ["WATCH", "DEBOUNCE_MS"] => {
                self.settings.watch.debounce_ms = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse(key, "expected integer"))?;
            }
            ["LOGGING", "LEVEL"] => {
                self.settings.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.settings.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env_parse(key, "expected 'json' or 'pretty'")),
                };
            }
            _ => {}
        }

        Ok(())
    }
}
