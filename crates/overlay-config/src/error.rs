//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading sources or reading typed values.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A local source file does not exist.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read a local source file.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Source content is not a valid `{ "data": [...] }` document.
    #[error("failed to parse configuration from {origin}: {source}")]
    Parse {
        /// File path or URL the content came from.
        origin: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The remote endpoint could not be reached at all.
    #[error("{url} is unreachable: {reason}")]
    Unreachable {
        /// Requested URL.
        url: String,
        /// Explanation of the connection failure.
        reason: String,
    },

    /// The remote request failed before a usable response arrived.
    #[error("failed to fetch {url}: {reason}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Explanation of the transport failure.
        reason: String,
    },

    /// The remote endpoint answered with a non-success status.
    #[error("{url} returned status {status}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// A stored value could not be parsed as the requested type.
    #[error("invalid value for {key}: {value:?} is not a valid {expected}")]
    InvalidValue {
        /// Key that was looked up.
        key: String,
        /// Raw stored value.
        value: String,
        /// Name of the requested type.
        expected: &'static str,
    },

    /// A stored vector value has the wrong number of components.
    #[error("malformed value for {key}: {value:?} has {found} component(s), expected {expected}")]
    Format {
        /// Key that was looked up.
        key: String,
        /// Raw stored value.
        value: String,
        /// Number of components required.
        expected: usize,
        /// Number of components present.
        found: usize,
    },

    /// TOML parsing error in the settings manifest.
    #[error("failed to parse TOML settings: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parsing error in the settings manifest.
    #[error("failed to parse JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    /// Environment variable parsing error.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParse {
        /// The environment variable name.
        var: String,
        /// Explanation of the parsing error.
        reason: String,
    },

    /// Settings failed validation.
    #[error("settings validation failed: {0}")]
    Validation(String),

    /// Invalid configuration for a component.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create a new file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Create a new document parse error.
    pub fn parse(origin: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            origin: origin.into(),
            source,
        }
    }

    /// Create a new transport error.
    pub fn transport(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transport {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new unreachable-endpoint error.
    pub fn unreachable(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Unreachable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new invalid value error.
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            expected,
        }
    }

    /// Create a new environment variable parse error.
    pub fn env_parse(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParse {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Create a new validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error means the source is simply absent.
    ///
    /// Absent sources are logged as warnings; everything else is a defect in
    /// the source content or the transport and is logged as an error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::FileNotFound { .. } | Self::Unreachable { .. } => true,
            Self::HttpStatus { status, .. } => *status == 404,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_error() {
        let err = ConfigError::file_not_found("/path/to/hud.json");
        assert!(err.to_string().contains("/path/to/hud.json"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_parse_error_names_origin() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ConfigError::parse("hud.json", source);
        assert!(err.to_string().contains("hud.json"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_value("scale", "abc", "float");
        let message = err.to_string();
        assert!(message.contains("scale"));
        assert!(message.contains("\"abc\""));
        assert!(message.contains("float"));
    }

    #[test]
    fn test_format_error() {
        let err = ConfigError::Format {
            key: "pos".to_string(),
            value: "1.0,2.0".to_string(),
            expected: 3,
            found: 2,
        };
        assert!(err.to_string().contains("2 component(s), expected 3"));
    }

    #[test]
    fn test_http_404_counts_as_not_found() {
        let missing = ConfigError::HttpStatus {
            url: "http://localhost/hud.json".to_string(),
            status: 404,
        };
        let broken = ConfigError::HttpStatus {
            url: "http://localhost/hud.json".to_string(),
            status: 500,
        };
        assert!(missing.is_not_found());
        assert!(!broken.is_not_found());

        assert!(ConfigError::unreachable("http://127.0.0.1:9", "connection refused").is_not_found());
        assert!(!ConfigError::transport("http://127.0.0.1:9", "timed out").is_not_found());
    }

    #[test]
    fn test_env_parse_error() {
        let err = ConfigError::env_parse("OVERLAY__REMOTE__TIMEOUT_MS", "expected integer");
        assert!(err.to_string().contains("OVERLAY__REMOTE__TIMEOUT_MS"));
        assert!(err.to_string().contains("expected integer"));
    }
}
