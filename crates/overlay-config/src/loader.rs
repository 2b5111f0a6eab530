//! Fetching and parsing source content.
//!
//! Both local files and remote endpoints carry the same document shape:
//!
//! ```json
//! { "data": [ { "key": "title", "value": "Debug HUD" } ] }
//! ```
//!
//! Local reads are synchronous. Remote reads suspend the calling task at the
//! HTTP request and resume when the body has arrived, without blocking other
//! tasks.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::source::SourceLocation;

/// One key/value pair parsed from a source document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParsedEntry {
    /// Key as written in the source, before any prefix is applied.
    pub key: String,
    /// Raw value.
    pub value: String,
}

impl ParsedEntry {
    /// Create an entry.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SourceDocument {
    data: Vec<ParsedEntry>,
}

/// Options for remote fetches.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Per-request timeout. A request that exceeds it fails like any other
    /// transport error.
    pub timeout: Duration,
    /// User-Agent header sent with remote requests.
    pub user_agent: String,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            user_agent: concat!("overlay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Fetches source content and parses it into entries.
#[derive(Debug, Clone)]
pub struct SourceLoader {
    client: reqwest::Client,
}

impl SourceLoader {
    /// Create a loader with default options.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConfig` if the HTTP client cannot be built.
    pub fn new() -> ConfigResult<Self> {
        Self::with_options(&LoaderOptions::default())
    }

    /// Create a loader with explicit options.
    pub fn with_options(options: &LoaderOptions) -> ConfigResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .build()
            .map_err(|e| ConfigError::InvalidConfig {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client })
    }

    /// Load entries from any location, awaiting only for remote sources.
    pub async fn load(&self, location: &SourceLocation) -> ConfigResult<Vec<ParsedEntry>> {
        match location {
            SourceLocation::Local(path) => Self::load_local(path),
            SourceLocation::Remote(url) => self.load_remote(url).await,
        }
    }

    /// Read and parse a local file.
    ///
    /// # Errors
    ///
    /// `FileNotFound` when the file does not exist, `ReadError` when it cannot
    /// be read, and `Parse` when it is not a valid source document.
    pub fn load_local(path: &Path) -> ConfigResult<Vec<ParsedEntry>> {
        debug!(path = %path.display(), "reading local source");

        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::file_not_found(path),
            _ => ConfigError::read_error(path, e),
        })?;

        parse_document(&content, &path.display().to_string())
    }

    /// Fetch and parse a remote document.
    ///
    /// # Errors
    ///
    /// `Unreachable` when no connection can be made, `Transport` on timeout
    /// or an unreadable body, `HttpStatus` on a non-success status, and
    /// `Parse` on a malformed body.
    pub async fn load_remote(&self, url: &str) -> ConfigResult<Vec<ParsedEntry>> {
        info!(url, "fetching remote source");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ConfigError::unreachable(url, e)
                } else {
                    ConfigError::transport(url, e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ConfigError::transport(url, format!("failed to read response: {e}")))?;

        parse_document(&body, url)
    }
}

/// Parse a source document.
///
/// Duplicate keys within one document resolve last-one-wins; the result keeps
/// the position of each key's first occurrence.
///
/// # Errors
///
/// Returns `ConfigError::Parse` naming `origin` if the content is not a
/// `{ "data": [ { "key", "value" } ] }` object with string keys and values.
pub fn parse_document(content: &str, origin: &str) -> ConfigResult<Vec<ParsedEntry>> {
    let document: SourceDocument =
        serde_json::from_str(content).map_err(|e| ConfigError::parse(origin, e))?;

    let total = document.data.len();
    let mut deduped: IndexMap<String, String> = IndexMap::with_capacity(total);
    for entry in document.data {
        deduped.insert(entry.key, entry.value);
    }

    if deduped.len() != total {
        debug!(
            origin,
            duplicates = total - deduped.len(),
            "source repeats keys, keeping the last value of each"
        );
    }

    Ok(deduped
        .into_iter()
        .map(|(key, value)| ParsedEntry { key, value })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_document() {
        let entries = parse_document(
            r#"{"data": [{"key": "title", "value": "HUD"}, {"key": "scale", "value": "2"}]}"#,
            "inline",
        )
        .unwrap();
        assert_eq!(
            entries,
            vec![ParsedEntry::new("title", "HUD"), ParsedEntry::new("scale", "2")]
        );
    }

    #[test]
    fn test_parse_document_duplicate_keys_last_wins() {
        let entries = parse_document(
            r#"{"data": [
                {"key": "a", "value": "1"},
                {"key": "b", "value": "2"},
                {"key": "a", "value": "3"}
            ]}"#,
            "inline",
        )
        .unwrap();
        assert_eq!(entries, vec![ParsedEntry::new("a", "3"), ParsedEntry::new("b", "2")]);
    }

    #[test]
    fn test_parse_document_empty_data() {
        let entries = parse_document(r#"{"data": []}"#, "inline").unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_parse_document_malformed() {
        let result = parse_document("{ not json", "broken.json");
        match result {
            Err(ConfigError::Parse { origin, .. }) => assert_eq!(origin, "broken.json"),
            other => panic!("Expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_document_rejects_non_string_values() {
        let result = parse_document(r#"{"data": [{"key": "scale", "value": 2}]}"#, "inline");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_parse_document_requires_data_array() {
        let result = parse_document(r#"{"entries": []}"#, "inline");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_local() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hud.json");
        fs::write(&path, r#"{"data": [{"key": "title", "value": "HUD"}]}"#).unwrap();

        let entries = SourceLoader::load_local(&path).unwrap();
        assert_eq!(entries, vec![ParsedEntry::new("title", "HUD")]);
    }

    #[test]
    fn test_load_local_not_found() {
        let result = SourceLoader::load_local(Path::new("/nonexistent/hud.json"));
        let err = result.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_local_unreadable_is_not_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("hud.json");
        fs::write(&file, r#"{"data": []}"#).unwrap();

        // A regular file used as a directory exists on disk but cannot be read.
        let err = SourceLoader::load_local(&file.join("child.json")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_default_options() {
        let options = LoaderOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert!(options.user_agent.starts_with("overlay/"));
    }

    #[tokio::test]
    async fn test_load_remote_unreachable() {
        let loader = SourceLoader::with_options(&LoaderOptions {
            timeout: Duration::from_millis(500),
            ..LoaderOptions::default()
        })
        .unwrap();

        // Port 9 on localhost is the discard service and is almost never open.
        let result = loader.load_remote("http://127.0.0.1:9/hud.json").await;
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Unreachable { .. }));
        assert!(err.is_not_found());
    }
}
