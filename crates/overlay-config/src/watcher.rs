//! Hot-reload of local sources.
//!
//! [`SourceWatcher`] watches the directory of every local source with the
//! `notify` crate. When a source file is created or modified it re-runs
//! [`ConfigRegistry::load_one`] for that source, which fires the load-completed
//! notification again. Remote sources are never polled.
//!
//! Directories are watched rather than the files themselves so that editors
//! that save by writing a temporary file and renaming it are still seen.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use overlay_config::{ConfigRegistry, SourceDescriptor, SourceWatcher};
//!
//! # async fn example() -> Result<(), overlay_config::ConfigError> {
//! let registry = Arc::new(ConfigRegistry::new()?);
//! let sources: Arc<[SourceDescriptor]> =
//!     vec![SourceDescriptor::local("defaults", "config/hud.json")].into();
//!
//! registry.load_all(&sources).await;
//!
//! let mut watcher = SourceWatcher::builder(registry, sources)
//!     .with_debounce(Duration::from_millis(250))
//!     .build()?;
//!
//! tokio::spawn(async move { watcher.run().await });
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::registry::ConfigRegistry;
use crate::source::SourceDescriptor;

/// A source reload triggered by a file change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReload {
    /// Name of the reloaded source.
    pub source: String,
    /// Path that changed.
    pub path: PathBuf,
    /// Whether the reload merged.
    pub loaded: bool,
}

/// Builder for [`SourceWatcher`].
pub struct SourceWatcherBuilder {
    registry: Arc<ConfigRegistry>,
    sources: Arc<[SourceDescriptor]>,
    debounce: Duration,
}

impl SourceWatcherBuilder {
    /// Set the debounce window. A file is reloaded once it has seen no
    /// change for this long. Default is 500ms.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start watching.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConfig` if there is no local source whose
    /// directory exists, or if the platform watcher cannot be created.
    pub fn build(self) -> Result<SourceWatcher, ConfigError> {
        let mut targets: HashMap<PathBuf, Vec<usize>> = HashMap::new();
        let mut directories: HashSet<PathBuf> = HashSet::new();

        for (index, source) in self.sources.iter().enumerate() {
            let Some(path) = source.path() else { continue };
            let Some(resolved) = resolve_path(path) else {
                warn!(
                    source = source.name(),
                    path = %path.display(),
                    "source directory does not exist, not watching"
                );
                continue;
            };
            if let Some(parent) = resolved.parent() {
                directories.insert(parent.to_path_buf());
            }
            targets.entry(resolved).or_default().push(index);
        }

        if targets.is_empty() {
            return Err(ConfigError::InvalidConfig {
                message: "No local sources to watch".to_string(),
            });
        }

        let (tx, rx) = mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                // Only send if channel is open
                let _ = tx.blocking_send(event);
            }
        })
        .map_err(|e| ConfigError::InvalidConfig {
            message: format!("Failed to create file watcher: {}", e),
        })?;

        for directory in &directories {
            watcher
                .watch(directory, RecursiveMode::NonRecursive)
                .map_err(|e| ConfigError::InvalidConfig {
                    message: format!("Failed to watch {}: {}", directory.display(), e),
                })?;
        }

        info!(
            files = targets.len(),
            directories = directories.len(),
            "watching local configuration sources"
        );

        Ok(SourceWatcher {
            _watcher: watcher,
            rx,
            registry: self.registry,
            sources: self.sources,
            targets,
            debounce: self.debounce,
            pending: HashMap::new(),
            closed: false,
        })
    }
}

/// Reloads local sources when their files change.
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<Event>,
    registry: Arc<ConfigRegistry>,
    sources: Arc<[SourceDescriptor]>,
    targets: HashMap<PathBuf, Vec<usize>>,
    debounce: Duration,
    /// Changed files waiting for their window to pass, with its deadline.
    pending: HashMap<PathBuf, Instant>,
    closed: bool,
}

impl SourceWatcher {
    /// Create a builder over the given registry and source list.
    pub fn builder(
        registry: Arc<ConfigRegistry>,
        sources: Arc<[SourceDescriptor]>,
    ) -> SourceWatcherBuilder {
        SourceWatcherBuilder {
            registry,
            sources,
            debounce: Duration::from_millis(500),
        }
    }

    /// Paths being watched.
    pub fn watched_paths(&self) -> Vec<&Path> {
        self.targets.keys().map(PathBuf::as_path).collect()
    }

    /// Reload sources as their files change until the watcher is dropped.
    pub async fn run(&mut self) {
        while self.next_reload().await.is_some() {}
    }

    /// Wait for the next settled file change that maps to a source, reload
    /// it, and report the result. Returns `None` once the event channel
    /// closes and nothing is left pending.
    ///
    /// Every event for a file restarts its debounce deadline, so a save that
    /// truncates and then writes is read once, after the last write.
    ///
    /// When several sources share a file, all of them are reloaded in list
    /// order and the last one is reported.
    pub async fn next_reload(&mut self) -> Option<SourceReload> {
        loop {
            let due = self
                .pending
                .iter()
                .min_by_key(|(_, deadline)| **deadline)
                .map(|(path, deadline)| (path.clone(), *deadline));

            if self.closed && due.is_none() {
                return None;
            }
            let deadline = due.as_ref().map_or_else(Instant::now, |(_, d)| *d);

            tokio::select! {
                event = self.rx.recv(), if !self.closed => match event {
                    Some(event) => {
                        if let Some(path) = self.match_event(&event) {
                            self.pending.insert(path, Instant::now() + self.debounce);
                        }
                    }
                    None => self.closed = true,
                },
                () = sleep_until(deadline), if due.is_some() => {
                    if let Some((path, _)) = due {
                        self.pending.remove(&path);
                        if let Some(reload) = self.reload(&path).await {
                            return Some(reload);
                        }
                    }
                }
            }
        }
    }

    async fn reload(&self, path: &Path) -> Option<SourceReload> {
        let indices = self.targets.get(path)?;
        let mut last = None;
        for &index in indices {
            let source = &self.sources[index];
            debug!(source = source.name(), path = %path.display(), "source file settled");
            let loaded = self.registry.load_one(source).await;
            last = Some(SourceReload {
                source: source.name().to_string(),
                path: path.to_path_buf(),
                loaded,
            });
        }
        last
    }

    fn match_event(&self, event: &Event) -> Option<PathBuf> {
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => {}
            _ => return None,
        }

        event.paths.iter().find_map(|p| {
            let resolved = p.canonicalize().unwrap_or_else(|_| p.clone());
            self.targets.contains_key(&resolved).then_some(resolved)
        })
    }
}

/// Absolute form of a source path, resolved through its parent directory so
/// that a file which does not exist yet can still be matched once created.
fn resolve_path(path: &Path) -> Option<PathBuf> {
    if let Ok(resolved) = path.canonicalize() {
        return Some(resolved);
    }
    let file_name = path.file_name()?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    parent.canonicalize().ok().map(|dir| dir.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tokio::time::{sleep, timeout};

    fn registry() -> Arc<ConfigRegistry> {
        Arc::new(ConfigRegistry::new().unwrap())
    }

    #[test]
    fn test_build_without_local_sources() {
        let sources: Arc<[SourceDescriptor]> =
            vec![SourceDescriptor::remote("live", "http://localhost/hud.json")].into();
        let result = SourceWatcher::builder(registry(), sources).build();
        match result {
            Err(ConfigError::InvalidConfig { message }) => {
                assert!(message.contains("No local sources"));
            }
            _ => panic!("Expected InvalidConfig error"),
        }
    }

    #[test]
    fn test_build_skips_missing_directories() {
        let sources: Arc<[SourceDescriptor]> =
            vec![SourceDescriptor::local("gone", "/nonexistent/dir/hud.json")].into();
        assert!(SourceWatcher::builder(registry(), sources).build().is_err());
    }

    #[test]
    fn test_resolve_path_for_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("later.json");
        let resolved = resolve_path(&path).unwrap();
        assert_eq!(resolved.file_name().unwrap(), "later.json");
        assert_eq!(resolved.parent().unwrap(), temp_dir.path().canonicalize().unwrap());
    }

    #[tokio::test]
    async fn test_watched_paths() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hud.json");
        fs::write(&path, r#"{"data": []}"#).unwrap();

        let sources: Arc<[SourceDescriptor]> = vec![
            SourceDescriptor::local("hud", &path),
            SourceDescriptor::remote("live", "http://localhost/hud.json"),
        ]
        .into();
        let watcher = SourceWatcher::builder(registry(), sources).build().unwrap();

        assert_eq!(watcher.watched_paths(), vec![path.canonicalize().unwrap().as_path()]);
    }

    #[tokio::test]
    async fn test_reload_on_change() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hud.json");
        fs::write(&path, r#"{"data": [{"key": "title", "value": "one"}]}"#).unwrap();

        let registry = registry();
        let sources: Arc<[SourceDescriptor]> =
            vec![SourceDescriptor::local("hud", &path)].into();
        registry.load_all(&sources).await;

        let mut watcher = SourceWatcher::builder(registry.clone(), sources)
            .with_debounce(Duration::from_millis(100))
            .build()
            .unwrap();

        // Give the watcher time to start
        sleep(Duration::from_millis(100)).await;

        fs::write(&path, r#"{"data": [{"key": "title", "value": "two"}]}"#).unwrap();

        let reload = timeout(Duration::from_secs(5), watcher.next_reload())
            .await
            .expect("no reload within 5s")
            .expect("watcher closed");
        assert_eq!(reload.source, "hud");
        assert!(reload.loaded);
        assert_eq!(registry.get_string("title").as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_truncate_then_write_reloads_final_contents_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hud.json");
        fs::write(&path, r#"{"data": [{"key": "title", "value": "one"}]}"#).unwrap();

        let registry = registry();
        let sources: Arc<[SourceDescriptor]> =
            vec![SourceDescriptor::local("hud", &path)].into();
        registry.load_all(&sources).await;
        assert_eq!(registry.get_string("title").as_deref(), Some("one"));

        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        let _guard = registry.on_config_loaded_scoped(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut watcher = SourceWatcher::builder(registry.clone(), sources)
            .with_debounce(Duration::from_millis(400))
            .build()
            .unwrap();

        sleep(Duration::from_millis(100)).await;

        // Editor-style save: the file is empty for a moment before the new
        // contents land.
        fs::write(&path, "").unwrap();
        sleep(Duration::from_millis(100)).await;
        fs::write(&path, r#"{"data": [{"key": "title", "value": "two"}]}"#).unwrap();

        let reload = timeout(Duration::from_secs(5), watcher.next_reload())
            .await
            .expect("no reload within 5s")
            .expect("watcher closed");

        assert!(reload.loaded);
        assert_eq!(registry.get_string("title").as_deref(), Some("two"));
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }
}
