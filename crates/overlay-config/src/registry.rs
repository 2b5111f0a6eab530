//! Source orchestration and merging.
//!
//! The registry walks an ordered list of [`SourceDescriptor`]s, loads each,
//! writes its entries into the [`ValueStore`] under the source's prefix, marks
//! the source loaded and fires the [`NotificationHub`].
//!
//! # Ordering
//!
//! Sources are loaded one after another in list order, so when two sources
//! produce the same final key the later one wins.
//!
//! # Failures
//!
//! A failing source contributes nothing and stays not-loaded; the remaining
//! sources still load. Values merged earlier are never rolled back. There is
//! no automatic retry: call [`ConfigRegistry::load_one`] again.
//!
//! # Concurrency
//!
//! Loads may run from several tasks at once. Fetching happens outside any
//! lock; the merge-then-notify step runs under a single merge lock so two
//! merges never interleave their writes.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use overlay_telemetry::metrics::{
    record_entries_merged, record_load_duration, record_source_load, LoadOutcome,
};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::hub::{NotificationHub, Subscription, SubscriptionGuard};
use crate::loader::{LoaderOptions, ParsedEntry, SourceLoader};
use crate::source::SourceDescriptor;
use crate::store::{ValueStore, Vector3};

/// Result of loading one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// Entries were merged.
    Loaded {
        /// Number of entries written.
        entries: usize,
    },
    /// The source contributed nothing.
    Failed {
        /// Human-readable cause.
        reason: String,
    },
}

impl SourceOutcome {
    /// Whether the source merged.
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// Per-source results of a [`ConfigRegistry::load_all`] call, in list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// `(source name, outcome)` pairs.
    pub sources: Vec<(String, SourceOutcome)>,
}

impl LoadReport {
    /// Number of sources that merged.
    pub fn loaded(&self) -> usize {
        self.sources.iter().filter(|(_, o)| o.is_loaded()).count()
    }

    /// Number of sources that failed.
    pub fn failed(&self) -> usize {
        self.sources.len() - self.loaded()
    }

    /// Total entries written across all sources.
    pub fn entries(&self) -> usize {
        self.sources
            .iter()
            .map(|(_, outcome)| match outcome {
                SourceOutcome::Loaded { entries } => *entries,
                SourceOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    /// Outcome for a named source.
    pub fn outcome(&self, name: &str) -> Option<&SourceOutcome> {
        self.sources
            .iter()
            .find(|(source, _)| source == name)
            .map(|(_, outcome)| outcome)
    }
}

/// Owns the value store and notification hub and applies source loads.
///
/// Created once at application start and shared by reference (or `Arc`)
/// with whatever reads configuration.
pub struct ConfigRegistry {
    store: ValueStore,
    hub: NotificationHub,
    loader: SourceLoader,
    merge_lock: Mutex<()>,
}

impl fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigRegistry")
            .field("keys", &self.store.len())
            .field("subscribers", &self.hub.len())
            .finish_non_exhaustive()
    }
}

impl ConfigRegistry {
    /// Create a registry with an empty store and default loader options.
    pub fn new() -> ConfigResult<Self> {
        Ok(Self::with_loader(SourceLoader::new()?))
    }

    /// Create a registry with explicit loader options.
    pub fn with_options(options: &LoaderOptions) -> ConfigResult<Self> {
        Ok(Self::with_loader(SourceLoader::with_options(options)?))
    }

    /// Create a registry around an existing loader.
    pub fn with_loader(loader: SourceLoader) -> Self {
        Self {
            store: ValueStore::new(),
            hub: NotificationHub::new(),
            loader,
            merge_lock: Mutex::new(()),
        }
    }

    /// Resolved values.
    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    /// Load-completed signal.
    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    /// Load every source in order. Failures are logged and recorded in the
    /// report; they never stop later sources.
    pub async fn load_all(&self, sources: &[SourceDescriptor]) -> LoadReport {
        let mut report = LoadReport::default();
        for source in sources {
            let outcome = match self.load_source(source).await {
                Ok(entries) => SourceOutcome::Loaded { entries },
                Err(e) => SourceOutcome::Failed {
                    reason: e.to_string(),
                },
            };
            report.sources.push((source.name().to_string(), outcome));
        }

        info!(
            loaded = report.loaded(),
            failed = report.failed(),
            entries = report.entries(),
            "configuration sources processed"
        );

        report
    }

    /// Run [`load_all`](Self::load_all) on a background task.
    pub fn spawn_load_all(
        self: &Arc<Self>,
        sources: Arc<[SourceDescriptor]>,
    ) -> JoinHandle<LoadReport> {
        let registry = Arc::clone(self);
        tokio::spawn(async move { registry.load_all(&sources).await })
    }

    /// Load a single source and report whether it merged.
    pub async fn load_one(&self, source: &SourceDescriptor) -> bool {
        self.load_source(source).await.is_ok()
    }

    /// Load a single source, returning the number of entries merged or the
    /// cause of failure.
    ///
    /// Local sources complete without suspending; remote sources suspend at
    /// the HTTP request. The failure is logged here, absent sources at warn
    /// and everything else at error.
    pub async fn load_source(&self, source: &SourceDescriptor) -> ConfigResult<usize> {
        let kind = source.kind().as_str();
        let started = Instant::now();
        let result = self.loader.load(source.location()).await;
        record_load_duration(kind, started.elapsed());

        match result {
            Ok(entries) => {
                let merged = self.merge(source, entries);
                record_outcome(source, LoadOutcome::Loaded);
                Ok(merged)
            }
            Err(e) => {
                report_failure(source, &e);
                Err(e)
            }
        }
    }

    /// Merge already-parsed entries as if they had been loaded from `source`.
    ///
    /// Useful for hosts that obtain content through their own transport.
    pub fn apply(&self, source: &SourceDescriptor, entries: Vec<ParsedEntry>) -> usize {
        let merged = self.merge(source, entries);
        record_outcome(source, LoadOutcome::Loaded);
        merged
    }

    fn merge(&self, source: &SourceDescriptor, entries: Vec<ParsedEntry>) -> usize {
        let _guard = self.merge_lock.lock();

        let written = self.store.extend(
            entries
                .into_iter()
                .map(|entry| (source.qualify(&entry.key), entry.value)),
        );
        source.mark_loaded();

        info!(
            source = source.name(),
            kind = %source.kind(),
            prefix = source.prefix(),
            entries = written,
            "configuration source merged"
        );
        record_entries_merged(source.name(), written);

        self.hub.notify();
        written
    }

    /// Subscribe to load-completed notifications.
    pub fn on_config_loaded<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hub.subscribe(callback)
    }

    /// Subscribe for as long as the returned guard lives.
    pub fn on_config_loaded_scoped<F>(&self, callback: F) -> SubscriptionGuard
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hub.subscribe_scoped(callback)
    }

    /// Remove a subscription.
    pub fn remove_listener(&self, subscription: Subscription) -> bool {
        self.hub.unsubscribe(subscription)
    }

    /// See [`ValueStore::get_string`].
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.store.get_string(key)
    }

    /// See [`ValueStore::get_string_or`].
    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.store.get_string_or(key, default)
    }

    /// See [`ValueStore::get_float`].
    pub fn get_float(&self, key: &str, default: f32) -> ConfigResult<f32> {
        self.store.get_float(key, default)
    }

    /// See [`ValueStore::get_int`].
    pub fn get_int(&self, key: &str, default: i32) -> ConfigResult<i32> {
        self.store.get_int(key, default)
    }

    /// See [`ValueStore::get_bool`].
    pub fn get_bool(&self, key: &str, default: bool) -> ConfigResult<bool> {
        self.store.get_bool(key, default)
    }

    /// See [`ValueStore::get_vector3`].
    pub fn get_vector3(&self, key: &str, default: Vector3) -> ConfigResult<Vector3> {
        self.store.get_vector3(key, default)
    }
}

fn record_outcome(source: &SourceDescriptor, outcome: LoadOutcome) {
    record_source_load(source.name(), source.kind().as_str(), outcome);
}

fn report_failure(source: &SourceDescriptor, e: &ConfigError) {
    if e.is_not_found() {
        warn!(
            source = source.name(),
            location = %source.location(),
            error = %e,
            "configuration source not found, skipping"
        );
        record_outcome(source, LoadOutcome::NotFound);
    } else {
        error!(
            source = source.name(),
            location = %source.location(),
            error = %e,
            "configuration source failed to load"
        );
        record_outcome(source, LoadOutcome::Failed);
    }
}
