//! The overlay aggregate handed to HUD collaborators.

use std::sync::Arc;
use std::time::Duration;

use overlay_config::{
    ConfigError, ConfigRegistry, ConfigResult, LoadReport, LogFormat, LoggingSettings,
    OverlaySettings, SourceDescriptor, SourceKind, SourceWatcher, Subscription, Vector3,
    WatchSettings,
};
use overlay_telemetry::LogConfig;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::binding::ConfigBinding;
use crate::help::HelpBoard;

/// Configuration registry, declared sources and help board in one place.
///
/// Cheap to clone; clones share the same registry, sources and board.
#[derive(Debug, Clone)]
pub struct DebugOverlay {
    registry: Arc<ConfigRegistry>,
    sources: Arc<[SourceDescriptor]>,
    board: Arc<HelpBoard>,
    watch: WatchSettings,
}

impl DebugOverlay {
    /// Build an overlay over an existing registry and source list.
    /// File watching is off.
    pub fn new(registry: Arc<ConfigRegistry>, sources: Vec<SourceDescriptor>) -> Self {
        Self {
            registry,
            sources: sources.into(),
            board: Arc::new(HelpBoard::new()),
            watch: WatchSettings::default(),
        }
    }

    /// Build an overlay from a settings manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings fail validation or the HTTP client
    /// cannot be built.
    pub fn from_settings(settings: &OverlaySettings) -> ConfigResult<Self> {
        settings.validate()?;
        let registry = ConfigRegistry::with_options(&settings.loader_options())?;

        Ok(Self {
            registry: Arc::new(registry),
            sources: settings.descriptors().into(),
            board: Arc::new(HelpBoard::new()),
            watch: settings.watch.clone(),
        })
    }

    /// Shared registry.
    pub fn registry(&self) -> &Arc<ConfigRegistry> {
        &self.registry
    }

    /// Declared sources in load order.
    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    /// Look up a declared source by name.
    pub fn source(&self, name: &str) -> Option<&SourceDescriptor> {
        self.sources.iter().find(|source| source.name() == name)
    }

    /// Help and debug text board.
    pub fn board(&self) -> &HelpBoard {
        &self.board
    }

    /// Load every declared source in order.
    pub async fn load_all(&self) -> LoadReport {
        self.registry.load_all(&self.sources).await
    }

    /// Load every declared source on a background task.
    pub fn spawn_load_all(&self) -> JoinHandle<LoadReport> {
        self.registry.spawn_load_all(Arc::clone(&self.sources))
    }

    /// Reload one declared source by name.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConfig` if no source has that name. A
    /// source that fails to load is reported as `Ok(false)`.
    pub async fn load_one(&self, name: &str) -> ConfigResult<bool> {
        let source = self.source(name).ok_or_else(|| ConfigError::InvalidConfig {
            message: format!("unknown source: {name}"),
        })?;
        Ok(self.registry.load_one(source).await)
    }

    /// Start hot-reload of local sources when `[watch].enabled` is set.
    ///
    /// Returns `Ok(None)` when watching is disabled or nothing is local.
    ///
    /// # Errors
    ///
    /// Returns an error if the file watcher cannot be created.
    pub fn spawn_watcher(&self) -> ConfigResult<Option<JoinHandle<()>>> {
        if !self.watch.enabled {
            return Ok(None);
        }
        if !self
            .sources
            .iter()
            .any(|source| source.kind() == SourceKind::Local)
        {
            debug!("watching enabled but no local sources declared");
            return Ok(None);
        }

        let mut watcher =
            SourceWatcher::builder(Arc::clone(&self.registry), Arc::clone(&self.sources))
                .with_debounce(Duration::from_millis(self.watch.debounce_ms))
                .build()?;
        info!(paths = watcher.watched_paths().len(), "watching local sources");

        Ok(Some(tokio::spawn(async move { watcher.run().await })))
    }

    /// Bind a widget to `key`.
    pub fn bind(&self, key: impl Into<String>) -> ConfigBinding {
        ConfigBinding::new(&self.registry, key)
    }

    /// See [`ConfigRegistry::on_config_loaded`].
    pub fn on_config_loaded<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.registry.on_config_loaded(callback)
    }

    /// See [`ConfigRegistry::remove_listener`].
    pub fn remove_listener(&self, subscription: Subscription) -> bool {
        self.registry.remove_listener(subscription)
    }

    /// See [`HelpBoard::help`].
    pub fn help(&self, text: &str) {
        self.board.help(text);
    }

    /// See [`HelpBoard::debug`].
    pub fn debug(&self, text: &str) {
        self.board.debug(text);
    }

    /// See [`HelpBoard::begin_frame`].
    pub fn begin_frame(&self) {
        self.board.begin_frame();
    }

    /// See [`ConfigRegistry::get_string`].
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.registry.get_string(key)
    }

    /// See [`ConfigRegistry::get_float`].
    pub fn get_float(&self, key: &str, default: f32) -> ConfigResult<f32> {
        self.registry.get_float(key, default)
    }

    /// See [`ConfigRegistry::get_int`].
    pub fn get_int(&self, key: &str, default: i32) -> ConfigResult<i32> {
        self.registry.get_int(key, default)
    }

    /// See [`ConfigRegistry::get_bool`].
    pub fn get_bool(&self, key: &str, default: bool) -> ConfigResult<bool> {
        self.registry.get_bool(key, default)
    }

    /// See [`ConfigRegistry::get_vector3`].
    pub fn get_vector3(&self, key: &str, default: Vector3) -> ConfigResult<Vector3> {
        self.registry.get_vector3(key, default)
    }
}

/// Logging configuration for a manifest's `[logging]` section.
pub fn log_config(settings: &LoggingSettings) -> LogConfig {
    let base = match settings.format {
        LogFormat::Json => LogConfig::production(),
        LogFormat::Pretty => LogConfig::default(),
    };
    base.with_filter(settings.level.clone())
}
