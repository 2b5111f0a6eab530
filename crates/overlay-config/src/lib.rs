//! Layered key/value configuration for the in-process debug overlay.
//!
//! This crate holds the configuration core that the HUD, hotkey and
//! screenshot collaborators read from:
//! - Local JSON files and remote HTTP endpoints as sources
//! - Per-source key prefixes for collision-free namespacing
//! - Ordered, partial-failure-tolerant loading
//! - Typed accessors over raw string values
//! - A "config loaded" notification after every merge
//!
//! # Overview
//!
//! ```text
//! [SourceDescriptor, ...]
//!     → SourceLoader      (read file / HTTP GET, parse `{ "data": [...] }`)
//!     → ConfigRegistry    (prefix keys, merge under the merge lock)
//!     → ValueStore        (last write wins)
//!     → NotificationHub   (callbacks re-read the store)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use overlay_config::{ConfigRegistry, SourceDescriptor, Vector3};
//!
//! # async fn example() -> Result<(), overlay_config::ConfigError> {
//! let registry = ConfigRegistry::new()?;
//! let sources = vec![
//!     SourceDescriptor::local("defaults", "config/hud.json"),
//!     SourceDescriptor::remote("live", "https://example.com/hud.json").with_prefix("live_"),
//! ];
//!
//! let _subscription = registry.on_config_loaded(|| println!("config changed"));
//! let report = registry.load_all(&sources).await;
//! println!("{} of {} sources loaded", report.loaded(), sources.len());
//!
//! let rotation = registry.get_vector3("rotator_rotation", Vector3::ZERO)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Source Format
//!
//! ```json
//! { "data": [ { "key": "title", "value": "Debug HUD" },
//!             { "key": "rotator_rotation", "value": "0,90,0" } ] }
//! ```
//!
//! All values are strings; numbers and vectors are parsed on read.

#![warn(missing_docs)]

mod error;
mod hub;
mod loader;
mod registry;
mod settings;
mod settings_loader;
mod source;
mod store;
mod watcher;

pub use error::{ConfigError, ConfigResult};
pub use hub::{NotificationHub, Subscription, SubscriptionGuard};
pub use loader::{parse_document, LoaderOptions, ParsedEntry, SourceLoader};
pub use registry::{ConfigRegistry, LoadReport, SourceOutcome};
pub use settings::*;
pub use settings_loader::SettingsLoader;
pub use source::{SourceDescriptor, SourceKind, SourceLocation};
pub use store::{ValueStore, Vector3};
pub use watcher::{SourceReload, SourceWatcher, SourceWatcherBuilder};
