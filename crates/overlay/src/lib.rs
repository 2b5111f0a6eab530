//! # Overlay
//!
//! **Configuration facade for an in-process debug HUD**
//!
//! HUD collaborators (text labels, rotators, hotkey handlers, the screenshot
//! helper) read their settings through a [`DebugOverlay`]:
//!
//! - Local JSON files and remote HTTP endpoints, loaded in declared order
//! - Per-source key prefixes
//! - Typed reads (`f32`, `i32`, `bool`, [`Vector3`]) over string values
//! - A "config loaded" callback after every merge
//! - [`ConfigBinding`] for widgets that display one key
//! - [`HelpBoard`] for hotkey help and per-frame debug lines
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use overlay::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = SettingsLoader::new()
//!     .with_file("overlay.toml")?
//!     .with_env_prefix("OVERLAY")
//!     .load()?;
//!
//! let hud = DebugOverlay::from_settings(&settings)?;
//! let title = hud.bind("title");
//! hud.help("Rotator has no hotkeys.");
//!
//! hud.load_all().await;
//! let _watcher = hud.spawn_watcher()?;
//!
//! let rotation = hud.get_vector3("rotator_rotation", Vector3::ZERO)?;
//! println!("{} {rotation}", title.value().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binding;
mod debug_overlay;
mod help;

pub use binding::ConfigBinding;
pub use debug_overlay::{log_config, DebugOverlay};
pub use help::HelpBoard;

// Re-export the configuration core
pub use overlay_config as config;
pub use overlay_config::{
    ConfigError, ConfigRegistry, ConfigResult, LoadReport, SourceDescriptor, SourceOutcome,
    Vector3,
};

// Re-export telemetry setup
pub use overlay_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use overlay::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{ConfigBinding, DebugOverlay, HelpBoard};

    pub use overlay_config::{
        ConfigError, ConfigRegistry, ConfigResult, LoadReport, OverlaySettings, SettingsLoader,
        SourceDescriptor, SourceOutcome, Subscription, SubscriptionGuard, Vector3,
    };

    pub use overlay_telemetry::{init_logging, LogConfig};
}
