//! Widgets bound to a single configuration key.
//!
//! A [`ConfigBinding`] reads its key as soon as it is created and again after
//! every merge. A lookup that finds nothing leaves the cached value alone, so
//! a text label keeps showing its last known value while a later source that
//! does not mention the key loads.

use std::sync::{Arc, Weak};

use overlay_config::{ConfigRegistry, SubscriptionGuard};
use parking_lot::RwLock;
use tracing::trace;

/// Keeps one key's value fresh for as long as it lives.
///
/// Dropping the binding unsubscribes it from the registry.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use overlay::{ConfigBinding, ConfigRegistry};
///
/// # fn example() -> Result<(), overlay::ConfigError> {
/// let registry = Arc::new(ConfigRegistry::new()?);
/// let title = ConfigBinding::new(&registry, "title");
///
/// // Later, each frame:
/// let label = title.value().unwrap_or_default();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigBinding {
    key: Arc<str>,
    value: Arc<RwLock<Option<String>>>,
    _subscription: SubscriptionGuard,
}

impl ConfigBinding {
    /// Bind `key`, reading its current value immediately.
    pub fn new(registry: &Arc<ConfigRegistry>, key: impl Into<String>) -> Self {
        let key: Arc<str> = Arc::from(key.into());
        let value = Arc::new(RwLock::new(None));
        refresh(registry, &key, &value);

        // Weak so the hub does not keep the registry alive through itself.
        let weak: Weak<ConfigRegistry> = Arc::downgrade(registry);
        let callback_key = Arc::clone(&key);
        let callback_value = Arc::clone(&value);
        let subscription = registry.on_config_loaded_scoped(move || {
            if let Some(registry) = weak.upgrade() {
                refresh(&registry, &callback_key, &callback_value);
            }
        });

        Self {
            key,
            value,
            _subscription: subscription,
        }
    }

    /// Bound key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Last value seen for the key, if it has ever been present.
    pub fn value(&self) -> Option<String> {
        self.value.read().clone()
    }
}

fn refresh(registry: &ConfigRegistry, key: &str, slot: &RwLock<Option<String>>) {
    if let Some(value) = registry.get_string(key) {
        trace!(key, value = %value, "binding refreshed");
        *slot.write() = Some(value);
    }
}
