//! Resolved key/value storage with typed accessors.
//!
//! Every value is kept in its raw textual form. Interpretation as a number,
//! boolean or vector happens only at read time, and a stored value that does
//! not parse is reported as an error rather than replaced by the default:
//! a malformed value is a configuration bug, a missing key is not.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;

use crate::error::{ConfigError, ConfigResult};

/// A three-component vector read from a `"x,y,z"` value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vector3 {
    /// Zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a vector from its components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<(f32, f32, f32)> for Vector3 {
    fn from((x, y, z): (f32, f32, f32)) -> Self {
        Self::new(x, y, z)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

/// Process-wide map from key to raw string value.
///
/// Keys are unique and a later [`set`](Self::set) overwrites the prior value.
/// Each write is atomic with respect to readers; readers never block each
/// other.
#[derive(Debug, Default)]
pub struct ValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl ValueStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().insert(key.into(), value.into());
    }

    /// Insert a batch of values under one write lock, in iteration order.
    ///
    /// Returns the number of entries written.
    pub fn extend<I, K, V>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = self.entries.write();
        let mut written = 0;
        for (key, value) in entries {
            map.insert(key.into(), value.into());
            written += 1;
        }
        written
    }

    /// Look up a raw value. `None` means the key was never written, which is
    /// distinct from a key that maps to the empty string.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    /// Look up a raw value, substituting `default` when the key is absent.
    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse the stored value as `T`, or return `default` when absent.
    ///
    /// `expected` names the type in the error reported for a value that does
    /// not parse.
    pub fn get_parsed<T: FromStr>(
        &self,
        key: &str,
        default: T,
        expected: &'static str,
    ) -> ConfigResult<T> {
        match self.get_string(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_value(key, raw, expected)),
        }
    }

    /// Read a float, or `default` when the key is absent.
    pub fn get_float(&self, key: &str, default: f32) -> ConfigResult<f32> {
        self.get_parsed(key, default, "float")
    }

    /// Read an integer, or `default` when the key is absent.
    pub fn get_int(&self, key: &str, default: i32) -> ConfigResult<i32> {
        self.get_parsed(key, default, "integer")
    }

    /// Read a boolean, or `default` when the key is absent.
    ///
    /// Accepts `true/false`, `1/0`, `yes/no` and `on/off`, case-insensitively.
    pub fn get_bool(&self, key: &str, default: bool) -> ConfigResult<bool> {
        match self.get_string(key) {
            None => Ok(default),
            Some(raw) => {
                parse_bool(raw.trim()).ok_or_else(|| ConfigError::invalid_value(key, raw, "boolean"))
            }
        }
    }

    /// Read a vector stored as exactly three comma-separated numbers, or
    /// `default` when the key is absent.
    pub fn get_vector3(&self, key: &str, default: Vector3) -> ConfigResult<Vector3> {
        match self.get_string(key) {
            None => Ok(default),
            Some(raw) => parse_vector3(key, &raw),
        }
    }

    /// Whether the key has been written.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// A sorted copy of every stored entry.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

fn parse_vector3(key: &str, raw: &str) -> ConfigResult<Vector3> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(ConfigError::Format {
            key: key.to_string(),
            value: raw.to_string(),
            expected: 3,
            found: parts.len(),
        });
    }

    let mut components = [0.0_f32; 3];
    for (slot, part) in components.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| ConfigError::invalid_value(key, raw, "vector3"))?;
    }

    Ok(Vector3::new(components[0], components[1], components[2]))
}

/// Parse a boolean from a string.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
