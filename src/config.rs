use std::path::Path;

use toml::Value;

use crate::error::Error;

/// Opaque key-value settings store backing policy construction.
/// Wraps a parsed TOML document and serves nested values by dotted key
/// path with per-key default fallback. The engine never writes to it.
pub struct Settings {
    root: Value,
}

impl Settings {
    /// Load settings from `linkgate.toml` in the given directory.
    /// Returns an empty store (all defaults) if the file doesn't exist.
    /// Returns an error if the file exists but is malformed — never
    /// silently falls back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(dir: &Path) -> Result<Self, Error> {
        let path = dir.join("linkgate.toml");
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::empty()),
            Err(e) => return Err(Error::Io(e)),
        };

        let root: Value = toml::from_str(&content)?;
        Ok(Self { root })
    }

    /// A store with no keys set; every lookup falls back to its default.
    pub fn empty() -> Self {
        Self {
            root: Value::Table(toml::map::Map::new()),
        }
    }

    /// Wrap an already-parsed TOML value. Used when the host application
    /// owns settings loading and hands the engine one subtree.
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Fetch a nested value by dotted key path, e.g.
    /// `security.allowed_domains`. Returns `None` if any segment is
    /// missing or a non-table is traversed.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut current = &self.root;
        for part in key.split('.') {
            current = current.as_table()?.get(part)?;
        }
        Some(current)
    }

    /// Boolean at `key`, or `default` when absent or not a boolean.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Non-negative integer at `key`, or `default` when absent, not an
    /// integer, or negative.
    pub fn get_usize(&self, key: &str, default: usize) -> usize {
        self.get(key)
            .and_then(Value::as_integer)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(default)
    }

    /// String array at `key`, or `default` when absent. Non-string
    /// elements are skipped.
    pub fn get_string_list(&self, key: &str, default: &[&str]) -> Vec<String> {
        match self.get(key).and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
            None => default.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}
