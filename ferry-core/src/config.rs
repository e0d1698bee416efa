//! # Ferry Configuration
//!
//! A minimal string key/value store. Values are dotted keys
//! (`compression.threshold`, `datasource.s3.bucket`) and stay strings
//! until a [`ConfigSnapshot`] parses them on the way out.
//!
//! ```rust
//! use ferry_core::FerryConfig;
//!
//! let mut config = FerryConfig::new();
//! config.set("compression.enabled", "true");
//! config.set("compression.threshold", "1024");
//!
//! let snapshot = config.snapshot();
//! assert_eq!(snapshot.get_bool("compression.enabled"), Some(true));
//! assert_eq!(snapshot.get_u64("compression.threshold"), Some(1024));
//! ```
//!
//! ## Environment overrides
//! [`FerryConfig::load_env`] maps prefixed variables onto keys:
//!
//! ```bash
//! export FERRY__DATASOURCE__TYPE=s3   # datasource.type = s3
//! ```

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct FerryConfig {
    values: HashMap<String, String>,
}

impl FerryConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Set a key only when it has no value yet.
    pub fn set_default<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Get a configuration value by key.
    ///
    /// Returns None if the key is not present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Check whether a key is present.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Copy every `PREFIX...` variable of the process environment into the store.
    ///
    /// `FERRY__COMPRESSION__THRESHOLD` with prefix `FERRY__` becomes
    /// `compression.threshold`. Returns the number of keys loaded.
    pub fn load_env(&mut self, prefix: &str) -> usize {
        self.load_vars(prefix, std::env::vars())
    }

    /// Same as [`load_env`](Self::load_env) over an explicit variable list.
    pub fn load_vars<I>(&mut self, prefix: &str, vars: I) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut loaded = 0;
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                if stripped.is_empty() {
                    continue;
                }
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(normalized, value);
                loaded += 1;
            }
        }
        loaded
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(self.values.clone())
    }
}

/// Read-only view of the configuration, taken once at startup.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    map: HashMap<String, String>,
}

impl ConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_u16(&self, key: &str) -> Option<u16> {
        self.get(key).and_then(|v| v.trim().parse::<u16>().ok())
    }

    /// Accepts `true`/`false` in any case, plus `1`/`0`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        let value = self.get(key)?.trim();
        if value.eq_ignore_ascii_case("true") || value == "1" {
            Some(true)
        } else if value.eq_ignore_ascii_case("false") || value == "0" {
            Some(false)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_vars_map_to_dotted_keys() {
        let mut config = FerryConfig::new();
        let loaded = config.load_vars(
            "FERRY__",
            vec![
                ("FERRY__COMPRESSION__ENABLED".to_string(), "TRUE".to_string()),
                ("FERRY__DATASOURCE__S3__BUCKET".to_string(), "files".to_string()),
                ("OTHER__VALUE".to_string(), "ignored".to_string()),
                ("FERRY__".to_string(), "ignored".to_string()),
            ],
        );

        assert_eq!(loaded, 2);
        assert_eq!(config.get("compression.enabled"), Some("TRUE"));
        assert_eq!(config.get("datasource.s3.bucket"), Some("files"));
        assert!(!config.has("other.value"));
    }

    #[test]
    fn defaults_do_not_override_explicit_values() {
        let mut config = FerryConfig::new();
        config.set("http.port", "8080");
        config.set_default("http.port", "3000");
        config.set_default("http.host", "127.0.0.1");

        assert_eq!(config.get("http.port"), Some("8080"));
        assert_eq!(config.get("http.host"), Some("127.0.0.1"));
    }

    #[test]
    fn snapshot_parses_typed_values() {
        let mut config = FerryConfig::new();
        config.set("a", "1");
        config.set("b", "nope");
        config.set("c", " 42 ");
        let snapshot = config.snapshot();

        assert_eq!(snapshot.get_bool("a"), Some(true));
        assert_eq!(snapshot.get_bool("b"), None);
        assert_eq!(snapshot.get_u64("c"), Some(42));
        assert_eq!(snapshot.get_u16("b"), None);
        assert_eq!(snapshot.get_usize("missing"), None);
    }
}
