//! # Configuration
//!
//! A plain string key/value store, set with `app.set(key, value)` and read
//! with `app.get(key)`. Keys are dotted (`http.port`, `media.folder`).
//! Hooks see an immutable [`ConfigSnapshot`] taken when the call started.
//!
//! ```rust
//! use catalog_core::CatalogApp;
//! let app = CatalogApp::<(), (), ()>::new();
//!
//! app.set("media.folder", "products");
//! assert_eq!(app.get("media.folder"), Some("products".to_string()));
//! ```
//!
//! Environment overrides use `PREFIX__SECTION__KEY`, see
//! [`CatalogConfig::apply_env`].

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct CatalogConfig {
    values: HashMap<String, String>,
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Apply `PREFIX__A__B=value` pairs as `a.b = value`.
    ///
    /// Segments are lowercased, except that a segment written in
    /// `UPPER_SNAKE` becomes `lowerCamel` (`MAX_FILE_BYTES` → `maxFileBytes`).
    pub fn apply_env<I>(&mut self, prefix: &str, vars: I) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let marker = format!("{prefix}__");
        let mut applied = 0;
        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(&marker) else {
                continue;
            };
            if stripped.is_empty() {
                continue;
            }
            let normalized = stripped
                .split("__")
                .map(camel_segment)
                .collect::<Vec<_>>()
                .join(".");
            self.set(normalized, value);
            applied += 1;
        }
        applied
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(self.values.clone())
    }
}

fn camel_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut upper_next = false;
    for ch in segment.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

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

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse::<bool>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_pairs_become_dotted_keys() {
        let mut cfg = CatalogConfig::new();
        let applied = cfg.apply_env(
            "CATALOG",
            vec![
                ("CATALOG__HTTP__PORT".to_string(), "8080".to_string()),
                ("CATALOG__UPLOADS__MAX_FILE_BYTES".to_string(), "1024".to_string()),
                ("OTHER__HTTP__PORT".to_string(), "1".to_string()),
                ("CATALOG__".to_string(), "ignored".to_string()),
            ],
        );

        assert_eq!(applied, 2);
        assert_eq!(cfg.get("http.port"), Some("8080"));
        assert_eq!(cfg.snapshot().get_usize("uploads.maxFileBytes"), Some(1024));
        assert!(!cfg.has("port"));
    }

    #[test]
    fn snapshot_is_detached() {
        let mut cfg = CatalogConfig::new();
        cfg.set("media.folder", "products");
        let snap = cfg.snapshot();
        cfg.set("media.folder", "other");

        assert_eq!(snap.get("media.folder"), Some("products"));
        assert_eq!(snap.get_bool("media.folder"), None);
    }
}
