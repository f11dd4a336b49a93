use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::{fmt::Debug, fs, path::Path};

/// Namespace the host application prefixes onto every key it writes.
pub const DEFAULT_NAMESPACE: &str = "flutter.";

/// Read-only, string-valued view over the host's key-value store.
pub trait PreferenceStore: Send + Sync + Debug {
    /// Returns the stored string for `key`, or `default` when the key is
    /// missing or holds a non-string value.
    fn get_string(&self, key: &str, default: &str) -> String;
}

/// Shared preferences as written by the host app: a flat JSON object whose
/// keys carry the host's namespace prefix.
#[derive(Debug, Clone, Default)]
pub struct SharedPreferences {
    namespace: String,
    values: Map<String, Value>,
}

impl SharedPreferences {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            values: Map::new(),
        }
    }

    /// Load from a `shared_preferences.json` file. A missing file is an empty store.
    pub fn load(path: &Path, namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "preference file not found, using defaults");
            return Ok(Self::new(namespace));
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read preference file: {}", path.display()))?;

        let values: Map<String, Value> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse preference file: {}", path.display()))?;

        Ok(Self { namespace, values })
    }

    /// Store an un-namespaced key. Used to seed stores in tests and demos.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(self.namespaced(key), value.into());
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }
}

impl PreferenceStore for SharedPreferences {
    fn get_string(&self, key: &str, default: &str) -> String {
        match self.values.get(&self.namespaced(key)) {
            Some(Value::String(s)) => s.clone(),
            _ => default.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_namespaced_string() {
        let prefs = SharedPreferences::new(DEFAULT_NAMESPACE).with("city", "Paris");
        assert_eq!(prefs.get_string("city", "Город"), "Paris");
    }

    #[test]
    fn missing_key_yields_default() {
        let prefs = SharedPreferences::new(DEFAULT_NAMESPACE);
        assert_eq!(prefs.get_string("temp", "20°C"), "20°C");
    }

    #[test]
    fn non_string_value_yields_default() {
        let prefs = SharedPreferences::new(DEFAULT_NAMESPACE).with("temp", 15);
        assert_eq!(prefs.get_string("temp", "20°C"), "20°C");
    }

    #[test]
    fn key_without_namespace_is_not_visible() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"city": "Oslo", "flutter.temp": "3°C"}}"#).unwrap();

        let prefs = SharedPreferences::load(file.path(), DEFAULT_NAMESPACE).unwrap();
        assert_eq!(prefs.get_string("city", "Город"), "Город");
        assert_eq!(prefs.get_string("temp", "20°C"), "3°C");
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = SharedPreferences::load(&dir.path().join("nope.json"), "app.").unwrap();

        assert_eq!(prefs.namespace(), "app.");
        assert_eq!(prefs.get_string("wind", ""), "");
    }

    #[test]
    fn load_malformed_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = SharedPreferences::load(file.path(), DEFAULT_NAMESPACE).unwrap_err();
        assert!(err.to_string().contains("Failed to parse preference file"));
    }
}
