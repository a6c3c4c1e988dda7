//! Configuration loading and management

use super::schema::Config;
use super::validate::validate_config;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Configuration loader
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a new config loader with the default config directory
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .map(|h| h.join(".toolbridge"))
            .unwrap_or_else(|| PathBuf::from(".toolbridge"));

        Self { config_dir }
    }

    /// Create a new config loader with a custom config directory
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Load configuration from file and environment
    pub fn load(&self) -> crate::Result<Config> {
        let config_path = self.config_dir.join("config.json");
        let mut merged = serde_json::to_value(Config::default())?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let file_value: Value = serde_json::from_str(&content).map_err(|e| {
                crate::Error::Config(format!("{}: {}", config_path.display(), e))
            })?;
            overlay(&mut merged, file_value);
        }

        apply_alias_overrides(&mut merged);
        apply_path_overrides(&mut merged);

        let config: Config = serde_json::from_value(merged)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &Config) -> crate::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        let config_path = self.config_dir.join("config.json");
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment variables that feed a config field; the first one set wins
const ENV_ALIASES: &[(&[&str], &[&str])] = &[
    (
        &["Z_AI_API_KEY", "ZAI_API_KEY", "ZHIPUAI_API_KEY"],
        &["zai", "api_key"],
    ),
    (&["GEMINI_CLI"], &["gemini", "binary"]),
];

const PATH_OVERRIDE_PREFIX: &str = "TOOLBRIDGE__";

/// Recursively lay `top` over `bottom`; objects merge key by key, anything else replaces
fn overlay(bottom: &mut Value, top: Value) {
    let Value::Object(top_map) = top else {
        *bottom = top;
        return;
    };
    let Value::Object(bottom_map) = &mut *bottom else {
        *bottom = Value::Object(top_map);
        return;
    };
    for (key, value) in top_map {
        match bottom_map.get_mut(&key) {
            Some(slot) => overlay(slot, value),
            None => {
                bottom_map.insert(key, value);
            }
        }
    }
}

/// Environment strings become JSON where they parse as JSON, otherwise text
fn coerce_env_value(raw: &str) -> Value {
    match raw.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Place `value` at `path`, turning any non-object on the way into an object
fn insert_at_path<S: AsRef<str>>(root: &mut Value, path: &[S], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *root = value;
        return;
    };

    let mut node = root;
    for key in parents {
        let Some(map) = object_mut(node) else { return };
        node = map
            .entry(key.as_ref())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if let Some(map) = object_mut(node) {
        map.insert(last.as_ref().to_string(), value);
    }
}

fn object_mut(node: &mut Value) -> Option<&mut Map<String, Value>> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    node.as_object_mut()
}

fn apply_alias_overrides(config: &mut Value) {
    for (names, path) in ENV_ALIASES {
        let found = names.iter().find_map(|name| std::env::var(name).ok());
        if let Some(value) = found {
            insert_at_path(config, *path, Value::String(value));
        }
    }
}

/// `TOOLBRIDGE__ZAI__TIMEOUT_SECS=60` sets `zai.timeout_secs`
fn override_path(key: &str) -> Option<Vec<String>> {
    let path: Vec<String> = key
        .strip_prefix(PATH_OVERRIDE_PREFIX)?
        .split("__")
        .filter(|segment| !segment.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    (!path.is_empty()).then_some(path)
}

fn apply_path_overrides(config: &mut Value) {
    let overrides = std::env::vars()
        .filter_map(|(key, raw)| override_path(&key).map(|path| (path, coerce_env_value(&raw))));
    for (path, value) in overrides {
        insert_at_path(config, path.as_slice(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::{Mutex, MutexGuard};
    use tempfile::TempDir;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    struct EnvVarGuard {
        key: String,
        original: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &str, value: &str) -> Self {
            let original = std::env::var(key).ok();
            // SAFETY: tests serialize env mutations with ENV_LOCK.
            unsafe { std::env::set_var(key, value) };
            Self {
                key: key.to_string(),
                original,
            }
        }

        fn unset(key: &str) -> Self {
            let original = std::env::var(key).ok();
            // SAFETY: tests serialize env mutations with ENV_LOCK.
            unsafe { std::env::remove_var(key) };
            Self {
                key: key.to_string(),
                original,
            }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.original {
                // SAFETY: tests serialize env mutations with ENV_LOCK.
                unsafe { std::env::set_var(&self.key, value) };
            } else {
                // SAFETY: tests serialize env mutations with ENV_LOCK.
                unsafe { std::env::remove_var(&self.key) };
            }
        }
    }

    fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn clear_key_aliases() -> Vec<EnvVarGuard> {
        ["Z_AI_API_KEY", "ZAI_API_KEY", "ZHIPUAI_API_KEY", "GEMINI_CLI"]
            .iter()
            .map(|key| EnvVarGuard::unset(key))
            .collect()
    }

    #[test]
    fn test_load_default_config() {
        let _lock = lock_env();
        let _aliases = clear_key_aliases();
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let config = loader.load().unwrap();

        assert_eq!(config.zai.default_model, "glm-4.7");
        assert_eq!(config.gemini.binary, "gemini");
        assert!(config.zai.api_key.is_empty());
    }

    #[test]
    fn test_save_and_load_config() {
        let _lock = lock_env();
        let _aliases = clear_key_aliases();
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());

        let mut config = Config::default();
        config.gemini.default_model = Some("gemini-2.5-pro".to_string());

        loader.save(&config).unwrap();
        let loaded = loader.load().unwrap();

        assert_eq!(loaded.gemini.default_model.as_deref(), Some("gemini-2.5-pro"));
    }

    #[test]
    fn test_load_applies_alias_env_overrides() {
        let _lock = lock_env();
        let _aliases = clear_key_aliases();
        let _key_guard = EnvVarGuard::set("Z_AI_API_KEY", "zai-from-env");
        let _bin_guard = EnvVarGuard::set("GEMINI_CLI", "/opt/bin/gemini");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let config = loader.load().unwrap();

        assert_eq!(config.zai.api_key, "zai-from-env");
        assert_eq!(config.gemini.binary, "/opt/bin/gemini");
    }

    #[test]
    fn test_load_applies_path_env_overrides() {
        let _lock = lock_env();
        let _aliases = clear_key_aliases();
        let _model_guard = EnvVarGuard::set("TOOLBRIDGE__ZAI__DEFAULT_MODEL", "glm-4.6");
        let _timeout_guard = EnvVarGuard::set("TOOLBRIDGE__GEMINI__TIMEOUT_SECS", "300");
        let _yolo_guard = EnvVarGuard::set("TOOLBRIDGE__GEMINI__YOLO", "false");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let config = loader.load().unwrap();

        assert_eq!(config.zai.default_model, "glm-4.6");
        assert_eq!(config.gemini.timeout_secs, 300);
        assert!(!config.gemini.yolo);
    }

    #[test]
    fn test_path_env_overrides_alias_and_file() {
        let _lock = lock_env();
        let _aliases = clear_key_aliases();
        let _alias_guard = EnvVarGuard::set("ZAI_API_KEY", "zai-alias");
        let _path_guard = EnvVarGuard::set("TOOLBRIDGE__ZAI__API_KEY", "zai-path-override");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());

        let config_path = temp_dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"zai":{"api_key":"zai-file"}}"#).unwrap();

        let config = loader.load().unwrap();
        assert_eq!(config.zai.api_key, "zai-path-override");
    }

    #[test]
    fn test_file_values_merge_over_defaults() {
        let _lock = lock_env();
        let _aliases = clear_key_aliases();
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());

        std::fs::write(
            temp_dir.path().join("config.json"),
            r#"{"gemini":{"admin_timeout_secs":5},"logging":{"format":"json"}}"#,
        )
        .unwrap();

        let config = loader.load().unwrap();
        assert_eq!(config.gemini.admin_timeout_secs, 5);
        assert_eq!(config.gemini.timeout_secs, 120);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let _lock = lock_env();
        let _aliases = clear_key_aliases();
        let _timeout_guard = EnvVarGuard::set("TOOLBRIDGE__ZAI__TIMEOUT_SECS", "0");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let err = loader.load().unwrap_err();
        assert!(err.to_string().contains("zai.timeout_secs"));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let _lock = lock_env();
        let _aliases = clear_key_aliases();
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        std::fs::write(temp_dir.path().join("config.json"), "{not json").unwrap();

        let err = loader.load().unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_first_alias_wins() {
        let _lock = lock_env();
        let _aliases = clear_key_aliases();
        let _primary = EnvVarGuard::set("Z_AI_API_KEY", "primary");
        let _fallback = EnvVarGuard::set("ZHIPUAI_API_KEY", "fallback");

        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::with_dir(temp_dir.path()).load().unwrap();
        assert_eq!(config.zai.api_key, "primary");
    }

    #[test]
    fn test_override_path_parsing() {
        assert_eq!(
            override_path("TOOLBRIDGE__LOGGING__OVERRIDES__HYPER"),
            Some(vec![
                "logging".to_string(),
                "overrides".to_string(),
                "hyper".to_string()
            ])
        );
        assert_eq!(override_path("TOOLBRIDGE__"), None);
        assert_eq!(override_path("TOOLBRIDGE____"), None);
        assert_eq!(override_path("HOME"), None);
    }

    #[test]
    fn test_coerce_env_value() {
        assert_eq!(coerce_env_value("TRUE"), Value::Bool(true));
        assert_eq!(coerce_env_value("42"), serde_json::json!(42));
        assert_eq!(coerce_env_value("null"), Value::Null);
        assert_eq!(coerce_env_value("glm-4.6"), serde_json::json!("glm-4.6"));
    }

    #[test]
    fn test_insert_at_path_replaces_scalars() {
        let mut root = serde_json::json!({"zai": "oops", "gemini": {"yolo": true}});
        insert_at_path(&mut root, &["zai", "api_key"], serde_json::json!("k"));
        insert_at_path(&mut root, &["gemini", "binary"], serde_json::json!("g"));
        assert_eq!(
            root,
            serde_json::json!({
                "zai": {"api_key": "k"},
                "gemini": {"yolo": true, "binary": "g"}
            })
        );
    }

    #[test]
    fn test_overlay_keeps_untouched_keys() {
        let mut bottom = serde_json::json!({"a": {"b": 1, "c": 2}, "d": 3});
        overlay(&mut bottom, serde_json::json!({"a": {"c": 20}, "e": 5}));
        assert_eq!(
            bottom,
            serde_json::json!({"a": {"b": 1, "c": 20}, "d": 3, "e": 5})
        );
    }
}
