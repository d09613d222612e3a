//! # PMOStatusApplet Configuration Module
//!
//! This module provides configuration management for PMOStatusApplet, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters for configuration values
//! - Thread-safe singleton access pattern
//!
//! The configuration is read-only once loaded: the applet keeps no state
//! across runs, so nothing is ever written back to disk.
//!
//! ## Usage
//!
//! ```no_run
//! use pmoconfig::get_config;
//!
//! let config = get_config();
//! let tick = config.get_tick_ms();
//! let base_url = config.get_status_base_url();
//! println!("polling {} every {} ms", base_url, tick);
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Value};
use std::{env, fs, path::Path, sync::Arc};
use tracing::{info, warn};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmostatus.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> = Arc::new(Config::load_config("").unwrap_or_else(|err| {
        warn!(error = %err, "Invalid configuration, falling back to embedded defaults");
        Config::embedded()
    }));
}

const ENV_CONFIG_DIR: &str = "PMOSTATUS_CONFIG";
const ENV_PREFIX: &str = "PMOSTATUS_CONFIG__";
const CONFIG_DIR_NAME: &str = ".pmostatus";

// Default values for configuration
const DEFAULT_STATUS_BASE_URL: &str = "http://127.0.0.1:4380";
const DEFAULT_STATUS_OAUTH_URL: &str = "https://open.spotify.com/token";
const DEFAULT_STATUS_TIMEOUT_MS: u64 = 1000;
const DEFAULT_TICK_MS: u64 = 33;
const DEFAULT_SHOW_TITLES: bool = true;
const DEFAULT_APPLET_NAME: &str = "Spotify Status Applet";
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";

/// Macro to generate a getter for u64 values with default
macro_rules! impl_u64_config {
    ($getter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> u64 {
            match self.get_value($path) {
                Ok(Value::Number(n)) => n.as_u64().unwrap_or($default),
                Ok(Value::String(s)) => s.trim().parse().unwrap_or_else(|_| {
                    warn!(path = %$path.join("."), value = %s, "Not a number, using default");
                    $default
                }),
                _ => $default,
            }
        }
    };
}

/// Macro to generate a getter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> bool {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => b,
                _ => $default,
            }
        }
    };
}

/// Macro to generate a getter for string values with default
macro_rules! impl_string_config {
    ($getter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> String {
            match self.get_value($path) {
                Ok(Value::String(s)) if !s.trim().is_empty() => s,
                _ => $default.to_string(),
            }
        }
    };
}

/// Configuration manager for PMOStatusApplet
///
/// This structure manages the application configuration, including:
/// - Loading configuration from YAML files
/// - Merging with default configuration
/// - Handling environment variable overrides
/// - Providing typed getters for configuration values
#[derive(Debug, Clone)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Value,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        // 1. Try provided directory
        if !directory.is_empty() {
            return directory.to_string();
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var=ENV_CONFIG_DIR, path=%env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Try current directory
        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        // Default fallback
        CONFIG_DIR_NAME.to_string()
    }

    /// Builds a configuration made only of the embedded defaults.
    pub fn embedded() -> Self {
        let data = serde_yaml::from_str::<Value>(DEFAULT_CONFIG)
            .map(Self::lower_keys_value)
            .unwrap_or_else(|_| Value::Mapping(Mapping::new()));
        Config {
            config_dir: String::new(),
            path: String::new(),
            data,
        }
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    ///
    /// A missing directory or file is not an error: the embedded defaults
    /// are used. A file that exists but is not valid YAML is an error.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        info!(config_dir=%config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        let mut config_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        match fs::read(&path) {
            Ok(data) => {
                info!(config_file=%path, "Loaded config file");
                let external_value: Value = serde_yaml::from_slice(&data)
                    .map_err(|e| anyhow!("Invalid YAML in {}: {}", path, e))?;
                merge_yaml(&mut config_value, &Self::lower_keys_value(external_value));
            }
            Err(_) => {
                info!(config_file=%path, "Config file not found, using default embedded config");
            }
        }

        let mut config_value = Self::lower_keys_value(config_value);
        Self::apply_env_overrides(&mut config_value, env::vars());

        Ok(Config {
            config_dir,
            path,
            data: config_value,
        })
    }

    /// Directory the configuration was looked up in.
    pub fn config_dir(&self) -> &str {
        &self.config_dir
    }

    /// Path of the `config.yaml` file merged over the defaults (it may not exist).
    pub fn config_file(&self) -> &str {
        &self.path
    }

    /// Gets a configuration value at the specified path
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["applet", "tick_ms"]`)
    ///
    /// # Returns
    ///
    /// Returns a `Result` containing the YAML value or an error if the path doesn't exist
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let mut current = &self.data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                let key = key.to_lowercase();

                if let Some(next) = map.get(&Value::String(key)) {
                    current = next;
                } else {
                    return Err(anyhow!("Path {} does not exist", path[..=i].join(".")));
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    /// Applies `PMOSTATUS_CONFIG__SECTION__KEY=value` overrides.
    pub fn apply_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::apply_env_overrides(&mut self.data, vars);
    }

    fn apply_env_overrides<I>(config: &mut Value, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let key_path = stripped.split("__").collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                if let Err(err) = Self::set_value_internal(config, &key_path, yaml_value) {
                    warn!(variable = %key, error = %err, "Ignoring configuration override");
                }
            }
        }
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key_value = Value::String(path[0].to_lowercase());
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    fn convert_env_value(value: &str) -> Value {
        if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
            return parsed;
        }
        Value::String(value.to_string())
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    if let Value::String(s) = k {
                        new_map.insert(Value::String(s.to_lowercase()), Self::lower_keys_value(v));
                    } else {
                        new_map.insert(k, Self::lower_keys_value(v));
                    }
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    impl_string_config!(
        get_status_base_url,
        &["status", "base_url"],
        DEFAULT_STATUS_BASE_URL
    );

    impl_string_config!(
        get_status_oauth_url,
        &["status", "oauth_url"],
        DEFAULT_STATUS_OAUTH_URL
    );

    /// OAuth token to use instead of fetching one, if configured.
    ///
    /// An all-digit token reads back from YAML as a number; it is
    /// stringified rather than dropped.
    pub fn get_status_oauth_token(&self) -> Option<String> {
        match self.get_value(&["status", "oauth_token"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Ok(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    impl_u64_config!(
        get_status_timeout_ms,
        &["status", "timeout_ms"],
        DEFAULT_STATUS_TIMEOUT_MS
    );

    impl_u64_config!(get_tick_ms, &["applet", "tick_ms"], DEFAULT_TICK_MS);

    impl_bool_config!(
        get_show_titles,
        &["applet", "show_titles"],
        DEFAULT_SHOW_TITLES
    );

    impl_string_config!(get_applet_name, &["applet", "name"], DEFAULT_APPLET_NAME);

    impl_string_config!(
        get_log_min_level,
        &["log", "min_level"],
        DEFAULT_LOG_MIN_LEVEL
    );

    /// Log file path, if one is configured.
    pub fn get_log_file(&self) -> Option<String> {
        match self.get_value(&["log", "file"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => Some(s),
            _ => None,
        }
    }
}

/// Returns the global configuration instance
///
/// This function provides access to the singleton configuration instance,
/// which is lazily loaded on first access.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// - For mappings (objects), it merges keys from external into default
/// - For scalars and sequences, external values replace default values
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(), // pour les scalaires ou séquences, on remplace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults() {
        let config = Config::embedded();
        assert_eq!(config.get_tick_ms(), 33);
        assert_eq!(config.get_status_timeout_ms(), 1000);
        assert!(config.get_show_titles());
        assert_eq!(config.get_status_base_url(), "http://127.0.0.1:4380");
        assert_eq!(config.get_status_oauth_token(), None);
        assert_eq!(config.get_log_file(), None);
        assert_eq!(config.get_log_min_level(), "INFO");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::embedded();
        config.apply_overrides(vec![
            ("PMOSTATUS_CONFIG__APPLET__TICK_MS".to_string(), "50".to_string()),
            ("PMOSTATUS_CONFIG__APPLET__SHOW_TITLES".to_string(), "false".to_string()),
            ("PMOSTATUS_CONFIG__STATUS__OAUTH_TOKEN".to_string(), "abc".to_string()),
            ("UNRELATED".to_string(), "1".to_string()),
        ]);
        assert_eq!(config.get_tick_ms(), 50);
        assert!(!config.get_show_titles());
        assert_eq!(config.get_status_oauth_token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_numeric_oauth_token_override() {
        let mut config = Config::embedded();
        config.apply_overrides(vec![(
            "PMOSTATUS_CONFIG__STATUS__OAUTH_TOKEN".to_string(),
            "4815162342".to_string(),
        )]);
        assert_eq!(
            config.get_status_oauth_token().as_deref(),
            Some("4815162342")
        );
    }

    #[test]
    fn test_merge_yaml_keeps_unset_defaults() {
        let mut default: Value = serde_yaml::from_str("a: {b: 1, c: 2}").unwrap();
        let external: Value = serde_yaml::from_str("a: {c: 3}").unwrap();
        merge_yaml(&mut default, &external);
        let expected: Value = serde_yaml::from_str("a: {b: 1, c: 3}").unwrap();
        assert_eq!(default, expected);
    }

    #[test]
    fn test_get_value_missing_path() {
        let config = Config::embedded();
        assert!(config.get_value(&["applet", "nope"]).is_err());
        assert!(config.get_value(&["applet", "tick_ms", "deeper"]).is_err());
    }

    #[test]
    fn test_bad_number_falls_back() {
        let mut config = Config::embedded();
        config.apply_overrides(vec![(
            "PMOSTATUS_CONFIG__STATUS__TIMEOUT_MS".to_string(),
            "soon".to_string(),
        )]);
        assert_eq!(config.get_status_timeout_ms(), DEFAULT_STATUS_TIMEOUT_MS);
    }
}
