// src/config/mod.rs

//! Layered configuration for the client
//!
//! Settings come from up to three kinds of layers, merged in priority order:
//! - configuration files (YAML, JSON or TOML, chosen by extension)
//! - environment variables with the `UPS_CALC_` prefix
//! - in-memory values (command-line overrides, tests)

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, ErrorKind, Result};
use crate::manager::{ManagedState, Manager, ManagerState, ManagerStatus};

pub const ENV_PREFIX: &str = "UPS_CALC";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub key: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation error for '{}': {}", self.key, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ConfigSource {
    File { path: PathBuf, format: ConfigFormat },
    Environment { prefix: String },
    Memory { data: Value },
}

#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub name: String,
    pub source: ConfigSource,
    pub priority: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
    pub polling: PollingConfig,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    /// Checks the values the client cannot run without.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        let base_url = self.api.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            errors.push(ValidationError {
                key: "api.base_url".to_string(),
                message: format!("'{}' is not an http(s) URL", self.api.base_url),
            });
        }

        if self.polling.interval_ms == 0 {
            errors.push(ValidationError {
                key: "polling.interval_ms".to_string(),
                message: "polling interval must be greater than zero".to_string(),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            errors.push(ValidationError {
                key: "logging.level".to_string(),
                message: format!("unknown log level '{}'", self.logging.level),
            });
        }

        errors
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub version: String,
    pub environment: String,
    pub debug: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "UPS Calc".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
            debug: cfg!(debug_assertions),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend origin, without a trailing `/api`.
    pub base_url: String,
    /// Per-request timeout; `None` waits for the server indefinitely.
    pub timeout_ms: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub console: bool,
    pub file: Option<FileLogConfig>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            console: true,
            file: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileLogConfig {
    pub directory: PathBuf,
    pub file_prefix: String,
}

impl Default for FileLogConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./logs"),
            file_prefix: "ups_calc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Serve the built-in demo catalog when the backend is unreachable.
    pub offline_fallback: bool,
}

pub struct ConfigManager {
    state: ManagedState,
    layers: Vec<ConfigLayer>,
    merged_config: Arc<RwLock<Value>>,
    env_prefix: String,
}

impl fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigManager")
            .field("layers", &self.layers.len())
            .field("env_prefix", &self.env_prefix)
            .finish()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            state: ManagedState::new(Uuid::new_v4(), "config_manager"),
            layers: Vec::new(),
            merged_config: Arc::new(RwLock::new(Value::Object(Map::new()))),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    pub fn with_config_file<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let mut manager = Self::new();
        manager.add_file_layer("file", config_path, 0)?;
        Ok(manager)
    }

    /// Overrides the environment prefix picked up on `initialize`.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn add_file_layer<P: AsRef<Path>>(
        &mut self,
        name: impl Into<String>,
        path: P,
        priority: u32,
    ) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        let format = ConfigFormat::from_extension(&path).ok_or_else(|| {
            Error::config(format!(
                "Unsupported configuration file format: {}",
                path.display()
            ))
        })?;

        self.push_layer(ConfigLayer {
            name: name.into(),
            source: ConfigSource::File { path, format },
            priority,
        });
        Ok(())
    }

    pub fn add_env_layer(&mut self, name: impl Into<String>, prefix: impl Into<String>, priority: u32) {
        self.push_layer(ConfigLayer {
            name: name.into(),
            source: ConfigSource::Environment {
                prefix: prefix.into(),
            },
            priority,
        });
    }

    pub fn add_memory_layer(&mut self, name: impl Into<String>, data: Value, priority: u32) {
        self.push_layer(ConfigLayer {
            name: name.into(),
            source: ConfigSource::Memory { data },
            priority,
        });
    }

    fn push_layer(&mut self, layer: ConfigLayer) {
        self.layers.push(layer);
        self.layers.sort_by_key(|l| l.priority);
    }

    pub async fn set<T>(&self, key: &str, value: T) -> Result<()>
    where
        T: Serialize,
    {
        let serialized_value = serde_json::to_value(value)
            .map_err(|e| key_error(key, format!("Failed to serialize config value: {}", e)))?;

        let mut config = self.merged_config.write().await;
        set_nested_value(&mut config, key, serialized_value);
        Ok(())
    }

    pub async fn get<T>(&self, key: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let config = self.merged_config.read().await;
        let value = get_nested_value(&config, key)
            .ok_or_else(|| key_error(key, format!("Configuration key '{}' not found", key)))?;

        serde_json::from_value(value)
            .map_err(|e| key_error(key, format!("Failed to deserialize config value: {}", e)))
    }

    /// The merged configuration as typed settings; missing sections take defaults.
    pub async fn get_config(&self) -> Result<AppConfig> {
        let config = self.merged_config.read().await;
        serde_json::from_value(config.clone())
            .map_err(|e| Error::config(format!("Invalid configuration: {}", e)))
    }

    pub async fn reload(&self) -> Result<()> {
        self.merge_configurations().await
    }

    pub async fn validate(&self) -> Result<Vec<ValidationError>> {
        Ok(self.get_config().await?.validate())
    }

    async fn merge_configurations(&self) -> Result<()> {
        let mut merged = Value::Object(Map::new());

        for layer in &self.layers {
            let layer_config = load_layer_config(layer)?;
            tracing::debug!(layer = %layer.name, priority = layer.priority, "merging config layer");
            merge_values(&mut merged, layer_config);
        }

        *self.merged_config.write().await = merged;
        Ok(())
    }

    pub async fn debug_config(&self) -> Value {
        self.merged_config.read().await.clone()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn key_error(key: &str, message: String) -> Error {
    Error::new(
        ErrorKind::Configuration {
            key: Some(key.to_string()),
            validation_errors: vec![message.clone()],
        },
        message,
    )
}

fn load_layer_config(layer: &ConfigLayer) -> Result<Value> {
    match &layer.source {
        #[cfg(not(target_arch = "wasm32"))]
        ConfigSource::File { path, format } => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::config(format!("Failed to read config file {}: {}", path.display(), e))
            })?;
            parse_config(&content, *format)
        }

        #[cfg(target_arch = "wasm32")]
        ConfigSource::File { .. } => Err(Error::config("File loading not supported in web platform")),

        #[cfg(not(target_arch = "wasm32"))]
        ConfigSource::Environment { prefix } => {
            let vars: Vec<(String, String)> = std::env::vars().collect();
            Ok(env_to_value(prefix, vars))
        }

        #[cfg(target_arch = "wasm32")]
        ConfigSource::Environment { .. } => Ok(Value::Object(Map::new())),

        ConfigSource::Memory { data } => Ok(data.clone()),
    }
}

fn parse_config(content: &str, format: ConfigFormat) -> Result<Value> {
    match format {
        ConfigFormat::Json => serde_json::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse JSON config: {}", e))),
        ConfigFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse YAML config: {}", e))),
        ConfigFormat::Toml => toml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse TOML config: {}", e))),
    }
}

/// Maps `PREFIX_SECTION_KEY=value` pairs onto `{section: {key: value}}`. The
/// first `_` after the section splits nesting; the rest of the name is kept
/// so `UPS_CALC_API_BASE_URL` lands on `api.base_url`.
fn env_to_value(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Value {
    let mut env_config = Map::new();
    let marker = format!("{}_", prefix);

    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(&marker) else {
            continue;
        };
        let rest = rest.to_lowercase();
        let keys: Vec<&str> = match rest.split_once('_') {
            Some((section, field)) => vec![section, field],
            None => vec![rest.as_str()],
        };
        set_nested_env_value(&mut env_config, &keys, value);
    }

    Value::Object(env_config)
}

fn merge_values(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, source_value) in source_map {
                match target_map.get_mut(&key) {
                    Some(target_value) => merge_values(target_value, source_value),
                    None => {
                        target_map.insert(key, source_value);
                    }
                }
            }
        }
        (target, source) => {
            *target = source;
        }
    }
}

fn get_nested_value(config: &Value, key: &str) -> Option<Value> {
    let mut current = config;
    for k in key.split('.') {
        current = current.get(k)?;
    }
    Some(current.clone())
}

fn set_nested_value(config: &mut Value, key: &str, value: Value) {
    let keys: Vec<&str> = key.split('.').collect();
    let mut current = config;

    for k in &keys[..keys.len() - 1] {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        current = map
            .entry(k.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let (Value::Object(map), Some(last)) = (current, keys.last()) {
        map.insert(last.to_string(), value);
    }
}

fn set_nested_env_value(config: &mut Map<String, Value>, keys: &[&str], value: String) {
    let Some((first, rest)) = keys.split_first() else {
        return;
    };

    if rest.is_empty() {
        let parsed_value = if let Ok(bool_val) = value.parse::<bool>() {
            Value::Bool(bool_val)
        } else if let Ok(int_val) = value.parse::<i64>() {
            Value::Number(Number::from(int_val))
        } else if let Some(float_val) = value.parse::<f64>().ok().and_then(Number::from_f64) {
            Value::Number(float_val)
        } else {
            Value::String(value)
        };

        config.insert(first.to_string(), parsed_value);
    } else {
        let entry = config
            .entry(first.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(nested_map) = entry {
            set_nested_env_value(nested_map, rest, value);
        }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Manager for ConfigManager {
    fn name(&self) -> &str {
        "config_manager"
    }

    fn id(&self) -> Uuid {
        self.state.id()
    }

    async fn initialize(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::Initializing).await;

        let env_prefix = self.env_prefix.clone();
        self.add_env_layer("environment", env_prefix, 1000);

        if let Err(e) = self.merge_configurations().await {
            self.state.set_state(ManagerState::Error).await;
            return Err(e);
        }

        self.state.set_state(ManagerState::Running).await;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::Shutdown).await;
        Ok(())
    }

    async fn status(&self) -> ManagerStatus {
        let mut status = self.state.status().await;
        status.add_metadata("layers", Value::from(self.layers.len()));
        status.add_metadata("env_prefix", Value::String(self.env_prefix.clone()));
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[tokio::test]
    async fn test_file_layer() {
        let mut temp_file = Builder::new().suffix(".yaml").tempfile().unwrap();
        temp_file
            .write_all(b"api:\n  base_url: \"https://calc.example.org\"\npolling:\n  interval_ms: 2500\n")
            .unwrap();

        let mut manager = ConfigManager::with_config_file(temp_file.path())
            .unwrap()
            .with_env_prefix("UPS_CALC_TEST_FILE");
        manager.initialize().await.unwrap();

        let base_url: String = manager.get("api.base_url").await.unwrap();
        assert_eq!(base_url, "https://calc.example.org");

        let config = manager.get_config().await.unwrap();
        assert_eq!(config.polling.interval_ms, 2500);
        assert_eq!(config.logging.level, "info");
        assert!(!config.catalog.offline_fallback);
    }

    #[tokio::test]
    async fn test_toml_file_layer() {
        let mut temp_file = Builder::new().suffix(".toml").tempfile().unwrap();
        temp_file
            .write_all(b"[catalog]\noffline_fallback = true\n\n[api]\ntimeout_ms = 3000\n")
            .unwrap();

        let mut manager = ConfigManager::new().with_env_prefix("UPS_CALC_TEST_TOML");
        manager.add_file_layer("file", temp_file.path(), 0).unwrap();
        manager.initialize().await.unwrap();

        let config = manager.get_config().await.unwrap();
        assert!(config.catalog.offline_fallback);
        assert_eq!(config.api.timeout_ms, Some(3000));
    }

    #[test]
    fn test_unsupported_extension() {
        let mut manager = ConfigManager::new();
        assert!(manager.add_file_layer("file", "settings.ini", 0).is_err());
    }

    #[test]
    fn test_env_mapping() {
        let vars = vec![
            ("UPS_CALC_API_BASE_URL".to_string(), "http://10.0.0.2:8080".to_string()),
            ("UPS_CALC_POLLING_INTERVAL_MS".to_string(), "500".to_string()),
            ("OTHER_VALUE".to_string(), "ignored".to_string()),
        ];
        let value = env_to_value("UPS_CALC", vars);

        assert_eq!(value["api"]["base_url"], "http://10.0.0.2:8080");
        assert_eq!(value["polling"]["interval_ms"], 500);
        assert!(value.get("other").is_none());
    }

    #[tokio::test]
    async fn test_layer_priority() {
        let mut manager = ConfigManager::new().with_env_prefix("UPS_CALC_TEST_PRIORITY");
        manager.add_memory_layer(
            "overrides",
            serde_json::json!({ "logging": { "level": "debug" } }),
            500,
        );
        manager.add_memory_layer(
            "defaults",
            serde_json::json!({ "logging": { "level": "warn", "console": false } }),
            10,
        );
        manager.initialize().await.unwrap();

        let config = manager.get_config().await.unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.console);
    }

    #[tokio::test]
    async fn test_set_and_get_nested() {
        let manager = ConfigManager::new();
        manager.set("api.timeout_ms", 1500u64).await.unwrap();

        let timeout: u64 = manager.get("api.timeout_ms").await.unwrap();
        assert_eq!(timeout, 1500);
        assert!(manager.get::<String>("api.missing").await.is_err());
    }

    #[test]
    fn test_validate_reports_bad_values() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_empty());

        config.api.base_url = "localhost:8080".to_string();
        config.polling.interval_ms = 0;
        config.logging.level = "loud".to_string();

        let keys: Vec<String> = config.validate().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["api.base_url", "polling.interval_ms", "logging.level"]);
    }
}
