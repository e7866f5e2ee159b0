use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::llm::ModelSettings;
use crate::session::DEFAULT_SESSION_CAPACITY;

pub const APP_NAME: &str = "course-advisor";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    /// Falls back to the per-user data directory when unset.
    #[serde(default)]
    pub sqlite_path: Option<String>,
    #[serde(default = "default_true")]
    pub seed_on_start: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            sqlite_path: None,
            seed_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_session_backend")]
    pub backend: SessionBackend,
    #[serde(default = "default_session_capacity")]
    pub capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            backend: default_session_backend(),
            capacity: default_session_capacity(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(AppError::Config(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl std::str::FromStr for SessionBackend {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(AppError::Config(format!(
                "unsupported session backend `{other}` (expected memory|sqlite)"
            ))),
        }
    }
}

impl AppConfig {
    /// File (explicit path, then `ADVISOR_CONFIG`, then `advisor.toml`) overlaid by the
    /// process environment, then validated.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, AppError> {
        let explicit = config_path.or_else(|| read_env("ADVISOR_CONFIG").map(PathBuf::from));
        let mut config = match resolve_config_path(explicit.as_deref())? {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(read_env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("could not read config file `{}`: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(raw)?)
    }

    /// Overlay values from `lookup`; blank values are treated as unset.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), AppError> {
        if let Some(value) = lookup("OPENAI_API_KEY") {
            self.model.api_key = value;
        }
        if let Some(value) = lookup("OPENAI_BASE_URL") {
            self.model.base_url = Some(value);
        }
        if let Some(value) = lookup("ADVISOR_MODEL") {
            self.model.model_id = value;
        }
        if let Some(value) = lookup("ADVISOR_TIMEOUT_SECS") {
            self.model.timeout_secs = parse_number("ADVISOR_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = lookup("BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = lookup("PORT") {
            self.server.port = parse_number("PORT", &value)?;
        }

        if let Some(value) = lookup("STORE_SQLITE_PATH") {
            self.store.sqlite_path = Some(value);
        }

        if let Some(value) = lookup("SESSION_BACKEND") {
            self.session.backend = value.parse()?;
        }
        if let Some(value) = lookup("SESSION_CAPACITY") {
            self.session.capacity = parse_number("SESSION_CAPACITY", &value)?;
        }

        if let Some(value) = lookup("LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = lookup("LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.model.model_id.trim().is_empty() {
            return Err(AppError::Config("model.model_id must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(AppError::Config(
                "model.temperature must be in range 0.0..=2.0".to_string(),
            ));
        }
        if self.model.max_tokens == 0 {
            return Err(AppError::Config(
                "model.max_tokens must be greater than zero".to_string(),
            ));
        }
        if self.model.timeout_secs == 0 || self.model.timeout_secs > 600 {
            return Err(AppError::Config(
                "model.timeout_secs must be in range 1..=600".to_string(),
            ));
        }
        // Two turns per exchange; anything smaller would evict the pair just stored.
        if self.session.capacity < 2 {
            return Err(AppError::Config(
                "session.capacity must be at least 2".to_string(),
            ));
        }
        let level = self.logging.level.trim().to_ascii_lowercase();
        if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
            return Err(AppError::Config(
                "logging.level must be one of trace|debug|info|warn|error".to_string(),
            ));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Result<Option<PathBuf>, AppError> {
    if let Some(path) = explicit_path {
        if !path.exists() {
            return Err(AppError::Config(format!(
                "config file was not found: `{}`",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }
    Ok([PathBuf::from("advisor.toml"), PathBuf::from("config/advisor.toml")]
        .into_iter()
        .find(|path| path.exists()))
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, AppError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| AppError::Config(format!("invalid environment override for `{key}`: `{value}`")))
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_session_backend() -> SessionBackend {
    SessionBackend::Memory
}

fn default_session_capacity() -> usize {
    DEFAULT_SESSION_CAPACITY
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_mirror_the_reference_server() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.session.capacity, 20);
        assert_eq!(config.session.backend, SessionBackend::Memory);
        assert_eq!(config.model.temperature, 0.7);
        assert_eq!(config.model.max_tokens, 1500);
        assert!(config.store.seed_on_start);
        config.validate().unwrap();
    }

    #[test]
    fn toml_file_is_overlaid_by_environment() {
        let mut config = AppConfig::from_toml_str(
            r#"
            [model]
            model_id = "gpt-4o-mini"
            temperature = 0.2

            [session]
            backend = "sqlite"
            capacity = 8
            "#,
        )
        .unwrap();
        config
            .apply_env(lookup(&[("SESSION_CAPACITY", "12"), ("LOG_FORMAT", "json")]))
            .unwrap();

        assert_eq!(config.model.model_id, "gpt-4o-mini");
        assert_eq!(config.model.temperature, 0.2);
        assert_eq!(config.model.max_tokens, 1500);
        assert_eq!(config.session.backend, SessionBackend::Sqlite);
        assert_eq!(config.session.capacity, 12);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn invalid_overrides_are_reported() {
        let mut config = AppConfig::default();
        let err = config.apply_env(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        let err = config
            .apply_env(lookup(&[("SESSION_BACKEND", "redis")]))
            .unwrap_err();
        assert!(err.to_string().contains("memory|sqlite"));
    }

    #[test]
    fn validation_rejects_capacity_below_one_exchange() {
        let mut config = AppConfig::default();
        config.session.capacity = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_explicit_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
