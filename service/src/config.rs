//! Service configuration.
//!
//! Values are layered with figment, lowest priority first:
//! 1. [`Config::default`]
//! 2. a YAML file (`config.yaml` unless `--config` names another)
//! 3. environment variables prefixed with [`ENV_PREFIX`], `__` separating
//!    nested keys (`ZK_ZOO_SERVICE__BASE_URL`)
//!
//! Every section is `#[serde(default)]`, so a file only needs the keys it
//! changes.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_aux::prelude::deserialize_vec_from_string_or_vec;

/// Prefix of environment variables overriding configuration values.
pub const ENV_PREFIX: &str = "ZK_";

const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub zoo_service: ZooServiceConfig,
    pub validation: ValidationConfig,
    pub cors: CorsConfig,
    pub security_headers: SecurityHeadersConfig,
}

/// Keeper store connection. `user` and `password` have no usable default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    /// Directory of `.sql` migrations; the crate's `migrations/` when unset.
    pub migrations_dir: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            name: "zoo_keeper".to_string(),
            user: String::new(),
            password: String::new(),
            max_connections: 10,
            migrations_dir: None,
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address; must be an IP literal.
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `zookeeper_api=debug,tower_http=info`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Remote service owning zoos and monkeys.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ZooServiceConfig {
    /// Zoos are served under `{base_url}/zoos/`, monkeys under `{base_url}/monkeys/`.
    pub base_url: String,
    /// Per-attempt timeout; fractions are allowed.
    pub timeout_secs: f64,
    /// Attempts per request. Only timeouts are retried.
    pub max_attempts: u32,
}

const DEFAULT_TIMEOUT_SECS: f64 = 2.0;

impl Default for ZooServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: 3,
        }
    }
}

impl ZooServiceConfig {
    /// Per-attempt timeout. Falls back to the default for values that
    /// [`Config::validate`] would reject.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Accept writes whose references cannot be checked because the zoo
    /// service is unreachable. Off by default.
    pub fail_open: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// `"*"` or http(s) origins, as a list or one comma-separated string
    /// (the form env vars arrive in). Empty disables cross-origin access.
    #[serde(deserialize_with = "deserialize_origins")]
    pub allowed_origins: Vec<String>,
}

fn deserialize_origins<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let origins: Vec<String> = deserialize_vec_from_string_or_vec(deserializer)?;
    Ok(origins
        .into_iter()
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect())
}

/// `X-Frame-Options` value. Parsed case-insensitively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum FrameOptions {
    #[default]
    #[serde(rename = "DENY")]
    Deny,
    #[serde(rename = "SAMEORIGIN")]
    SameOrigin,
}

impl FrameOptions {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deny => "DENY",
            Self::SameOrigin => "SAMEORIGIN",
        }
    }
}

impl<'de> Deserialize<'de> for FrameOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.to_ascii_uppercase().as_str() {
            "DENY" => Ok(Self::Deny),
            "SAMEORIGIN" => Ok(Self::SameOrigin),
            _ => Err(de::Error::invalid_value(
                de::Unexpected::Str(&raw),
                &"DENY or SAMEORIGIN",
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityHeadersConfig {
    pub enabled: bool,
    /// Only enable behind HTTPS.
    pub hsts_enabled: bool,
    pub hsts_max_age: u64,
    pub hsts_include_subdomains: bool,
    pub frame_options: FrameOptions,
    pub content_security_policy: String,
    pub referrer_policy: String,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hsts_enabled: false,
            hsts_max_age: 31_536_000,
            hsts_include_subdomains: true,
            frame_options: FrameOptions::Deny,
            content_security_policy: "default-src 'self'".to_string(),
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

impl Config {
    /// Load from `config.yaml` (if present) and the environment.
    ///
    /// # Errors
    /// Returns an error if a source cannot be parsed or the result is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from `yaml_path` (if present) and the environment.
    ///
    /// # Errors
    /// Returns an error if a source cannot be parsed or the result is invalid.
    pub fn load_from(yaml_path: &str) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Yaml::file(yaml_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field rules serde cannot express. Reports the first
    /// broken rule.
    ///
    /// # Errors
    /// Returns [`ConfigError::Validation`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let db = &self.database;
        let zoo = &self.zoo_service;

        let rules = [
            (db.user.is_empty(), "database.user is required (set ZK_DATABASE__USER)"),
            (db.password.is_empty(), "database.password is required (set ZK_DATABASE__PASSWORD)"),
            (db.port == 0, "database.port cannot be 0"),
            (db.max_connections == 0, "database.max_connections cannot be 0"),
            (self.server.port == 0, "server.port cannot be 0"),
            (!is_http_url(&zoo.base_url), "zoo_service.base_url must be an http:// or https:// URL"),
            (
                !zoo.timeout_secs.is_finite() || zoo.timeout_secs <= 0.0,
                "zoo_service.timeout_secs must be a positive number of seconds",
            ),
            (zoo.max_attempts == 0, "zoo_service.max_attempts cannot be 0"),
        ];
        if let Some((_, message)) = rules.iter().find(|(broken, _)| *broken) {
            return Err(ConfigError::Validation((*message).to_string()));
        }

        if let Some(origin) = self
            .cors
            .allowed_origins
            .iter()
            .find(|origin| *origin != "*" && !is_http_url(origin))
        {
            return Err(ConfigError::Validation(format!(
                "cors.allowed_origins: '{origin}' is neither '*' nor an http(s) origin"
            )));
        }

        Ok(())
    }
}
