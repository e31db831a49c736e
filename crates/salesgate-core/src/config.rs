//! Configuration management for the sales gateway
//!
//! Loads configuration with priority:
//! 1. Environment variables (`SALESGATE_*` overrides)
//! 2. salesgate.toml (or the file named by `SALESGATE_CONFIG`)
//! 3. Defaults
//!
//! The database connection string is never read from the file itself. The
//! file only names the environment variable that carries it
//! (`SQL_CONNECTION_STRING` by default), and a missing value is fatal.

use crate::error::{Error, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for in the current directory and its parents.
pub const CONFIG_FILE_NAME: &str = "salesgate.toml";

/// Fully resolved application configuration.
///
/// Built once at process start and shared read-only afterwards.
#[derive(Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub retry: RetryConfig,
    pub observability: ObservabilityConfig,
    /// Raw connection string taken from `database.connection_string_env`
    pub connection_string: SecretString,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound for one request, retries included
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Which database backend the executor talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQL Server through the ODBC driver
    SqlServer,
    /// Local SQLite file, used for development and tests
    Sqlite,
}

impl std::str::FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlserver" | "mssql" => Ok(BackendKind::SqlServer),
            "sqlite" => Ok(BackendKind::Sqlite),
            other => Err(Error::config_error(format!(
                "unknown backend '{other}' (expected 'sqlserver' or 'sqlite')"
            ))),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_backend")]
    pub backend: BackendKind,

    /// Environment variable holding the connection string
    #[serde(default = "default_connection_string_env")]
    pub connection_string_env: String,

    /// ODBC driver name appended during normalization
    #[serde(default = "default_odbc_driver")]
    pub odbc_driver: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Per-statement timeout handed to the driver
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

/// Retry policy for query execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, the first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,
}

/// On-disk shape of salesgate.toml
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    database: DatabaseConfig,
    #[serde(default)]
    retry: RetryConfig,
    #[serde(default)]
    observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            connection_string_env: default_connection_string_env(),
            odbc_driver: default_odbc_driver(),
            connect_timeout_secs: default_connect_timeout_secs(),
            query_timeout_secs: default_query_timeout_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
            log_level: default_log_level(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, the config file and the process
    /// environment.
    pub fn load() -> Result<Self> {
        // A missing .env file is the common case in deployed environments
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {:?}", path);
        }

        let explicit = env::var("SALESGATE_CONFIG").ok().map(PathBuf::from);
        let contents = match explicit {
            Some(path) => Some(Self::read_file(&path)?),
            None => match Self::find_config_file() {
                Some(path) => Some(Self::read_file(&path)?),
                None => None,
            },
        };

        Self::from_sources(contents.as_deref(), |key| env::var(key).ok())
    }

    /// Build the configuration from optional TOML contents and an environment
    /// lookup.
    ///
    /// Kept separate from [`AppConfig::load`] so callers can inject a fake
    /// environment.
    pub fn from_sources<F>(file_contents: Option<&str>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut file: FileConfig = match file_contents {
            Some(contents) => toml::from_str(contents)?,
            None => FileConfig::default(),
        };

        if let Some(host) = lookup("SALESGATE_HOST") {
            file.server.host = host;
        }
        if let Some(port) = lookup("SALESGATE_PORT") {
            file.server.port = port
                .parse()
                .map_err(|_| Error::config_error(format!("invalid SALESGATE_PORT '{port}'")))?;
        }
        if let Some(backend) = lookup("SALESGATE_BACKEND") {
            file.database.backend = backend.parse()?;
        }
        if let Some(format) = lookup("SALESGATE_LOG_FORMAT") {
            file.observability.log_format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                other => {
                    return Err(Error::config_error(format!(
                        "invalid SALESGATE_LOG_FORMAT '{other}'"
                    )));
                }
            };
        }

        if file.retry.max_attempts == 0 {
            return Err(Error::config_error("retry.max_attempts must be at least 1"));
        }

        let var_name = &file.database.connection_string_env;
        let connection_string = lookup(var_name)
            .map(|value| resolve_env_reference(&value, &lookup))
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                Error::config_error(format!("{var_name} environment variable is not set"))
            })?;

        Ok(Self {
            server: file.server,
            database: file.database,
            retry: file.retry,
            observability: file.observability,
            connection_string: SecretString::from(connection_string),
        })
    }

    /// Address the HTTP listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn read_file(path: &Path) -> Result<String> {
        tracing::debug!("Loading configuration from: {:?}", path);
        fs::read_to_string(path).map_err(|e| {
            Error::config_error(format!("cannot read config file {}: {e}", path.display()))
        })
    }

    /// Find salesgate.toml by searching current directory and parents
    fn find_config_file() -> Option<PathBuf> {
        let mut current = env::current_dir().ok()?;

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}

/// Resolve a single ${VAR_NAME} reference
fn resolve_env_reference<F>(value: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match value.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
        Some(var_name) => lookup(var_name).unwrap_or_default(),
        None => value.to_string(),
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_backend() -> BackendKind {
    BackendKind::SqlServer
}

fn default_connection_string_env() -> String {
    "SQL_CONNECTION_STRING".to_string()
}

fn default_odbc_driver() -> String {
    "ODBC Driver 18 for SQL Server".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_query_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "salesgate".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_connection_string() {
        let config =
            AppConfig::from_sources(None, env_of(&[("SQL_CONNECTION_STRING", "Server=x")]))
                .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.backend, BackendKind::SqlServer);
        assert_eq!(config.database.connect_timeout_secs, 30);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.delay_ms, 1000);
        assert_eq!(config.connection_string.expose_secret(), "Server=x");
    }

    #[test]
    fn test_missing_connection_string_is_fatal() {
        let err = AppConfig::from_sources(None, env_of(&[])).unwrap_err();
        assert!(err.to_string().contains("SQL_CONNECTION_STRING"));

        let err =
            AppConfig::from_sources(None, env_of(&[("SQL_CONNECTION_STRING", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_file_and_env_overrides() {
        let toml = r#"
            [server]
            port = 9000

            [database]
            backend = "sqlite"
            connection_string_env = "SALES_DB"

            [retry]
            max_attempts = 5
            delay_ms = 250
        "#;

        let config = AppConfig::from_sources(
            Some(toml),
            env_of(&[("SALES_DB", "sqlite://sales.db"), ("SALESGATE_PORT", "9100")]),
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.database.backend, BackendKind::Sqlite);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.delay_ms, 250);
        assert_eq!(config.bind_address(), "127.0.0.1:9100");
    }

    #[test]
    fn test_resolve_env_reference() {
        let lookup = env_of(&[("REAL_CONN", "Server=y")]);
        assert_eq!(resolve_env_reference("${REAL_CONN}", &lookup), "Server=y");
        assert_eq!(resolve_env_reference("plain_value", &lookup), "plain_value");
        assert_eq!(resolve_env_reference("${MISSING}", &lookup), "");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let env = env_of(&[("SQL_CONNECTION_STRING", "Server=x"), ("SALESGATE_PORT", "http")]);
        assert!(AppConfig::from_sources(None, env).is_err());

        let env = env_of(&[("SQL_CONNECTION_STRING", "Server=x"), ("SALESGATE_BACKEND", "oracle")]);
        assert!(AppConfig::from_sources(None, env).is_err());

        let env = env_of(&[("SQL_CONNECTION_STRING", "Server=x")]);
        assert!(AppConfig::from_sources(Some("[retry]\nmax_attempts = 0"), env).is_err());
    }

    #[test]
    fn test_debug_does_not_leak_connection_string() {
        let config = AppConfig::from_sources(
            None,
            env_of(&[("SQL_CONNECTION_STRING", "Server=x;Password=hunter2")]),
        )
        .unwrap();

        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
