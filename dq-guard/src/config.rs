//! Connection and harness configuration.
//!
//! Configuration is built in code with `with_*` setters or read from the
//! environment:
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `DQ_DB_HOST` | PostgreSQL host | `localhost` |
//! | `DQ_DB_PORT` | PostgreSQL port | `5434` |
//! | `DQ_DB_NAME` | database name | `mydatabase` |
//! | `DQ_DB_USER` | user name | required |
//! | `DQ_DB_PASSWORD` | password | required |
//! | `DQ_DB_SSLMODE` | libpq `sslmode` | unset |
//! | `DQ_PARQUET_PATH` | root of the Parquet datasets | `/parquet_data` |

use crate::error::{ProviderError, Result};
use crate::providers::{ParquetReader, DEFAULT_BASE_PATH};
use crate::security::SecureString;
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 5434;
pub const DEFAULT_DB_NAME: &str = "mydatabase";

/// PostgreSQL connection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: SecureString,
    pub sslmode: Option<String>,
}

impl PostgresConfig {
    /// Creates a configuration with default host, port and database.
    pub fn new(user: impl Into<String>, password: impl Into<SecureString>) -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            database: DEFAULT_DB_NAME.to_string(),
            user: user.into(),
            password: password.into(),
            sslmode: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_sslmode(mut self, sslmode: impl Into<String>) -> Self {
        self.sslmode = Some(sslmode.into());
        self
    }

    /// Reads the configuration from `DQ_DB_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps variable names to
    /// values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key).filter(|v| !v.is_empty()).ok_or_else(|| {
                ProviderError::Configuration(format!("Missing required option: {key}"))
            })
        };

        let mut config = Self::new(required("DQ_DB_USER")?, required("DQ_DB_PASSWORD")?);
        if let Some(host) = lookup("DQ_DB_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("DQ_DB_PORT") {
            config.port = port.parse().map_err(|e| {
                ProviderError::Configuration(format!("Invalid DQ_DB_PORT '{port}': {e}"))
            })?;
        }
        if let Some(database) = lookup("DQ_DB_NAME") {
            config.database = database;
        }
        config.sslmode = lookup("DQ_DB_SSLMODE");
        Ok(config)
    }

    /// A connection description that leaves out the password.
    pub fn describe(&self) -> String {
        format!(
            "postgresql://{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }

    /// Key/value connection parameters understood by the PostgreSQL pool.
    pub fn connection_params(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert("host".to_string(), self.host.clone());
        params.insert("port".to_string(), self.port.to_string());
        params.insert("db".to_string(), self.database.clone());
        params.insert("user".to_string(), self.user.clone());
        params.insert("pass".to_string(), self.password.expose().to_string());
        if let Some(sslmode) = &self.sslmode {
            params.insert("sslmode".to_string(), sslmode.clone());
        }
        params
    }
}

/// Everything a test harness needs to reach source and target data.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub postgres: PostgresConfig,
    pub parquet_path: PathBuf,
}

impl HarnessConfig {
    pub fn new(postgres: PostgresConfig) -> Self {
        Self {
            postgres,
            parquet_path: PathBuf::from(DEFAULT_BASE_PATH),
        }
    }

    pub fn with_parquet_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.parquet_path = path.into();
        self
    }

    /// Reads the configuration from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let postgres = PostgresConfig::from_lookup(&lookup)?;
        let mut config = Self::new(postgres);
        if let Some(path) = lookup("DQ_PARQUET_PATH") {
            config.parquet_path = PathBuf::from(path);
        }
        Ok(config)
    }

    /// A Parquet reader rooted at the configured path.
    pub fn parquet_reader(&self) -> ParquetReader {
        ParquetReader::new(self.parquet_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_defaults() {
        let config =
            PostgresConfig::from_lookup(lookup(&[("DQ_DB_USER", "qa"), ("DQ_DB_PASSWORD", "pw")]))
                .unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5434);
        assert_eq!(config.database, "mydatabase");
        assert_eq!(config.sslmode, None);
        assert_eq!(config.describe(), "postgresql://qa@localhost:5434/mydatabase");
    }

    #[test]
    fn test_overrides() {
        let config = PostgresConfig::from_lookup(lookup(&[
            ("DQ_DB_USER", "qa"),
            ("DQ_DB_PASSWORD", "pw"),
            ("DQ_DB_HOST", "db.internal"),
            ("DQ_DB_PORT", "5432"),
            ("DQ_DB_NAME", "clinic"),
            ("DQ_DB_SSLMODE", "require"),
        ]))
        .unwrap();
        assert_eq!(config.port, 5432);
        let params = config.connection_params();
        assert_eq!(params["host"], "db.internal");
        assert_eq!(params["db"], "clinic");
        assert_eq!(params["pass"], "pw");
        assert_eq!(params["sslmode"], "require");
    }

    #[test]
    fn test_missing_credentials() {
        let err = PostgresConfig::from_lookup(lookup(&[("DQ_DB_USER", "qa")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required option: DQ_DB_PASSWORD"
        );
    }

    #[test]
    fn test_invalid_port() {
        let err = PostgresConfig::from_lookup(lookup(&[
            ("DQ_DB_USER", "qa"),
            ("DQ_DB_PASSWORD", "pw"),
            ("DQ_DB_PORT", "fifty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("Invalid DQ_DB_PORT 'fifty'"));
    }

    #[test]
    fn test_password_not_in_debug() {
        let config = PostgresConfig::new("qa", "secret-pw");
        assert!(!format!("{config:?}").contains("secret-pw"));
    }

    #[test]
    fn test_harness_config() {
        let config = HarnessConfig::from_lookup(lookup(&[
            ("DQ_DB_USER", "qa"),
            ("DQ_DB_PASSWORD", "pw"),
            ("DQ_PARQUET_PATH", "/data/parquet"),
        ]))
        .unwrap();
        assert_eq!(config.parquet_reader().base_path(), std::path::Path::new("/data/parquet"));

        let config = HarnessConfig::new(PostgresConfig::new("qa", "pw"));
        assert_eq!(config.parquet_path, PathBuf::from("/parquet_data"));
    }
}
