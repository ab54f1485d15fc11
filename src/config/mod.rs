//! Configuration management for the users gateway
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (development, staging, production).

use std::env;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Get the environment name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Connection settings for the Xata record API
#[derive(Debug, Clone)]
pub struct XataConfig {
    /// Database URL, e.g. `https://ws-1234.us-east-1.xata.sh/db/app`
    pub database_url: String,

    pub api_key: String,

    pub branch: String,

    pub table: String,

    /// Request timeout for the backend HTTP client
    pub timeout: Duration,
}

impl XataConfig {
    /// Base URL of the table's record endpoints
    pub fn table_url(&self) -> String {
        format!(
            "{}:{}/tables/{}",
            self.database_url.trim_end_matches('/'),
            self.branch,
            self.table
        )
    }
}

/// Which record store backs the gateway
#[derive(Debug, Clone)]
pub enum BackendConfig {
    Xata(XataConfig),
    /// In-process store, for local development
    Memory,
}

impl BackendConfig {
    pub fn name(&self) -> &'static str {
        match self {
            BackendConfig::Xata(_) => "xata",
            BackendConfig::Memory => "memory",
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Listen address
    pub host: IpAddr,

    /// Server port
    pub port: u16,

    /// CORS allowed origins
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,

    pub backend: BackendConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let host = lookup("HOST")
            .unwrap_or_else(|| "127.0.0.1".to_string())
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidValue("HOST must be an IP address".to_string()))?;

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS").filter(|s| !s.trim().is_empty());

        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let backend = match lookup("USERS_BACKEND")
            .unwrap_or_else(|| "xata".to_string())
            .to_lowercase()
            .as_str()
        {
            "xata" => BackendConfig::Xata(Self::xata_from_lookup(&lookup)?),
            "memory" => BackendConfig::Memory,
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid USERS_BACKEND: '{}'. Expected: xata or memory",
                    other
                )))
            }
        };

        Ok(Config {
            environment,
            host,
            port,
            cors_allowed_origins,
            log_level,
            backend,
        })
    }

    fn xata_from_lookup<F>(lookup: &F) -> Result<XataConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("XATA_API_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("XATA_API_KEY".to_string()))?;

        let database_url = lookup("XATA_DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("XATA_DATABASE_URL".to_string()))?;

        let branch = lookup("XATA_BRANCH").unwrap_or_else(|| "main".to_string());

        let table = lookup("XATA_TABLE").unwrap_or_else(|| "users".to_string());

        let timeout_secs = lookup("XATA_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse::<u64>()
            .unwrap_or(30);

        Ok(XataConfig {
            database_url,
            api_key,
            branch,
            table,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("dev").unwrap(), Environment::Development);
        assert_eq!(Environment::parse("staging").unwrap(), Environment::Staging);
        assert_eq!(Environment::parse("PROD").unwrap(), Environment::Production);
        assert!(Environment::parse("invalid").is_err());
    }

    #[test]
    fn test_environment_is_production() {
        assert!(!Environment::Development.is_production());
        assert!(!Environment::Staging.is_production());
        assert!(Environment::Production.is_production());
        assert_eq!(Environment::Production.as_str(), "production");
    }

    #[test]
    fn test_memory_backend_defaults() {
        let config = Config::from_lookup(lookup_from(&[("USERS_BACKEND", "memory")])).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.host.to_string(), "127.0.0.1");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.log_level, "info");
        assert!(config.cors_allowed_origins.is_none());
        assert_eq!(config.backend.name(), "memory");
    }

    #[test]
    fn test_xata_backend_requires_api_key() {
        let err = Config::from_lookup(lookup_from(&[(
            "XATA_DATABASE_URL",
            "https://ws.us-east-1.xata.sh/db/app",
        )]))
        .unwrap_err();

        assert!(err.to_string().contains("XATA_API_KEY"));
    }

    #[test]
    fn test_xata_backend_table_url() {
        let config = Config::from_lookup(lookup_from(&[
            ("XATA_API_KEY", "xau_secret"),
            ("XATA_DATABASE_URL", "https://ws.us-east-1.xata.sh/db/app/"),
            ("PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        match config.backend {
            BackendConfig::Xata(xata) => {
                assert_eq!(xata.branch, "main");
                assert_eq!(
                    xata.table_url(),
                    "https://ws.us-east-1.xata.sh/db/app:main/tables/users"
                );
                assert_eq!(xata.timeout, Duration::from_secs(30));
            }
            BackendConfig::Memory => panic!("expected xata backend"),
        }
    }

    #[test]
    fn test_invalid_port_and_backend() {
        let err = Config::from_lookup(lookup_from(&[
            ("USERS_BACKEND", "memory"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(_)));

        let err = Config::from_lookup(lookup_from(&[("USERS_BACKEND", "postgres")])).unwrap_err();
        assert!(err.to_string().contains("postgres"));
    }
}
