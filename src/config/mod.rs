use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub feed: FeedConfig,
    pub images: ImageConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string. `None` selects the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Upper bound applied to `per_page` after parsing. `None` leaves it unbounded.
    pub max_per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    pub fetch_timeout_secs: u64,
}

/// Development-only signing secret used when `JWT_SECRET` is not set.
const DEV_JWT_SECRET: &str = "marketplace-dev-secret";

/// Default token lifetime in seconds.
const DEFAULT_TOKEN_TTL_SECS: i64 = 1300;

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()?;

        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Server overrides
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT") {
            self.server.port = parse_var("SERVER_PORT", &v)?;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_SECS") {
            self.security.token_ttl_secs = parse_var("JWT_EXPIRY_SECS", &v)?;
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Feed overrides
        if let Ok(v) = env::var("FEED_MAX_PER_PAGE") {
            self.feed.max_per_page = v.parse().ok().filter(|n: &i64| *n > 0);
        }

        // Image overrides
        if let Ok(v) = env::var("IMAGE_FETCH_TIMEOUT_SECS") {
            self.images.fetch_timeout_secs = v.parse().unwrap_or(self.images.fetch_timeout_secs);
        }

        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.security.token_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "JWT_EXPIRY_SECS",
                value: self.security.token_ttl_secs.to_string(),
            });
        }
        if self.environment != Environment::Development && self.database.url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { host: "0.0.0.0".to_string(), port: 8080 },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
                cors_origins: vec![],
            },
            feed: FeedConfig { max_per_page: None },
            images: ImageConfig { fetch_timeout_secs: 10 },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { host: "0.0.0.0".to_string(), port: 8080 },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                // Must come from JWT_SECRET
                jwt_secret: String::new(),
                token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            feed: FeedConfig { max_per_page: Some(500) },
            images: ImageConfig { fetch_timeout_secs: 10 },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { host: "0.0.0.0".to_string(), port: 8080 },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            feed: FeedConfig { max_per_page: Some(100) },
            images: ImageConfig { fetch_timeout_secs: 5 },
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.environment, Environment::Development);
        assert!(config.database.url.is_none());
        assert_eq!(config.feed.max_per_page, None);
        assert_eq!(config.security.token_ttl_secs, 1300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_production_config_requires_secret_and_database() {
        let config = AppConfig::production();
        assert_eq!(config.feed.max_per_page, Some(100));
        assert!(matches!(config.validate(), Err(ConfigError::Missing("JWT_SECRET"))));

        let mut config = AppConfig::production();
        config.security.jwt_secret = "s3cret".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("DATABASE_URL"))));

        config.database.url = Some("postgres://localhost/marketplace".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_token_ttl() {
        let mut config = AppConfig::development();
        config.security.token_ttl_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_bind_addr() {
        let mut config = AppConfig::development();
        config.server.port = 9000;
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_parse_var_reports_key() {
        let err = parse_var::<u16>("SERVER_PORT", "eighty").unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for SERVER_PORT: eighty");
    }
}
