//! Configuration management for the marketplace server.
//!
//! Loads configuration from environment variables with sensible defaults.
//! `.env` files are honored by the binary through `dotenvy` before this runs.

use chrono::Duration as ChronoDuration;
use marketplace_runtime::Settings;
use marketplace_runtime::retry::RetryPolicy;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set to a value that cannot be used.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
        /// What was expected.
        reason: &'static str,
    },
    /// A variable required by the chosen setup is missing.
    #[error("{0} is required")]
    Missing(&'static str),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Store backend configuration
    pub store: StoreConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Simulated document storage
    pub documents: DocumentConfig,
    /// Store retry configuration
    pub retry: RetryConfig,
    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
}

/// Which store implementation backs the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local store. Data is lost on restart.
    Memory,
    /// `PostgreSQL` via sqlx.
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            _ => Err(ConfigError::InvalidValue {
                key: "STORE_BACKEND",
                value: s.to_string(),
                reason: "expected memory or postgres",
            }),
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Backend selection
    pub backend: StoreBackend,
    /// `PostgreSQL` connection URL, required for the postgres backend
    pub database_url: Option<String>,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Pool acquire timeout in seconds
    pub connect_timeout_secs: u64,
}

/// Authentication configuration
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Bearer token lifetime in minutes
    pub access_token_expire_minutes: i64,
    /// Admin account created at startup when all three are set
    pub admin_username: Option<String>,
    /// Admin email
    pub admin_email: Option<String>,
    /// Admin password
    pub admin_password: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .field("admin_username", &self.admin_username)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Admin account to bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminBootstrap<'a> {
    /// Username
    pub username: &'a str,
    /// Email
    pub email: &'a str,
    /// Password
    pub password: &'a str,
}

impl AuthConfig {
    /// The admin account to create, when fully configured.
    #[must_use]
    pub fn admin_bootstrap(&self) -> Option<AdminBootstrap<'_>> {
        Some(AdminBootstrap {
            username: self.admin_username.as_deref()?,
            email: self.admin_email.as_deref()?,
            password: self.admin_password.as_deref()?,
        })
    }
}

/// Simulated document storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentConfig {
    /// Prefix of generated document URLs
    pub base_url: String,
}

/// Store retry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first failed call
    pub max_retries: usize,
    /// Delay before the first retry, in milliseconds
    pub initial_delay_ms: u64,
}

/// Metrics configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Serve `/metrics` on the main router
    pub enabled: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown `STORE_BACKEND`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown `STORE_BACKEND`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| non_empty_var(&lookup, key);

        Ok(Self {
            server: ServerConfig {
                host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_var(&lookup, "PORT").unwrap_or(8080),
                shutdown_timeout_secs: parse_var(&lookup, "SHUTDOWN_TIMEOUT_SECS").unwrap_or(30),
                cors_origins: non_empty("CORS_ORIGINS")
                    .unwrap_or_else(|| "http://localhost:5173,http://localhost:3000".to_string())
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect(),
            },
            store: StoreConfig {
                backend: non_empty("STORE_BACKEND")
                    .map(|s| s.parse::<StoreBackend>())
                    .transpose()?
                    .unwrap_or(StoreBackend::Memory),
                database_url: non_empty("DATABASE_URL"),
                max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS").unwrap_or(10),
                connect_timeout_secs: parse_var(&lookup, "DATABASE_CONNECT_TIMEOUT_SECS").unwrap_or(5),
            },
            auth: AuthConfig {
                access_token_expire_minutes: parse_var(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES").unwrap_or(30),
                admin_username: non_empty("ADMIN_USERNAME"),
                admin_email: non_empty("ADMIN_EMAIL"),
                admin_password: lookup("ADMIN_PASSWORD").filter(|s| !s.is_empty()),
            },
            documents: DocumentConfig {
                base_url: non_empty("DOCUMENT_BASE_URL")
                    .unwrap_or_else(|| "https://storage.invalid/documents".to_string()),
            },
            retry: RetryConfig {
                max_retries: parse_var(&lookup, "STORE_MAX_RETRIES").unwrap_or(3),
                initial_delay_ms: parse_var(&lookup, "STORE_RETRY_INITIAL_MS").unwrap_or(100),
            },
            metrics: MetricsConfig {
                enabled: parse_var(&lookup, "METRICS_ENABLED").unwrap_or(true),
            },
        })
    }

    /// Reject combinations the server cannot start with.
    ///
    /// # Errors
    ///
    /// - `Missing("DATABASE_URL")` for the postgres backend without a URL
    /// - `InvalidValue` for port 0, a non-positive token lifetime, or a
    ///   partially configured admin account
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PORT",
                value: "0".to_string(),
                reason: "port must be non-zero",
            });
        }
        if self.store.backend == StoreBackend::Postgres && self.store.database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if self.auth.access_token_expire_minutes <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                value: self.auth.access_token_expire_minutes.to_string(),
                reason: "token lifetime must be positive",
            });
        }
        let admin_fields = [
            self.auth.admin_username.is_some(),
            self.auth.admin_email.is_some(),
            self.auth.admin_password.is_some(),
        ];
        if admin_fields.contains(&true) && self.auth.admin_bootstrap().is_none() {
            return Err(ConfigError::InvalidValue {
                key: "ADMIN_USERNAME",
                value: String::new(),
                reason: "ADMIN_USERNAME, ADMIN_EMAIL and ADMIN_PASSWORD must be set together",
            });
        }
        Ok(())
    }

    /// Address to bind, `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Graceful shutdown deadline.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Runtime settings for the marketplace services.
    #[must_use]
    pub fn settings(&self) -> Settings {
        Settings {
            session_ttl: ChronoDuration::minutes(self.auth.access_token_expire_minutes),
            document_base_url: self.documents.base_url.clone(),
            retry: RetryPolicy::builder()
                .max_retries(self.retry.max_retries)
                .initial_delay(Duration::from_millis(self.retry.initial_delay_ms))
                .build(),
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}

fn non_empty_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(
            config.server.cors_origins,
            vec!["http://localhost:5173", "http://localhost:3000"]
        );
        assert_eq!(config.auth.access_token_expire_minutes, 30);
        assert!(config.metrics.enabled);
        assert!(config.auth.admin_bootstrap().is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_unparsable_numbers_fall_back_to_defaults() {
        let config = load(&[("PORT", "eighty"), ("STORE_MAX_RETRIES", "-1")]).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_unknown_backend_is_error() {
        let err = load(&[("STORE_BACKEND", "mongo")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "STORE_BACKEND", .. }));
    }

    #[test]
    fn test_postgres_requires_url() {
        let config = load(&[("STORE_BACKEND", "postgres")]).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn test_zero_port_is_rejected() {
        let config = load(&[("PORT", "0")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_admin_is_rejected() {
        let config = load(&[("ADMIN_USERNAME", "root")]).unwrap();
        assert!(config.validate().is_err());

        let config = load(&[
            ("ADMIN_USERNAME", "root"),
            ("ADMIN_EMAIL", "root@example.com"),
            ("ADMIN_PASSWORD", "s3cret-pass"),
        ])
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.auth.admin_bootstrap().unwrap().username, "root");
    }

    #[test]
    fn test_settings_follow_config() {
        let config = load(&[
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "5"),
            ("STORE_MAX_RETRIES", "1"),
            ("DOCUMENT_BASE_URL", "https://docs.example.com/"),
        ])
        .unwrap();
        let settings = config.settings();
        assert_eq!(settings.session_ttl, ChronoDuration::minutes(5));
        assert_eq!(settings.retry.max_retries, 1);
        assert_eq!(settings.document_base_url, "https://docs.example.com/");
    }

    #[test]
    fn test_debug_redacts_admin_password() {
        let config = load(&[("ADMIN_PASSWORD", "hunter22")]).unwrap();
        assert!(!format!("{config:?}").contains("hunter22"));
    }
}
