//! Atelier service configuration.
//!
//! Configuration is loaded from environment variables. The database URL is
//! redacted in Debug output.

use common::jwt::{parse_algorithm_list, AlgorithmListError, DEFAULT_ALGORITHM};
use jsonwebtoken::Algorithm;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default JWKS cache TTL in seconds.
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 300;

/// Default JWKS fetch timeout in seconds.
pub const DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Upper bound on the JWKS fetch timeout.
pub const MAX_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 60;

/// Default database pool size.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Service configuration.
///
/// Loaded from environment variables with defaults for everything except the
/// database URL, the issuer domain and the API audience.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Token issuer domain, e.g. `example.auth0.com`.
    pub auth_domain: String,

    /// Expected `aud` claim.
    pub api_audience: String,

    /// Expected `iss` claim (default: `https://<domain>/`).
    pub auth_issuer: String,

    /// JWKS endpoint (default: `https://<domain>/.well-known/jwks.json`).
    pub jwks_url: String,

    /// Accepted token signature algorithms (default: RS256).
    pub jwt_algorithms: Vec<Algorithm>,

    /// How long a fetched key set is served from cache.
    pub jwks_cache_ttl_seconds: u64,

    /// Upper bound on a single key set fetch.
    pub jwks_fetch_timeout_seconds: u64,

    /// Maximum database pool connections.
    pub db_max_connections: u32,

    /// Seconds to wait after a shutdown signal before draining connections.
    pub drain_seconds: u64,

    /// Client id used to build the hosted login URL.
    pub auth_client_id: Option<String>,

    /// Redirect target for the hosted login URL.
    pub auth_callback_url: Option<String>,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("auth_domain", &self.auth_domain)
            .field("api_audience", &self.api_audience)
            .field("auth_issuer", &self.auth_issuer)
            .field("jwks_url", &self.jwks_url)
            .field("jwt_algorithms", &self.jwt_algorithms)
            .field("jwks_cache_ttl_seconds", &self.jwks_cache_ttl_seconds)
            .field("jwks_fetch_timeout_seconds", &self.jwks_fetch_timeout_seconds)
            .field("db_max_connections", &self.db_max_connections)
            .field("drain_seconds", &self.drain_seconds)
            .field("auth_client_id", &self.auth_client_id)
            .field("auth_callback_url", &self.auth_callback_url)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT algorithm configuration: {0}")]
    InvalidAlgorithms(#[from] AlgorithmListError),

    #[error("Invalid JWKS configuration: {0}")]
    InvalidJwks(String),

    #[error("Invalid database configuration: {0}")]
    InvalidDatabase(String),

    #[error("Invalid drain configuration: {0}")]
    InvalidDrain(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = required(vars, "DATABASE_URL")?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let auth_domain = required(vars, "AUTH0_DOMAIN")?
            .trim_end_matches('/')
            .to_string();
        let api_audience = required(vars, "API_AUDIENCE")?;

        let auth_issuer = vars
            .get("AUTH_ISSUER")
            .cloned()
            .unwrap_or_else(|| format!("https://{auth_domain}/"));

        let jwks_url = vars
            .get("JWKS_URL")
            .cloned()
            .unwrap_or_else(|| format!("https://{auth_domain}/.well-known/jwks.json"));

        let jwt_algorithms = match vars.get("JWT_ALGORITHMS") {
            Some(list) => parse_algorithm_list(list)?,
            None => vec![DEFAULT_ALGORITHM],
        };

        let jwks_cache_ttl_seconds = parse_u64(
            vars,
            "JWKS_CACHE_TTL_SECONDS",
            DEFAULT_JWKS_CACHE_TTL_SECONDS,
            ConfigError::InvalidJwks,
        )?;
        if jwks_cache_ttl_seconds == 0 {
            return Err(ConfigError::InvalidJwks(
                "JWKS_CACHE_TTL_SECONDS must be greater than 0".to_string(),
            ));
        }

        let jwks_fetch_timeout_seconds = parse_u64(
            vars,
            "JWKS_FETCH_TIMEOUT_SECONDS",
            DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS,
            ConfigError::InvalidJwks,
        )?;
        if !(1..=MAX_JWKS_FETCH_TIMEOUT_SECONDS).contains(&jwks_fetch_timeout_seconds) {
            return Err(ConfigError::InvalidJwks(format!(
                "JWKS_FETCH_TIMEOUT_SECONDS must be between 1 and {}, got {}",
                MAX_JWKS_FETCH_TIMEOUT_SECONDS, jwks_fetch_timeout_seconds
            )));
        }

        let db_max_connections = if let Some(value_str) = vars.get("DB_MAX_CONNECTIONS") {
            let value: u32 = value_str.parse().map_err(|e| {
                ConfigError::InvalidDatabase(format!(
                    "DB_MAX_CONNECTIONS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidDatabase(
                    "DB_MAX_CONNECTIONS must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_DB_MAX_CONNECTIONS
        };

        let drain_seconds = parse_u64(vars, "ATELIER_DRAIN_SECONDS", 0, ConfigError::InvalidDrain)?;

        let auth_client_id = optional(vars, "AUTH0_CLIENT_ID");
        let auth_callback_url = optional(vars, "AUTH0_CALLBACK_URL");

        Ok(Config {
            database_url,
            bind_address,
            auth_domain,
            api_audience,
            auth_issuer,
            jwks_url,
            jwt_algorithms,
            jwks_cache_ttl_seconds,
            jwks_fetch_timeout_seconds,
            db_max_connections,
            drain_seconds,
            auth_client_id,
            auth_callback_url,
        })
    }
}

/// A required variable; empty values count as missing.
fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .filter(|value| !value.trim().is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn parse_u64(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
    err: fn(String) -> ConfigError,
) -> Result<u64, ConfigError> {
    match vars.get(name) {
        Some(value_str) => value_str.parse().map_err(|e| {
            err(format!(
                "{} must be a valid non-negative integer, got '{}': {}",
                name, value_str, e
            ))
        }),
        None => Ok(default),
    }
}
