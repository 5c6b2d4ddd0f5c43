// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development. The session secret and
//! identity-provider credentials are required; everything else has a default.

use std::env;

/// Minimum length of the cookie encryption secret.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

/// Where the service is running. Anything other than development gets
/// `Secure` cookies and HSTS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Development,
    Production,
}

impl DeploymentMode {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => DeploymentMode::Development,
            _ => DeploymentMode::Production,
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Public base URL of this service, used to build the OAuth callback URL
    pub host_url: String,
    /// PostgreSQL connection string (`memory:` selects the in-process store)
    pub database_url: String,
    /// Upper bound on pooled database connections
    pub database_max_connections: u32,
    /// Secret used to derive the session cookie and OAuth state keys
    pub session_secret: Vec<u8>,
    /// How long a session cookie stays valid
    pub session_ttl: chrono::Duration,
    /// Okta organization URL, e.g. `https://dev-123456.okta.com`
    pub okta_org_url: String,
    pub okta_client_id: String,
    pub okta_client_secret: String,
    pub deployment_mode: DeploymentMode,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            host_url: "http://localhost:8080".to_string(),
            database_url: "memory:".to_string(),
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            session_secret: b"test_cookie_secret_32_bytes_min!!".to_vec(),
            session_ttl: chrono::Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            okta_org_url: "https://okta.test".to_string(),
            okta_client_id: "test_client_id".to_string(),
            okta_client_secret: "test_client_secret".to_string(),
            deployment_mode: DeploymentMode::Development,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                reason: format!("'{}' is not a valid port", raw),
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let session_secret = env::var("COOKIE_ENCRYPT_PWD")
            .map_err(|_| ConfigError::Missing("COOKIE_ENCRYPT_PWD"))?
            .into_bytes();
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "COOKIE_ENCRYPT_PWD",
                reason: format!("must be at least {} bytes", MIN_SESSION_SECRET_LEN),
            });
        }

        let session_ttl_hours = match env::var("SESSION_TTL_HOURS") {
            Ok(raw) => match raw.parse::<i64>() {
                Ok(hours) if hours > 0 => hours,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "SESSION_TTL_HOURS",
                        reason: format!("'{}' is not a positive number of hours", raw),
                    })
                }
            },
            Err(_) => DEFAULT_SESSION_TTL_HOURS,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            host_url: env::var("HOST_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
            database_url: env::var("DATABASE_URL").or_else(|_| database_url_from_parts())?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            session_secret,
            session_ttl: chrono::Duration::hours(session_ttl_hours),
            okta_org_url: env::var("OKTA_ORG_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("OKTA_ORG_URL"))?,
            okta_client_id: env::var("OKTA_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("OKTA_CLIENT_ID"))?,
            okta_client_secret: env::var("OKTA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("OKTA_CLIENT_SECRET"))?,
            deployment_mode: env::var("APP_ENV")
                .map(|v| DeploymentMode::parse(&v))
                .unwrap_or(DeploymentMode::Production),
        })
    }

    /// Whether cookies must carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.deployment_mode != DeploymentMode::Development
    }

    /// Absolute URL the identity provider redirects back to.
    pub fn callback_url(&self) -> String {
        format!(
            "{}/authorization-code/callback",
            self.host_url.trim_end_matches('/')
        )
    }
}

/// Build a connection string from the libpq-style `PG*` variables.
fn database_url_from_parts() -> Result<String, ConfigError> {
    let host = env::var("PGHOST").map_err(|_| ConfigError::Missing("DATABASE_URL or PGHOST"))?;
    let port = env::var("PGPORT").unwrap_or_else(|_| "5432".to_string());
    let user = env::var("PGUSER").map_err(|_| ConfigError::Missing("PGUSER"))?;
    let password = env::var("PGPASSWORD").unwrap_or_default();
    let database = env::var("PGDATABASE").unwrap_or_else(|_| user.clone());

    Ok(format!(
        "postgres://{}:{}@{}:{}/{}",
        urlencoding::encode(&user),
        urlencoding::encode(&password),
        host,
        port,
        database
    ))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
