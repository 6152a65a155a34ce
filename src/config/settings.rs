//! Application settings loading from config.toml
//!
//! Every section is optional. A missing `config.toml` yields the defaults, and the
//! `DATABASE_URL` and `JWT_SECRET` environment variables (usually set through `.env`)
//! take precedence over the file.

use crate::config::{
    database::DEFAULT_DATABASE_URL,
    users::{SeedUser, default_seed_users},
};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Signing secret used when neither the file nor the environment provides one.
pub const DEFAULT_JWT_SECRET: &str = "finance-portal-development-secret-change-me";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// `SeaORM` connection URL
    pub database_url: String,
    /// Token signing and session storage
    pub auth: AuthConfig,
    /// File import limits
    pub import: ImportConfig,
    /// Accounts created on start-up when missing
    pub users: Vec<SeedUser>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            import: ImportConfig::default(),
            users: default_seed_users(),
        }
    }
}

/// Token signing settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for HS256 tokens
    pub jwt_secret: String,
    /// Token lifetime in seconds
    pub jwt_expiration_secs: i64,
    /// `iss` claim written into and required from every token
    pub issuer: String,
    /// Where `auth login` stores the issued token
    pub session_file: PathBuf,
    /// bcrypt work factor for new password hashes
    pub password_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expiration_secs: 86_400,
            issuer: "finance-portal".to_string(),
            session_file: PathBuf::from("data/session.token"),
            password_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// File import settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ImportConfig {
    /// Largest accepted upload in bytes
    pub max_file_bytes: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Applies `DATABASE_URL` and `JWT_SECRET` from the environment over the file values.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database_url = url;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        self
    }
}

/// Loads the application configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from `path` if it exists, otherwise the defaults, then applies
/// environment overrides.
pub fn load_app_configuration(path: &Path) -> Result<AppConfig> {
    let config = if path.exists() {
        info!("Loading configuration from {}", path.display());
        load_config(path)?
    } else {
        info!("No {} found, using default configuration", path.display());
        AppConfig::default()
    };

    let config = config.with_env_overrides();
    if config.auth.jwt_secret == DEFAULT_JWT_SECRET {
        warn!("JWT_SECRET is not set; tokens are signed with the development secret");
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            database_url = "sqlite://finance.sqlite?mode=rwc"

            [auth]
            jwt_secret = "s3cret"
            jwt_expiration_secs = 3600
            issuer = "portal-test"
            session_file = "/tmp/portal.token"

            [import]
            max_file_bytes = 1024

            [[users]]
            username = "alice"
            email = "alice@example.com"
            password = "pw"
            role = "ADMIN"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.database_url, "sqlite://finance.sqlite?mode=rwc");
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.auth.jwt_expiration_secs, 3600);
        assert_eq!(config.auth.issuer, "portal-test");
        assert_eq!(config.import.max_file_bytes, 1024);
        assert_eq!(config.users.len(), 1);
        assert_eq!(config.users[0].username, "alice");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.auth.jwt_expiration_secs, 86_400);
        assert_eq!(config.import.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(config.users, default_seed_users());
    }

    #[test]
    fn test_partial_auth_section_keeps_other_defaults() {
        let config = parse_config("[auth]\nissuer = \"other\"").unwrap();
        assert_eq!(config.auth.issuer, "other");
        assert_eq!(config.auth.jwt_secret, DEFAULT_JWT_SECRET);
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let result = parse_config("database_url = 42");
        assert!(matches!(result.unwrap_err(), Error::Config { .. }));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_config("/nonexistent/finance-portal/config.toml");
        assert!(matches!(result.unwrap_err(), Error::Config { .. }));
    }
}
