//! Server configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

/// Whether update and delete check that the caller owns the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnershipPolicy {
    /// Any authenticated caller may update or delete any item by id.
    #[default]
    Unscoped,
    /// Update and delete only touch items owned by the caller.
    Owner,
}

impl FromStr for OwnershipPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unscoped" => Ok(Self::Unscoped),
            "owner" => Ok(Self::Owner),
            other => anyhow::bail!("unknown ownership policy '{other}', expected unscoped or owner"),
        }
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database URL.
    pub database_url: String,
    /// JWT secret. When unset, sessions live in the database.
    pub jwt_secret: Option<String>,
    /// JWT expiration in hours.
    pub jwt_expiration_hours: u64,
    /// Name of the session cookie.
    pub session_cookie: String,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Ownership check on update and delete.
    pub ownership: OwnershipPolicy,
    /// Include internal error text in 500 bodies.
    pub expose_error_details: bool,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Log level.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            database_url: "sqlite:worktrack.db?mode=rwc".to_string(),
            jwt_secret: None,
            jwt_expiration_hours: auth::DEFAULT_SESSION_TTL_HOURS,
            session_cookie: auth::DEFAULT_SESSION_COOKIE.to_string(),
            cors_origins: vec!["http://localhost:3000".to_string(), "mobile://".to_string()],
            ownership: OwnershipPolicy::Unscoped,
            expose_error_details: false,
            request_timeout_secs: 30,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let port = match lookup("WORKTRACK_PORT") {
            Some(v) => v.parse().context("WORKTRACK_PORT must be a port number")?,
            None => defaults.port,
        };
        let jwt_expiration_hours = match lookup("WORKTRACK_JWT_EXPIRATION_HOURS") {
            Some(v) => v
                .parse()
                .context("WORKTRACK_JWT_EXPIRATION_HOURS must be a number")?,
            None => defaults.jwt_expiration_hours,
        };
        let request_timeout_secs = match lookup("WORKTRACK_REQUEST_TIMEOUT_SECS") {
            Some(v) => v
                .parse()
                .context("WORKTRACK_REQUEST_TIMEOUT_SECS must be a number")?,
            None => defaults.request_timeout_secs,
        };
        let ownership = match lookup("WORKTRACK_OWNERSHIP") {
            Some(v) => v.parse()?,
            None => defaults.ownership,
        };
        let cors_origins = match lookup("WORKTRACK_CORS_ORIGINS") {
            Some(v) => v
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
            None => defaults.cors_origins,
        };

        Ok(Self {
            host: lookup("WORKTRACK_HOST").unwrap_or(defaults.host),
            port,
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            jwt_secret: lookup("WORKTRACK_JWT_SECRET").filter(|s| !s.is_empty()),
            jwt_expiration_hours,
            session_cookie: lookup("WORKTRACK_SESSION_COOKIE").unwrap_or(defaults.session_cookie),
            cors_origins,
            ownership,
            expose_error_details: lookup("WORKTRACK_EXPOSE_ERROR_DETAILS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
            request_timeout_secs,
            log_level: lookup("WORKTRACK_LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }

    /// Returns the server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.server_addr(), "0.0.0.0:4000");
        assert_eq!(config.ownership, OwnershipPolicy::Unscoped);
        assert_eq!(config.cors_origins, vec!["http://localhost:3000", "mobile://"]);
        assert_eq!(config.session_cookie, "worktrack.session_token");
        assert!(config.jwt_secret.is_none());
        assert!(!config.expose_error_details);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("WORKTRACK_PORT", "8080"),
            ("WORKTRACK_OWNERSHIP", "Owner"),
            ("WORKTRACK_CORS_ORIGINS", "https://a.example, https://b.example"),
            ("WORKTRACK_EXPOSE_ERROR_DETAILS", "true"),
            ("WORKTRACK_JWT_SECRET", "s3cret"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.ownership, OwnershipPolicy::Owner);
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert!(config.expose_error_details);
        assert_eq!(config.jwt_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(load(&[("WORKTRACK_PORT", "eighty")]).is_err());
        assert!(load(&[("WORKTRACK_OWNERSHIP", "everyone")]).is_err());
    }

    #[test]
    fn test_empty_jwt_secret_means_database_sessions() {
        let config = load(&[("WORKTRACK_JWT_SECRET", "")]).unwrap();
        assert!(config.jwt_secret.is_none());
    }
}
