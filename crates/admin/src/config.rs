//! Front-end configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `VETDESK_API_BASE_URL` - Base URL of the clinic REST API (e.g. `https://api.clinic.vet/v1`)
//!
//! ## Optional
//! - `VETDESK_HOST` - Bind address (default: 127.0.0.1)
//! - `VETDESK_PORT` - Listen port (default: 3000)
//! - `VETDESK_BASE_URL` - Public URL of this front end (default: `http://localhost:3000`)
//! - `VETDESK_API_TIMEOUT_SECS` - Per-request timeout for API calls (default: 15)
//! - `VETDESK_REMEMBER_ME_DAYS` - Lifetime of a "remember me" session (default: 30)
//! - `VETDESK_LOG_JSON` - Emit JSON logs when set to `1`/`true`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)
//!
//! ## Optional (TLS)
//! - `VETDESK_TLS_CERT` - PEM-encoded certificate chain
//! - `VETDESK_TLS_KEY` - PEM-encoded private key

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_TIMEOUT_SECS: u64 = 15;
const DEFAULT_REMEMBER_ME_DAYS: i64 = 30;
const MAX_REMEMBER_ME_DAYS: i64 = 365;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Front-end application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the front end
    pub base_url: String,
    /// Clinic API settings
    pub api: ApiConfig,
    /// How long a "remember me" session survives without activity
    pub remember_me_days: i64,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Clinic REST API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL; resource paths are joined onto it.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ApiConfig {
    /// Build an API configuration from a base URL string.
    ///
    /// A trailing slash is added when missing so that joining `pets` onto
    /// `https://api.clinic.vet/v1` yields `.../v1/pets` rather than `.../pets`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse or is
    /// not http(s).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let url = Url::parse(&normalized).map_err(|e| {
            ConfigError::InvalidEnvVar("VETDESK_API_BASE_URL".to_string(), e.to_string())
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "VETDESK_API_BASE_URL".to_string(),
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(Self {
            base_url: url,
            timeout,
        })
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("VETDESK_TLS_CERT");
        let key_pem = get_optional_env("VETDESK_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "VETDESK_TLS_*".to_string(),
                "Both VETDESK_TLS_CERT and VETDESK_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("VETDESK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("VETDESK_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("VETDESK_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("VETDESK_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("VETDESK_BASE_URL", "http://localhost:3000");

        let timeout_secs = get_env_or_default(
            "VETDESK_API_TIMEOUT_SECS",
            &DEFAULT_API_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("VETDESK_API_TIMEOUT_SECS".to_string(), e.to_string())
        })?;
        let api = ApiConfig::new(
            &get_required_env("VETDESK_API_BASE_URL")?,
            Duration::from_secs(timeout_secs),
        )?;

        let remember_me_days = parse_remember_me_days(get_optional_env(
            "VETDESK_REMEMBER_ME_DAYS",
        ))?;
        let log_json = get_optional_env("VETDESK_LOG_JSON")
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            api,
            remember_me_days,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the front end is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://") || self.tls.is_some()
    }

    /// Lifetime of a "remember me" session.
    #[must_use]
    pub const fn remember_me_duration(&self) -> time::Duration {
        time::Duration::days(self.remember_me_days)
    }

    /// Configuration suitable for tests: local bind, given API URL, no Sentry.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_base_url` is invalid.
    pub fn for_api(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: "http://localhost".to_string(),
            api: ApiConfig::new(
                api_base_url,
                Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            )?,
            remember_me_days: DEFAULT_REMEMBER_ME_DAYS,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
            tls: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse and bound the remember-me lifetime.
fn parse_remember_me_days(raw: Option<String>) -> Result<i64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_REMEMBER_ME_DAYS);
    };
    let days = raw.trim().parse::<i64>().map_err(|e| {
        ConfigError::InvalidEnvVar("VETDESK_REMEMBER_ME_DAYS".to_string(), e.to_string())
    })?;
    if !(1..=MAX_REMEMBER_ME_DAYS).contains(&days) {
        return Err(ConfigError::InvalidEnvVar(
            "VETDESK_REMEMBER_ME_DAYS".to_string(),
            format!("must be between 1 and {MAX_REMEMBER_ME_DAYS}"),
        ));
    }
    Ok(days)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_adds_trailing_slash() {
        let api = ApiConfig::new("https://api.clinic.vet/v1", Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url.as_str(), "https://api.clinic.vet/v1/");
        assert_eq!(
            api.base_url.join("pets").unwrap().as_str(),
            "https://api.clinic.vet/v1/pets"
        );
    }

    #[test]
    fn test_api_config_rejects_bad_urls() {
        assert!(ApiConfig::new("not a url", Duration::from_secs(5)).is_err());
        let err = ApiConfig::new("ftp://files.clinic.vet", Duration::from_secs(5)).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_remember_me_days_bounds() {
        assert_eq!(parse_remember_me_days(None).unwrap(), 30);
        assert_eq!(parse_remember_me_days(Some("7".to_string())).unwrap(), 7);
        assert!(parse_remember_me_days(Some("0".to_string())).is_err());
        assert!(parse_remember_me_days(Some("400".to_string())).is_err());
        assert!(parse_remember_me_days(Some("week".to_string())).is_err());
    }

    #[test]
    fn test_socket_addr_and_security() {
        let mut config = AdminConfig::for_api("http://127.0.0.1:9000").unwrap();
        config.port = 3000;
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());

        config.base_url = "https://desk.clinic.vet".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_remember_me_duration() {
        let config = AdminConfig::for_api("http://127.0.0.1:9000").unwrap();
        assert_eq!(config.remember_me_duration(), time::Duration::days(30));
    }

    #[test]
    fn test_tls_config_debug_redacts_key() {
        let config = TlsConfig {
            cert_pem: "-----BEGIN CERTIFICATE-----".to_string(),
            key_pem: SecretString::from("super_secret_private_key"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_private_key"));
    }
}
