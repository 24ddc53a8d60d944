//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `ZALLSHOP_HOST` - Bind address (default: 127.0.0.1)
//! - `ZALLSHOP_PORT` - Listen port (default: 3000)
//! - `ZALLSHOP_BASE_URL` - Public URL for the storefront (default: <http://localhost:3000>)
//! - `ZALLSHOP_STORAGE_DIR` - Directory for persisted carts (default: in-memory)
//! - `ZALLSHOP_CHECKOUT_DELAY_MS` - Simulated checkout processing time (default: 2000)
//! - `ZALLSHOP_LOG_FORMAT` - `text` or `json` (default: text)
//! - `CATALOG_BASE_URL` - Product catalog API (default: <https://dummyjson.com>)
//! - `CATALOG_EXCHANGE_RATE` - Catalog USD to display IDR rate (default: 15000)
//! - `CATALOG_CACHE_TTL_SECS` - Catalog response cache lifetime (default: 60)
//! - `CATALOG_TIMEOUT_SECS` - Catalog request timeout (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines, for local development
    #[default]
    Text,
    /// One JSON object per event, for log aggregation
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected `text` or `json`, got `{other}`")),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Directory for file-backed cart storage; in-memory when unset
    pub storage_dir: Option<PathBuf>,
    /// How long the simulated checkout takes
    pub checkout_delay: Duration,
    /// Log output format
    pub log_format: LogFormat,
    /// Product catalog API configuration
    pub catalog: CatalogConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error event sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Product catalog API configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the catalog API
    pub base_url: Url,
    /// Multiplier from catalog prices (USD) to display prices (IDR)
    pub exchange_rate: Decimal,
    /// How long catalog responses are cached
    pub cache_ttl: Duration,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_CATALOG_URL).expect("default catalog URL is valid"),
            exchange_rate: Decimal::new(15_000, 0),
            cache_ttl: Duration::from_secs(60),
            timeout: Duration::from_secs(10),
        }
    }
}

const DEFAULT_CATALOG_URL: &str = "https://dummyjson.com";

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default::<IpAddr>("ZALLSHOP_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("ZALLSHOP_PORT", "3000")?;
        let base_url = get_env_or_default("ZALLSHOP_BASE_URL", "http://localhost:3000");
        let storage_dir = get_optional_env("ZALLSHOP_STORAGE_DIR").map(PathBuf::from);
        let checkout_delay = Duration::from_millis(parse_env_or_default::<u64>(
            "ZALLSHOP_CHECKOUT_DELAY_MS",
            "2000",
        )?);

        let log_format = parse_env_or_default::<LogFormat>("ZALLSHOP_LOG_FORMAT", "text")?;
        let catalog = CatalogConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            storage_dir,
            checkout_delay,
            log_format,
            catalog,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default::<f32>("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default::<f32>(
                "SENTRY_TRACES_SAMPLE_RATE",
                "0.1",
            )?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            storage_dir: None,
            checkout_delay: Duration::from_secs(2),
            log_format: LogFormat::Text,
            catalog: CatalogConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_env_or_default("CATALOG_BASE_URL", DEFAULT_CATALOG_URL);
        let base_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("CATALOG_BASE_URL".to_string(), e.to_string())
        })?;

        let exchange_rate = parse_env_or_default::<Decimal>("CATALOG_EXCHANGE_RATE", "15000")?;
        if exchange_rate <= Decimal::ZERO {
            return Err(ConfigError::InvalidEnvVar(
                "CATALOG_EXCHANGE_RATE".to_string(),
                "must be positive".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            exchange_rate,
            cache_ttl: Duration::from_secs(parse_env_or_default::<u64>(
                "CATALOG_CACHE_TTL_SECS",
                "60",
            )?),
            timeout: Duration::from_secs(parse_env_or_default::<u64>(
                "CATALOG_TIMEOUT_SECS",
                "10",
            )?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_valid() {
        let port: u16 = parse_value("TEST_PORT", "8080").unwrap();
        assert_eq!(port, 8080);

        let rate: Decimal = parse_value("TEST_RATE", " 15000 ").unwrap();
        assert_eq!(rate, Decimal::new(15_000, 0));
    }

    #[test]
    fn test_parse_value_invalid() {
        let result = parse_value::<u16>("TEST_PORT", "not-a-port");
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "TEST_PORT"));
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            host: "0.0.0.0".parse().unwrap(),
            port: 8080,
            ..StorefrontConfig::default()
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "0.0.0.0");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_is_secure() {
        let mut config = StorefrontConfig::default();
        assert!(!config.is_secure());

        config.base_url = "https://shop.example.com".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(parse_value::<LogFormat>("FMT", "JSON").unwrap(), LogFormat::Json);
        assert_eq!(parse_value::<LogFormat>("FMT", "text").unwrap(), LogFormat::Text);
        assert!(parse_value::<LogFormat>("FMT", "yaml").is_err());
    }

    #[test]
    fn test_catalog_defaults() {
        let catalog = CatalogConfig::default();
        assert_eq!(catalog.base_url.as_str(), "https://dummyjson.com/");
        assert_eq!(catalog.exchange_rate, Decimal::new(15_000, 0));
        assert_eq!(catalog.cache_ttl, Duration::from_secs(60));
    }
}
