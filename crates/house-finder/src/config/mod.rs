use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::listings::Coordinates;
use crate::sessions::DEFAULT_SESSION_TTL_HOURS;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub database: DatabaseConfig,
    pub listings: ListingConfig,
    pub notifier: NotifierConfig,
    pub sessions: SessionConfig,
    pub model: ModelConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://houses.db".to_string()),
            max_connections: parse_bounded("DATABASE_MAX_CONNECTIONS", 8, 1..=64)?,
        };

        let fallback = Coordinates::default();
        let listings = ListingConfig {
            default_coordinates: Coordinates {
                lat: parse_var("LISTING_DEFAULT_LAT", fallback.lat)?,
                lon: parse_var("LISTING_DEFAULT_LON", fallback.lon)?,
            },
            max_duration_days: parse_bounded("LISTING_MAX_DURATION_DAYS", 30, 1..=365)?,
        };

        let notifier = NotifierConfig {
            interval: Duration::from_secs(parse_bounded(
                "NOTIFIER_INTERVAL_SECS",
                60,
                1..=86_400,
            )?),
            lookahead: chrono::Duration::days(parse_bounded(
                "NOTIFIER_LOOKAHEAD_DAYS",
                3,
                1..=365,
            )?),
        };

        let sessions = SessionConfig {
            ttl: chrono::Duration::hours(parse_bounded(
                "SESSION_TTL_HOURS",
                DEFAULT_SESSION_TTL_HOURS,
                1..=24 * 90,
            )?),
        };

        let model = ModelConfig {
            path: env::var("PRICE_MODEL_PATH")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            database,
            listings,
            notifier,
            sessions,
            model,
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            name,
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// Like [`parse_var`], but values outside `range` are rejected too.
fn parse_bounded<T>(
    name: &'static str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + ToString,
{
    let value = parse_var(name, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// SQLite connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Single-connection in-memory database, handy for tests and dry runs.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// Defaults applied when new listings are created.
#[derive(Debug, Clone)]
pub struct ListingConfig {
    pub default_coordinates: Coordinates,
    pub max_duration_days: i64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_coordinates: Coordinates::default(),
            max_duration_days: 30,
        }
    }
}

/// Polling cadence and lookahead window for expiry notifications.
#[derive(Debug, Clone, Copy)]
pub struct NotifierConfig {
    pub interval: Duration,
    pub lookahead: chrono::Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            lookahead: chrono::Duration::days(3),
        }
    }
}

/// How long a login stays valid.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub ttl: chrono::Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: chrono::Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        }
    }
}

/// Location of the serialized price model; `None` selects the baseline.
#[derive(Debug, Clone, Default)]
pub struct ModelConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { name, value } => {
                write!(f, "{name} has an unparseable value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidValue { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "DATABASE_URL",
            "DATABASE_MAX_CONNECTIONS",
            "LISTING_DEFAULT_LAT",
            "LISTING_DEFAULT_LON",
            "LISTING_MAX_DURATION_DAYS",
            "NOTIFIER_INTERVAL_SECS",
            "NOTIFIER_LOOKAHEAD_DAYS",
            "SESSION_TTL_HOURS",
            "PRICE_MODEL_PATH",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.listings.max_duration_days, 30);
        assert_eq!(config.notifier.interval, Duration::from_secs(60));
        assert_eq!(config.notifier.lookahead, chrono::Duration::days(3));
        assert_eq!(config.sessions.ttl, chrono::Duration::hours(24));
        assert!(config.model.path.is_none());
        assert!((config.listings.default_coordinates.lat - 42.0347).abs() < 1e-9);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn rejects_unparseable_notifier_interval() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("NOTIFIER_INTERVAL_SECS", "soon");
        match AppConfig::load() {
            Err(ConfigError::InvalidValue { name, value }) => {
                assert_eq!(name, "NOTIFIER_INTERVAL_SECS");
                assert_eq!(value, "soon");
            }
            other => panic!("expected invalid value error, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_out_of_range_notifier_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        for (name, raw) in [
            ("NOTIFIER_INTERVAL_SECS", "0"),
            ("NOTIFIER_LOOKAHEAD_DAYS", "9223372036854775807"),
            ("NOTIFIER_LOOKAHEAD_DAYS", "0"),
            ("SESSION_TTL_HOURS", "0"),
        ] {
            reset_env();
            env::set_var(name, raw);
            match AppConfig::load() {
                Err(ConfigError::InvalidValue { name: found, value }) => {
                    assert_eq!(found, name);
                    assert_eq!(value, raw);
                }
                other => panic!("expected {name}={raw} to be rejected, got {other:?}"),
            }
        }
        reset_env();
    }
}
