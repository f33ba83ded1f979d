//! Environment-driven configuration.
//!
//! All knobs live under a `VETWATCH_` prefix and every one of them has a
//! development default, so a bare `cargo run` comes up listening on
//! loopback. A `.env` file is read when present.

use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

const ENV_STAGE: &str = "VETWATCH_ENV";
const ENV_HOST: &str = "VETWATCH_HOST";
const ENV_PORT: &str = "VETWATCH_PORT";
const ENV_LOG: &str = "VETWATCH_LOG";
const ENV_CRITICAL_THRESHOLD: &str = "VETWATCH_CRITICAL_THRESHOLD";
const ENV_GRACE_DAYS: &str = "VETWATCH_GRACE_DAYS";
const ENV_PENALTY: &str = "VETWATCH_PENALTY_PER_ENTITY";

/// Deployment stage of the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Staging,
    Production,
}

impl AppEnvironment {
    /// Unrecognized values fall back to `Development` rather than failing
    /// startup.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "stage" | "staging" => Self::Staging,
            _ => Self::Development,
        }
    }
}

/// Everything the binaries need to come up, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scoring: ScoringOverrides,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            environment: AppEnvironment::parse(&env_or(ENV_STAGE, "development")),
            server: ServerConfig {
                host: env_or(ENV_HOST, "127.0.0.1"),
                port: parse_env(ENV_PORT, 8080)?,
            },
            telemetry: TelemetryConfig {
                log_level: env_or(ENV_LOG, "info"),
            },
            scoring: ScoringOverrides {
                critical_threshold: parse_env_opt(ENV_CRITICAL_THRESHOLD)?,
                grace_period_days: parse_env_opt(ENV_GRACE_DAYS)?,
                penalty_per_entity: parse_env_opt(ENV_PENALTY)?,
            },
        })
    }
}

/// HTTP bind address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::from([127, 0, 0, 1])
        } else {
            self.host
                .parse()
                .map_err(|source| ConfigError::InvalidHost { source })?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Log verbosity, overridable at runtime by `RUST_LOG`.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Operator adjustments to the published scoring methodology. `None` leaves
/// the corresponding built-in value in force; `VETWATCH_GRACE_DAYS=0` turns
/// the grace window off entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringOverrides {
    pub critical_threshold: Option<f64>,
    pub grace_period_days: Option<i64>,
    pub penalty_per_entity: Option<f64>,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

fn parse_env_opt<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(None),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
    InvalidHost { source: std::net::AddrParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, value } => {
                write!(f, "{key} could not be parsed from {value:?}")
            }
            ConfigError::InvalidHost { .. } => {
                write!(f, "host must be \"localhost\" or a literal IP address")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Invalid { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    // Process environment is shared across the test binary, so every test
    // touching it holds this lock.
    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env mutex poisoned")
    }

    fn clear_vetwatch_vars() {
        for key in [
            ENV_STAGE,
            ENV_HOST,
            ENV_PORT,
            ENV_LOG,
            ENV_CRITICAL_THRESHOLD,
            ENV_GRACE_DAYS,
            ENV_PENALTY,
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn defaults_cover_local_development() {
        let _guard = env_lock();
        clear_vetwatch_vars();

        let config = AppConfig::load().expect("defaults load");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.scoring, ScoringOverrides::default());
    }

    #[test]
    fn localhost_binds_loopback() {
        let _guard = env_lock();
        clear_vetwatch_vars();
        env::set_var(ENV_HOST, "localhost");

        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 8080));

        env::remove_var(ENV_HOST);
    }

    #[test]
    fn scoring_overrides_parse_from_env() {
        let _guard = env_lock();
        clear_vetwatch_vars();
        env::set_var(ENV_CRITICAL_THRESHOLD, "35.5");
        env::set_var(ENV_GRACE_DAYS, "0");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.scoring.critical_threshold, Some(35.5));
        assert_eq!(config.scoring.grace_period_days, Some(0));
        assert_eq!(config.scoring.penalty_per_entity, None);

        clear_vetwatch_vars();
    }

    #[test]
    fn garbage_port_is_rejected() {
        let _guard = env_lock();
        clear_vetwatch_vars();
        env::set_var(ENV_PORT, "eighty");

        let error = AppConfig::load().expect_err("port must be numeric");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                key: "VETWATCH_PORT",
                ..
            }
        ));

        env::remove_var(ENV_PORT);
    }

    #[test]
    fn stage_aliases_normalize() {
        for (raw, expected) in [
            ("prod", AppEnvironment::Production),
            ("Production", AppEnvironment::Production),
            ("stage", AppEnvironment::Staging),
            ("staging", AppEnvironment::Staging),
            ("dev", AppEnvironment::Development),
            ("anything-else", AppEnvironment::Development),
        ] {
            assert_eq!(AppEnvironment::parse(raw), expected, "alias {raw:?}");
        }
    }
}
