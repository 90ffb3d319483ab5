use secrecy::{ExposeSecret, Secret};
use service_core::config as core_config;
use service_core::error::AppError;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::env;
use std::time::Duration;

/// Session time zone requested on every database connection.
pub const DB_TIME_ZONE: &str = "Asia/Tokyo";

/// UTC offset of `DB_TIME_ZONE` in seconds. Tokyo observes no DST.
pub const DB_UTC_OFFSET_SECS: i32 = 9 * 60 * 60;

/// Upper bound for establishing a database connection.
pub const DB_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_PG_PORT: u16 = 5432;

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    /// `None` when `DB_HOST` is unset; the service then runs without a store.
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: Secret<String>,
    pub name: String,
    /// Raw `DB_PORT`; validated when connecting so a bad value only disables the store.
    pub port: String,
}

impl BackendConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        Ok(BackendConfig {
            common,
            service_name: get_env("SERVICE_NAME", "backend-service"),
            log_level: get_env("LOG_LEVEL", "info"),
            otlp_endpoint: non_empty_env("OTLP_ENDPOINT"),
            database: DatabaseConfig::from_env(),
        })
    }
}

impl DatabaseConfig {
    /// Read the `DB_*` variables. Returns `None` when `DB_HOST` is unset or empty.
    pub fn from_env() -> Option<Self> {
        let host = non_empty_env("DB_HOST")?;

        Some(DatabaseConfig {
            host,
            user: get_env("DB_USER", ""),
            password: Secret::new(get_env("DB_PASSWORD", "")),
            name: get_env("DB_NAME", ""),
            port: get_env("DB_PORT", ""),
        })
    }

    /// Connection options: TLS required, Tokyo session time zone.
    pub fn connect_options(&self) -> Result<PgConnectOptions, AppError> {
        let port = if self.port.trim().is_empty() {
            DEFAULT_PG_PORT
        } else {
            self.port.trim().parse::<u16>().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid DB_PORT '{}': {}", self.port, e))
            })?
        };

        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(port)
            .username(&self.user)
            .password(self.password.expose_secret())
            .ssl_mode(PgSslMode::Require)
            .options([("TimeZone", DB_TIME_ZONE)]);

        if !self.name.is_empty() {
            options = options.database(&self.name);
        }

        Ok(options)
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
