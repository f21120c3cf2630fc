use anyhow::{Context, Result, bail};
use dotenvy::dotenv;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use strum_macros::{AsRefStr, Display as StrumDisplay, EnumString};

/// Which persistence sits behind the attendance store. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr, StrumDisplay)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StorageBackend {
    Memory,
    Mysql,
    Sqlite,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    // Rate limiting, 0 disables
    pub rate_api_per_min: u32,

    pub api_prefix: String,
    pub app_env: String,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "0.0.0.0:5000".to_string(),
            storage_backend: StorageBackend::Memory,
            database_url: None,
            database_max_connections: 5,
            rate_api_per_min: 1000,
            api_prefix: "/api".to_string(),
            app_env: "development".to_string(),
            log_dir: "logs".to_string(),
            log_level: tracing::Level::INFO,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or(defaults.server_addr),
            storage_backend: parse_var("STORAGE_BACKEND", defaults.storage_backend)?,
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty()),
            database_max_connections: parse_var(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            rate_api_per_min: parse_var("RATE_API_PER_MIN", defaults.rate_api_per_min)?,
            api_prefix: env::var("API_PREFIX").unwrap_or(defaults.api_prefix),
            app_env: env::var("APP_ENV").unwrap_or(defaults.app_env),
            log_dir: env::var("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: parse_var("LOG_LEVEL", defaults.log_level)?,
        };

        if config.storage_backend != StorageBackend::Memory && config.database_url.is_none() {
            bail!(
                "DATABASE_URL must be set when STORAGE_BACKEND is {}",
                config.storage_backend
            );
        }

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    /// Storage error text is only attached to responses outside production.
    pub fn expose_error_details(&self) -> bool {
        !self.is_production()
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| anyhow::anyhow!("{e}"))
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
