//! Configuration management for umanager.
//!
//! Loads configuration from environment variables (and a `.env` file when
//! present) once per process.

use std::env;
use std::sync::OnceLock;
use std::time::Duration;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Initialize configuration (call once at startup)
pub fn init() -> &'static Config {
    config()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub service: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`.
    pub path: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Deadline applied to every service gateway call.
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_SERVICE_TIMEOUT_MS),
        }
    }
}

const DEFAULT_SERVICE_TIMEOUT_MS: u64 = 5000;

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_or("PORT", "8080").parse().expect("Invalid PORT"),
            },
            database: DatabaseConfig {
                path: env_or("DATABASE_PATH", "./data/umanager.db"),
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", "10")
                    .parse()
                    .unwrap_or(10),
            },
            service: ServiceConfig {
                timeout: parse_timeout_ms(env::var("SERVICE_TIMEOUT_MS").ok().as_deref()),
            },
        }
    }
}

/// A missing, unparsable or zero value falls back to the default deadline.
fn parse_timeout_ms(raw: Option<&str>) -> Duration {
    let millis = raw
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(DEFAULT_SERVICE_TIMEOUT_MS);
    Duration::from_millis(millis)
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
