// Repository configuration (driver selector + data source names)

use ::config::{Config, ConfigError, Environment};
use conveyor_core::application::DEFAULT_WATCH_INTERVAL;
use conveyor_core::error::{AppError, Result};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable prefix (`CONVEYOR_DRIVER`, `CONVEYOR_SQLITE3_DSN`, ...)
pub const ENV_PREFIX: &str = "CONVEYOR";

/// SQLite database used when no DSN is configured
pub const DEFAULT_SQLITE_DSN: &str = "~/.conveyor/config.db";

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Storage driver behind both repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Sqlite,
    MySql,
    InMemory,
}

impl Driver {
    pub const fn name(&self) -> &'static str {
        match self {
            Driver::Sqlite => "sqlite3",
            Driver::MySql => "mysql",
            Driver::InMemory => "in-memory",
        }
    }
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Driver {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "sqlite3" => Ok(Driver::Sqlite),
            "mysql" => Ok(Driver::MySql),
            "in-memory" => Ok(Driver::InMemory),
            other => Err(AppError::Config(format!("Unknown driver: {}", other))),
        }
    }
}

/// Which driver to use and where its data lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub driver: Driver,
    /// Data source name; `None` only for the in-memory driver
    pub dsn: Option<String>,
    pub max_connections: u32,
}

impl RepositoryConfig {
    pub fn in_memory() -> Self {
        Self {
            driver: Driver::InMemory,
            dsn: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    pub fn sqlite(dsn: impl Into<String>) -> Self {
        Self {
            driver: Driver::Sqlite,
            dsn: Some(dsn.into()),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    pub fn mysql(dsn: impl Into<String>) -> Self {
        Self {
            driver: Driver::MySql,
            dsn: Some(dsn.into()),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Load from `CONVEYOR_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(&env_config()?)
    }

    /// Resolve driver and DSN from loaded configuration
    ///
    /// Keys: `driver`, `repository_<driver>_dsn` with fallback to
    /// `<driver>_dsn`, and `repository_max_connections`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let driver = match lookup(config, "driver")? {
            Some(name) => name.parse()?,
            None => Driver::Sqlite,
        };

        let dsn = match driver {
            Driver::Sqlite => Some(
                dsn_for(config, "sqlite3")?
                    .unwrap_or_else(|| shellexpand::tilde(DEFAULT_SQLITE_DSN).into_owned()),
            ),
            Driver::MySql => Some(dsn_for(config, "mysql")?.ok_or_else(|| {
                AppError::Config(
                    "mysql driver needs repository_mysql_dsn or mysql_dsn".to_string(),
                )
            })?),
            Driver::InMemory => None,
        };

        let max_connections = match config.get_int("repository_max_connections") {
            Ok(n) => u32::try_from(n)
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    AppError::Config(format!("repository_max_connections out of range: {}", n))
                })?,
            Err(ConfigError::NotFound(_)) => DEFAULT_MAX_CONNECTIONS,
            Err(e) => return Err(AppError::Config(format!("repository_max_connections: {}", e))),
        };

        Ok(Self {
            driver,
            dsn,
            max_connections,
        })
    }
}

/// Collect `CONVEYOR_*` environment variables into one `Config`
pub fn env_config() -> Result<Config> {
    Config::builder()
        .add_source(Environment::with_prefix(ENV_PREFIX))
        .build()
        .map_err(|e| AppError::Config(e.to_string()))
}

/// Revision poll interval from `watch_interval_ms` (at least 1ms)
pub fn watch_interval(config: &Config) -> Result<Duration> {
    match config.get_int("watch_interval_ms") {
        Ok(ms) => u64::try_from(ms)
            .map(|ms| Duration::from_millis(ms.max(1)))
            .map_err(|_| AppError::Config(format!("watch_interval_ms out of range: {}", ms))),
        Err(ConfigError::NotFound(_)) => Ok(DEFAULT_WATCH_INTERVAL),
        Err(e) => Err(AppError::Config(format!("watch_interval_ms: {}", e))),
    }
}

/// Driver-specific key first, then the generic one
fn dsn_for(config: &Config, driver: &str) -> Result<Option<String>> {
    if let Some(dsn) = lookup(config, &format!("repository_{}_dsn", driver))? {
        return Ok(Some(dsn));
    }
    lookup(config, &format!("{}_dsn", driver))
}

/// Unset and blank values both count as absent
fn lookup(config: &Config, key: &str) -> Result<Option<String>> {
    match config.get_string(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(AppError::Config(format!("{}: {}", key, e))),
    }
}
