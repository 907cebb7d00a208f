// SQL Connection Pool Setup

use conveyor_core::error::{AppError, Result};
use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::AnyPool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Concrete SQL backend behind the shared Any pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlBackend {
    Sqlite,
    MySql,
}

impl SqlBackend {
    pub const fn name(&self) -> &'static str {
        match self {
            SqlBackend::Sqlite => "sqlite3",
            SqlBackend::MySql => "mysql",
        }
    }

    /// Clause turning an `INSERT` into an upsert on primary key `key`
    ///
    /// On conflict, `columns` take the values of the attempted insert.
    pub(crate) fn upsert_clause(&self, key: &str, columns: &[&str]) -> String {
        match self {
            SqlBackend::Sqlite => {
                let sets: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{0} = excluded.{0}", c))
                    .collect();
                format!("ON CONFLICT({}) DO UPDATE SET {}", key, sets.join(", "))
            }
            SqlBackend::MySql => {
                let sets: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{0} = VALUES({0})", c))
                    .collect();
                format!("ON DUPLICATE KEY UPDATE {}", sets.join(", "))
            }
        }
    }
}

impl std::fmt::Display for SqlBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Create a connection pool for `backend`
///
/// SQLite accepts a bare path, `:memory:` or a `sqlite:` URL. An in-memory
/// database lives only as long as its connection, so it gets exactly one
/// connection that is never recycled.
pub async fn create_pool(backend: SqlBackend, dsn: &str, max_connections: u32) -> Result<AnyPool> {
    install_default_drivers();

    let url = connection_url(backend, dsn)?;
    let in_memory = backend == SqlBackend::Sqlite && is_sqlite_memory(&url);

    if backend == SqlBackend::Sqlite && !in_memory {
        ensure_sqlite_parent_dir(&url)?;
    }

    let mut options = AnyPoolOptions::new().acquire_timeout(Duration::from_secs(30));
    options = if in_memory {
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        options.max_connections(max_connections.max(1))
    };

    if backend == SqlBackend::Sqlite && !in_memory {
        options = options.after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA journal_mode = WAL")
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        });
    }

    let pool = options.connect(&url).await.map_err(|e| {
        AppError::Config(format!("Cannot open {} data source: {}", backend, e))
    })?;

    info!(backend = %backend, in_memory, "Connection pool created");
    Ok(pool)
}

fn connection_url(backend: SqlBackend, dsn: &str) -> Result<String> {
    let dsn = dsn.trim();
    if dsn.is_empty() {
        return Err(AppError::Config(format!("Empty {} data source name", backend)));
    }

    match backend {
        SqlBackend::Sqlite => Ok(sqlite_url(dsn)),
        SqlBackend::MySql if dsn.starts_with("mysql://") => Ok(dsn.to_string()),
        SqlBackend::MySql => Err(AppError::Config(format!(
            "MySQL data source must be a mysql:// URL, got {}",
            dsn
        ))),
    }
}

fn sqlite_url(dsn: &str) -> String {
    if dsn.starts_with("sqlite:") {
        return dsn.to_string();
    }
    if dsn == ":memory:" {
        return "sqlite::memory:".to_string();
    }
    // mode=rwc creates the file when missing
    let sep = if dsn.contains('?') { '&' } else { '?' };
    format!("sqlite://{}{}mode=rwc", dsn, sep)
}

fn is_sqlite_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn sqlite_path(url: &str) -> &str {
    let rest = url.trim_start_matches("sqlite:").trim_start_matches("//");
    rest.split('?').next().unwrap_or(rest)
}

fn ensure_sqlite_parent_dir(url: &str) -> Result<()> {
    let path = Path::new(sqlite_path(url));
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Config(format!(
                    "Cannot create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}
