// Migration Runner

use crate::connection::SqlBackend;
use conveyor_core::error::{AppError, Result};
use sqlx::AnyPool;
use tracing::info;

struct Migration {
    version: i64,
    description: &'static str,
    sqlite: &'static str,
    mysql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Queue, throttle, routing and revision tables",
    sqlite: include_str!("../migrations/sqlite/001_config_schema.sql"),
    mysql: include_str!("../migrations/mysql/001_config_schema.sql"),
}];

/// Run database migrations
///
/// Failures are configuration failures: the process must not start on a
/// store whose schema it cannot trust.
pub async fn run_migrations(pool: &AnyPool, backend: SqlBackend) -> Result<()> {
    info!(backend = %backend, "Running database migrations...");

    sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version BIGINT NOT NULL PRIMARY KEY)")
        .execute(pool)
        .await
        .map_err(migration_error)?;

    let current_version: i64 = sqlx::query_scalar::<_, Option<i64>>(
        "SELECT MAX(version) FROM schema_version",
    )
    .fetch_one(pool)
    .await
    .map_err(migration_error)?
    .unwrap_or(0);

    info!("Current schema version: {}", current_version);

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!(
            "Applying migration {:03}: {}",
            migration.version, migration.description
        );
        let sql = match backend {
            SqlBackend::Sqlite => migration.sqlite,
            SqlBackend::MySql => migration.mysql,
        };
        apply_migration(pool, migration.version, sql).await?;
    }

    info!("All migrations applied successfully");
    Ok(())
}

/// Apply a single migration SQL file
async fn apply_migration(pool: &AnyPool, version: i64, sql: &str) -> Result<()> {
    // MySQL commits DDL implicitly; the transaction still guards the version row
    let mut tx = pool.begin().await.map_err(migration_error)?;

    // Split by semicolon and execute each statement
    for statement in sql.split(';') {
        // Remove comments and trim
        let clean_statement: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        if !clean_statement.is_empty() {
            sqlx::query(&clean_statement)
                .execute(&mut *tx)
                .await
                .map_err(migration_error)?;
        }
    }

    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(&mut *tx)
        .await
        .map_err(migration_error)?;

    tx.commit().await.map_err(migration_error)?;
    Ok(())
}

fn migration_error(err: sqlx::Error) -> AppError {
    AppError::Config(format!("Migration failed: {}", err))
}
