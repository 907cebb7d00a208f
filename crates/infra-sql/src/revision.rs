// Config revision counter (one row per config domain)

use crate::connection::SqlBackend;
use crate::error::map_sqlx_error;
use conveyor_core::domain::{ConfigDomain, DomainError, Revision};
use conveyor_core::error::Result;
use sqlx::{AnyConnection, AnyPool};

/// Current revision; a domain never mutated reads as 0
pub(crate) async fn current(pool: &AnyPool, domain: ConfigDomain) -> Result<Revision> {
    let revision: Option<i64> =
        sqlx::query_scalar("SELECT revision FROM config_revision WHERE name = ?")
            .bind(domain.as_str())
            .fetch_optional(pool)
            .await
            .map_err(map_sqlx_error)?;

    revision.map_or(Ok(0), to_revision)
}

/// Increment the domain's revision by one, creating the row on first use
///
/// A single upsert, so writers in other processes racing on the first bump
/// cannot collide on the primary key. Runs on the caller's transaction so
/// the bump commits with the write.
pub(crate) async fn bump(
    conn: &mut AnyConnection,
    backend: SqlBackend,
    domain: ConfigDomain,
) -> Result<Revision> {
    sqlx::query(bump_statement(backend))
        .bind(domain.as_str())
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    let revision: i64 = sqlx::query_scalar("SELECT revision FROM config_revision WHERE name = ?")
        .bind(domain.as_str())
        .fetch_one(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    to_revision(revision)
}

fn bump_statement(backend: SqlBackend) -> &'static str {
    match backend {
        SqlBackend::Sqlite => {
            "INSERT INTO config_revision (name, revision) VALUES (?, 1) \
             ON CONFLICT(name) DO UPDATE SET revision = revision + 1"
        }
        SqlBackend::MySql => {
            "INSERT INTO config_revision (name, revision) VALUES (?, 1) \
             ON DUPLICATE KEY UPDATE revision = revision + 1"
        }
    }
}

fn to_revision(value: i64) -> Result<Revision> {
    Revision::try_from(value).map_err(|_| {
        DomainError::OutOfRange(format!("negative config revision {}", value)).into()
    })
}
