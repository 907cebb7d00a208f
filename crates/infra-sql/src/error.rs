// sqlx::Error -> AppError mapping

use conveyor_core::error::AppError;

/// Convert sqlx::Error to AppError with structured information
///
/// Codes come from the underlying driver: SQLite extended result codes
/// (https://www.sqlite.org/rescode.html) or MySQL server error numbers.
pub fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                match code_str {
                    // SQLite UNIQUE / PRIMARY KEY, MySQL ER_DUP_ENTRY
                    "2067" | "1555" | "1062" => AppError::Database(format!(
                        "Unique constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    // SQLite FOREIGN KEY, MySQL ER_NO_REFERENCED_ROW_2
                    "787" | "3850" | "1452" => AppError::Database(format!(
                        "Foreign key constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    // SQLITE_BUSY / BUSY_SNAPSHOT, MySQL lock wait timeout / deadlock
                    "5" | "517" | "1205" | "1213" => AppError::Database(format!(
                        "Database locked: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    // SQLITE_FULL
                    "13" => AppError::Database(format!("Database full: {}", db_err.message())),
                    _ => AppError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("Column not found: {}", col))
        }
        sqlx::Error::PoolTimedOut => {
            AppError::Database("Timed out acquiring a pooled connection".to_string())
        }
        // Connection, pool, protocol errors
        _ => AppError::Database(err.to_string()),
    }
}
