//! Database connection setup and the bounded retry wrapper used at the
//! reservation engine's transaction boundary. Grounded in the teacher's
//! `db.rs` (`RetryConfig`, `with_retry`, `is_retryable_error`), trimmed from
//! unbounded exponential backoff with metrics counters down to the single
//! retry the spec calls for, with `tracing` in place of the `metrics` crate.

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::AppError;

/// Establishes the sea-orm connection pool from the resolved configuration.
pub async fn connect(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(config.db_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .sqlx_logging(!config.is_production());

    info!("connecting to database");
    Database::connect(options).await
}

/// Transient errors worth a single retry: connection churn, pool exhaustion,
/// and the serialization failures/deadlocks Postgres raises under
/// concurrent `SELECT ... FOR UPDATE` contention.
fn is_retryable(err: &DbErr) -> bool {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => true,
        DbErr::Query(inner) => {
            let msg = inner.to_string().to_lowercase();
            msg.contains("deadlock")
                || msg.contains("serialization failure")
                || msg.contains("connection")
                || msg.contains("timeout")
        }
        _ => false,
    }
}

/// Runs `operation` once, and if it rolls back with a transient database
/// error, runs it exactly one more time. Per spec §7: "DB transaction errors
/// roll back and are retried at most once at the engine boundary for
/// transient serialization failures." Non-database failures (validation,
/// not-found, conflict, insufficient ingredients) are never retried — they
/// are deterministic outcomes of the operation's own logic, not transient
/// infrastructure hiccups.
pub async fn with_retry<F, Fut, T>(operation_name: &str, mut operation: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
{
    match operation().await {
        Ok(value) => Ok(value),
        Err(AppError::Database(err)) if is_retryable(&err) => {
            warn!(operation = operation_name, error = %err, "retrying transient database error once");
            operation().await
        }
        Err(err) => Err(err),
    }
}
