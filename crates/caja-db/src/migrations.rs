//! # Database Migrations
//!
//! SQL files under `migrations/sqlite/` compiled into the binary.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_cash_sessions.sql   cash_sessions, cash_movements, open-register index
//! ```
//!
//! Applied migrations are tracked in `_sqlx_migrations`. Add a new numbered
//! file for every schema change; never edit one that has shipped, its
//! checksum is recorded on every register that ran it.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies pending migrations in filename order. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts, for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.migrations.len();

    let tracked: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;

    // No tracking table before the first run
    if !tracked {
        return Ok((embedded, 0));
    }

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((embedded, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        assert_eq!(migration_status(&pool).await.unwrap().1, 0);

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let (embedded, applied) = migration_status(&pool).await.unwrap();
        assert_eq!(embedded, applied);
        assert_eq!(embedded, 1);
    }

    #[tokio::test]
    async fn test_status_reports_connection_errors() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        pool.close().await;

        let err = migration_status(&pool).await.unwrap_err();
        assert!(matches!(err, crate::DbError::ConnectionFailed(_)));
    }

    #[tokio::test]
    async fn test_one_open_session_per_register_index() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();

        let insert = |id: &'static str, status: &'static str| {
            sqlx::query::<sqlx::Sqlite>(
                r#"
                INSERT INTO cash_sessions (
                    id, tenant_id, register_id, status, opening_breakdown,
                    current_breakdown, current_total_cents, opened_at, updated_at
                ) VALUES (?1, 't', 'caja-1', ?2, '{}', '{}', 0, 'now', 'now')
                "#,
            )
            .bind(id)
            .bind(status)
        };

        insert("a", "closed").execute(&pool).await.unwrap();
        insert("b", "open").execute(&pool).await.unwrap();
        let err: crate::DbError = insert("c", "open").execute(&pool).await.unwrap_err().into();

        assert!(matches!(err, crate::DbError::UniqueViolation { .. }));
    }
}
