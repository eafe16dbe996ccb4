//! # Database Pool Management
//!
//! Opening the SQLite file that holds the drawer sessions.
//!
//! ## Writers and Readers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     One drawer, several terminals                       │
//! │                                                                         │
//! │  terminal A ── record_cash_sale ──┐                                     │
//! │  terminal B ── give_change ───────┼──► SqlitePool (max_connections)     │
//! │  back office ─ list_movements ────┘          │                          │
//! │                                              ▼                          │
//! │                              caja.db  (WAL, foreign keys on)            │
//! │                                                                         │
//! │  • readers never wait on a writer (WAL)                                 │
//! │  • a second writer waits up to busy_timeout for the file lock           │
//! │  • two writes from the same snapshot: the later one fails the           │
//! │    sync_version check and surfaces ConcurrentModification               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::session::CashSessionRepository;

const MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where the drawer database lives and how many connections to keep.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/caja/caja.db")
///     .max_connections(4)
///     .busy_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file; `:memory:` for a throwaway database.
    pub database_path: PathBuf,

    /// Pool ceiling. Default 5: a handful of terminals per store.
    pub max_connections: u32,

    pub min_connections: u32,

    /// How long to wait for a pooled connection.
    pub acquire_timeout: Duration,

    /// How long a writer waits on another writer's lock before failing.
    pub busy_timeout: Duration,

    /// Apply pending migrations when connecting.
    pub run_migrations: bool,
}

impl DbConfig {
    /// Configuration for a database file, created on first connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Private in-memory database for tests.
    ///
    /// Pinned to one connection that never idles out: every connection to
    /// `:memory:` is its own empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(MEMORY_PATH),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(1),
            run_migrations: true,
        }
    }

    /// Reads `CAJA_DB_PATH` and `CAJA_DB_MAX_CONNECTIONS`, falling back to
    /// `default_path` and the defaults of [`DbConfig::new`].
    pub fn from_env(default_path: impl Into<PathBuf>) -> Self {
        Self::from_lookup(default_path, |key| std::env::var(key).ok())
    }

    fn from_lookup(
        default_path: impl Into<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let path = lookup("CAJA_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_path.into());
        let mut config = DbConfig::new(path);

        if let Some(max) = lookup("CAJA_DB_MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
            config.max_connections = max;
        }

        config
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let url = if self.is_in_memory() {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite://{}?mode=rwc", self.database_path.display())
        };

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Movements reference their session
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout)
            .create_if_missing(true);

        Ok(options)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the drawer database. Clones share one pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./caja.db")).await?;
/// let session = db.sessions().get_open_for_register("caja-1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects to the database and, unless disabled, migrates it.
    ///
    /// ## Errors
    /// - `ConnectionFailed` for a bad path or an unreachable file
    /// - `MigrationFailed` if the schema cannot be brought up to date
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening drawer database");

        let options = config.connect_options()?;
        debug!(busy_timeout_ms = config.busy_timeout.as_millis() as u64, "Connect options ready");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout);
        if config.is_in_memory() {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(max_connections = config.max_connections, "Database pool ready");

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Safe to call repeatedly.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Raw pool, for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cash session repository for the default tenant.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let outcome = db.sessions().give_change(&session_id, amount).await?;
    /// ```
    pub fn sessions(&self) -> CashSessionRepository {
        CashSessionRepository::new(self.pool.clone())
    }

    /// Closes every pooled connection; later queries fail.
    pub async fn close(&self) {
        info!("Closing drawer database");
        self.pool.close().await;
    }

    /// True if the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/caja-test.db")
            .max_connections(10)
            .min_connections(2)
            .busy_timeout(Duration::from_millis(250));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }

    #[test]
    fn test_config_from_lookup() {
        let config = DbConfig::from_lookup("./caja.db", |key| match key {
            "CAJA_DB_PATH" => Some("/var/lib/caja/sucursal2.db".to_string()),
            "CAJA_DB_MAX_CONNECTIONS" => Some("8".to_string()),
            _ => None,
        });
        assert_eq!(config.database_path, PathBuf::from("/var/lib/caja/sucursal2.db"));
        assert_eq!(config.max_connections, 8);

        let fallback = DbConfig::from_lookup("./caja.db", |_| None);
        assert_eq!(fallback.database_path, PathBuf::from("./caja.db"));
        assert_eq!(fallback.max_connections, 5);
    }

    #[tokio::test]
    async fn test_migrations_create_session_tables() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'cash_%' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        assert_eq!(tables, vec!["cash_movements", "cash_sessions"]);
    }

    #[tokio::test]
    async fn test_file_database_persists_sessions() {
        let path = std::env::temp_dir().join(format!("caja-{}.db", uuid::Uuid::new_v4()));
        let float = caja_core::CashBreakdown::empty().with(caja_core::Denomination::Peso10, 3);

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let session = db.sessions().open_session("caja-1", &float).await.unwrap();
        db.close().await;

        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        let stored = reopened.sessions().get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.current_breakdown, float);
        reopened.close().await;

        let _ = std::fs::remove_file(&path);
    }
}
