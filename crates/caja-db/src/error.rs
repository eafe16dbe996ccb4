//! # Database Error Types
//!
//! Everything a drawer operation can fail with once storage is involved.
//!
//! ## Error Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error ───────────► NotFound / UniqueViolation / ForeignKey /     │
//! │                           QueryFailed / PoolExhausted / Internal        │
//! │  SQLITE_BUSY / LOCKED ──► Busy             (retryable)                  │
//! │  MigrateError ──────────► MigrationFailed                               │
//! │  serde_json::Error ─────► CorruptData      (breakdown JSON columns)     │
//! │  CoreError ─────────────► Core             (domain rule, unchanged)     │
//! │  sync_version mismatch ─► ConcurrentModification                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use caja_core::CoreError;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write, e.g. a second open session on
    /// one register.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database file missing, unreadable or the pool is closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQL rejected at runtime, including CHECK constraints on status and
    /// movement kind.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Another writer updated the session between our read and write.
    ///
    /// Nothing was written; the caller may reload and retry.
    #[error("Session {session_id} was modified concurrently")]
    ConcurrentModification { session_id: String },

    /// Another connection held the write lock past `busy_timeout`.
    #[error("Database busy: {0}")]
    Busy(String),

    /// Stored breakdown JSON no longer decodes.
    #[error("Corrupt stored data: {0}")]
    CorruptData(String),

    /// A domain rule rejected the operation (closed session, overdraw,
    /// blocked shortfall, invalid input).
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True when retrying against fresh state may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DbError::ConcurrentModification { .. } | DbError::Busy(_) | DbError::PoolExhausted
        )
    }
}

/// Maps sqlx errors by constraint kind rather than message text where the
/// driver reports one.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();
                if db_err.code().is_some_and(|code| is_busy_code(&code)) {
                    return DbError::Busy(msg);
                }
                match db_err.kind() {
                    ErrorKind::UniqueViolation => {
                        // "UNIQUE constraint failed: cash_sessions.tenant_id, ..."
                        let field = msg
                            .split(": ")
                            .nth(1)
                            .unwrap_or("unknown")
                            .to_string();
                        DbError::UniqueViolation {
                            field,
                            value: "unknown".to_string(),
                        }
                    }
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message: msg },
                    _ => DbError::QueryFailed(msg),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            other => DbError::Internal(other.to_string()),
        }
    }
}

/// SQLITE_BUSY, SQLITE_LOCKED and their extended codes (BUSY_RECOVERY,
/// BUSY_SNAPSHOT, BUSY_TIMEOUT, LOCKED_SHAREDCACHE).
fn is_busy_code(code: &str) -> bool {
    matches!(code, "5" | "261" | "517" | "773" | "6" | "262")
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::CorruptData(err.to_string())
    }
}

impl From<caja_core::ValidationError> for DbError {
    fn from(err: caja_core::ValidationError) -> Self {
        DbError::Core(CoreError::Validation(err))
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
