//! # caja-db: Database Layer for Caja
//!
//! Persists register cash sessions, their drawer state and the movement log
//! in SQLite via sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Caja Data Flow                                 │
//! │                                                                         │
//! │  Checkout (cash sale) / drawer bin                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     caja-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────────┐  ┌─────────────┐  │   │
//! │  │   │   Database    │    │    Repository     │  │ Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│   (session.rs)    │  │ (embedded)  │  │   │
//! │  │   └───────────────┘    └─────────┬─────────┘  └─────────────┘  │   │
//! │  │                                  │ pure arithmetic              │   │
//! │  │                                  ▼                              │   │
//! │  │                             caja-core                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite: cash_sessions, cash_movements                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Cash session repository
//!
//! ## Usage
//!
//! ```rust,ignore
//! use caja_core::{CashBreakdown, Denomination, Money};
//! use caja_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/caja.db")).await?;
//!
//! let float = CashBreakdown::empty().with(Denomination::Peso10, 20);
//! let session = db.sessions().open_session("caja-1", &float).await?;
//!
//! let outcome = db.sessions().give_change(&session.id, Money::from_pesos(30)).await?;
//! println!("{}", outcome.summary); // "3x$10"
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::session::{CashSessionRepository, ChangeOutcome, CloseOutcome, SaleOutcome};
