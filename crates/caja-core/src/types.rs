//! # Domain Types
//!
//! Register sessions and the audit trail of drawer movements.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────┐          ┌──────────────────────┐            │
//! │  │    CashSession       │ 1      * │    CashMovement      │            │
//! │  │  ──────────────────  │──────────│  ──────────────────  │            │
//! │  │  id (UUID)           │          │  id (UUID)           │            │
//! │  │  register_id         │          │  session_id (FK)     │            │
//! │  │  status              │          │  kind                │            │
//! │  │  opening_breakdown   │          │  amount              │            │
//! │  │  current_breakdown   │          │  breakdown           │            │
//! │  │  closing_breakdown?  │          │  summary             │            │
//! │  │  variance?           │          └──────────────────────┘            │
//! │  └──────────────────────┘                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A session is the period between opening a drawer with a float and
//! closing it with a count. At most one session per register is open.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::breakdown::CashBreakdown;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Session Status
// =============================================================================

/// Lifecycle state of a cash session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Drawer is in use; sales may give change.
    #[default]
    Open,
    /// Drawer has been counted and closed.
    Closed,
}

// =============================================================================
// Cash Session
// =============================================================================

/// A register's drawer between opening and close-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashSession {
    pub id: String,
    pub tenant_id: String,
    pub register_id: String,
    pub status: SessionStatus,

    /// Float the drawer started with.
    #[ts(as = "crate::breakdown::BreakdownDto")]
    pub opening_breakdown: CashBreakdown,

    /// What the drawer should hold right now.
    #[ts(as = "crate::breakdown::BreakdownDto")]
    pub current_breakdown: CashBreakdown,

    /// What the cashier counted at close.
    #[ts(as = "Option<crate::breakdown::BreakdownDto>")]
    pub closing_breakdown: Option<CashBreakdown>,

    /// counted − expected at close.
    pub variance: Option<Money>,

    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Bumped on every write; used for optimistic concurrency.
    pub sync_version: i64,
}

impl CashSession {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// Fails with [`CoreError::SessionClosed`] unless the session is open.
    pub fn ensure_open(&self) -> CoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(CoreError::SessionClosed {
                session_id: self.id.clone(),
            })
        }
    }
}

// =============================================================================
// Cash Movement
// =============================================================================

/// What changed the drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Opening float counted into the drawer.
    Opening,
    /// Customer cash deposited into the drawer.
    Deposit,
    /// Change handed back to a customer.
    Change,
    /// Change owed but not given (shortfall recorded for manual handling).
    Shortfall,
    /// Close-out count.
    Closing,
}

/// One audited drawer mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashMovement {
    pub id: String,
    pub session_id: String,
    pub kind: MovementKind,
    pub amount: Money,
    /// Units involved; empty for a shortfall.
    #[ts(as = "crate::breakdown::BreakdownDto")]
    pub breakdown: CashBreakdown,
    /// Receipt-style text, e.g. "1x$20, 1x$0.50".
    pub summary: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
