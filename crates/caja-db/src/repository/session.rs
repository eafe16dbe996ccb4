//! # Cash Session Repository
//!
//! Database operations for register cash sessions and their movement log.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Session Lifecycle                                 │
//! │                                                                         │
//! │  1. OPEN                                                               │
//! │     └── open_session() → CashSession { status: Open }                  │
//! │         + movement: opening (float)                                    │
//! │                                                                         │
//! │  2. TRADE (any number of times)                                        │
//! │     ├── record_cash_sale()   → deposit + change movements              │
//! │     ├── give_change()        → change movement                         │
//! │     └── give_manual_change() → change movement (hand-entered units)    │
//! │                                                                         │
//! │  3. CLOSE                                                              │
//! │     └── close_session() → CashSession { status: Closed, variance }     │
//! │         + movement: closing (count)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Read-Modify-Persist
//! Every drawer mutation runs in one transaction:
//! ```text
//! BEGIN IMMEDIATE                        ← takes the write lock up front
//!   SELECT session                       ← snapshot + sync_version N
//!   caja-core arithmetic (pure)
//!   UPDATE ... WHERE sync_version = N    ← 0 rows? ConcurrentModification
//!   INSERT movement(s)
//! COMMIT
//! ```
//! A second writer waits on `busy_timeout` at `BEGIN IMMEDIATE` and then
//! reads the committed drawer. If the wait runs out it gets `DbError::Busy`,
//! which is retryable. A deferred `BEGIN` would let both writers read the
//! same snapshot and fail the loser's lock upgrade instead.
//!
//! A failed change calculation writes nothing.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use caja_core::validation::{validate_register_id, validate_uuid};
use caja_core::{
    calculate_optimal_change, debit_register, format_change_breakdown, reconcile,
    settle_cash_sale, subtract_change_from_register, CashBreakdown, CashMovement, CashSession,
    CashSettlement, ChangeResult, CoreError, Money, MovementKind, Reconciliation, SessionStatus,
    ShortfallPolicy, DEFAULT_TENANT_ID,
};

use crate::error::{DbError, DbResult};

// =============================================================================
// Outcomes
// =============================================================================

/// Result of [`CashSessionRepository::give_change`].
#[derive(Debug, Clone)]
pub struct ChangeOutcome {
    /// Session as stored after the operation (unchanged on failure).
    pub session: CashSession,
    pub result: ChangeResult,
    /// Receipt text for the change handed over.
    pub summary: String,
}

/// Result of [`CashSessionRepository::record_cash_sale`].
#[derive(Debug, Clone)]
pub struct SaleOutcome {
    pub session: CashSession,
    pub settlement: CashSettlement,
    pub summary: String,
}

/// Result of [`CashSessionRepository::close_session`].
#[derive(Debug, Clone)]
pub struct CloseOutcome {
    pub session: CashSession,
    pub reconciliation: Reconciliation,
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: String,
    tenant_id: String,
    register_id: String,
    status: SessionStatus,
    opening_breakdown: String,
    current_breakdown: String,
    closing_breakdown: Option<String>,
    variance_cents: Option<i64>,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
    sync_version: i64,
}

impl TryFrom<SessionRow> for CashSession {
    type Error = DbError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let closing_breakdown = row
            .closing_breakdown
            .as_deref()
            .map(serde_json::from_str::<CashBreakdown>)
            .transpose()?;

        Ok(CashSession {
            id: row.id,
            tenant_id: row.tenant_id,
            register_id: row.register_id,
            status: row.status,
            opening_breakdown: serde_json::from_str(&row.opening_breakdown)?,
            current_breakdown: serde_json::from_str(&row.current_breakdown)?,
            closing_breakdown,
            variance: row.variance_cents.map(Money::from_cents),
            opened_at: row.opened_at,
            closed_at: row.closed_at,
            updated_at: row.updated_at,
            sync_version: row.sync_version,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id: String,
    session_id: String,
    kind: MovementKind,
    amount_cents: i64,
    breakdown: String,
    summary: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for CashMovement {
    type Error = DbError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        Ok(CashMovement {
            id: row.id,
            session_id: row.session_id,
            kind: row.kind,
            amount: Money::from_cents(row.amount_cents),
            breakdown: serde_json::from_str(&row.breakdown)?,
            summary: row.summary,
            created_at: row.created_at,
        })
    }
}

const SESSION_COLUMNS: &str = r#"
    id, tenant_id, register_id, status,
    opening_breakdown, current_breakdown, closing_breakdown,
    variance_cents, opened_at, closed_at, updated_at, sync_version
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for cash session database operations.
#[derive(Debug, Clone)]
pub struct CashSessionRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl CashSessionRepository {
    /// Creates a new CashSessionRepository for the default tenant.
    pub fn new(pool: SqlitePool) -> Self {
        CashSessionRepository {
            pool,
            tenant_id: DEFAULT_TENANT_ID.to_string(),
        }
    }

    /// Scopes the repository to another tenant.
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = tenant_id.into();
        self
    }

    /// Starts a transaction holding the database write lock, so concurrent
    /// drawer mutations run one after another.
    async fn begin_write(&self) -> DbResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Gets a session by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashSession>> {
        let sql = format!(
            "SELECT {} FROM cash_sessions WHERE id = ?1 AND tenant_id = ?2",
            SESSION_COLUMNS
        );
        let row: Option<SessionRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(&self.tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(CashSession::try_from).transpose()
    }

    /// Gets the open session of a register, if any.
    pub async fn get_open_for_register(&self, register_id: &str) -> DbResult<Option<CashSession>> {
        let sql = format!(
            "SELECT {} FROM cash_sessions WHERE tenant_id = ?1 AND register_id = ?2 AND status = ?3",
            SESSION_COLUMNS
        );
        let row: Option<SessionRow> = sqlx::query_as(&sql)
            .bind(&self.tenant_id)
            .bind(register_id)
            .bind(SessionStatus::Open)
            .fetch_optional(&self.pool)
            .await?;

        row.map(CashSession::try_from).transpose()
    }

    /// Lists a session's movements, oldest first.
    pub async fn list_movements(&self, session_id: &str) -> DbResult<Vec<CashMovement>> {
        let rows: Vec<MovementRow> = sqlx::query_as(
            r#"
            SELECT m.id, m.session_id, m.kind, m.amount_cents, m.breakdown, m.summary, m.created_at
            FROM cash_movements m
            JOIN cash_sessions s ON s.id = m.session_id
            WHERE m.session_id = ?1 AND s.tenant_id = ?2
            ORDER BY m.created_at ASC, m.rowid ASC
            "#,
        )
        .bind(session_id)
        .bind(&self.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CashMovement::try_from).collect()
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Opens a session on a register with an opening float.
    ///
    /// ## Errors
    /// - `UniqueViolation` if the register already has an open session
    /// - `Core(Validation)` for a malformed register ID
    pub async fn open_session(
        &self,
        register_id: &str,
        opening: &CashBreakdown,
    ) -> DbResult<CashSession> {
        validate_register_id(register_id)?;

        if self.get_open_for_register(register_id).await?.is_some() {
            return Err(DbError::duplicate("open session for register", register_id));
        }

        let now = Utc::now();
        let session = CashSession {
            id: Uuid::new_v4().to_string(),
            tenant_id: self.tenant_id.clone(),
            register_id: register_id.to_string(),
            status: SessionStatus::Open,
            opening_breakdown: opening.clone(),
            current_breakdown: opening.clone(),
            closing_breakdown: None,
            variance: None,
            opened_at: now,
            closed_at: None,
            updated_at: now,
            sync_version: 0,
        };

        let opening_json = serde_json::to_string(opening)?;

        let mut tx = self.begin_write().await?;

        sqlx::query(
            r#"
            INSERT INTO cash_sessions (
                id, tenant_id, register_id, status,
                opening_breakdown, current_breakdown, current_total_cents,
                closing_breakdown, variance_cents,
                opened_at, closed_at, updated_at, sync_version
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?5, ?6,
                NULL, NULL,
                ?7, NULL, ?7, 0
            )
            "#,
        )
        .bind(&session.id)
        .bind(&session.tenant_id)
        .bind(&session.register_id)
        .bind(session.status)
        .bind(&opening_json)
        .bind(opening.total_cash().cents())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        insert_movement(
            &mut tx,
            &session.id,
            MovementKind::Opening,
            opening.total_cash(),
            opening,
            format_change_breakdown(opening),
            now,
        )
        .await?;

        tx.commit().await?;

        info!(
            session_id = %session.id,
            register_id = %register_id,
            float = %opening.total_cash(),
            "Cash session opened"
        );

        Ok(session)
    }

    /// Gives `amount` of change from the session's drawer.
    ///
    /// On success the drawer is debited and a `change` movement recorded.
    /// When the drawer cannot make the amount, nothing is written and the
    /// outcome carries the failed [`ChangeResult`].
    pub async fn give_change(&self, session_id: &str, amount: Money) -> DbResult<ChangeOutcome> {
        let mut tx = self.begin_write().await?;
        let session = fetch_open_session(&mut tx, &self.tenant_id, session_id).await?;

        let result = calculate_optimal_change(amount, Some(&session.current_breakdown));

        let Some(given) = result.change_given.clone() else {
            if !result.success {
                warn!(
                    session_id = %session_id,
                    requested = %amount,
                    remaining = %result.remaining_amount,
                    "Change could not be made"
                );
            }
            let summary = format_change_breakdown(&CashBreakdown::empty());
            return Ok(ChangeOutcome {
                session,
                result,
                summary,
            });
        };

        let next = debit_register(&session.current_breakdown, &given)?;
        let now = Utc::now();
        let summary = format_change_breakdown(&given);

        persist_breakdown(&mut tx, &session, &next, now).await?;
        insert_movement(
            &mut tx,
            session_id,
            MovementKind::Change,
            given.total_cash(),
            &given,
            summary.clone(),
            now,
        )
        .await?;
        tx.commit().await?;

        debug!(session_id = %session_id, amount = %amount, change = %summary, "Change given");

        Ok(ChangeOutcome {
            session: advance(session, next, now),
            result,
            summary,
        })
    }

    /// Settles a cash sale: deposits the tendered units and gives change.
    ///
    /// ## Shortfall Handling
    /// - `Block`: returns `Core(InsufficientChange)`, nothing is written
    /// - `RecordShortfall`: keeps the deposit, gives no change and records
    ///   a `shortfall` movement for the unpaid change
    pub async fn record_cash_sale(
        &self,
        session_id: &str,
        amount_due: Money,
        tendered: &CashBreakdown,
        policy: ShortfallPolicy,
    ) -> DbResult<SaleOutcome> {
        let mut tx = self.begin_write().await?;
        let session = fetch_open_session(&mut tx, &self.tenant_id, session_id).await?;

        let settlement = settle_cash_sale(&session.current_breakdown, amount_due, tendered)?;

        if !settlement.is_complete() && policy == ShortfallPolicy::Block {
            warn!(
                session_id = %session_id,
                due = %amount_due,
                missing = %settlement.change.remaining_amount,
                "Cash sale blocked: change cannot be made"
            );
            return Err(CoreError::InsufficientChange {
                missing: settlement.change.remaining_amount,
            }
            .into());
        }

        let now = Utc::now();
        persist_breakdown(&mut tx, &session, &settlement.register, now).await?;

        insert_movement(
            &mut tx,
            session_id,
            MovementKind::Deposit,
            tendered.total_cash(),
            tendered,
            format_change_breakdown(tendered),
            now,
        )
        .await?;

        let summary = match &settlement.change.change_given {
            Some(given) => {
                let summary = format_change_breakdown(given);
                insert_movement(
                    &mut tx,
                    session_id,
                    MovementKind::Change,
                    given.total_cash(),
                    given,
                    summary.clone(),
                    now,
                )
                .await?;
                summary
            }
            None if settlement.is_complete() => format_change_breakdown(&CashBreakdown::empty()),
            None => {
                let summary = format!("Cambio pendiente {}", settlement.change_amount);
                insert_movement(
                    &mut tx,
                    session_id,
                    MovementKind::Shortfall,
                    settlement.change_amount,
                    &CashBreakdown::empty(),
                    summary.clone(),
                    now,
                )
                .await?;
                warn!(
                    session_id = %session_id,
                    owed = %settlement.change_amount,
                    "Shortfall recorded for manual settlement"
                );
                summary
            }
        };

        tx.commit().await?;

        debug!(
            session_id = %session_id,
            due = %amount_due,
            tendered = %tendered.total_cash(),
            change = %summary,
            "Cash sale recorded"
        );

        Ok(SaleOutcome {
            session: advance(session, settlement.register.clone(), now),
            settlement,
            summary,
        })
    }

    /// Debits change units entered by hand by the cashier.
    ///
    /// With `strict`, asking for more units than the drawer holds fails
    /// with `Core(Overdraw)`; otherwise the slot is floored at zero and the
    /// movement records only what was actually removed.
    pub async fn give_manual_change(
        &self,
        session_id: &str,
        change: &CashBreakdown,
        strict: bool,
    ) -> DbResult<CashSession> {
        let mut tx = self.begin_write().await?;
        let session = fetch_open_session(&mut tx, &self.tenant_id, session_id).await?;
        let current = &session.current_breakdown;

        let next = if strict {
            debit_register(current, change)?
        } else {
            subtract_change_from_register(Some(current), change)
                .unwrap_or_else(|| current.clone())
        };

        let removed = CashBreakdown::from_counts(
            current
                .iter()
                .map(|(d, held)| (d, held - next.count(d))),
        );
        if removed != *change {
            warn!(
                session_id = %session_id,
                requested = %change.total_cash(),
                removed = %removed.total_cash(),
                "Manual change exceeded drawer; floored at zero"
            );
        }

        let now = Utc::now();
        let summary = format_change_breakdown(&removed);

        persist_breakdown(&mut tx, &session, &next, now).await?;
        insert_movement(
            &mut tx,
            session_id,
            MovementKind::Change,
            removed.total_cash(),
            &removed,
            summary,
            now,
        )
        .await?;
        tx.commit().await?;

        Ok(advance(session, next, now))
    }

    /// Closes a session with the cashier's count and records the variance.
    pub async fn close_session(
        &self,
        session_id: &str,
        counted: &CashBreakdown,
    ) -> DbResult<CloseOutcome> {
        let mut tx = self.begin_write().await?;
        let session = fetch_open_session(&mut tx, &self.tenant_id, session_id).await?;

        let reconciliation = reconcile(&session.current_breakdown, counted);
        let now = Utc::now();
        let counted_json = serde_json::to_string(counted)?;

        let result = sqlx::query(
            r#"
            UPDATE cash_sessions
            SET status = ?1,
                closing_breakdown = ?2,
                variance_cents = ?3,
                closed_at = ?4,
                updated_at = ?4,
                sync_version = sync_version + 1
            WHERE id = ?5 AND sync_version = ?6
            "#,
        )
        .bind(SessionStatus::Closed)
        .bind(&counted_json)
        .bind(reconciliation.variance.cents())
        .bind(now)
        .bind(session_id)
        .bind(session.sync_version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::ConcurrentModification {
                session_id: session_id.to_string(),
            });
        }

        insert_movement(
            &mut tx,
            session_id,
            MovementKind::Closing,
            counted.total_cash(),
            counted,
            format!("Diferencia {}", reconciliation.variance),
            now,
        )
        .await?;
        tx.commit().await?;

        if reconciliation.variance.is_zero() {
            info!(session_id = %session_id, "Cash session closed balanced");
        } else {
            warn!(
                session_id = %session_id,
                variance = %reconciliation.variance,
                "Cash session closed with variance"
            );
        }

        let session = CashSession {
            status: SessionStatus::Closed,
            closing_breakdown: Some(counted.clone()),
            variance: Some(reconciliation.variance),
            closed_at: Some(now),
            updated_at: now,
            sync_version: session.sync_version + 1,
            ..session
        };

        Ok(CloseOutcome {
            session,
            reconciliation,
        })
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Loads an open session of `tenant_id`; another tenant's session is
/// `NotFound`.
async fn fetch_open_session(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    session_id: &str,
) -> DbResult<CashSession> {
    validate_uuid(session_id)?;

    let sql = format!(
        "SELECT {} FROM cash_sessions WHERE id = ?1 AND tenant_id = ?2",
        SESSION_COLUMNS
    );
    let row: Option<SessionRow> = sqlx::query_as(&sql)
        .bind(session_id)
        .bind(tenant_id)
        .fetch_optional(&mut *conn)
        .await?;

    let session = CashSession::try_from(
        row.ok_or_else(|| DbError::not_found("CashSession", session_id))?,
    )?;
    session.ensure_open()?;
    Ok(session)
}

/// Writes the drawer if nobody else has since `session` was read.
async fn persist_breakdown(
    conn: &mut SqliteConnection,
    session: &CashSession,
    next: &CashBreakdown,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let json = serde_json::to_string(next)?;

    let result = sqlx::query(
        r#"
        UPDATE cash_sessions
        SET current_breakdown = ?1,
            current_total_cents = ?2,
            updated_at = ?3,
            sync_version = sync_version + 1
        WHERE id = ?4 AND sync_version = ?5 AND status = ?6
        "#,
    )
    .bind(&json)
    .bind(next.total_cash().cents())
    .bind(now)
    .bind(&session.id)
    .bind(session.sync_version)
    .bind(SessionStatus::Open)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        warn!(session_id = %session.id, version = session.sync_version, "Stale session write rejected");
        return Err(DbError::ConcurrentModification {
            session_id: session.id.clone(),
        });
    }

    Ok(())
}

async fn insert_movement(
    conn: &mut SqliteConnection,
    session_id: &str,
    kind: MovementKind,
    amount: Money,
    breakdown: &CashBreakdown,
    summary: String,
    now: DateTime<Utc>,
) -> DbResult<CashMovement> {
    let movement = CashMovement {
        id: Uuid::new_v4().to_string(),
        session_id: session_id.to_string(),
        kind,
        amount,
        breakdown: breakdown.clone(),
        summary,
        created_at: now,
    };

    debug!(session_id = %session_id, kind = ?kind, amount = %amount, "Recording movement");

    sqlx::query(
        r#"
        INSERT INTO cash_movements (
            id, session_id, kind, amount_cents, breakdown, summary, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.session_id)
    .bind(movement.kind)
    .bind(movement.amount.cents())
    .bind(serde_json::to_string(&movement.breakdown)?)
    .bind(&movement.summary)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(movement)
}

fn advance(session: CashSession, next: CashBreakdown, now: DateTime<Utc>) -> CashSession {
    CashSession {
        current_breakdown: next,
        updated_at: now,
        sync_version: session.sync_version + 1,
        ..session
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use caja_core::Denomination;
    use std::time::Duration;

    async fn repo() -> CashSessionRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.sessions()
    }

    fn float() -> CashBreakdown {
        CashBreakdown::from_counts([
            (Denomination::Hundreds, 2),
            (Denomination::Fifties, 2),
            (Denomination::Twenties, 5),
            (Denomination::Peso10, 5),
            (Denomination::Peso5, 4),
            (Denomination::Peso1, 10),
            (Denomination::Centavos50, 4),
        ])
    }

    #[tokio::test]
    async fn test_open_and_fetch_session() {
        let repo = repo().await;
        let session = repo.open_session("caja-1", &float()).await.unwrap();

        assert!(session.is_open());
        assert_eq!(session.current_breakdown, float());

        let fetched = repo.get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(fetched.current_breakdown, float());
        assert_eq!(fetched.sync_version, 0);

        let open = repo.get_open_for_register("caja-1").await.unwrap().unwrap();
        assert_eq!(open.id, session.id);

        let movements = repo.list_movements(&session.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementKind::Opening);
        assert_eq!(movements[0].amount, float().total_cash());
    }

    #[tokio::test]
    async fn test_second_open_session_rejected() {
        let repo = repo().await;
        repo.open_session("caja-1", &float()).await.unwrap();

        let err = repo.open_session("caja-1", &float()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Another register is fine
        assert!(repo.open_session("caja-2", &float()).await.is_ok());
    }

    #[tokio::test]
    async fn test_give_change_debits_and_logs() {
        let repo = repo().await;
        let session = repo.open_session("caja-1", &float()).await.unwrap();

        let outcome = repo
            .give_change(&session.id, Money::from_cents(3_750))
            .await
            .unwrap();

        assert!(outcome.result.success);
        assert_eq!(outcome.summary, "1x$20, 1x$10, 1x$5, 2x$1, 1x$0.50");
        assert_eq!(
            outcome.session.current_breakdown.total_cash(),
            float().total_cash() - Money::from_cents(3_750)
        );

        let stored = repo.get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.current_breakdown, outcome.session.current_breakdown);
        assert_eq!(stored.sync_version, 1);

        let movements = repo.list_movements(&session.id).await.unwrap();
        assert_eq!(movements.last().unwrap().kind, MovementKind::Change);
        assert_eq!(movements.last().unwrap().amount, Money::from_cents(3_750));
    }

    #[tokio::test]
    async fn test_failed_change_writes_nothing() {
        let repo = repo().await;
        let session = repo.open_session("caja-1", &float()).await.unwrap();

        let outcome = repo
            .give_change(&session.id, Money::from_cents(10))
            .await
            .unwrap();

        assert!(!outcome.result.success);
        assert_eq!(outcome.result.remaining_amount, Money::from_cents(10));
        assert_eq!(outcome.summary, "Sin cambio");

        let stored = repo.get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.current_breakdown, float());
        assert_eq!(stored.sync_version, 0);
        assert_eq!(repo.list_movements(&session.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cash_sale_deposits_and_gives_change() {
        let repo = repo().await;
        let session = repo.open_session("caja-1", &float()).await.unwrap();
        let tendered = CashBreakdown::empty().with(Denomination::FiveHundreds, 1);

        let outcome = repo
            .record_cash_sale(
                &session.id,
                Money::from_cents(43_250),
                &tendered,
                ShortfallPolicy::Block,
            )
            .await
            .unwrap();

        assert!(outcome.settlement.is_complete());
        assert_eq!(outcome.settlement.change_amount, Money::from_cents(6_750));
        assert_eq!(outcome.summary, "1x$50, 1x$10, 1x$5, 2x$1, 1x$0.50");
        assert_eq!(
            outcome.session.current_breakdown.total_cash(),
            float().total_cash() + Money::from_cents(43_250)
        );

        let kinds: Vec<MovementKind> = repo
            .list_movements(&session.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![MovementKind::Opening, MovementKind::Deposit, MovementKind::Change]
        );
    }

    #[tokio::test]
    async fn test_blocked_shortfall_rolls_back() {
        let repo = repo().await;
        let tiny = CashBreakdown::empty().with(Denomination::Peso1, 2);
        let session = repo.open_session("caja-1", &tiny).await.unwrap();
        let tendered = CashBreakdown::empty().with(Denomination::Hundreds, 1);

        let err = repo
            .record_cash_sale(&session.id, Money::from_pesos(95), &tendered, ShortfallPolicy::Block)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientChange { missing }) if missing == Money::from_pesos(3)
        ));
        let stored = repo.get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.current_breakdown, tiny);
    }

    #[tokio::test]
    async fn test_recorded_shortfall_keeps_deposit() {
        let repo = repo().await;
        let tiny = CashBreakdown::empty().with(Denomination::Peso1, 2);
        let session = repo.open_session("caja-1", &tiny).await.unwrap();
        let tendered = CashBreakdown::empty().with(Denomination::Hundreds, 1);

        let outcome = repo
            .record_cash_sale(
                &session.id,
                Money::from_pesos(95),
                &tendered,
                ShortfallPolicy::RecordShortfall,
            )
            .await
            .unwrap();

        assert!(!outcome.settlement.is_complete());
        assert_eq!(outcome.summary, "Cambio pendiente $5.00");
        assert_eq!(outcome.session.current_breakdown.count(Denomination::Hundreds), 1);
        assert_eq!(outcome.session.current_breakdown.count(Denomination::Peso1), 2);

        let last = repo.list_movements(&session.id).await.unwrap().pop().unwrap();
        assert_eq!(last.kind, MovementKind::Shortfall);
        assert_eq!(last.amount, Money::from_pesos(5));
    }

    #[tokio::test]
    async fn test_manual_change_strict_and_lenient() {
        let repo = repo().await;
        let session = repo.open_session("caja-1", &float()).await.unwrap();
        let too_many = CashBreakdown::empty().with(Denomination::Peso10, 7);

        let err = repo
            .give_manual_change(&session.id, &too_many, true)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Overdraw { .. })));

        let after = repo
            .give_manual_change(&session.id, &too_many, false)
            .await
            .unwrap();
        assert_eq!(after.current_breakdown.count(Denomination::Peso10), 0);

        let last = repo.list_movements(&session.id).await.unwrap().pop().unwrap();
        assert_eq!(last.amount, Money::from_pesos(50));
        assert_eq!(last.summary, "5x$10");
    }

    #[tokio::test]
    async fn test_close_session_records_variance() {
        let repo = repo().await;
        let session = repo.open_session("caja-1", &float()).await.unwrap();

        let counted = float().with(Denomination::Peso10, 4);
        let outcome = repo.close_session(&session.id, &counted).await.unwrap();

        assert_eq!(outcome.reconciliation.variance, Money::from_pesos(-10));
        assert_eq!(outcome.session.status, SessionStatus::Closed);

        let stored = repo.get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::Closed);
        assert_eq!(stored.variance, Some(Money::from_pesos(-10)));
        assert_eq!(stored.closing_breakdown, Some(counted));
        assert!(stored.closed_at.is_some());

        assert!(repo.get_open_for_register("caja-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_closed_session_rejects_change() {
        let repo = repo().await;
        let session = repo.open_session("caja-1", &float()).await.unwrap();
        repo.close_session(&session.id, &float()).await.unwrap();

        let err = repo
            .give_change(&session.id, Money::from_pesos(10))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::SessionClosed { .. })));

        // Register can be reopened once closed
        assert!(repo.open_session("caja-1", &float()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let repo = repo().await;
        let err = repo
            .give_change("550e8400-e29b-41d4-a716-446655440000", Money::from_pesos(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    /// File database shared by two pooled connections, so writers really
    /// contend for the SQLite write lock.
    async fn file_db(busy_timeout: Duration) -> (Database, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!("caja-race-{}.db", Uuid::new_v4()));
        let config = DbConfig::new(&path)
            .max_connections(2)
            .busy_timeout(busy_timeout);
        (Database::new(config).await.unwrap(), path)
    }

    #[tokio::test]
    async fn test_stale_snapshot_rejected_in_write_transaction() {
        let repo = repo().await;
        let session = repo.open_session("caja-1", &float()).await.unwrap();
        let stale = repo.get_by_id(&session.id).await.unwrap().unwrap();

        // Another terminal moves the drawer first
        repo.give_change(&session.id, Money::from_pesos(10))
            .await
            .unwrap();

        let mut tx = repo.begin_write().await.unwrap();
        let err = persist_breakdown(&mut tx, &stale, &CashBreakdown::empty(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ConcurrentModification { .. }));
        assert!(err.is_retryable());
        drop(tx);

        let stored = repo.get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.sync_version, 1);
        assert_eq!(stored.current_breakdown.count(Denomination::Peso10), 4);
    }

    #[tokio::test]
    async fn test_concurrent_writers_serialize() {
        let (db, path) = file_db(Duration::from_secs(5)).await;
        let repo = db.sessions();
        let session = repo.open_session("caja-1", &float()).await.unwrap();

        // Terminal A reads the drawer inside its write transaction
        let mut tx = repo.begin_write().await.unwrap();
        let held = fetch_open_session(&mut tx, &repo.tenant_id, &session.id)
            .await
            .unwrap();

        // Terminal B starts while A still holds the lock
        let other = repo.clone();
        let id = session.id.clone();
        let racer =
            tokio::spawn(async move { other.give_change(&id, Money::from_pesos(10)).await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let taken = CashBreakdown::empty().with(Denomination::Peso10, 1);
        let next = debit_register(&held.current_breakdown, &taken).unwrap();
        persist_breakdown(&mut tx, &held, &next, Utc::now())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        // B waited for A's commit and worked from the fresh drawer
        let outcome = racer.await.unwrap().unwrap();
        assert!(outcome.result.success);

        let stored = repo.get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.sync_version, 2);
        assert_eq!(stored.current_breakdown.count(Denomination::Peso10), 3);

        db.close().await;
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_lock_timeout_is_retryable_busy() {
        let (db, path) = file_db(Duration::from_millis(50)).await;
        let repo = db.sessions();
        let session = repo.open_session("caja-1", &float()).await.unwrap();

        let tx = repo.begin_write().await.unwrap();
        let err = repo
            .give_change(&session.id, Money::from_pesos(10))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Busy(_)));
        assert!(err.is_retryable());
        tx.rollback().await.unwrap();

        // Lock released: the retry goes through
        let outcome = repo
            .give_change(&session.id, Money::from_pesos(10))
            .await
            .unwrap();
        assert!(outcome.result.success);

        db.close().await;
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_tenants_are_isolated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = db.sessions();
        let b = db.sessions().with_tenant("tenant-b");

        a.open_session("caja-1", &float()).await.unwrap();

        assert!(b.get_open_for_register("caja-1").await.unwrap().is_none());
        assert!(b.open_session("caja-1", &float()).await.is_ok());
    }

    #[tokio::test]
    async fn test_other_tenant_cannot_touch_session() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = db.sessions();
        let b = db.sessions().with_tenant("tenant-b");
        let session = a.open_session("caja-1", &float()).await.unwrap();

        assert!(b.get_by_id(&session.id).await.unwrap().is_none());
        assert!(b.list_movements(&session.id).await.unwrap().is_empty());

        let err = b
            .give_change(&session.id, Money::from_pesos(20))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let err = b.close_session(&session.id, &float()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let stored = a.get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.current_breakdown, float());
        assert!(stored.is_open());
        assert_eq!(a.list_movements(&session.id).await.unwrap().len(), 1);
    }
}
