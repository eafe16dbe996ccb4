//! # Register Operations
//!
//! Applying change and tendered cash to a drawer's breakdown.
//!
//! ## Cash Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Amount due: $163.50       Customer hands over: 1 × $200 bill           │
//! │                                                                         │
//! │  1. deposit(tendered)            drawer += 1 × $200                     │
//! │  2. calculate_optimal_change     $36.50 from the post-deposit drawer    │
//! │  3. debit (success only)         drawer -= change units                 │
//! │                                                                         │
//! │  Net effect on totalCash: + amount due                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here returns a new breakdown. The caller owns persisting
//! it and serializing concurrent updates to the same drawer.

use serde::Serialize;

use crate::breakdown::CashBreakdown;
use crate::change::{calculate_optimal_change, ChangeResult};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation::validate_amount_due;

// =============================================================================
// Debit
// =============================================================================

/// Removes `change_given` from `existing`, flooring each slot at zero.
///
/// Returns `None` when there is no drawer state to debit. Asking for more
/// units than held is not reported here; use [`debit_register`] when that
/// must be an error.
///
/// ## Example
/// ```rust
/// use caja_core::{subtract_change_from_register, CashBreakdown, Denomination};
///
/// let drawer = CashBreakdown::empty().with(Denomination::Peso10, 2);
/// let change = CashBreakdown::empty().with(Denomination::Peso10, 5);
///
/// let after = subtract_change_from_register(Some(&drawer), &change).unwrap();
/// assert_eq!(after.count(Denomination::Peso10), 0);
/// assert!(subtract_change_from_register(None, &change).is_none());
/// ```
pub fn subtract_change_from_register(
    existing: Option<&CashBreakdown>,
    change_given: &CashBreakdown,
) -> Option<CashBreakdown> {
    let existing = existing?;
    let mut next = existing.clone();

    for (denomination, taken) in change_given.non_zero() {
        next.set_count(
            denomination,
            existing.count(denomination).saturating_sub(taken),
        );
    }

    Some(next)
}

/// Removes `change` from `existing`, failing if any slot would go below
/// zero.
///
/// ## Errors
/// [`CoreError::Overdraw`] naming the first slot (natural order) that is
/// short.
pub fn debit_register(existing: &CashBreakdown, change: &CashBreakdown) -> CoreResult<CashBreakdown> {
    let mut next = existing.clone();

    for (denomination, requested) in change.non_zero() {
        let available = existing.count(denomination);
        let left = available
            .checked_sub(requested)
            .ok_or(CoreError::Overdraw {
                denomination,
                available,
                requested,
            })?;
        next.set_count(denomination, left);
    }

    Ok(next)
}

// =============================================================================
// Cash Sale Settlement
// =============================================================================

/// Result of settling a cash sale against a drawer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashSettlement {
    /// Drawer after deposit and, when change succeeded, debit.
    pub register: CashBreakdown,

    /// What the customer handed over.
    pub tendered: CashBreakdown,

    /// tendered total − amount due.
    pub change_amount: Money,

    /// Outcome of the change calculation.
    pub change: ChangeResult,
}

impl CashSettlement {
    /// True when the customer received the full change owed.
    pub fn is_complete(&self) -> bool {
        self.change.success
    }
}

/// Settles a cash sale: deposits the tendered units, then computes and
/// debits change from the drawer that now includes them.
///
/// When change cannot be made, the returned register includes the deposit
/// but no debit; the caller decides whether to keep or discard it.
///
/// ## Errors
/// - [`CoreError::Validation`] if `amount_due` is not positive
/// - [`CoreError::InsufficientTender`] if the tender does not cover it
/// - [`CoreError::CountOverflow`] from the deposit
///
/// ## Example
/// ```rust
/// use caja_core::{settle_cash_sale, CashBreakdown, Denomination, Money};
///
/// let drawer = CashBreakdown::empty()
///     .with(Denomination::Twenties, 1)
///     .with(Denomination::Peso10, 1)
///     .with(Denomination::Peso5, 1)
///     .with(Denomination::Peso1, 1)
///     .with(Denomination::Centavos50, 1);
/// let tendered = CashBreakdown::empty().with(Denomination::TwoHundreds, 1);
///
/// let s = settle_cash_sale(&drawer, Money::from_cents(16_350), &tendered).unwrap();
/// assert!(s.is_complete());
/// assert_eq!(s.change_amount, Money::from_cents(3_650));
/// assert_eq!(s.register.total_cash(), drawer.total_cash() + Money::from_cents(16_350));
/// ```
pub fn settle_cash_sale(
    register: &CashBreakdown,
    amount_due: Money,
    tendered: &CashBreakdown,
) -> CoreResult<CashSettlement> {
    validate_amount_due(amount_due)?;

    let tendered_total = tendered.total_cash();
    if tendered_total < amount_due {
        return Err(CoreError::InsufficientTender {
            due: amount_due,
            tendered: tendered_total,
        });
    }

    let with_tender = register.deposit(tendered)?;
    let change_amount = tendered_total - amount_due;
    let change = calculate_optimal_change(change_amount, Some(&with_tender));

    let register = match &change.change_given {
        Some(given) => debit_register(&with_tender, given)?,
        None => with_tender,
    };

    Ok(CashSettlement {
        register,
        tendered: tendered.clone(),
        change_amount,
        change,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
