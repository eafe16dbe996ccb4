//! # Change Calculator
//!
//! Works out which bills and coins to hand back to a customer.
//!
//! ## Greedy Largest-First
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Change owed: $37.50                                                    │
//! │                                                                         │
//! │  $20 coin   floor(37.50 / 20) = 1, held 1  → take 1   remaining 17.50   │
//! │  $10 coin   floor(17.50 / 10) = 1, held 1  → take 1   remaining  7.50   │
//! │  $5 coin    floor( 7.50 /  5) = 1, held 1  → take 1   remaining  2.50   │
//! │  $2 coin    floor( 2.50 /  2) = 1, held 0  → skip                       │
//! │  $1 coin    floor( 2.50 /  1) = 2, held 2  → take 2   remaining  0.50   │
//! │  $0.50      floor( 0.50 / .5) = 1, held 1  → take 1   remaining  0.00 ✅ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Greedy is optimal in unit count for the peso's canonical denomination
//! set. It does not backtrack, so a drawer short on the "right" units can
//! fail where another split exists; that outcome is reported, not hidden.
//!
//! Running short of denominations is an ordinary business outcome and is
//! returned as a [`ChangeResult`] with `success == false`, never as `Err`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::breakdown::CashBreakdown;
use crate::denomination::Denomination;
use crate::money::Money;

// =============================================================================
// Change Outcome Types
// =============================================================================

/// Why change could not be (fully) given.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeError {
    /// Negative change was requested.
    #[error("Invalid change amount")]
    InvalidAmount { amount: Money },

    /// Positive change was requested but no drawer state was supplied.
    #[error("No cash register data available")]
    NoRegisterData,

    /// The drawer cannot represent the full amount.
    #[error("Insufficient denominations to give change, missing {missing}")]
    InsufficientDenominations { missing: Money },
}

/// Outcome of a change calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChangeResult {
    /// True iff the full amount was represented.
    pub success: bool,

    /// Units to hand over. Present only on success with a drawer supplied.
    #[ts(as = "Option<crate::breakdown::BreakdownDto>")]
    pub change_given: Option<CashBreakdown>,

    /// Portion not covered. Zero on success; the requested amount when the
    /// request itself was rejected.
    pub remaining_amount: Money,

    pub error: Option<ChangeError>,
}

impl ChangeResult {
    fn rejected(amount: Money, error: Option<ChangeError>) -> Self {
        ChangeResult {
            success: false,
            change_given: None,
            remaining_amount: amount,
            error,
        }
    }

    fn nothing_owed() -> Self {
        ChangeResult {
            success: true,
            change_given: None,
            remaining_amount: Money::zero(),
            error: None,
        }
    }

    /// Amount actually covered by `change_given`.
    pub fn amount_given(&self) -> Money {
        self.change_given
            .as_ref()
            .map_or(Money::zero(), CashBreakdown::total_cash)
    }
}

// =============================================================================
// Calculator
// =============================================================================

/// Computes the greedy breakdown of `change_amount` from the units held in
/// `available`.
///
/// ## Edge Policy
/// | drawer  | amount | outcome                                           |
/// |---------|--------|---------------------------------------------------|
/// | absent  | 0      | success, nothing given                            |
/// | absent  | < 0    | failure, `InvalidAmount`                          |
/// | absent  | > 0    | failure, `NoRegisterData`                         |
/// | present | 0      | success, nothing given                            |
/// | present | < 0    | failure, `InvalidAmount`                          |
/// | present | > 0    | greedy walk; `InsufficientDenominations` if short |
///
/// The absent-drawer failure is plain `success = false` in the POS screens
/// that consume this result; the `NoRegisterData` tag is extra, so callers
/// can tell "no drawer loaded" from "drawer short". Code that reads only
/// `success` and `remaining_amount` sees the same outcome either way.
///
/// `available` is only read; the result owns fresh data.
///
/// ## Example
/// ```rust
/// use caja_core::{calculate_optimal_change, CashBreakdown, Denomination, Money};
///
/// let drawer = CashBreakdown::empty()
///     .with(Denomination::Fifties, 1)
///     .with(Denomination::Peso10, 3);
///
/// let result = calculate_optimal_change(Money::from_pesos(70), Some(&drawer));
/// assert!(result.success);
///
/// let given = result.change_given.unwrap();
/// assert_eq!(given.count(Denomination::Fifties), 1);
/// assert_eq!(given.count(Denomination::Peso10), 2);
/// ```
pub fn calculate_optimal_change(
    change_amount: Money,
    available: Option<&CashBreakdown>,
) -> ChangeResult {
    if change_amount.is_negative() {
        return ChangeResult::rejected(
            change_amount,
            Some(ChangeError::InvalidAmount {
                amount: change_amount,
            }),
        );
    }
    if change_amount.is_zero() {
        return ChangeResult::nothing_owed();
    }
    let Some(available) = available else {
        return ChangeResult::rejected(change_amount, Some(ChangeError::NoRegisterData));
    };

    let mut remaining = change_amount;
    let mut given = CashBreakdown::empty();

    for denomination in Denomination::CHANGE_ORDER {
        let value = denomination.value().cents();
        // Bounded by `remaining`, which fits the drawer's u32 counts
        let needed = u32::try_from(remaining.cents() / value).unwrap_or(u32::MAX);
        let used = available.count(denomination).min(needed);

        if used > 0 {
            given.set_count(denomination, used);
            remaining -= denomination.value().times_count(used);
        }

        if remaining.is_zero() {
            break;
        }
    }

    if remaining.is_zero() {
        ChangeResult {
            success: true,
            change_given: Some(given),
            remaining_amount: Money::zero(),
            error: None,
        }
    } else {
        ChangeResult::rejected(
            remaining,
            Some(ChangeError::InsufficientDenominations { missing: remaining }),
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
