//! # Session Reconciliation
//!
//! Compares what the drawer should hold with what the cashier counted when
//! closing a session.
//!
//! ## Close-Out
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  expected (tracked)    counted (by hand)     discrepancy               │
//! │  ─────────────────     ─────────────────     ───────────               │
//! │  $100 bill × 3         $100 bill × 3                                   │
//! │  $10 coin  × 5         $10 coin  × 4         -1  ($-10.00)             │
//! │  $0.50     × 2         $0.50     × 3         +1  ($0.50)               │
//! │                                                                         │
//! │  variance = counted - expected = -$9.50   (drawer is short)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::breakdown::CashBreakdown;
use crate::denomination::Denomination;
use crate::money::Money;

/// One slot whose counted units differ from the expected units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    pub denomination: Denomination,
    pub expected: u32,
    pub counted: u32,
}

impl Discrepancy {
    /// Signed value difference (counted − expected) for this slot.
    pub fn amount(&self) -> Money {
        self.denomination
            .value()
            .times_count(self.counted)
            - self.denomination.value().times_count(self.expected)
    }
}

/// Result of counting a drawer against its tracked breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub expected_total: Money,
    pub counted_total: Money,
    /// counted − expected. Negative means cash is missing.
    pub variance: Money,
    pub discrepancies: Vec<Discrepancy>,
}

impl Reconciliation {
    /// True when every slot matches.
    pub fn is_balanced(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// Reconciles a counted drawer against the expected breakdown.
///
/// Discrepancies are listed in natural field order. The variance can be
/// zero while discrepancies exist (e.g. two $5 coins counted where a $10
/// coin was expected).
pub fn reconcile(expected: &CashBreakdown, counted: &CashBreakdown) -> Reconciliation {
    let discrepancies = Denomination::ALL
        .iter()
        .filter(|d| expected.count(**d) != counted.count(**d))
        .map(|d| Discrepancy {
            denomination: *d,
            expected: expected.count(*d),
            counted: counted.count(*d),
        })
        .collect();

    let expected_total = expected.total_cash();
    let counted_total = counted.total_cash();

    Reconciliation {
        expected_total,
        counted_total,
        variance: counted_total - expected_total,
        discrepancies,
    }
}
