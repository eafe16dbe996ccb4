//! # Cash Breakdown
//!
//! A snapshot of a drawer's physical cash: how many units of each
//! denomination it holds.
//!
//! ## Representation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  In memory                         On the wire (JSON / TypeScript)     │
//! │  ─────────────────────────         ────────────────────────────────    │
//! │  CashBreakdown {                   {                                   │
//! │    counts: [u32; 17]   ──into──►     "bills": {                        │
//! │  }                                     "thousands": {value,count,total}│
//! │                        ◄─try_from─     ... 9 slots },                  │
//! │  totals are DERIVED,                 "coins": { ... 8 slots },         │
//! │  never stored                        "totalCash": 123450               │
//! │                                    }                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Because per-slot totals and the grand total are computed from counts,
//! `total == value * count` and `totalCash == Σ total` hold for every
//! `CashBreakdown` value. The wire form is checked on the way in: a missing
//! slot, a wrong face value, or a total that disagrees with its count is
//! rejected as [`CoreError::MalformedBreakdown`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::denomination::{Denomination, DenominationKind, DENOMINATION_COUNT};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation::validate_slot_count;

// =============================================================================
// CashBreakdown
// =============================================================================

/// Per-denomination unit counts of a cash drawer.
///
/// ## Example
/// ```rust
/// use caja_core::{CashBreakdown, Denomination, Money};
///
/// let drawer = CashBreakdown::empty()
///     .with(Denomination::Hundreds, 2)
///     .with(Denomination::Centavos50, 3);
///
/// assert_eq!(drawer.total(Denomination::Hundreds), Money::from_pesos(200));
/// assert_eq!(drawer.total_cash(), Money::from_cents(20_150));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "BreakdownDto", try_from = "BreakdownDto")]
pub struct CashBreakdown {
    counts: [u32; DENOMINATION_COUNT],
}

impl CashBreakdown {
    /// A breakdown with every slot at zero.
    pub const fn empty() -> Self {
        CashBreakdown {
            counts: [0; DENOMINATION_COUNT],
        }
    }

    /// Builds a breakdown from `(denomination, count)` pairs. Later pairs
    /// for the same denomination overwrite earlier ones.
    pub fn from_counts(counts: impl IntoIterator<Item = (Denomination, u32)>) -> Self {
        counts
            .into_iter()
            .fold(CashBreakdown::empty(), |b, (d, n)| b.with(d, n))
    }

    /// Returns a copy with one slot set to `count`.
    #[must_use]
    pub fn with(mut self, denomination: Denomination, count: u32) -> Self {
        self.counts[denomination.index()] = count;
        self
    }

    #[inline]
    pub fn count(&self, denomination: Denomination) -> u32 {
        self.counts[denomination.index()]
    }

    #[inline]
    pub fn set_count(&mut self, denomination: Denomination, count: u32) {
        self.counts[denomination.index()] = count;
    }

    /// Value held in one slot (`value * count`).
    #[inline]
    pub fn total(&self, denomination: Denomination) -> Money {
        denomination.value().times_count(self.count(denomination))
    }

    /// Value of the whole drawer.
    pub fn total_cash(&self) -> Money {
        Denomination::ALL.iter().map(|d| self.total(*d)).sum()
    }

    /// Total number of physical units held.
    pub fn unit_count(&self) -> u64 {
        self.counts.iter().map(|n| u64::from(*n)).sum()
    }

    /// True when no slot has a positive count.
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|n| *n == 0)
    }

    /// Iterates `(denomination, count)` in natural field order, including
    /// zero-count slots.
    pub fn iter(&self) -> impl Iterator<Item = (Denomination, u32)> + '_ {
        Denomination::ALL.iter().map(move |d| (*d, self.count(*d)))
    }

    /// Iterates only the slots with a positive count, in natural order.
    pub fn non_zero(&self) -> impl Iterator<Item = (Denomination, u32)> + '_ {
        self.iter().filter(|(_, n)| *n > 0)
    }

    /// Returns a new breakdown with `tendered` added slot by slot.
    ///
    /// ## Errors
    /// [`CoreError::CountOverflow`] if any slot would exceed `u32::MAX`.
    pub fn deposit(&self, tendered: &CashBreakdown) -> CoreResult<CashBreakdown> {
        let mut next = self.clone();
        for (denomination, added) in tendered.non_zero() {
            let current = next.count(denomination);
            let sum = current
                .checked_add(added)
                .ok_or(CoreError::CountOverflow { denomination })?;
            next.set_count(denomination, sum);
        }
        Ok(next)
    }
}

// =============================================================================
// Wire Shape
// =============================================================================

/// One denomination slot as the frontend and the database see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SlotDto {
    pub value: Money,
    pub count: u32,
    pub total: Money,
}

/// The nine bill slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillsDto {
    pub thousands: SlotDto,
    pub five_hundreds: SlotDto,
    pub two_hundreds: SlotDto,
    pub hundreds: SlotDto,
    pub fifties: SlotDto,
    pub twenties: SlotDto,
    pub tens: SlotDto,
    pub fives: SlotDto,
    pub ones: SlotDto,
}

/// The eight coin slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CoinsDto {
    pub peso20: SlotDto,
    pub peso10: SlotDto,
    pub peso5: SlotDto,
    pub peso2: SlotDto,
    pub peso1: SlotDto,
    pub centavos50: SlotDto,
    pub centavos20: SlotDto,
    pub centavos10: SlotDto,
}

/// Full breakdown in wire form. Every slot is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownDto {
    pub bills: BillsDto,
    pub coins: CoinsDto,
    pub total_cash: Money,
}

impl BreakdownDto {
    /// Pairs every slot with its denomination, natural order.
    fn slots(&self) -> [(Denomination, &SlotDto); DENOMINATION_COUNT] {
        let b = &self.bills;
        let c = &self.coins;
        [
            (Denomination::Thousands, &b.thousands),
            (Denomination::FiveHundreds, &b.five_hundreds),
            (Denomination::TwoHundreds, &b.two_hundreds),
            (Denomination::Hundreds, &b.hundreds),
            (Denomination::Fifties, &b.fifties),
            (Denomination::Twenties, &b.twenties),
            (Denomination::Tens, &b.tens),
            (Denomination::Fives, &b.fives),
            (Denomination::Ones, &b.ones),
            (Denomination::Peso20, &c.peso20),
            (Denomination::Peso10, &c.peso10),
            (Denomination::Peso5, &c.peso5),
            (Denomination::Peso2, &c.peso2),
            (Denomination::Peso1, &c.peso1),
            (Denomination::Centavos50, &c.centavos50),
            (Denomination::Centavos20, &c.centavos20),
            (Denomination::Centavos10, &c.centavos10),
        ]
    }
}

fn slot(b: &CashBreakdown, d: Denomination) -> SlotDto {
    SlotDto {
        value: d.value(),
        count: b.count(d),
        total: b.total(d),
    }
}

impl From<CashBreakdown> for BreakdownDto {
    fn from(b: CashBreakdown) -> Self {
        BreakdownDto::from(&b)
    }
}

impl From<&CashBreakdown> for BreakdownDto {
    fn from(b: &CashBreakdown) -> Self {
        BreakdownDto {
            bills: BillsDto {
                thousands: slot(b, Denomination::Thousands),
                five_hundreds: slot(b, Denomination::FiveHundreds),
                two_hundreds: slot(b, Denomination::TwoHundreds),
                hundreds: slot(b, Denomination::Hundreds),
                fifties: slot(b, Denomination::Fifties),
                twenties: slot(b, Denomination::Twenties),
                tens: slot(b, Denomination::Tens),
                fives: slot(b, Denomination::Fives),
                ones: slot(b, Denomination::Ones),
            },
            coins: CoinsDto {
                peso20: slot(b, Denomination::Peso20),
                peso10: slot(b, Denomination::Peso10),
                peso5: slot(b, Denomination::Peso5),
                peso2: slot(b, Denomination::Peso2),
                peso1: slot(b, Denomination::Peso1),
                centavos50: slot(b, Denomination::Centavos50),
                centavos20: slot(b, Denomination::Centavos20),
                centavos10: slot(b, Denomination::Centavos10),
            },
            total_cash: b.total_cash(),
        }
    }
}

impl TryFrom<BreakdownDto> for CashBreakdown {
    type Error = CoreError;

    fn try_from(dto: BreakdownDto) -> Result<Self, Self::Error> {
        let mut breakdown = CashBreakdown::empty();

        for (denomination, slot) in dto.slots() {
            let section = match denomination.kind() {
                DenominationKind::Bill => "bills",
                DenominationKind::Coin => "coins",
            };
            let path = format!("{}.{}", section, denomination.slot_name());

            if slot.value != denomination.value() {
                return Err(CoreError::malformed(format!(
                    "{} has value {}, expected {}",
                    path,
                    slot.value,
                    denomination.value()
                )));
            }
            validate_slot_count(&path, slot.count)?;
            if slot.total != denomination.value().times_count(slot.count) {
                return Err(CoreError::malformed(format!(
                    "{} total {} does not match {} x {}",
                    path, slot.total, slot.count, slot.value
                )));
            }

            breakdown.set_count(denomination, slot.count);
        }

        if dto.total_cash != breakdown.total_cash() {
            return Err(CoreError::malformed(format!(
                "totalCash {} does not match sum of slots {}",
                dto.total_cash,
                breakdown.total_cash()
            )));
        }

        Ok(breakdown)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CashBreakdown {
        CashBreakdown::from_counts([
            (Denomination::FiveHundreds, 1),
            (Denomination::Fifties, 2),
            (Denomination::Peso10, 4),
            (Denomination::Centavos50, 3),
        ])
    }

    #[test]
    fn test_totals_are_derived() {
        let b = sample();
        assert_eq!(b.total(Denomination::Fifties), Money::from_pesos(100));
        assert_eq!(b.total(Denomination::Centavos50), Money::from_cents(150));
        assert_eq!(b.total_cash(), Money::from_cents(64_150));
        assert_eq!(b.unit_count(), 10);
    }

    #[test]
    fn test_empty() {
        let b = CashBreakdown::empty();
        assert!(b.is_empty());
        assert!(b.total_cash().is_zero());
        assert_eq!(b.non_zero().count(), 0);
        assert_eq!(b.iter().count(), DENOMINATION_COUNT);
    }

    #[test]
    fn test_deposit_adds_counts() {
        let drawer = sample();
        let tendered = CashBreakdown::empty()
            .with(Denomination::Fifties, 1)
            .with(Denomination::Hundreds, 2);

        let after = drawer.deposit(&tendered).unwrap();
        assert_eq!(after.count(Denomination::Fifties), 3);
        assert_eq!(after.count(Denomination::Hundreds), 2);
        assert_eq!(after.total_cash(), drawer.total_cash() + tendered.total_cash());
        // Original untouched
        assert_eq!(drawer.count(Denomination::Fifties), 2);
    }

    #[test]
    fn test_deposit_overflow() {
        let drawer = CashBreakdown::empty().with(Denomination::Peso1, u32::MAX);
        let tendered = CashBreakdown::empty().with(Denomination::Peso1, 1);
        assert_eq!(
            drawer.deposit(&tendered),
            Err(CoreError::CountOverflow {
                denomination: Denomination::Peso1
            })
        );
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["bills"]["fiveHundreds"]["value"], 50_000);
        assert_eq!(json["bills"]["fifties"]["count"], 2);
        assert_eq!(json["bills"]["fifties"]["total"], 10_000);
        assert_eq!(json["coins"]["centavos50"]["total"], 150);
        assert_eq!(json["coins"]["peso2"]["count"], 0);
        assert_eq!(json["totalCash"], 64_150);
    }

    #[test]
    fn test_json_accepts_own_output() {
        let json = serde_json::to_string(&sample()).unwrap();
        let back: CashBreakdown = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_json_rejects_missing_slot() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["coins"].as_object_mut().unwrap().remove("peso5");
        let err = serde_json::from_value::<CashBreakdown>(json).unwrap_err();
        assert!(err.to_string().contains("peso5"), "{}", err);
    }

    #[test]
    fn test_json_rejects_wrong_face_value() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["bills"]["tens"]["value"] = 900.into();
        let err = serde_json::from_value::<CashBreakdown>(json).unwrap_err();
        assert!(err.to_string().contains("bills.tens"), "{}", err);
    }

    #[test]
    fn test_json_rejects_inconsistent_totals() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["bills"]["fifties"]["total"] = 5_000.into();
        assert!(serde_json::from_value::<CashBreakdown>(json).is_err());

        let mut json = serde_json::to_value(sample()).unwrap();
        json["totalCash"] = 1.into();
        let err = serde_json::from_value::<CashBreakdown>(json).unwrap_err();
        assert!(err.to_string().contains("totalCash"), "{}", err);
    }

    #[test]
    fn test_dto_try_from_error_kind() {
        let mut dto = BreakdownDto::from(&sample());
        dto.coins.peso1.count = 2;
        let err = CashBreakdown::try_from(dto).unwrap_err();
        assert!(matches!(err, CoreError::MalformedBreakdown { .. }));
    }
}
