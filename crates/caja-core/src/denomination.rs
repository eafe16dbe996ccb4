//! # Denomination Registry
//!
//! The fixed catalog of Mexican peso bills and coins a drawer can hold.
//!
//! ## Catalog
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BILLS (9)                          COINS (8)                           │
//! │  ──────────────────────             ──────────────────────              │
//! │  thousands     $1000                peso20      $20                     │
//! │  fiveHundreds  $500                 peso10      $10                     │
//! │  twoHundreds   $200                 peso5       $5                      │
//! │  hundreds      $100                 peso2       $2                      │
//! │  fifties       $50                  peso1       $1                      │
//! │  twenties      $20                  centavos50  $0.50                   │
//! │  tens          $10                  centavos20  $0.20                   │
//! │  fives         $5                   centavos10  $0.10                   │
//! │  ones          $1                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`Denomination::ALL`] is the natural field order (bills then coins, each
//! descending). [`Denomination::CHANGE_ORDER`] is the order change is paid
//! out in: strictly non-increasing face value, bill before coin on a tie.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

/// Number of denomination slots in a breakdown.
pub const DENOMINATION_COUNT: usize = 17;

/// Physical form of a denomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DenominationKind {
    Bill,
    Coin,
}

/// A single face-value unit of currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum Denomination {
    Thousands,
    FiveHundreds,
    TwoHundreds,
    Hundreds,
    Fifties,
    Twenties,
    Tens,
    Fives,
    Ones,
    Peso20,
    Peso10,
    Peso5,
    Peso2,
    Peso1,
    Centavos50,
    Centavos20,
    Centavos10,
}

impl Denomination {
    /// Every denomination in natural field order.
    pub const ALL: [Denomination; DENOMINATION_COUNT] = [
        Denomination::Thousands,
        Denomination::FiveHundreds,
        Denomination::TwoHundreds,
        Denomination::Hundreds,
        Denomination::Fifties,
        Denomination::Twenties,
        Denomination::Tens,
        Denomination::Fives,
        Denomination::Ones,
        Denomination::Peso20,
        Denomination::Peso10,
        Denomination::Peso5,
        Denomination::Peso2,
        Denomination::Peso1,
        Denomination::Centavos50,
        Denomination::Centavos20,
        Denomination::Centavos10,
    ];

    /// Payout order for change making. Face values never increase along
    /// this list, which is what keeps the greedy walk correct.
    pub const CHANGE_ORDER: [Denomination; DENOMINATION_COUNT] = [
        Denomination::Thousands,
        Denomination::FiveHundreds,
        Denomination::TwoHundreds,
        Denomination::Hundreds,
        Denomination::Fifties,
        Denomination::Twenties,
        Denomination::Peso20,
        Denomination::Tens,
        Denomination::Peso10,
        Denomination::Fives,
        Denomination::Peso5,
        Denomination::Peso2,
        Denomination::Ones,
        Denomination::Peso1,
        Denomination::Centavos50,
        Denomination::Centavos20,
        Denomination::Centavos10,
    ];

    /// Face value.
    pub const fn value(self) -> Money {
        Money::from_cents(match self {
            Denomination::Thousands => 100_000,
            Denomination::FiveHundreds => 50_000,
            Denomination::TwoHundreds => 20_000,
            Denomination::Hundreds => 10_000,
            Denomination::Fifties => 5_000,
            Denomination::Twenties | Denomination::Peso20 => 2_000,
            Denomination::Tens | Denomination::Peso10 => 1_000,
            Denomination::Fives | Denomination::Peso5 => 500,
            Denomination::Peso2 => 200,
            Denomination::Ones | Denomination::Peso1 => 100,
            Denomination::Centavos50 => 50,
            Denomination::Centavos20 => 20,
            Denomination::Centavos10 => 10,
        })
    }

    pub const fn kind(self) -> DenominationKind {
        match self {
            Denomination::Thousands
            | Denomination::FiveHundreds
            | Denomination::TwoHundreds
            | Denomination::Hundreds
            | Denomination::Fifties
            | Denomination::Twenties
            | Denomination::Tens
            | Denomination::Fives
            | Denomination::Ones => DenominationKind::Bill,
            _ => DenominationKind::Coin,
        }
    }

    /// Position in [`Denomination::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Wire key of this slot inside `bills` / `coins`.
    pub const fn slot_name(self) -> &'static str {
        match self {
            Denomination::Thousands => "thousands",
            Denomination::FiveHundreds => "fiveHundreds",
            Denomination::TwoHundreds => "twoHundreds",
            Denomination::Hundreds => "hundreds",
            Denomination::Fifties => "fifties",
            Denomination::Twenties => "twenties",
            Denomination::Tens => "tens",
            Denomination::Fives => "fives",
            Denomination::Ones => "ones",
            Denomination::Peso20 => "peso20",
            Denomination::Peso10 => "peso10",
            Denomination::Peso5 => "peso5",
            Denomination::Peso2 => "peso2",
            Denomination::Peso1 => "peso1",
            Denomination::Centavos50 => "centavos50",
            Denomination::Centavos20 => "centavos20",
            Denomination::Centavos10 => "centavos10",
        }
    }

    /// Looks a denomination up by its wire key.
    pub fn from_slot_name(name: &str) -> Option<Self> {
        Denomination::ALL
            .into_iter()
            .find(|d| d.slot_name() == name)
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind() {
            DenominationKind::Bill => "bill",
            DenominationKind::Coin => "coin",
        };
        write!(f, "${} {}", self.value().face_label(), kind)
    }
}
