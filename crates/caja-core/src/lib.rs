//! # caja-core: Pure Cash Drawer Logic
//!
//! Denomination inventory, change making and drawer arithmetic for a retail
//! POS, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Caja Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               POS checkout / session close screens              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                caja-db (sessions, transactions)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ caja-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────┐   │   │
//! │  │  │ denomination │ │  change  │ │ register │ │   format     │   │   │
//! │  │  │  breakdown   │ │  greedy  │ │  debit   │ │  reconcile   │   │   │
//! │  │  └──────────────┘ └──────────┘ └──────────┘ └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`denomination`] - The 17 MXN bills and coins
//! - [`breakdown`] - Per-denomination drawer inventory
//! - [`change`] - Greedy change calculator
//! - [`register`] - Debit, deposit and cash sale settlement
//! - [`format`] - Receipt text for a breakdown
//! - [`reconcile`] - Close-out count against expected cash
//! - [`types`] - Sessions and movements
//! - [`money`] - Integer centavo arithmetic
//! - [`config`] - Register configuration
//! - [`error`] / [`validation`] - Typed errors and input rules
//!
//! ## Example Usage
//!
//! ```rust
//! use caja_core::{
//!     calculate_optimal_change, format_change_breakdown, subtract_change_from_register,
//!     CashBreakdown, Denomination, Money,
//! };
//!
//! let drawer = CashBreakdown::empty()
//!     .with(Denomination::Twenties, 3)
//!     .with(Denomination::Peso5, 4)
//!     .with(Denomination::Centavos50, 2);
//!
//! let result = calculate_optimal_change(Money::parse_decimal("45.50").unwrap(), Some(&drawer));
//! let given = result.change_given.expect("drawer covers $45.50");
//! assert_eq!(format_change_breakdown(&given), "2x$20, 1x$5, 1x$0.50");
//!
//! let after = subtract_change_from_register(Some(&drawer), &given).unwrap();
//! assert_eq!(after.total_cash(), drawer.total_cash() - Money::from_cents(4_550));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod breakdown;
pub mod change;
pub mod config;
pub mod denomination;
pub mod error;
pub mod format;
pub mod money;
pub mod reconcile;
pub mod register;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use breakdown::{BreakdownDto, CashBreakdown};
pub use change::{calculate_optimal_change, ChangeError, ChangeResult};
pub use config::{RegisterConfig, ShortfallPolicy};
pub use denomination::{Denomination, DenominationKind};
pub use error::{CoreError, CoreResult, ValidationError};
pub use format::{format_change_breakdown, NO_CHANGE_LABEL};
pub use money::Money;
pub use reconcile::{reconcile, Discrepancy, Reconciliation};
pub use register::{debit_register, settle_cash_sale, subtract_change_from_register, CashSettlement};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tenant ID (single-tenant runtime with multi-tenant schema).
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum units of one denomination a breakdown may report.
///
/// ## Business Reason
/// Catches typos in hand counts (10000 typed for 100) before they reach the
/// drawer state.
pub const MAX_SLOT_COUNT: u32 = 100_000;
