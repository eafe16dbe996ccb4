//! # Error Types
//!
//! Domain-specific error types for caja-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  caja-core errors (this file)                                          │
//! │  ├── CoreError        - Broken calling contracts (malformed input,     │
//! │  │                      overdrawn debit, closed session)               │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  Expected outcomes are NOT errors:                                     │
//! │  └── ChangeError      - Carried inside ChangeResult (change.rs)        │
//! │                                                                         │
//! │  caja-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::denomination::Denomination;
use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core cash drawer errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A breakdown did not have the fixed 17-slot shape or its derived
    /// totals disagreed with its counts.
    ///
    /// ## When This Occurs
    /// - A stored or submitted breakdown is missing a slot
    /// - A slot's `value` is not that slot's face value
    /// - `total` or `totalCash` was edited by hand
    #[error("Malformed cash breakdown: {reason}")]
    MalformedBreakdown { reason: String },

    /// Strict debit asked for more units than the drawer holds.
    ///
    /// ## User Workflow
    /// ```text
    /// Cashier enters change by hand: 3 × $20 coin
    ///      │
    ///      ▼
    /// Drawer holds: 1 × $20 coin
    ///      │
    ///      ▼
    /// Overdraw { denomination: Peso20, available: 1, requested: 3 }
    ///      │
    ///      ▼
    /// UI shows: "Only 1 $20 coin in the drawer"
    /// ```
    #[error("Cannot take {requested} x {denomination} from the drawer: only {available} held")]
    Overdraw {
        denomination: Denomination,
        available: u32,
        requested: u32,
    },

    /// Adding units would overflow a slot counter.
    #[error("Count overflow for {denomination}")]
    CountOverflow { denomination: Denomination },

    /// The customer handed over less cash than the amount due.
    #[error("Tendered {tendered} does not cover amount due {due}")]
    InsufficientTender { due: Money, tendered: Money },

    /// Change could not be made and the configured policy blocks the sale.
    #[error("Cannot give change: missing {missing}")]
    InsufficientChange { missing: Money },

    /// The register session is already closed.
    #[error("Cash session {session_id} is closed")]
    SessionClosed { session_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a MalformedBreakdown error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        CoreError::MalformedBreakdown {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::Overdraw {
            denomination: Denomination::Peso20,
            available: 1,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Cannot take 3 x $20 coin from the drawer: only 1 held"
        );

        let err = CoreError::InsufficientTender {
            due: Money::from_cents(12_550),
            tendered: Money::from_pesos(100),
        };
        assert_eq!(
            err.to_string(),
            "Tendered $100.00 does not cover amount due $125.50"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "register_id".to_string(),
        };
        assert_eq!(err.to_string(), "register_id is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "amount due".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
