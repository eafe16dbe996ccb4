//! # Validation Module
//!
//! Input validation for values entering the cash drawer engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  └── Immediate cashier feedback                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Deserialization (CashBreakdown::try_from)                    │
//! │  └── All 17 slots present, face values and totals consistent           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: THIS MODULE                                                  │
//! │  └── Amounts, counts, identifiers                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  └── CHECK / UNIQUE constraints                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_SLOT_COUNT;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a unit count for one denomination slot.
///
/// ## Rules
/// - Must not exceed MAX_SLOT_COUNT
///
/// ## Example
/// ```rust
/// use caja_core::validation::validate_slot_count;
///
/// assert!(validate_slot_count("coins.peso1", 250).is_ok());
/// assert!(validate_slot_count("coins.peso1", 5_000_000).is_err());
/// ```
pub fn validate_slot_count(field: &str, count: u32) -> ValidationResult<()> {
    if count > MAX_SLOT_COUNT {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::from(MAX_SLOT_COUNT),
        });
    }

    Ok(())
}

/// Validates the amount due on a cash sale.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_amount_due(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount due".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a register identifier ("caja-1", "SUC2_CAJA3").
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - Letters, digits, hyphens, underscores only
///
/// ## Example
/// ```rust
/// use caja_core::validation::validate_register_id;
///
/// assert!(validate_register_id("caja-1").is_ok());
/// assert!(validate_register_id("").is_err());
/// assert!(validate_register_id("caja 1").is_err());
/// ```
pub fn validate_register_id(register_id: &str) -> ValidationResult<()> {
    let register_id = register_id.trim();

    if register_id.is_empty() {
        return Err(ValidationError::Required {
            field: "register_id".to_string(),
        });
    }

    if register_id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "register_id".to_string(),
            max: 64,
        });
    }

    if !register_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "register_id".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use caja_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
