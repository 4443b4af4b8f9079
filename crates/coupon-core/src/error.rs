//! # Error Types
//!
//! Domain-specific error types for coupon-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  coupon-core errors (this file)                                        │
//! │  ├── ValidationError  - Malformed coupon drafts and carts              │
//! │  └── StoreError       - Storage port failures                          │
//! │                                                                         │
//! │  coupon-core outcomes (NOT errors, see rules.rs)                       │
//! │  └── RuleViolation    - Expired, below minimum, cap reached, ...       │
//! │                                                                         │
//! │  coupon-db errors                                                      │
//! │  └── DbError          - SQLite failures, converted into StoreError     │
//! │                                                                         │
//! │  coupon-service errors                                                 │
//! │  └── ServiceError     - What the request layer sees                    │
//! │                                                                         │
//! │  Flow: DbError → StoreError → ServiceError → request layer             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, code, ...)
//! 3. Errors are enum variants, never String
//! 4. A coupon failing a rule is an outcome, never an error

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Coupon creation and cart input errors.
///
/// Reported synchronously to the caller and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
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

    /// Value must be greater than zero.
    #[error("{field} must be greater than 0")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Amount does not fit in the money range.
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Invalid format or inconsistent combination of fields.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required { field: field.into() }
    }
}

// =============================================================================
// Store Error
// =============================================================================

/// Failures reported by a [`crate::store::CouponStore`] implementation.
///
/// There is no "not found" variant: lookups return `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Unique key already taken (e.g. coupon code).
    #[error("Duplicate {field}: '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Storage could not be reached (connection, pool exhausted, closed).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A transaction could not be committed (lock contention exhausted).
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// A stored record could not be decoded into the domain model.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Any other storage failure.
    #[error("Storage error: {0}")]
    Internal(String),
}

/// Result type for storage port operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
