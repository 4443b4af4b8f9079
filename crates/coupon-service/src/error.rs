//! # Service Error Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Source                          ServiceError                          │
//! │  ──────                          ────────────                          │
//! │  ValidationError (bad input)  ─► Validation                            │
//! │  StoreError::Duplicate        ─► DuplicateCode                         │
//! │  other StoreError             ─► Storage                               │
//! │  deadline elapsed             ─► Timeout                               │
//! │  bad environment value        ─► Config                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An unknown code or a failed rule is a [`coupon_core::ValidationOutcome`],
//! never an error.

use coupon_core::{StoreError, ValidationError};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The coupon draft or the cart was malformed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A coupon with this code already exists.
    #[error("Coupon code already exists: {0}")]
    DuplicateCode(String),

    /// The storage port failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// A storage call did not finish within the configured deadline.
    #[error("Storage call '{operation}' timed out after {after_ms}ms")]
    Timeout { operation: &'static str, after_ms: u64 },

    /// Service configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
