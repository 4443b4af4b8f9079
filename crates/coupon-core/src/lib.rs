//! # coupon-core: Pure Business Logic for the Coupon Engine
//!
//! This crate decides whether a coupon applies to a cart and how much it
//! takes off. Everything here is a pure function of its inputs: the clock
//! is a parameter, storage is a trait.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Coupon Engine Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Request layer (HTTP, auth) - external                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                coupon-service (CouponService)                   │   │
//! │  │        cache ─► rules ─► discount ─► atomic usage commit        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ coupon-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌───────────┐ ┌───────┐ │   │
//! │  │   │  types  │ │  money  │ │  rules   │ │ discount  │ │ store │ │   │
//! │  │   │ Coupon  │ │ Money   │ │ Rule     │ │ calculate │ │ trait │ │   │
//! │  │   │ Cart    │ │ bps     │ │ CHAIN    │ │ scopes    │ │ only  │ │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └───────────┘ └───────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          coupon-db (SQLite implementation of the port)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Coupon, Cart, outcomes)
//! - [`money`] - Integer-cent money and basis-point rates
//! - [`error`] - Validation and storage error types
//! - [`validation`] - Coupon creation input checks
//! - [`rules`] - The eligibility validator chain
//! - [`discount`] - Discount calculators
//! - [`store`] - The storage port
//!
//! ## Example Usage
//!
//! ```rust
//! use coupon_core::money::{DiscountRate, Money};
//!
//! let total = Money::from_major(100);
//! let discount = total.percentage(DiscountRate::from_percent(10));
//! assert_eq!(discount.to_string(), "10.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod money;
pub mod rules;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{StoreError, StoreResult, ValidationError};
pub use money::{DiscountRate, Money};
pub use rules::{Rule, RuleViolation, UsageFacts};
pub use store::{ApplicabilityFilter, CouponStore, UsageGrant};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a coupon code.
pub const MAX_CODE_LENGTH: usize = 64;
