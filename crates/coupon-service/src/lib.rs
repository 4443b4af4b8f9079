//! # coupon-service: Coupon Eligibility & Validation Service
//!
//! Ties the pure rules in `coupon-core` to a [`coupon_core::CouponStore`].
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Request layer (external)                                              │
//! │       │  create_coupon / validate_coupon / get_applicable_coupons      │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 coupon-service (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐   │   │
//! │  │   │ CouponService│──►│ TtlLruCache  │   │  ServiceConfig   │   │   │
//! │  │   │ (service.rs) │   │ coupons +    │   │  COUPON_* env    │   │   │
//! │  │   │              │   │ listings     │   │                  │   │   │
//! │  │   └──────┬───────┘   └──────────────┘   └──────────────────┘   │   │
//! │  │          │ every call bounded by storage_timeout                │   │
//! │  └──────────┼──────────────────────────────────────────────────────┘   │
//! │             ▼                                                           │
//! │  CouponStore (coupon-db::Database in production)                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use coupon_db::{Database, DbConfig};
//! use coupon_service::CouponService;
//!
//! let db = Database::new(DbConfig::new("./coupons.db")).await?;
//! let service = CouponService::from_env(db)?;
//!
//! let outcome = service
//!     .validate_coupon("user-42", "WELCOME10", &cart, Utc::now())
//!     .await?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod service;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, ServiceConfig};
pub use error::{ServiceError, ServiceResult};
pub use service::CouponService;
