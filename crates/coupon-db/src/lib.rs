//! # coupon-db: SQLite Storage for the Coupon Engine
//!
//! This crate implements the [`coupon_core::CouponStore`] port on SQLite,
//! using sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Coupon Engine Data Flow                          │
//! │                                                                         │
//! │  CouponService (coupon-service)                                        │
//! │       │  via CouponStore trait                                          │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    coupon-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CouponRepo    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ UsageRepo     │    │ 001_init.sql │  │   │
//! │  │   │ WAL + busy    │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              SQLite Database (./coupons.db)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded schema migrations
//! - [`repository`] - Coupon and usage repositories
//! - [`error`] - Database error types
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use coupon_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./coupons.db")).await?;
//! let coupon = db.coupons().find_by_code("WELCOME10").await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
mod store;

#[cfg(test)]
mod test_support;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::coupon::CouponRepository;
pub use repository::usage::UsageRepository;
