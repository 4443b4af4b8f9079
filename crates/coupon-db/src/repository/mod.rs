//! # Repository Module
//!
//! Database repository implementations for the coupon store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  CouponService ──► CouponStore (trait, coupon-core)                    │
//! │                         │                                               │
//! │                         ▼                                               │
//! │                    Database (store.rs)                                 │
//! │                    ├── db.coupons()  → CouponRepository                │
//! │                    │     insert / find_by_code / list_candidates       │
//! │                    └── db.usage()    → UsageRepository                 │
//! │                          user_usage / record_usage                     │
//! │                         │                                               │
//! │                         ▼                                               │
//! │                    SQLite Database                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CouponRepository`](coupon::CouponRepository) - Coupon definitions
//! - [`UsageRepository`](usage::UsageRepository) - Usage counters and commits

pub mod coupon;
pub mod usage;
