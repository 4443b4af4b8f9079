//! # Storage Port
//!
//! The interface the coupon service calls for persistence. This crate only
//! declares it; `coupon-db` provides the SQLite implementation.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation          Absent record         Concurrency                   │
//! │  ─────────          ─────────────         ───────────                   │
//! │  insert_coupon      n/a                   fails on duplicate code       │
//! │  find_by_code       Ok(None)              plain read                    │
//! │  user_usage         Ok(0)                 plain read                    │
//! │  record_usage       n/a                   ATOMIC: both counters, both   │
//! │                                           caps re-checked, one txn      │
//! │  list_candidates    empty Vec             plain read                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping any returned future must leave storage unchanged or fully
//! updated, never half-updated.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::money::Money;
use crate::types::Coupon;

/// Result of an atomic usage commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageGrant {
    /// Both counters were incremented.
    Granted,
    /// The coupon's global cap was already reached; nothing changed.
    TotalCapReached,
    /// The user's per-coupon cap was already reached; nothing changed.
    UserCapReached,
    /// The coupon no longer exists; nothing changed.
    CouponMissing,
}

/// Soft applicability criteria for listing coupons.
///
/// Implementations may push any subset of these into their query; the
/// service re-applies the complete rule chain to whatever is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicabilityFilter {
    pub user_id: String,
    pub order_total: Money,
    pub at: DateTime<Utc>,
    pub item_ids: Vec<String>,
    pub categories: Vec<String>,
}

/// Persistence operations needed by the coupon service.
#[async_trait]
pub trait CouponStore: Send + Sync {
    /// Persists a new coupon. Fails with `StoreError::Duplicate` when the
    /// code is taken.
    async fn insert_coupon(&self, coupon: &Coupon) -> StoreResult<()>;

    /// Looks a coupon up by its code.
    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Coupon>>;

    /// Times `user_id` has redeemed `coupon_id`; 0 when never.
    async fn user_usage(&self, user_id: &str, coupon_id: &str) -> StoreResult<u32>;

    /// Atomically increments the coupon's total usage and the user's usage,
    /// re-checking both caps against the stored counters.
    async fn record_usage(&self, coupon_id: &str, user_id: &str) -> StoreResult<UsageGrant>;

    /// Coupons that may be applicable under `filter`.
    async fn list_candidates(&self, filter: &ApplicabilityFilter) -> StoreResult<Vec<Coupon>>;

    /// Cheap liveness probe.
    async fn ping(&self) -> StoreResult<()>;
}
