//! # Usage Repository
//!
//! Per-user usage lookups and the atomic usage commit.
//!
//! ## Commit Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    record_usage (one transaction)                       │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  UPDATE coupons SET current_total_usage + 1                             │
//! │   WHERE id = ? AND (max_total_usage = 0                                 │
//! │                     OR current_total_usage < max_total_usage)          │
//! │    │                                                                    │
//! │    ├── 0 rows ──► ROLLBACK ──► TotalCapReached (or CouponMissing)       │
//! │    ▼            (this statement took the write lock; later ones         │
//! │                  see every earlier commit)                              │
//! │  INSERT user row times_used = 1                                         │
//! │    ON CONFLICT DO UPDATE times_used + 1                                 │
//! │    WHERE cap = 0 OR times_used < cap                                    │
//! │    │                                                                    │
//! │    ├── 0 rows ──► ROLLBACK ──► UserCapReached                           │
//! │    ▼                                                                    │
//! │  COMMIT ──► Granted                                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A transaction dropped before `COMMIT` (cancelled future, timeout) is
//! rolled back by sqlx, so the two counters always move together.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use coupon_core::{UsageGrant, UserCouponUsage};

/// Repository for `user_coupon_usages` and coupon counters.
#[derive(Debug, Clone)]
pub struct UsageRepository {
    pool: SqlitePool,
}

impl UsageRepository {
    /// Creates a new UsageRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UsageRepository { pool }
    }

    /// Times `user_id` has redeemed `coupon_id`; 0 when there is no row.
    pub async fn user_usage(&self, user_id: &str, coupon_id: &str) -> DbResult<u32> {
        let times_used: Option<i64> = sqlx::query_scalar(
            "SELECT times_used FROM user_coupon_usages WHERE user_id = ?1 AND coupon_id = ?2",
        )
        .bind(user_id)
        .bind(coupon_id)
        .fetch_optional(&self.pool)
        .await?;

        match times_used {
            None => Ok(0),
            Some(n) => u32::try_from(n).map_err(|_| {
                DbError::corrupt(
                    "user_coupon_usage",
                    format!("{user_id}/{coupon_id}"),
                    format!("times_used {n}"),
                )
            }),
        }
    }

    /// Full usage row, if any.
    pub async fn get(&self, user_id: &str, coupon_id: &str) -> DbResult<Option<UserCouponUsage>> {
        let row = sqlx::query_as::<_, UserCouponUsage>(
            r#"
            SELECT user_id, coupon_id, times_used
            FROM user_coupon_usages
            WHERE user_id = ?1 AND coupon_id = ?2
            "#,
        )
        .bind(user_id)
        .bind(coupon_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Atomically records one redemption of `coupon_id` by `user_id`.
    ///
    /// Both caps are re-checked against the stored counters inside the
    /// transaction, so concurrent callers can never push either counter
    /// past its cap.
    pub async fn record_usage(&self, coupon_id: &str, user_id: &str) -> DbResult<UsageGrant> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query(
            r#"
            UPDATE coupons
            SET current_total_usage = current_total_usage + 1,
                updated_at = ?2
            WHERE id = ?1
              AND (max_total_usage = 0 OR current_total_usage < max_total_usage)
            "#,
        )
        .bind(coupon_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if bumped.rows_affected() == 0 {
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM coupons WHERE id = ?1")
                .bind(coupon_id)
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await?;

            let grant = if exists.is_some() {
                UsageGrant::TotalCapReached
            } else {
                UsageGrant::CouponMissing
            };
            warn!(coupon_id = %coupon_id, user_id = %user_id, ?grant, "Usage commit refused");
            return Ok(grant);
        }

        let per_user_cap: i64 =
            sqlx::query_scalar("SELECT max_usage_per_user FROM coupons WHERE id = ?1")
                .bind(coupon_id)
                .fetch_one(&mut *tx)
                .await?;

        let upserted = sqlx::query(
            r#"
            INSERT INTO user_coupon_usages (user_id, coupon_id, times_used, created_at, updated_at)
            VALUES (?1, ?2, 1, ?3, ?3)
            ON CONFLICT (user_id, coupon_id) DO UPDATE
            SET times_used = times_used + 1,
                updated_at = excluded.updated_at
            WHERE ?4 = 0 OR user_coupon_usages.times_used < ?4
            "#,
        )
        .bind(user_id)
        .bind(coupon_id)
        .bind(now)
        .bind(per_user_cap)
        .execute(&mut *tx)
        .await?;

        if upserted.rows_affected() == 0 {
            tx.rollback().await?;
            warn!(coupon_id = %coupon_id, user_id = %user_id, "Usage commit refused: per-user cap");
            return Ok(UsageGrant::UserCapReached);
        }

        tx.commit().await?;

        debug!(coupon_id = %coupon_id, user_id = %user_id, "Usage recorded");
        Ok(UsageGrant::Granted)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
