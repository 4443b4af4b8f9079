//! # Coupon Repository
//!
//! Database operations for coupons.
//!
//! ## Row Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  coupons row                         Coupon                            │
//! │  ───────────                         ──────                            │
//! │  min_order_value_cents INTEGER  ──►  min_order_value: Money            │
//! │  discount_type + discount_value ──►  discount: Discount                │
//! │  caps / counters INTEGER        ──►  u32 (negative = corrupt row)      │
//! │  applicable_* TEXT (JSON array) ──►  BTreeSet<String>                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Counters are never written here; see [`super::usage::UsageRepository`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use coupon_core::{ApplicabilityFilter, Coupon, Discount, DiscountKind, Money, UsageType};

/// Columns selected for every coupon query, in `CouponRow` order.
const COUPON_COLUMNS: &str = r#"
    c.id,
    c.code,
    c.expires_at,
    c.usage_type,
    c.min_order_value_cents,
    c.valid_from,
    c.valid_until,
    c.terms_and_conditions,
    c.discount_type,
    c.discount_value,
    c.max_usage_per_user,
    c.max_total_usage,
    c.current_total_usage,
    c.applicable_item_ids,
    c.applicable_categories,
    c.created_at,
    c.updated_at
"#;

/// Raw `coupons` row.
#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: String,
    code: String,
    expires_at: DateTime<Utc>,
    usage_type: UsageType,
    min_order_value_cents: i64,
    valid_from: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
    terms_and_conditions: String,
    discount_type: DiscountKind,
    discount_value: i64,
    max_usage_per_user: i64,
    max_total_usage: i64,
    current_total_usage: i64,
    applicable_item_ids: String,
    applicable_categories: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CouponRow {
    fn counter(&self, column: &str, value: i64) -> DbResult<u32> {
        u32::try_from(value).map_err(|_| {
            DbError::corrupt("coupon", &self.id, format!("{column} out of range: {value}"))
        })
    }

    fn targets(&self, column: &str, json: &str) -> DbResult<BTreeSet<String>> {
        serde_json::from_str(json)
            .map_err(|e| DbError::corrupt("coupon", &self.id, format!("{column}: {e}")))
    }
}

impl TryFrom<CouponRow> for Coupon {
    type Error = DbError;

    fn try_from(row: CouponRow) -> DbResult<Self> {
        let discount = Discount::from_parts(row.discount_type, row.discount_value).ok_or_else(|| {
            DbError::corrupt(
                "coupon",
                &row.id,
                format!("invalid {} value {}", row.discount_type, row.discount_value),
            )
        })?;

        let max_usage_per_user = row.counter("max_usage_per_user", row.max_usage_per_user)?;
        let max_total_usage = row.counter("max_total_usage", row.max_total_usage)?;
        let current_total_usage = row.counter("current_total_usage", row.current_total_usage)?;
        let applicable_item_ids = row.targets("applicable_item_ids", &row.applicable_item_ids)?;
        let applicable_categories =
            row.targets("applicable_categories", &row.applicable_categories)?;

        Ok(Coupon {
            id: row.id,
            code: row.code,
            expires_at: row.expires_at,
            usage_type: row.usage_type,
            min_order_value: Money::from_cents(row.min_order_value_cents),
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            terms_and_conditions: row.terms_and_conditions,
            discount,
            max_usage_per_user,
            max_total_usage,
            current_total_usage,
            applicable_item_ids,
            applicable_categories,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn encode_targets(coupon: &Coupon, targets: &BTreeSet<String>) -> DbResult<String> {
    serde_json::to_string(targets)
        .map_err(|e| DbError::Internal(format!("encoding targets of coupon {}: {e}", coupon.code)))
}

/// Repository for coupon database operations.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Inserts a new coupon.
    ///
    /// ## Returns
    /// * `Ok(())` - Coupon stored
    /// * `Err(DbError::UniqueViolation)` - Code (or id) already exists
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        debug!(code = %coupon.code, "Inserting coupon");

        let item_ids = encode_targets(coupon, &coupon.applicable_item_ids)?;
        let categories = encode_targets(coupon, &coupon.applicable_categories)?;

        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, expires_at, usage_type, min_order_value_cents,
                valid_from, valid_until, terms_and_conditions,
                discount_type, discount_value,
                max_usage_per_user, max_total_usage, current_total_usage,
                applicable_item_ids, applicable_categories,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10,
                ?11, ?12, ?13,
                ?14, ?15,
                ?16, ?17
            )
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(coupon.expires_at)
        .bind(coupon.usage_type)
        .bind(coupon.min_order_value.cents())
        .bind(coupon.valid_from)
        .bind(coupon.valid_until)
        .bind(&coupon.terms_and_conditions)
        .bind(coupon.discount.kind())
        .bind(coupon.discount.raw_value())
        .bind(i64::from(coupon.max_usage_per_user))
        .bind(i64::from(coupon.max_total_usage))
        .bind(i64::from(coupon.current_total_usage))
        .bind(item_ids)
        .bind(categories)
        .bind(coupon.created_at)
        .bind(coupon.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                let value = if field == "id" { &coupon.id } else { &coupon.code };
                DbError::duplicate(field, value.as_str())
            }
            other => other,
        })?;

        Ok(())
    }

    /// Gets a coupon by its code.
    ///
    /// ## Returns
    /// * `Ok(Some(Coupon))` - Coupon found
    /// * `Ok(None)` - No coupon with that code
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons c WHERE c.code = ?1");

        let row: Option<CouponRow> = sqlx::query_as(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Coupon::try_from).transpose()
    }

    /// Lists coupons that may apply under `filter`.
    ///
    /// ## Pushed Into SQL
    /// - minimum order value
    /// - global cap not yet reached
    /// - per-user cap not yet reached (LEFT JOIN on the user's usage row)
    ///
    /// Expiry, the time window and targeting are left to the rule chain,
    /// which the caller runs on every returned coupon.
    pub async fn list_candidates(&self, filter: &ApplicabilityFilter) -> DbResult<Vec<Coupon>> {
        debug!(
            user_id = %filter.user_id,
            order_total = %filter.order_total,
            "Listing candidate coupons"
        );

        let sql = format!(
            r#"
            SELECT {COUPON_COLUMNS}
            FROM coupons c
            LEFT JOIN user_coupon_usages u
                ON u.coupon_id = c.id AND u.user_id = ?1
            WHERE c.min_order_value_cents <= ?2
              AND (c.max_total_usage = 0 OR c.current_total_usage < c.max_total_usage)
              AND (c.max_usage_per_user = 0 OR COALESCE(u.times_used, 0) < c.max_usage_per_user)
            ORDER BY c.code
            "#
        );

        let rows: Vec<CouponRow> = sqlx::query_as(&sql)
            .bind(&filter.user_id)
            .bind(filter.order_total.cents())
            .fetch_all(&self.pool)
            .await?;

        let coupons = rows
            .into_iter()
            .map(Coupon::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = coupons.len(), "Candidate coupons loaded");
        Ok(coupons)
    }

    /// Counts stored coupons (for diagnostics and the seeder).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coupons")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
