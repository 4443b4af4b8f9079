//! Shared fixtures for database tests.

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use crate::{Database, DbConfig};
use coupon_core::{Coupon, Discount, DiscountRate, Money, UsageType};

pub(crate) async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// File-backed database with a real multi-connection pool. Keep the
/// `TempDir` alive for as long as the database is used.
pub(crate) async fn file_db(max_connections: u32) -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig::new(dir.path().join("coupons.db")).max_connections(max_connections);
    let db = Database::new(config).await.unwrap();
    (dir, db)
}

/// Untargeted, uncapped 10% coupon expiring in 2030.
pub(crate) fn coupon(code: &str) -> Coupon {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Coupon {
        id: format!("id-{code}"),
        code: code.to_string(),
        expires_at: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        usage_type: UsageType::MultiUse,
        min_order_value: Money::zero(),
        valid_from: None,
        valid_until: None,
        terms_and_conditions: String::new(),
        discount: Discount::Percentage(DiscountRate::from_percent(10)),
        max_usage_per_user: 0,
        max_total_usage: 0,
        current_total_usage: 0,
        applicable_item_ids: Default::default(),
        applicable_categories: Default::default(),
        created_at: created,
        updated_at: created,
    }
}
