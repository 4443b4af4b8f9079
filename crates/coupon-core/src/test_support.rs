//! Shared fixtures for unit tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::money::{DiscountRate, Money};
use crate::types::{Coupon, Discount, UsageType};

pub(crate) fn ts(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

/// Untargeted, uncapped 10% coupon expiring in 2030.
pub(crate) fn coupon(code: &str) -> Coupon {
    let created = ts(2024, 1, 1, 0);
    Coupon {
        id: format!("id-{code}"),
        code: code.to_string(),
        expires_at: ts(2030, 1, 1, 0),
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
