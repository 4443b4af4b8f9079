//! Shared fixtures for service tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use coupon_core::{
    ApplicabilityFilter, Coupon, CouponDraft, CouponStore, Discount, Money, StoreError,
    StoreResult, UsageGrant, UsageType,
};
use coupon_db::{Database, DbConfig};

use crate::config::ServiceConfig;
use crate::service::CouponService;

pub(crate) fn ts(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

/// Request timestamp used by most tests.
pub(crate) fn at() -> DateTime<Utc> {
    ts(2025, 6, 1, 12)
}

/// Untargeted, uncapped draft expiring in 2030.
pub(crate) fn draft(code: &str, discount: Discount) -> CouponDraft {
    CouponDraft {
        code: code.to_string(),
        expires_at: Some(ts(2030, 1, 1, 0)),
        discount: Some(discount),
        ..Default::default()
    }
}

pub(crate) async fn memory_service() -> CouponService<Database> {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    CouponService::new(db, ServiceConfig::default())
}

/// Service over a file database with a multi-connection pool, for tests
/// that need real write contention.
pub(crate) async fn file_service() -> (TempDir, CouponService<Database>) {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig::new(dir.path().join("coupons.db")).max_connections(8);
    let db = Database::new(config).await.unwrap();
    (dir, CouponService::new(db, ServiceConfig::default()))
}

pub(crate) fn stub_coupon(code: &str) -> Coupon {
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
        discount: Discount::FixedAmount(Money::from_major(1)),
        max_usage_per_user: 0,
        max_total_usage: 0,
        current_total_usage: 0,
        applicable_item_ids: Default::default(),
        applicable_categories: Default::default(),
        created_at: created,
        updated_at: created,
    }
}

/// Single-coupon store with scriptable failures.
#[derive(Debug)]
pub(crate) struct StubStore {
    coupon: Coupon,
    grant: UsageGrant,
    fail_commit: bool,
    fail_usage_lookup: bool,
    delay: Option<Duration>,
    list_calls: AtomicUsize,
}

impl StubStore {
    pub(crate) fn with_coupon(coupon: Coupon) -> Self {
        StubStore {
            coupon,
            grant: UsageGrant::Granted,
            fail_commit: false,
            fail_usage_lookup: false,
            delay: None,
            list_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn grant(mut self, grant: UsageGrant) -> Self {
        self.grant = grant;
        self
    }

    pub(crate) fn fail_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub(crate) fn fail_usage_lookup(mut self) -> Self {
        self.fail_usage_lookup = true;
        self
    }

    pub(crate) fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn unavailable() -> StoreError {
        StoreError::Unavailable("stub store offline".to_string())
    }
}

#[async_trait]
impl CouponStore for StubStore {
    async fn insert_coupon(&self, coupon: &Coupon) -> StoreResult<()> {
        Err(StoreError::Duplicate {
            field: "code".to_string(),
            value: coupon.code.clone(),
        })
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Coupon>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok((code == self.coupon.code).then(|| self.coupon.clone()))
    }

    async fn user_usage(&self, _user_id: &str, _coupon_id: &str) -> StoreResult<u32> {
        if self.fail_usage_lookup {
            return Err(Self::unavailable());
        }
        Ok(0)
    }

    async fn record_usage(&self, _coupon_id: &str, _user_id: &str) -> StoreResult<UsageGrant> {
        if self.fail_commit {
            return Err(Self::unavailable());
        }
        Ok(self.grant)
    }

    async fn list_candidates(&self, _filter: &ApplicabilityFilter) -> StoreResult<Vec<Coupon>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.coupon.clone()])
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
