//! `CouponStore` implementation backed by [`Database`].

use async_trait::async_trait;

use crate::pool::Database;
use coupon_core::{ApplicabilityFilter, Coupon, CouponStore, StoreError, StoreResult, UsageGrant};

#[async_trait]
impl CouponStore for Database {
    async fn insert_coupon(&self, coupon: &Coupon) -> StoreResult<()> {
        Ok(self.coupons().insert(coupon).await?)
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Coupon>> {
        Ok(self.coupons().find_by_code(code).await?)
    }

    async fn user_usage(&self, user_id: &str, coupon_id: &str) -> StoreResult<u32> {
        Ok(self.usage().user_usage(user_id, coupon_id).await?)
    }

    async fn record_usage(&self, coupon_id: &str, user_id: &str) -> StoreResult<UsageGrant> {
        Ok(self.usage().record_usage(coupon_id, user_id).await?)
    }

    async fn list_candidates(&self, filter: &ApplicabilityFilter) -> StoreResult<Vec<Coupon>> {
        Ok(self.coupons().list_candidates(filter).await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.health_check().await {
            Ok(())
        } else {
            Err(StoreError::Unavailable("database did not answer SELECT 1".to_string()))
        }
    }
}
