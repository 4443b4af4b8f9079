//! # Coupon Service
//!
//! Orchestrates lookups, the rule chain, discount calculation and the usage
//! commit on top of any [`CouponStore`].
//!
//! ## validate_coupon
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  code ──► coupon cache ──miss──► store.find_by_code ──► cache.insert   │
//! │               │                        │                                │
//! │               │                        └── None ──► "Coupon not found" │
//! │               ▼                                                         │
//! │  Rule::CHAIN  expiry → window → min order → targeting → per-user → total│
//! │               │            (per-user count fetched only when needed)   │
//! │               └── first violation ──► invalid outcome, nothing written │
//! │               ▼                                                         │
//! │  discount::calculate                                                    │
//! │               ▼                                                         │
//! │  store.record_usage  (atomic, re-checks both caps)                     │
//! │               ├── cap reached ──► invalid outcome with the cap reason  │
//! │               ▼                                                         │
//! │  invalidate coupon entry + listings for this user / coupon             │
//! │               ▼                                                         │
//! │  "Coupon applied successfully" + breakdown                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cached coupon snapshots only ever lag behind storage on usage counters,
//! so a stale snapshot can let a request reach the commit but can never
//! reject one that storage would accept.

use std::future::Future;

use chrono::{DateTime, Utc};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use coupon_core::discount;
use coupon_core::validation::{build_coupon, validate_cart};
use coupon_core::{
    ApplicabilityFilter, ApplicableCoupon, Cart, Coupon, CouponDraft, CouponStore, Rule,
    RuleViolation, StoreError, StoreResult, UsageFacts, UsageGrant, ValidationOutcome,
};

use crate::cache::TtlLruCache;
use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::fingerprint;

/// Coupon eligibility and validation service.
///
/// All operations take `&self` and may run concurrently; share the service
/// behind an `Arc`.
#[derive(Debug)]
pub struct CouponService<S> {
    store: S,
    config: ServiceConfig,
    coupons: TtlLruCache<Coupon>,
    listings: TtlLruCache<Vec<ApplicableCoupon>>,
}

impl<S: CouponStore> CouponService<S> {
    pub fn new(store: S, config: ServiceConfig) -> Self {
        info!(
            cache_size = config.cache_size,
            listing_cache_size = config.listing_cache_size,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            storage_timeout_ms = config.storage_timeout.as_millis() as u64,
            "Coupon service initialised"
        );

        CouponService {
            coupons: TtlLruCache::new(config.cache_size, config.cache_ttl),
            listings: TtlLruCache::new(config.listing_cache_size, config.cache_ttl),
            store,
            config,
        }
    }

    /// Builds the service from `COUPON_*` environment variables.
    pub fn from_env(store: S) -> ServiceResult<Self> {
        Ok(Self::new(store, ServiceConfig::from_env()?))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Validates `draft`, assigns a fresh id and persists the coupon.
    pub async fn create_coupon(&self, draft: CouponDraft) -> ServiceResult<Coupon> {
        let coupon = build_coupon(draft, Uuid::new_v4().to_string(), Utc::now())?;

        match self
            .bounded("insert_coupon", self.store.insert_coupon(&coupon))
            .await
        {
            Ok(()) => {}
            Err(ServiceError::Storage(StoreError::Duplicate { .. })) => {
                warn!(code = %coupon.code, "Rejected duplicate coupon code");
                return Err(ServiceError::DuplicateCode(coupon.code));
            }
            Err(e) => return Err(e),
        }

        // A new coupon can show up in anyone's listing.
        self.listings.clear();

        info!(code = %coupon.code, id = %coupon.id, "Coupon created");
        Ok(coupon)
    }

    /// Looks a coupon up by code, through the cache.
    pub async fn get_coupon(&self, code: &str) -> ServiceResult<Option<Coupon>> {
        self.resolve(code.trim()).await
    }

    /// Checks `code` against `cart` for `user_id` and, when every rule
    /// passes, records the redemption.
    ///
    /// A malformed cart or a storage failure is an `Err`; an unknown code or
    /// a failed rule is an invalid [`ValidationOutcome`].
    pub async fn validate_coupon(
        &self,
        user_id: &str,
        code: &str,
        cart: &Cart,
        at: DateTime<Utc>,
    ) -> ServiceResult<ValidationOutcome> {
        let code = code.trim();
        debug!(user_id, code, order_total = %cart.order_total, "Validating coupon");
        validate_cart(cart)?;

        let Some(coupon) = self.resolve(code).await? else {
            debug!(code, "Coupon not found");
            return Ok(ValidationOutcome::not_found());
        };

        if let Err(violation) = self.check_rules(&coupon, user_id, cart, at).await? {
            debug!(code, reason = %violation, "Coupon rejected");
            return Ok(ValidationOutcome::rejected(violation.reason()));
        }

        let breakdown = discount::calculate(&coupon, cart);

        let committed = self
            .bounded("record_usage", self.store.record_usage(&coupon.id, user_id))
            .await;

        // Whatever the outcome, the cached counters may now be behind storage.
        self.coupons.remove(&coupon.code);

        let grant = match committed {
            Ok(grant) => grant,
            Err(e) => {
                // A timed-out commit may still have landed.
                self.invalidate_listings(user_id, &coupon.code);
                return Err(e);
            }
        };

        let violation = match grant {
            UsageGrant::Granted => {
                self.invalidate_listings(user_id, &coupon.code);
                info!(
                    user_id,
                    code,
                    discount = %breakdown.total_discount,
                    "Coupon applied"
                );
                return Ok(ValidationOutcome::applied(breakdown));
            }
            UsageGrant::CouponMissing => return Ok(ValidationOutcome::not_found()),
            UsageGrant::TotalCapReached => RuleViolation::TotalCapReached,
            UsageGrant::UserCapReached => RuleViolation::UserCapReached,
        };

        warn!(user_id, code, reason = %violation, "Usage commit lost a race");
        Ok(ValidationOutcome::rejected(violation.reason()))
    }

    /// Lists every coupon that would currently apply to `cart` for
    /// `user_id`, with the discount each would grant. Changes nothing.
    pub async fn get_applicable_coupons(
        &self,
        user_id: &str,
        cart: &Cart,
        at: DateTime<Utc>,
    ) -> ServiceResult<Vec<ApplicableCoupon>> {
        validate_cart(cart)?;

        let key = match fingerprint::listing_key(user_id, cart, at) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(error = %e, "Could not fingerprint listing request; skipping cache");
                None
            }
        };

        if let Some(cached) = key.as_deref().and_then(|k| self.listings.get(k)) {
            debug!(user_id, count = cached.len(), "Applicable coupons served from cache");
            return Ok(cached);
        }

        let filter = ApplicabilityFilter {
            user_id: user_id.to_string(),
            order_total: cart.order_total,
            at,
            item_ids: cart.item_ids().map(str::to_string).collect(),
            categories: cart.categories().map(str::to_string).collect(),
        };

        let candidates = self
            .bounded("list_candidates", self.store.list_candidates(&filter))
            .await?;
        let candidate_count = candidates.len();

        let mut applicable = Vec::new();
        for coupon in candidates {
            if let Err(violation) = self.check_rules(&coupon, user_id, cart, at).await? {
                debug!(code = %coupon.code, reason = %violation, "Candidate filtered out");
                continue;
            }

            let breakdown = discount::calculate(&coupon, cart);
            applicable.push(ApplicableCoupon {
                code: coupon.code,
                discount: coupon.discount,
                computed_discount: breakdown.total_discount,
            });
        }

        debug!(
            user_id,
            candidates = candidate_count,
            applicable = applicable.len(),
            "Applicable coupons computed"
        );

        if let Some(key) = key {
            let tags = std::iter::once(fingerprint::user_tag(user_id))
                .chain(applicable.iter().map(|c| fingerprint::coupon_tag(&c.code)))
                .collect::<Vec<_>>();
            self.listings.insert_tagged(key, applicable.clone(), tags);
        }

        Ok(applicable)
    }

    /// Verifies storage answers within the deadline.
    pub async fn health_check(&self) -> ServiceResult<()> {
        self.bounded("ping", self.store.ping()).await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn resolve(&self, code: &str) -> ServiceResult<Option<Coupon>> {
        if let Some(coupon) = self.coupons.get(code) {
            debug!(code, "Coupon cache hit");
            return Ok(Some(coupon));
        }

        let found = self
            .bounded("find_by_code", self.store.find_by_code(code))
            .await?;

        if let Some(coupon) = &found {
            self.coupons.insert(coupon.code.clone(), coupon.clone());
        }
        Ok(found)
    }

    fn invalidate_listings(&self, user_id: &str, code: &str) {
        self.listings.invalidate_by_tag(&fingerprint::user_tag(user_id));
        self.listings.invalidate_by_tag(&fingerprint::coupon_tag(code));
    }

    /// Runs [`Rule::CHAIN`] in order, stopping at the first violation.
    ///
    /// The outer `Result` carries storage failures, the inner one the rule
    /// verdict.
    async fn check_rules(
        &self,
        coupon: &Coupon,
        user_id: &str,
        cart: &Cart,
        at: DateTime<Utc>,
    ) -> ServiceResult<Result<(), RuleViolation>> {
        let mut usage = UsageFacts::default();

        for rule in Rule::CHAIN {
            if usage.user_times_used.is_none() && rule.needs_user_usage(coupon) {
                let times_used = self
                    .bounded("user_usage", self.store.user_usage(user_id, &coupon.id))
                    .await?;
                usage = UsageFacts::with_user_usage(times_used);
            }

            if let Err(violation) = rule.check(coupon, cart, at, &usage) {
                debug!(code = %coupon.code, rule = rule.name(), "Rule failed");
                return Ok(Err(violation));
            }
        }

        Ok(Ok(()))
    }

    /// Applies the configured storage deadline to `call`.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> ServiceResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match timeout(self.config.storage_timeout, call).await {
            Ok(result) => result.map_err(ServiceError::from),
            Err(_) => {
                let after_ms = self.config.storage_timeout.as_millis() as u64;
                warn!(operation, after_ms, "Storage call timed out");
                Err(ServiceError::Timeout { operation, after_ms })
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use coupon_core::{CartItem, Discount, DiscountRate, DiscountScope, Money, ValidationError};
    use std::sync::Arc;
    use std::time::Duration;

    // -------------------------------------------------------------------------
    // Scenarios
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_welcome10_applies_once_per_user() {
        let service = memory_service().await;
        let mut draft = draft("WELCOME10", Discount::Percentage(DiscountRate::from_percent(10)));
        draft.min_order_value = Money::from_major(50);
        draft.max_total_usage = 1000;
        draft.max_usage_per_user = 1;
        service.create_coupon(draft).await.unwrap();

        let cart = Cart::new(vec![], Money::from_major(100));

        let first = service.validate_coupon("alice", "WELCOME10", &cart, at()).await.unwrap();
        assert!(first.is_valid);
        assert_eq!(first.message, "Coupon applied successfully");
        let breakdown = first.discount.unwrap();
        assert_eq!(breakdown.total_discount, Money::from_major(10));
        assert_eq!(breakdown.total_discount.to_string(), "10.00");

        let second = service.validate_coupon("alice", "WELCOME10", &cart, at()).await.unwrap();
        assert!(!second.is_valid);
        assert_eq!(second.message, "maximum usage per user exceeded");
        assert!(second.discount.is_none());

        let bob = service.validate_coupon("bob", "WELCOME10", &cart, at()).await.unwrap();
        assert!(bob.is_valid);
    }

    #[tokio::test]
    async fn test_flat20_requires_minimum_order() {
        let service = memory_service().await;
        let mut draft = draft("FLAT20", Discount::FixedAmount(Money::from_major(20)));
        draft.min_order_value = Money::from_major(100);
        service.create_coupon(draft).await.unwrap();

        let cart = Cart::new(vec![], Money::from_major(50));
        let outcome = service.validate_coupon("alice", "FLAT20", &cart, at()).await.unwrap();

        assert!(!outcome.is_valid);
        assert_eq!(outcome.message, "minimum order value of 100.00 required");

        let stored = service.get_coupon("FLAT20").await.unwrap().unwrap();
        assert_eq!(stored.current_total_usage, 0);
    }

    #[tokio::test]
    async fn test_vitamins_coupon_excluded_from_painkiller_cart() {
        let service = memory_service().await;
        let mut vita = draft("VITA15", Discount::Percentage(DiscountRate::from_percent(15)));
        vita.applicable_categories = vec!["Vitamins".to_string()];
        service.create_coupon(vita).await.unwrap();
        service
            .create_coupon(draft("ALL5", Discount::FixedAmount(Money::from_major(5))))
            .await
            .unwrap();

        let painkillers = Cart::from_items(vec![CartItem::new(
            "ibu",
            "Painkillers",
            Money::from_major(80),
            1,
        )]);
        let listed = service.get_applicable_coupons("alice", &painkillers, at()).await.unwrap();
        let codes: Vec<_> = listed.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["ALL5"]);

        let mixed = Cart::from_items(vec![
            CartItem::new("ibu", "Painkillers", Money::from_major(80), 1),
            CartItem::new("vit-c", "Vitamins", Money::from_major(10), 2),
        ]);
        let listed = service.get_applicable_coupons("alice", &mixed, at()).await.unwrap();
        let vita = listed.iter().find(|c| c.code == "VITA15").unwrap();
        // 15% of the 20.00 of vitamins only.
        assert_eq!(vita.computed_discount, Money::from_major(3));
        assert_eq!(vita.discount, Discount::Percentage(DiscountRate::from_percent(15)));
    }

    #[tokio::test]
    async fn test_unknown_code_is_not_found_outcome() {
        let service = memory_service().await;
        let cart = Cart::new(vec![], Money::from_major(10));

        let outcome = service.validate_coupon("alice", "NOPE", &cart, at()).await.unwrap();
        assert!(!outcome.is_valid);
        assert_eq!(outcome.message, "Coupon not found");
    }

    #[tokio::test]
    async fn test_item_targeting_discount_and_reason() {
        let service = memory_service().await;
        let mut d = draft("MEDBUY", Discount::FixedAmount(Money::from_major(30)));
        d.applicable_item_ids = vec![" med1 ".to_string(), "".to_string()];
        service.create_coupon(d).await.unwrap();

        let miss = Cart::from_items(vec![CartItem::new(
            "med2",
            "Painkillers",
            Money::from_major(50),
            1,
        )]);
        let outcome = service.validate_coupon("alice", "MEDBUY", &miss, at()).await.unwrap();
        assert_eq!(outcome.message, "coupon not applicable to any items in the cart");

        let hit = Cart::from_items(vec![
            CartItem::new("med1", "Painkillers", Money::from_major(12), 2),
            CartItem::new("med2", "Painkillers", Money::from_major(50), 1),
        ]);
        let outcome = service.validate_coupon("alice", " MEDBUY ", &hit, at()).await.unwrap();
        let breakdown = outcome.discount.unwrap();
        assert_eq!(breakdown.scope, DiscountScope::Items);
        assert_eq!(breakdown.eligible_amount, Money::from_major(24));
        assert_eq!(breakdown.total_discount, Money::from_major(24));
    }

    #[tokio::test]
    async fn test_oversized_cart_is_rejected_before_storage() {
        let store = StubStore::with_coupon(stub_coupon("HUGE"));
        let service = CouponService::new(store, ServiceConfig::default());
        let huge = Money::from_cents(i64::MAX / 2);
        let cart = Cart::from_items(vec![CartItem::new("a", "Vitamins", huge, 3)]);

        let err = service
            .validate_coupon("alice", "HUGE", &cart, at())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::TooLarge { .. })));

        let err = service
            .get_applicable_coupons("alice", &cart, at())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::TooLarge { .. })));
        assert_eq!(service.store().list_calls(), 0);
    }

    // -------------------------------------------------------------------------
    // Time boundaries
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_time_window_is_inclusive_at_both_ends() {
        let service = memory_service().await;
        let start = ts(2025, 6, 1, 9);
        let end = ts(2025, 6, 1, 17);
        let mut d = draft("HAPPYHOUR", Discount::Percentage(DiscountRate::from_percent(5)));
        d.valid_from = Some(start);
        d.valid_until = Some(end);
        service.create_coupon(d).await.unwrap();

        let cart = Cart::new(vec![], Money::from_major(40));
        let check = |at: DateTime<Utc>| {
            let service = &service;
            let cart = &cart;
            async move { service.validate_coupon("alice", "HAPPYHOUR", cart, at).await.unwrap() }
        };

        let second = chrono::Duration::seconds(1);
        assert_eq!(check(start - second).await.message, "coupon is not yet valid");
        assert!(check(start).await.is_valid);
        assert!(check(end).await.is_valid);
        assert_eq!(check(end + second).await.message, "coupon is no longer valid");
    }

    #[tokio::test]
    async fn test_expiry_instant_itself_is_still_valid() {
        let service = memory_service().await;
        let mut d = draft("LASTDAY", Discount::FixedAmount(Money::from_major(1)));
        let expiry = ts(2025, 12, 31, 23);
        d.expires_at = Some(expiry);
        service.create_coupon(d).await.unwrap();

        let cart = Cart::new(vec![], Money::from_major(10));
        let on_time = service.validate_coupon("alice", "LASTDAY", &cart, expiry).await.unwrap();
        assert!(on_time.is_valid);

        let late = expiry + chrono::Duration::seconds(1);
        let outcome = service.validate_coupon("alice", "LASTDAY", &cart, late).await.unwrap();
        assert_eq!(outcome.message, "coupon has expired");
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_rejects_duplicates_and_bad_drafts() {
        let service = memory_service().await;
        let created = service
            .create_coupon(draft("SAVE", Discount::FixedAmount(Money::from_major(2))))
            .await
            .unwrap();
        assert_eq!(created.current_total_usage, 0);
        assert!(Uuid::parse_str(&created.id).is_ok());

        let err = service
            .create_coupon(draft("SAVE", Discount::FixedAmount(Money::from_major(3))))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateCode(code) if code == "SAVE"));

        let err = service
            .create_coupon(draft("BIG", Discount::Percentage(DiscountRate::from_bps(10_001))))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::OutOfRange { .. })));

        let mut missing = draft("NODISC", Discount::FixedAmount(Money::from_major(1)));
        missing.discount = None;
        let err = service.create_coupon(missing).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::Required { .. })));
    }

    // -------------------------------------------------------------------------
    // Caching
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_commit_refreshes_cached_coupon() {
        let service = memory_service().await;
        service
            .create_coupon(draft("COUNTED", Discount::FixedAmount(Money::from_major(1))))
            .await
            .unwrap();

        // Warm the cache, then redeem.
        assert_eq!(service.get_coupon("COUNTED").await.unwrap().unwrap().current_total_usage, 0);
        let cart = Cart::new(vec![], Money::from_major(10));
        assert!(service.validate_coupon("alice", "COUNTED", &cart, at()).await.unwrap().is_valid);

        assert_eq!(service.get_coupon("COUNTED").await.unwrap().unwrap().current_total_usage, 1);
    }

    #[tokio::test]
    async fn test_listing_cache_invalidated_after_redemption() {
        let service = memory_service().await;
        let mut once = draft("ONCE", Discount::FixedAmount(Money::from_major(2)));
        once.max_usage_per_user = 1;
        service.create_coupon(once).await.unwrap();

        let cart = Cart::new(vec![], Money::from_major(10));
        let before = service.get_applicable_coupons("alice", &cart, at()).await.unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].computed_discount, Money::from_major(2));

        assert!(service.validate_coupon("alice", "ONCE", &cart, at()).await.unwrap().is_valid);

        let after = service.get_applicable_coupons("alice", &cart, at()).await.unwrap();
        assert!(after.is_empty());
    }

    #[tokio::test]
    async fn test_listing_is_served_from_cache() {
        let store = StubStore::with_coupon(stub_coupon("CACHED"));
        let service = CouponService::new(store, ServiceConfig::default());
        let cart = Cart::new(vec![], Money::from_major(10));

        let first = service.get_applicable_coupons("alice", &cart, at()).await.unwrap();
        let second = service.get_applicable_coupons("alice", &cart, at()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(service.store().list_calls(), 1);
    }

    #[tokio::test]
    async fn test_new_coupon_clears_listings() {
        let service = memory_service().await;
        let cart = Cart::new(vec![], Money::from_major(10));

        assert!(service.get_applicable_coupons("alice", &cart, at()).await.unwrap().is_empty());
        service
            .create_coupon(draft("FRESH", Discount::FixedAmount(Money::from_major(1))))
            .await
            .unwrap();
        assert_eq!(service.get_applicable_coupons("alice", &cart, at()).await.unwrap().len(), 1);
    }

    // -------------------------------------------------------------------------
    // Concurrency
    // -------------------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_total_cap_holds_under_concurrent_validation() {
        let (_dir, service) = file_service().await;
        let mut d = draft("LIMITED", Discount::Percentage(DiscountRate::from_percent(10)));
        d.max_total_usage = 5;
        service.create_coupon(d).await.unwrap();

        let service = Arc::new(service);
        let mut handles = Vec::new();
        for i in 0..12 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                let cart = Cart::new(vec![], Money::from_major(100));
                service
                    .validate_coupon(&format!("user-{i}"), "LIMITED", &cart, at())
                    .await
                    .unwrap()
            }));
        }

        let mut valid = 0;
        for handle in handles {
            let outcome = handle.await.unwrap();
            if outcome.is_valid {
                valid += 1;
            } else {
                assert_eq!(outcome.message, "maximum total usage exceeded");
            }
        }

        assert_eq!(valid, 5);
        let stored = service.get_coupon("LIMITED").await.unwrap().unwrap();
        assert_eq!(stored.current_total_usage, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_per_user_cap_holds_under_concurrent_retries() {
        let (_dir, service) = file_service().await;
        let mut d = draft("TWICE", Discount::FixedAmount(Money::from_major(1)));
        d.max_usage_per_user = 2;
        service.create_coupon(d).await.unwrap();

        let service = Arc::new(service);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                let cart = Cart::new(vec![], Money::from_major(10));
                service.validate_coupon("alice", "TWICE", &cart, at()).await.unwrap()
            }));
        }

        let mut valid = 0;
        for handle in handles {
            let outcome = handle.await.unwrap();
            if outcome.is_valid {
                valid += 1;
            } else {
                assert_eq!(outcome.message, "maximum usage per user exceeded");
            }
        }
        assert_eq!(valid, 2);
    }

    // -------------------------------------------------------------------------
    // Storage failures
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_race_loser_gets_cap_reason() {
        let store = StubStore::with_coupon(stub_coupon("RACE")).grant(UsageGrant::TotalCapReached);
        let service = CouponService::new(store, ServiceConfig::default());
        let cart = Cart::new(vec![], Money::from_major(10));

        let outcome = service.validate_coupon("alice", "RACE", &cart, at()).await.unwrap();
        assert!(!outcome.is_valid);
        assert_eq!(outcome.message, "maximum total usage exceeded");

        let store = StubStore::with_coupon(stub_coupon("RACE")).grant(UsageGrant::UserCapReached);
        let service = CouponService::new(store, ServiceConfig::default());
        let outcome = service.validate_coupon("alice", "RACE", &cart, at()).await.unwrap();
        assert_eq!(outcome.message, "maximum usage per user exceeded");
    }

    #[tokio::test]
    async fn test_commit_failure_propagates() {
        let store = StubStore::with_coupon(stub_coupon("BOOM")).fail_commit();
        let service = CouponService::new(store, ServiceConfig::default());
        let cart = Cart::new(vec![], Money::from_major(10));

        let err = service.validate_coupon("alice", "BOOM", &cart, at()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_failed_commit_drops_cached_listings() {
        let store = StubStore::with_coupon(stub_coupon("BOOM")).fail_commit();
        let service = CouponService::new(store, ServiceConfig::default());
        let cart = Cart::new(vec![], Money::from_major(10));

        service.get_applicable_coupons("alice", &cart, at()).await.unwrap();
        assert_eq!(service.store().list_calls(), 1);

        assert!(service.validate_coupon("alice", "BOOM", &cart, at()).await.is_err());

        // The commit may have landed, so the listing is recomputed.
        service.get_applicable_coupons("alice", &cart, at()).await.unwrap();
        assert_eq!(service.store().list_calls(), 2);
    }

    #[tokio::test]
    async fn test_usage_lookup_failure_is_an_error_not_a_rejection() {
        let mut coupon = stub_coupon("CAPPED");
        coupon.max_usage_per_user = 1;
        let store = StubStore::with_coupon(coupon).fail_usage_lookup();
        let service = CouponService::new(store, ServiceConfig::default());
        let cart = Cart::new(vec![], Money::from_major(10));

        let err = service.validate_coupon("alice", "CAPPED", &cart, at()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));

        // Uncapped coupons never ask for the count.
        let store = StubStore::with_coupon(stub_coupon("OPEN")).fail_usage_lookup();
        let service = CouponService::new(store, ServiceConfig::default());
        assert!(service.validate_coupon("alice", "OPEN", &cart, at()).await.unwrap().is_valid);
    }

    #[tokio::test]
    async fn test_slow_storage_times_out() {
        let store = StubStore::with_coupon(stub_coupon("SLOW")).delay(Duration::from_secs(5));
        let config = ServiceConfig::default().storage_timeout(Duration::from_millis(20));
        let service = CouponService::new(store, config);
        let cart = Cart::new(vec![], Money::from_major(10));

        let err = service.validate_coupon("alice", "SLOW", &cart, at()).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Timeout { operation: "find_by_code", after_ms: 20 }
        ));
    }

    #[tokio::test]
    async fn test_health_check() {
        let service = memory_service().await;
        service.health_check().await.unwrap();

        service.store().close().await;
        assert!(matches!(
            service.health_check().await,
            Err(ServiceError::Storage(StoreError::Unavailable(_)))
        ));
    }
}
