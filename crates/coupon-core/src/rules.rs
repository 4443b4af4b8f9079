//! # Eligibility Rules
//!
//! The validator chain: independent, pure checks run in a fixed order.
//!
//! ## Chain Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Validator Chain                                   │
//! │                                                                         │
//! │  Expiry ──► TimeWindow ──► MinOrderValue ──► Targeting                 │
//! │                                                  │                      │
//! │                                                  ▼                      │
//! │                               PerUserCap ──► TotalCap ──► pass         │
//! │                                   ▲                                     │
//! │                                   │ needs the user's times_used,        │
//! │                                   │ fetched by the caller only when     │
//! │                                   │ the coupon declares a per-user cap  │
//! │                                                                         │
//! │  First failure wins: only one reason is ever reported.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Boundaries
//! - Expiry: a request exactly at `expires_at` is still valid.
//! - Time window: both `valid_from` and `valid_until` are inclusive.
//! - Caps: `0` means unlimited.
//!
//! Rules never mutate anything. The cap rules here are advisory; the
//! authoritative cap check happens atomically in storage when usage is
//! recorded.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::money::Money;
use crate::types::{Cart, Coupon};

// =============================================================================
// Rule Violation
// =============================================================================

/// Which targeting set failed to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetingMiss {
    Items,
    Categories,
    ItemsOrCategories,
}

impl std::fmt::Display for TargetingMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TargetingMiss::Items => "items",
            TargetingMiss::Categories => "categories",
            TargetingMiss::ItemsOrCategories => "items or categories",
        })
    }
}

/// A single, user-presentable reason a coupon cannot be used.
///
/// The `Display` text is returned verbatim as the validation message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("coupon has expired")]
    Expired,

    #[error("coupon is not yet valid")]
    NotYetValid,

    #[error("coupon is no longer valid")]
    NoLongerValid,

    #[error("minimum order value of {min} required")]
    BelowMinimumOrder { min: Money },

    #[error("coupon not applicable to any {0} in the cart")]
    NotApplicable(TargetingMiss),

    #[error("maximum usage per user exceeded")]
    UserCapReached,

    #[error("maximum total usage exceeded")]
    TotalCapReached,
}

impl RuleViolation {
    /// The reason text shown to the user.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

// =============================================================================
// Usage Facts
// =============================================================================

/// Usage data some rules need beyond the coupon snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageFacts {
    /// How often the requesting user has redeemed this coupon.
    ///
    /// `None` means it was not looked up; the per-user rule then treats the
    /// user as having no prior usage. Look it up whenever
    /// [`Rule::needs_user_usage`] says so.
    pub user_times_used: Option<u32>,
}

impl UsageFacts {
    pub const fn with_user_usage(times_used: u32) -> Self {
        UsageFacts {
            user_times_used: Some(times_used),
        }
    }
}

// =============================================================================
// Rules
// =============================================================================

/// One eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Expiry,
    TimeWindow,
    MinOrderValue,
    Targeting,
    PerUserCap,
    TotalCap,
}

impl Rule {
    /// The full chain, in evaluation order.
    pub const CHAIN: [Rule; 6] = [
        Rule::Expiry,
        Rule::TimeWindow,
        Rule::MinOrderValue,
        Rule::Targeting,
        Rule::PerUserCap,
        Rule::TotalCap,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            Rule::Expiry => "expiry",
            Rule::TimeWindow => "time_window",
            Rule::MinOrderValue => "min_order_value",
            Rule::Targeting => "targeting",
            Rule::PerUserCap => "per_user_cap",
            Rule::TotalCap => "total_cap",
        }
    }

    /// Whether evaluating this rule for `coupon` requires the user's usage
    /// count from storage.
    pub fn needs_user_usage(&self, coupon: &Coupon) -> bool {
        matches!(self, Rule::PerUserCap) && coupon.has_user_cap()
    }

    /// Runs the check.
    pub fn check(
        &self,
        coupon: &Coupon,
        cart: &Cart,
        at: DateTime<Utc>,
        usage: &UsageFacts,
    ) -> Result<(), RuleViolation> {
        match self {
            Rule::Expiry => check_expiry(coupon, at),
            Rule::TimeWindow => check_time_window(coupon, at),
            Rule::MinOrderValue => check_min_order(coupon, cart),
            Rule::Targeting => check_targeting(coupon, cart),
            Rule::PerUserCap => check_user_cap(coupon, usage),
            Rule::TotalCap => check_total_cap(coupon),
        }
    }
}

/// Runs the whole chain and returns the first violation.
///
/// Callers that want to avoid the per-user storage lookup for coupons that
/// fail earlier rules should step through [`Rule::CHAIN`] themselves.
pub fn evaluate(
    coupon: &Coupon,
    cart: &Cart,
    at: DateTime<Utc>,
    usage: &UsageFacts,
) -> Result<(), RuleViolation> {
    Rule::CHAIN
        .iter()
        .try_for_each(|rule| rule.check(coupon, cart, at, usage))
}

// =============================================================================
// Individual Checks
// =============================================================================

fn check_expiry(coupon: &Coupon, at: DateTime<Utc>) -> Result<(), RuleViolation> {
    if at > coupon.expires_at {
        return Err(RuleViolation::Expired);
    }
    Ok(())
}

fn check_time_window(coupon: &Coupon, at: DateTime<Utc>) -> Result<(), RuleViolation> {
    if let Some(from) = coupon.valid_from {
        if at < from {
            return Err(RuleViolation::NotYetValid);
        }
    }
    if let Some(until) = coupon.valid_until {
        if at > until {
            return Err(RuleViolation::NoLongerValid);
        }
    }
    Ok(())
}

fn check_min_order(coupon: &Coupon, cart: &Cart) -> Result<(), RuleViolation> {
    if cart.order_total < coupon.min_order_value {
        return Err(RuleViolation::BelowMinimumOrder {
            min: coupon.min_order_value,
        });
    }
    Ok(())
}

/// True when at least one line's item id is targeted.
pub fn matches_items(coupon: &Coupon, cart: &Cart) -> bool {
    cart.item_ids().any(|id| coupon.applicable_item_ids.contains(id))
}

/// True when at least one line's category is targeted.
pub fn matches_categories(coupon: &Coupon, cart: &Cart) -> bool {
    cart.categories()
        .any(|category| coupon.applicable_categories.contains(category))
}

fn check_targeting(coupon: &Coupon, cart: &Cart) -> Result<(), RuleViolation> {
    let by_items = coupon.targets_items() && matches_items(coupon, cart);
    let by_categories = coupon.targets_categories() && matches_categories(coupon, cart);

    if !coupon.is_targeted() || by_items || by_categories {
        return Ok(());
    }

    let miss = match (coupon.targets_items(), coupon.targets_categories()) {
        (true, true) => TargetingMiss::ItemsOrCategories,
        (true, false) => TargetingMiss::Items,
        _ => TargetingMiss::Categories,
    };
    Err(RuleViolation::NotApplicable(miss))
}

fn check_user_cap(coupon: &Coupon, usage: &UsageFacts) -> Result<(), RuleViolation> {
    if !coupon.has_user_cap() {
        return Ok(());
    }
    if usage.user_times_used.unwrap_or(0) >= coupon.max_usage_per_user {
        return Err(RuleViolation::UserCapReached);
    }
    Ok(())
}

fn check_total_cap(coupon: &Coupon) -> Result<(), RuleViolation> {
    if coupon.has_total_cap() && coupon.current_total_usage >= coupon.max_total_usage {
        return Err(RuleViolation::TotalCapReached);
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
