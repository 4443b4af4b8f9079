//! # Domain Types
//!
//! Core domain types used throughout the coupon engine.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Coupon       │   │      Cart       │   │ValidationOutcome│       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  items          │   │  is_valid       │       │
//! │  │  code (business)│   │  order_total    │   │  message        │       │
//! │  │  discount       │   └─────────────────┘   │  discount?      │       │
//! │  │  caps, window   │                         └─────────────────┘       │
//! │  │  targeting      │   ┌─────────────────┐   ┌─────────────────┐       │
//! │  └─────────────────┘   │    Discount     │   │ UserCouponUsage │       │
//! │                        │  ─────────────  │   │  ─────────────  │       │
//! │                        │  Percentage(bps)│   │  (user, coupon) │       │
//! │                        │  FixedAmount    │   │  times_used     │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A coupon has:
//! - `id`: UUID v4, immutable, used for usage records
//! - `code`: the user-facing business key, unique and immutable once created

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::money::{DiscountRate, Money};

// =============================================================================
// Usage Type
// =============================================================================

/// Informational classification of a coupon.
///
/// Not enforced on its own: the cap fields on [`Coupon`] carry the actual
/// limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UsageType {
    OneTime,
    #[default]
    MultiUse,
    TimeBased,
}

// =============================================================================
// Discount
// =============================================================================

/// Discount kind, without its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    FixedAmount,
}

impl DiscountKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::FixedAmount => "fixed_amount",
        }
    }
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountKind::Percentage),
            "fixed_amount" => Ok(DiscountKind::FixedAmount),
            other => Err(format!("unknown discount kind '{other}'")),
        }
    }
}

/// A coupon's discount: kind and value together, so a percentage can never
/// be read as cents or the other way round.
///
/// Serialized as `{"type": "percentage", "value": 1000}` (basis points) or
/// `{"type": "fixed_amount", "value": 2000}` (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    Percentage(DiscountRate),
    FixedAmount(Money),
}

impl Discount {
    pub const fn kind(&self) -> DiscountKind {
        match self {
            Discount::Percentage(_) => DiscountKind::Percentage,
            Discount::FixedAmount(_) => DiscountKind::FixedAmount,
        }
    }

    /// Raw stored value: basis points for percentages, cents for fixed
    /// amounts.
    pub fn raw_value(&self) -> i64 {
        match self {
            Discount::Percentage(rate) => i64::from(rate.bps()),
            Discount::FixedAmount(amount) => amount.cents(),
        }
    }

    /// Rebuilds a discount from its stored parts.
    ///
    /// Returns `None` when a percentage value does not fit basis points.
    pub fn from_parts(kind: DiscountKind, raw_value: i64) -> Option<Self> {
        match kind {
            DiscountKind::Percentage => u32::try_from(raw_value)
                .ok()
                .map(|bps| Discount::Percentage(DiscountRate::from_bps(bps))),
            DiscountKind::FixedAmount => Some(Discount::FixedAmount(Money::from_cents(raw_value))),
        }
    }

    /// Applies the discount to an eligible amount.
    ///
    /// ## Rules
    /// - Fixed amount: the value, capped at the eligible amount
    /// - Percentage: `eligible × bps / 10000`, rounded half-up
    /// - Never negative
    pub fn apply_to(&self, eligible: Money) -> Money {
        let eligible = eligible.floor_zero();
        match self {
            Discount::FixedAmount(amount) => (*amount).min(eligible).floor_zero(),
            Discount::Percentage(rate) => eligible.percentage(*rate).floor_zero(),
        }
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// A discount offer with eligibility constraints and usage limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// User-facing code, unique and immutable.
    pub code: String,

    /// After this instant the coupon is expired.
    pub expires_at: DateTime<Utc>,

    pub usage_type: UsageType,

    /// Minimum order total for the coupon to apply.
    pub min_order_value: Money,

    /// Inclusive start of the redemption window.
    pub valid_from: Option<DateTime<Utc>>,

    /// Inclusive end of the redemption window.
    pub valid_until: Option<DateTime<Utc>>,

    pub terms_and_conditions: String,

    pub discount: Discount,

    /// 0 = unlimited.
    pub max_usage_per_user: u32,

    /// 0 = unlimited.
    pub max_total_usage: u32,

    /// Redemptions so far. Authoritative only when read from storage.
    pub current_total_usage: u32,

    /// Item ids the discount is restricted to (empty = all).
    pub applicable_item_ids: BTreeSet<String>,

    /// Categories the discount is restricted to (empty = all).
    pub applicable_categories: BTreeSet<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    #[inline]
    pub fn targets_items(&self) -> bool {
        !self.applicable_item_ids.is_empty()
    }

    #[inline]
    pub fn targets_categories(&self) -> bool {
        !self.applicable_categories.is_empty()
    }

    /// A coupon without targeting applies to every cart.
    #[inline]
    pub fn is_targeted(&self) -> bool {
        self.targets_items() || self.targets_categories()
    }

    #[inline]
    pub fn has_user_cap(&self) -> bool {
        self.max_usage_per_user > 0
    }

    #[inline]
    pub fn has_total_cap(&self) -> bool {
        self.max_total_usage > 0
    }

}

// =============================================================================
// Coupon Draft
// =============================================================================

/// Admin request to create a coupon.
///
/// Required-ness is checked by [`crate::validation::validate_draft`] rather
/// than by the type system, so a malformed request is reported with the
/// missing field's name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CouponDraft {
    pub code: String,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_type: UsageType,
    #[serde(default)]
    pub applicable_item_ids: Vec<String>,
    #[serde(default)]
    pub applicable_categories: Vec<String>,
    #[serde(default)]
    pub min_order_value: Money,
    #[ts(as = "Option<String>")]
    pub valid_from: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub terms_and_conditions: String,
    pub discount: Option<Discount>,
    #[serde(default)]
    pub max_usage_per_user: u32,
    #[serde(default)]
    pub max_total_usage: u32,
}

// =============================================================================
// User Coupon Usage
// =============================================================================

/// How many times one user has redeemed one coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserCouponUsage {
    pub user_id: String,
    pub coupon_id: String,
    pub times_used: u32,
}

// =============================================================================
// Cart
// =============================================================================

/// A line in the shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    /// Item (product) identifier, matched against item targeting.
    pub id: String,
    /// Category identifier, matched against category targeting.
    pub category: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl CartItem {
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        CartItem {
            id: id.into(),
            category: category.into(),
            unit_price,
            quantity,
        }
    }

    /// Unit price × quantity, `None` when it does not fit in `Money`.
    pub fn checked_line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply_quantity(i64::from(self.quantity))
    }

    /// Unit price × quantity, saturating at the `Money` bounds.
    pub fn line_total(&self) -> Money {
        self.checked_line_total().unwrap_or_else(|| {
            if self.unit_price.is_negative() {
                Money::from_cents(i64::MIN)
            } else {
                Money::from_cents(i64::MAX)
            }
        })
    }
}

/// Transient checkout input. Never persisted.
///
/// `order_total` is supplied by the caller and is not recomputed from the
/// lines; shipping or other adjustments may already be folded into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub order_total: Money,
}

impl Cart {
    pub fn new(items: Vec<CartItem>, order_total: Money) -> Self {
        Cart { items, order_total }
    }

    /// A cart whose order total is the sum of its lines.
    ///
    /// The sum saturates; [`crate::validation::validate_cart`] rejects carts
    /// whose lines do not fit.
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let order_total = items.iter().map(CartItem::line_total).sum();
        Cart { items, order_total }
    }

    /// Exact sum of all line totals, `None` on overflow.
    pub fn checked_line_sum(&self) -> Option<Money> {
        self.items.iter().try_fold(Money::zero(), |sum, item| {
            sum.checked_add(item.checked_line_total()?)
        })
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.id.as_str())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.category.as_str())
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Which match set a discount was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountScope {
    /// Lines whose item id is targeted.
    Items,
    /// Lines whose category is targeted.
    Categories,
    /// The whole order total (untargeted coupon).
    Order,
}

/// Discount computed for one coupon against one cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountBreakdown {
    pub scope: DiscountScope,
    /// Amount the discount was computed against.
    pub eligible_amount: Money,
    /// Portion attributable to the matched lines.
    pub items_discount: Money,
    /// Total discount granted by the coupon.
    pub total_discount: Money,
}

/// Result of validating a coupon code.
///
/// Invalid coupons are outcomes, not errors: infrastructure failures are
/// reported through the service's error type instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountBreakdown>,
}

impl ValidationOutcome {
    pub const APPLIED: &'static str = "Coupon applied successfully";
    pub const NOT_FOUND: &'static str = "Coupon not found";

    pub fn applied(discount: DiscountBreakdown) -> Self {
        ValidationOutcome {
            is_valid: true,
            message: Self::APPLIED.to_string(),
            discount: Some(discount),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        ValidationOutcome {
            is_valid: false,
            message: reason.into(),
            discount: None,
        }
    }

    pub fn not_found() -> Self {
        Self::rejected(Self::NOT_FOUND)
    }
}

/// One entry of the applicable-coupons listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ApplicableCoupon {
    pub code: String,
    pub discount: Discount,
    /// Discount this coupon would grant for the requested cart.
    pub computed_discount: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
