//! # Discount Calculators
//!
//! Pure functions mapping `(coupon, cart)` to a [`DiscountBreakdown`].
//!
//! ## Scope Selection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Coupon targeting        Calculators run          Result                │
//! │  ────────────────        ───────────────          ──────                │
//! │  none                    Order                    order total based     │
//! │  items only              Items                    matched lines only    │
//! │  categories only         Categories               matched lines only    │
//! │  items + categories      Items AND Categories     the larger discount   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A line's eligible amount is `unit_price × quantity`. Lines outside the
//! targeted set contribute nothing. A targeted coupon that matches no line
//! yields a zero discount; the targeting rule rejects that case before any
//! discount is granted.

use crate::money::Money;
use crate::types::{Cart, Coupon, DiscountBreakdown, DiscountScope};

/// Sum of line totals for lines inside `scope`.
///
/// For [`DiscountScope::Order`] this is the cart's order total. Sums
/// saturate at the [`Money`] bounds; carts accepted by
/// [`crate::validation::validate_cart`] never reach them.
pub fn eligible_amount(scope: DiscountScope, coupon: &Coupon, cart: &Cart) -> Money {
    match scope {
        DiscountScope::Order => cart.order_total,
        DiscountScope::Items => cart
            .items
            .iter()
            .filter(|item| coupon.applicable_item_ids.contains(&item.id))
            .map(|item| item.line_total())
            .sum(),
        DiscountScope::Categories => cart
            .items
            .iter()
            .filter(|item| coupon.applicable_categories.contains(&item.category))
            .map(|item| item.line_total())
            .sum(),
    }
}

/// Runs a single calculator.
pub fn calculate_for(scope: DiscountScope, coupon: &Coupon, cart: &Cart) -> DiscountBreakdown {
    let eligible = eligible_amount(scope, coupon, cart).floor_zero();
    let discount = coupon.discount.apply_to(eligible);

    DiscountBreakdown {
        scope,
        eligible_amount: eligible,
        items_discount: discount,
        total_discount: discount,
    }
}

/// Scopes that apply to `coupon`, in tie-break order.
fn scopes(coupon: &Coupon) -> Vec<DiscountScope> {
    let mut scopes = Vec::with_capacity(2);
    if coupon.targets_items() {
        scopes.push(DiscountScope::Items);
    }
    if coupon.targets_categories() {
        scopes.push(DiscountScope::Categories);
    }
    if scopes.is_empty() {
        scopes.push(DiscountScope::Order);
    }
    scopes
}

/// Computes the discount `coupon` grants on `cart`.
///
/// Deterministic: the same coupon and cart always produce the same
/// breakdown. When both item and category targeting apply, the larger
/// discount wins and ties go to item targeting.
///
/// ## Example
/// ```rust
/// use coupon_core::discount::calculate;
/// # use chrono::{TimeZone, Utc};
/// # use coupon_core::money::{DiscountRate, Money};
/// # use coupon_core::types::*;
/// # let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
/// # let coupon = Coupon {
/// #     id: "1".into(), code: "WELCOME10".into(), expires_at: now,
/// #     usage_type: UsageType::MultiUse, min_order_value: Money::zero(),
/// #     valid_from: None, valid_until: None, terms_and_conditions: String::new(),
/// #     discount: Discount::Percentage(DiscountRate::from_percent(10)),
/// #     max_usage_per_user: 0, max_total_usage: 0, current_total_usage: 0,
/// #     applicable_item_ids: Default::default(), applicable_categories: Default::default(),
/// #     created_at: now, updated_at: now,
/// # };
/// let cart = Cart::new(vec![], Money::from_major(100));
/// let breakdown = calculate(&coupon, &cart);
/// assert_eq!(breakdown.total_discount, Money::from_major(10));
/// assert_eq!(breakdown.scope, DiscountScope::Order);
/// ```
pub fn calculate(coupon: &Coupon, cart: &Cart) -> DiscountBreakdown {
    let mut best: Option<DiscountBreakdown> = None;

    for scope in scopes(coupon) {
        let candidate = calculate_for(scope, coupon, cart);
        best = match best {
            Some(current) if current.total_discount >= candidate.total_discount => Some(current),
            _ => Some(candidate),
        };
    }

    best.unwrap_or_else(|| calculate_for(DiscountScope::Order, coupon, cart))
}

// =============================================================================
// Unit Tests
// =============================================================================
