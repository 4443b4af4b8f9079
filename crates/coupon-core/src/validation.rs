//! # Validation Module
//!
//! Input validation for coupon creation and checkout carts.
//!
//! This is *request* validation (is the draft or cart well-formed?). Whether a coupon
//! can be redeemed against a cart is decided by [`crate::rules`].
//!
//! ## Usage
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use coupon_core::money::DiscountRate;
//! use coupon_core::types::{CouponDraft, Discount};
//! use coupon_core::validation::build_coupon;
//!
//! let draft = CouponDraft {
//!     code: "WELCOME10".to_string(),
//!     expires_at: Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()),
//!     discount: Some(Discount::Percentage(DiscountRate::from_percent(10))),
//!     ..CouponDraft::default()
//! };
//! let now = Utc::now();
//! let coupon = build_coupon(draft, "3f0e6d3c-0000-4000-8000-000000000000".into(), now).unwrap();
//! assert_eq!(coupon.code, "WELCOME10");
//! ```

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::error::ValidationError;
use crate::money::BPS_PER_WHOLE;
use crate::types::{Cart, Coupon, CouponDraft, Discount};
use crate::MAX_CODE_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a coupon code.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_CODE_LENGTH`] characters
/// - No whitespace inside the code
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::required("coupon code"));
    }

    if code.chars().count() > MAX_CODE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "coupon code".to_string(),
            max: MAX_CODE_LENGTH,
        });
    }

    if code.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "coupon code".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

/// Validates a discount.
///
/// ## Rules
/// - Value must be greater than zero
/// - Percentages must not exceed 100% (10000 bps)
pub fn validate_discount(discount: &Discount) -> ValidationResult<()> {
    match discount {
        Discount::Percentage(rate) => {
            if rate.bps() == 0 {
                return Err(ValidationError::MustBePositive {
                    field: "discount value".to_string(),
                });
            }
            if rate.bps() > BPS_PER_WHOLE {
                return Err(ValidationError::OutOfRange {
                    field: "discount percentage (bps)".to_string(),
                    min: 1,
                    max: i64::from(BPS_PER_WHOLE),
                });
            }
        }
        Discount::FixedAmount(amount) => {
            if !amount.is_positive() {
                return Err(ValidationError::MustBePositive {
                    field: "discount value".to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Validates the optional redemption window.
pub fn validate_window(
    valid_from: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
) -> ValidationResult<()> {
    if let (Some(from), Some(until)) = (valid_from, valid_until) {
        if from > until {
            return Err(ValidationError::InvalidFormat {
                field: "valid time window".to_string(),
                reason: "start must not be after end".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates a complete draft.
///
/// Checks run in the order the fields are reported to admins: code, expiry,
/// discount, minimum order, window.
pub fn validate_draft(draft: &CouponDraft) -> ValidationResult<()> {
    validate_code(&draft.code)?;

    if draft.expires_at.is_none() {
        return Err(ValidationError::required("expiry date"));
    }

    let discount = draft
        .discount
        .as_ref()
        .ok_or_else(|| ValidationError::required("discount type"))?;
    validate_discount(discount)?;

    if draft.min_order_value.is_negative() {
        return Err(ValidationError::Negative {
            field: "minimum order value".to_string(),
        });
    }

    validate_window(draft.valid_from, draft.valid_until)
}

/// Validates a checkout cart.
///
/// ## Rules
/// - No negative unit price
/// - Every line total and the sum of all lines fit in [`crate::Money`]
///
/// Discount math sums subsets of the lines, so a cart that passes here can
/// never overflow there.
pub fn validate_cart(cart: &Cart) -> ValidationResult<()> {
    for item in &cart.items {
        if item.unit_price.is_negative() {
            return Err(ValidationError::Negative {
                field: format!("unit price of item '{}'", item.id),
            });
        }
        if item.checked_line_total().is_none() {
            return Err(ValidationError::TooLarge {
                field: format!("line total of item '{}'", item.id),
            });
        }
    }

    if cart.checked_line_sum().is_none() {
        return Err(ValidationError::TooLarge {
            field: "cart total".to_string(),
        });
    }

    Ok(())
}

/// Trims targeting ids and drops blanks.
fn normalize_targets(ids: Vec<String>) -> BTreeSet<String> {
    ids.into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

/// Validates a draft and turns it into a new coupon.
///
/// ## Arguments
/// * `draft` - Admin request
/// * `id` - Freshly generated identifier
/// * `now` - Creation timestamp
pub fn build_coupon(
    draft: CouponDraft,
    id: String,
    now: DateTime<Utc>,
) -> ValidationResult<Coupon> {
    validate_draft(&draft)?;

    let (Some(expires_at), Some(discount)) = (draft.expires_at, draft.discount) else {
        // validate_draft rejects both cases above.
        return Err(ValidationError::required("expiry date"));
    };

    Ok(Coupon {
        id,
        code: draft.code.trim().to_string(),
        expires_at,
        usage_type: draft.usage_type,
        min_order_value: draft.min_order_value,
        valid_from: draft.valid_from,
        valid_until: draft.valid_until,
        terms_and_conditions: draft.terms_and_conditions,
        discount,
        max_usage_per_user: draft.max_usage_per_user,
        max_total_usage: draft.max_total_usage,
        current_total_usage: 0,
        applicable_item_ids: normalize_targets(draft.applicable_item_ids),
        applicable_categories: normalize_targets(draft.applicable_categories),
        created_at: now,
        updated_at: now,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{DiscountRate, Money};
    use crate::types::CartItem;
    use chrono::TimeZone;

    fn draft() -> CouponDraft {
        CouponDraft {
            code: "FLAT20".to_string(),
            expires_at: Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()),
            discount: Some(Discount::FixedAmount(Money::from_major(20))),
            min_order_value: Money::from_major(100),
            ..CouponDraft::default()
        }
    }

    #[test]
    fn test_validate_code() {
        assert!(validate_code("WELCOME10").is_ok());
        assert!(validate_code("  SPRING-24 ").is_ok());

        assert_eq!(validate_code(""), Err(ValidationError::required("coupon code")));
        assert!(validate_code("   ").is_err());
        assert!(validate_code("TWO WORDS").is_err());
        assert!(validate_code(&"A".repeat(MAX_CODE_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(&Discount::Percentage(DiscountRate::from_percent(100))).is_ok());
        assert!(validate_discount(&Discount::Percentage(DiscountRate::from_bps(0))).is_err());
        assert!(validate_discount(&Discount::Percentage(DiscountRate::from_bps(10_001))).is_err());
        assert!(validate_discount(&Discount::FixedAmount(Money::zero())).is_err());
        assert!(validate_discount(&Discount::FixedAmount(Money::from_cents(-5))).is_err());
    }

    #[test]
    fn test_missing_required_fields() {
        let mut missing_expiry = draft();
        missing_expiry.expires_at = None;
        assert_eq!(
            validate_draft(&missing_expiry),
            Err(ValidationError::required("expiry date"))
        );

        let mut missing_discount = draft();
        missing_discount.discount = None;
        assert_eq!(
            validate_draft(&missing_discount),
            Err(ValidationError::required("discount type"))
        );
    }

    #[test]
    fn test_window_order() {
        let mut inverted = draft();
        inverted.valid_from = Some(Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap());
        inverted.valid_until = Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        assert!(validate_draft(&inverted).is_err());
    }

    #[test]
    fn test_build_coupon_normalizes_targets() {
        let mut with_targets = draft();
        with_targets.code = "  FLAT20 ".to_string();
        with_targets.applicable_categories =
            vec![" Vitamins ".into(), "".into(), "Vitamins".into()];

        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let coupon = build_coupon(with_targets, "id-1".into(), now).unwrap();

        assert_eq!(coupon.code, "FLAT20");
        assert_eq!(coupon.current_total_usage, 0);
        assert_eq!(coupon.created_at, now);
        assert_eq!(
            coupon.applicable_categories.into_iter().collect::<Vec<_>>(),
            vec!["Vitamins".to_string()]
        );
    }

    #[test]
    fn test_validate_cart() {
        let ok = Cart::from_items(vec![
            CartItem::new("vit-c", "Vitamins", Money::from_major(10), 2),
            CartItem::new("ibu", "Painkillers", Money::from_major(8), 1),
        ]);
        assert!(validate_cart(&ok).is_ok());
        assert!(validate_cart(&Cart::default()).is_ok());

        let huge = Money::from_cents(i64::MAX / 2);
        let one_line = Cart::from_items(vec![CartItem::new("a", "Vitamins", huge, 3)]);
        assert_eq!(
            validate_cart(&one_line),
            Err(ValidationError::TooLarge {
                field: "line total of item 'a'".to_string()
            })
        );

        let many_lines = Cart::from_items(vec![
            CartItem::new("a", "Vitamins", huge, 1),
            CartItem::new("b", "Vitamins", huge, 1),
            CartItem::new("c", "Vitamins", huge, 1),
        ]);
        assert_eq!(
            validate_cart(&many_lines),
            Err(ValidationError::TooLarge {
                field: "cart total".to_string()
            })
        );

        let refund = Cart::from_items(vec![CartItem::new(
            "r",
            "Vitamins",
            Money::from_cents(-1),
            1,
        )]);
        assert!(matches!(validate_cart(&refund), Err(ValidationError::Negative { .. })));
    }
}
