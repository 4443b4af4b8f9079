//! Cache keys for applicable-coupon listings.
//!
//! A listing depends on the user, every cart line, the order total and the
//! request timestamp, so the key is a SHA-256 digest of all of them:
//!
//! ```text
//! "applicable:" + hex(sha256(json({ user_id, cart, at })))
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use coupon_core::Cart;

const LISTING_PREFIX: &str = "applicable";

#[derive(Serialize)]
struct ListingRequest<'a> {
    user_id: &'a str,
    cart: &'a Cart,
    at: DateTime<Utc>,
}

/// Cache key for a `get_applicable_coupons` request.
pub fn listing_key(
    user_id: &str,
    cart: &Cart,
    at: DateTime<Utc>,
) -> Result<String, serde_json::Error> {
    let payload = serde_json::to_vec(&ListingRequest { user_id, cart, at })?;
    let digest = Sha256::digest(&payload);
    Ok(format!("{LISTING_PREFIX}:{}", hex::encode(digest)))
}

/// Invalidation tag attached to every listing computed for `user_id`.
pub fn user_tag(user_id: &str) -> String {
    format!("user:{user_id}")
}

/// Invalidation tag attached to every listing that contains `code`.
pub fn coupon_tag(code: &str) -> String {
    format!("coupon:{code}")
}
