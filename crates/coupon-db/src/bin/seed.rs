//! # Seed Data Generator
//!
//! Populates a development database with sample coupons.
//!
//! ## Usage
//! ```bash
//! # Seed ./coupons.db (default)
//! cargo run -p coupon-db --bin seed
//!
//! # Specify database path
//! DATABASE_PATH=./data/dev.db cargo run -p coupon-db --bin seed
//! cargo run -p coupon-db --bin seed -- --db ./data/dev.db
//! ```
//!
//! ## Generated Coupons
//! ```text
//! ┌────────────┬──────────────┬──────────┬───────────┬──────────────────────┐
//! │ Code       │ Discount     │ Min order│ Caps u/t  │ Targeting            │
//! ├────────────┼──────────────┼──────────┼───────────┼──────────────────────┤
//! │ WELCOME10  │ 10%          │ 50.00    │ 1 / 1000  │ -                    │
//! │ FLAT20     │ 20.00 fixed  │ 100.00   │ - / -     │ -                    │
//! │ CATEGORY50 │ 15%          │ 75.00    │ 5 / 500   │ Painkillers,Vitamins │
//! │ MEDBUY     │ 30.00 fixed  │ 150.00   │ 2 / 200   │ med1, med3, med5     │
//! │ TIMEBOUND  │ 25%          │ 200.00   │ - / -     │ window: +1d .. +7d   │
//! └────────────┴──────────────┴──────────┴───────────┴──────────────────────┘
//! ```

use chrono::{Duration, Utc};
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use coupon_core::validation::build_coupon;
use coupon_core::{CouponDraft, Discount, DiscountRate, Money, UsageType};
use coupon_db::{Database, DbConfig};

const DEFAULT_DATABASE_PATH: &str = "./coupons.db";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,coupon_db=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut db_path =
        env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string());

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-d" | "--db" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "-h" | "--help" => {
                println!("Coupon Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path");
                println!("                     (default: $DATABASE_PATH or {DEFAULT_DATABASE_PATH})");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(path = %db_path, "Seeding coupon database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.coupons().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has coupons; skipping seed");
        return Ok(());
    }

    let mut seeded = 0;
    for draft in sample_drafts() {
        let code = draft.code.clone();
        let coupon = match build_coupon(draft, Uuid::new_v4().to_string(), Utc::now()) {
            Ok(coupon) => coupon,
            Err(e) => {
                error!(code = %code, error = %e, "Invalid sample coupon");
                continue;
            }
        };

        if let Err(e) = db.coupons().insert(&coupon).await {
            error!(code = %code, error = %e, "Failed to insert coupon");
            continue;
        }

        info!(code = %coupon.code, discount = ?coupon.discount, "Seeded coupon");
        seeded += 1;
    }

    info!(seeded, "Seed complete");
    db.close().await;

    Ok(())
}

/// Sample coupons covering every discount kind and targeting mode.
fn sample_drafts() -> Vec<CouponDraft> {
    let now = Utc::now();

    vec![
        CouponDraft {
            code: "WELCOME10".to_string(),
            expires_at: Some(now + Duration::days(182)),
            usage_type: UsageType::OneTime,
            min_order_value: Money::from_major(50),
            terms_and_conditions: "Valid for new users on their first order.".to_string(),
            discount: Some(Discount::Percentage(DiscountRate::from_percent(10))),
            max_usage_per_user: 1,
            max_total_usage: 1000,
            ..Default::default()
        },
        CouponDraft {
            code: "FLAT20".to_string(),
            expires_at: Some(now + Duration::days(365)),
            usage_type: UsageType::MultiUse,
            min_order_value: Money::from_major(100),
            terms_and_conditions: "Flat 20.00 off orders above 100.00.".to_string(),
            discount: Some(Discount::FixedAmount(Money::from_major(20))),
            ..Default::default()
        },
        CouponDraft {
            code: "CATEGORY50".to_string(),
            expires_at: Some(now + Duration::days(91)),
            usage_type: UsageType::MultiUse,
            applicable_categories: vec!["Painkillers".to_string(), "Vitamins".to_string()],
            min_order_value: Money::from_major(75),
            terms_and_conditions: "Valid on Painkillers and Vitamins categories.".to_string(),
            discount: Some(Discount::Percentage(DiscountRate::from_percent(15))),
            max_usage_per_user: 5,
            max_total_usage: 500,
            ..Default::default()
        },
        CouponDraft {
            code: "MEDBUY".to_string(),
            expires_at: Some(now + Duration::days(273)),
            usage_type: UsageType::MultiUse,
            applicable_item_ids: vec!["med1".to_string(), "med3".to_string(), "med5".to_string()],
            min_order_value: Money::from_major(150),
            terms_and_conditions: "Valid on specific medicines.".to_string(),
            discount: Some(Discount::FixedAmount(Money::from_major(30))),
            max_usage_per_user: 2,
            max_total_usage: 200,
            ..Default::default()
        },
        CouponDraft {
            code: "TIMEBOUND".to_string(),
            expires_at: Some(now + Duration::days(30)),
            usage_type: UsageType::TimeBased,
            valid_from: Some(now + Duration::days(1)),
            valid_until: Some(now + Duration::days(7)),
            min_order_value: Money::from_major(200),
            terms_and_conditions: "Valid only during a specific time window.".to_string(),
            discount: Some(Discount::Percentage(DiscountRate::from_percent(25))),
            ..Default::default()
        },
    ]
}
