//! Seed randomized price history for existing products.
//!
//! For every product that already has at least one snapshot, inserts one
//! snapshot per past day with a random time within that day and a price
//! jittered around the product's latest price. Useful for exercising the
//! history and best-price queries against a freshly loaded database.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use clap::Args;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use shop_viz_data::{DatabaseClient, NewSnapshot, Repositories};

/// Arguments for the fake-history command.
#[derive(Args, Debug, Clone)]
pub struct FakeHistoryArgs {
    /// Number of past days to seed
    #[arg(long, default_value_t = 30)]
    pub days: u32,

    /// Database connection URL (uses DATABASE_URL env var if not provided)
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,
}

/// Runs the fake-history command.
///
/// # Errors
/// Returns an error if database connection or inserts fail.
pub async fn run_fake_history(args: FakeHistoryArgs) -> Result<()> {
    let db_url = args
        .db_url
        .ok_or_else(|| anyhow!("DATABASE_URL must be set via --db-url or DATABASE_URL env var"))?;

    let client = DatabaseClient::new(&db_url, 5).await?;
    let repos = Repositories::new(client.pool());

    let products = repos.products.list_detail().await?;
    let mut rng = rand::thread_rng();
    let now = Utc::now();
    let mut seeded = 0usize;

    for product in products {
        // Products without an initial snapshot have no base price to jitter.
        let Some(latest) = repos.snapshots.latest(product.id).await? else {
            continue;
        };
        let base_price = latest.price.unwrap_or(Decimal::ZERO);
        let urls = latest.urls.0.clone();

        for days_ago in 1..=i64::from(args.days) {
            let captured_at =
                random_time_in_day(now - Duration::days(days_ago), rng.gen_range(0..86_400));
            let price = jittered_price(base_price, rng.gen_range(0.9..=1.1));

            let snapshot = NewSnapshot::new(product.id, product.name.clone())
                .with_price(price)
                .with_urls(urls.clone())
                .with_captured_at(captured_at);
            repos.snapshots.insert(&snapshot).await?;
            seeded += 1;
        }
    }

    tracing::info!(seeded, days = args.days, "Seeded fake price history");
    Ok(())
}

/// Places a timestamp at `seconds_into_day` past midnight UTC of the day
/// containing `day`.
fn random_time_in_day(day: DateTime<Utc>, seconds_into_day: i64) -> DateTime<Utc> {
    let midnight = day.date_naive().and_time(NaiveTime::MIN).and_utc();
    midnight + Duration::seconds(seconds_into_day.clamp(0, 86_399))
}

/// Applies a multiplicative jitter to a base price, rounded to 2 decimals.
fn jittered_price(base: Decimal, factor: f64) -> Decimal {
    let base_f = base.to_f64().unwrap_or(0.0);
    Decimal::from_f64_retain(base_f * factor)
        .unwrap_or(base)
        .round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_random_time_stays_within_day() {
        let day = Utc.with_ymd_and_hms(2025, 6, 1, 15, 30, 0).unwrap();
        let at_start = random_time_in_day(day, 0);
        let at_end = random_time_in_day(day, 86_399);

        assert_eq!(at_start, Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(at_end, Utc.with_ymd_and_hms(2025, 6, 1, 23, 59, 59).unwrap());
        assert_eq!(at_start.date_naive(), at_end.date_naive());
    }

    #[test]
    fn test_random_time_clamps_out_of_range_offsets() {
        let day = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(
            random_time_in_day(day, 500_000).date_naive(),
            day.date_naive()
        );
    }

    #[test]
    fn test_jittered_price_rounds_to_cents() {
        let price = jittered_price(dec!(10.00), 1.0333);
        assert_eq!(price, dec!(10.33));
    }

    #[test]
    fn test_jittered_price_bounds() {
        let base = dec!(100.00);
        let low = jittered_price(base, 0.9);
        let high = jittered_price(base, 1.1);
        assert_eq!(low, dec!(90.00));
        assert_eq!(high, dec!(110.00));
    }
}
