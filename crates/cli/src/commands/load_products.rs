//! Bulk load products and initial snapshots from a sales CSV.
//!
//! Parses a CSV of sales data (product name, INR prices with currency
//! glyphs, product link), converts prices to USD, finds or creates each
//! product keyed by its name, and appends one initial snapshot per row.

use anyhow::{anyhow, Result};
use clap::Args;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

use shop_viz_data::{DatabaseClient, NewSnapshot, Repositories};

/// Exchange rate from Indian Rupees to US Dollars.
const INR_TO_USD: Decimal = dec!(0.012);

/// Arguments for the load-products command.
#[derive(Args, Debug, Clone)]
pub struct LoadProductsArgs {
    /// Path to the sales CSV file
    #[arg(long)]
    pub csv: PathBuf,

    /// Database connection URL (uses DATABASE_URL env var if not provided)
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,
}

/// One row of the sales CSV; unknown columns are ignored.
#[derive(Debug, Deserialize)]
struct SalesRow {
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    discounted_price: Option<String>,
    #[serde(default)]
    actual_price: Option<String>,
    #[serde(default)]
    product_link: Option<String>,
}

/// Runs the load-products command.
///
/// # Errors
/// Returns an error if the CSV cannot be read or a database operation fails.
pub async fn run_load_products(args: LoadProductsArgs) -> Result<()> {
    let db_url = args
        .db_url
        .ok_or_else(|| anyhow!("DATABASE_URL must be set via --db-url or DATABASE_URL env var"))?;

    let client = DatabaseClient::new(&db_url, 5).await?;
    client.init_schema().await?;
    let repos = Repositories::new(client.pool());

    let mut reader = csv::Reader::from_path(&args.csv)?;
    let mut loaded = 0usize;
    let mut skipped = 0usize;

    for row in reader.deserialize::<SalesRow>() {
        let row = row?;

        let name = match row.product_name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                skipped += 1;
                continue;
            }
        };

        // Prefer the discounted price, fall back to the list price.
        let price_str = row
            .discounted_price
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(row.actual_price.as_deref());
        let Some(price_usd) = price_str.and_then(parse_inr_price).map(inr_to_usd) else {
            skipped += 1;
            continue;
        };

        let product = repos.products.find_or_create(&name, &name).await?;

        let mut urls = Vec::new();
        if let Some(link) = row.product_link.as_deref().map(str::trim) {
            if !link.is_empty() {
                urls.push(link.to_string());
            }
        }

        let snapshot = NewSnapshot::new(product.id, &name)
            .with_price(price_usd)
            .with_urls(urls);
        repos.snapshots.insert(&snapshot).await?;
        loaded += 1;
    }

    tracing::info!(loaded, skipped, "Loaded products and created initial snapshots");
    Ok(())
}

/// Parses a formatted INR price ("₹1,099.00") to a decimal amount.
///
/// Strips every character other than digits and the decimal point; returns
/// `None` when nothing numeric remains or the residue is not a number.
fn parse_inr_price(raw: &str) -> Option<Decimal> {
    // Price glyph pattern is fixed; compilation cannot fail.
    let non_numeric = Regex::new(r"[^\d.]").ok()?;
    let cleaned = non_numeric.replace_all(raw, "");
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Converts an INR amount to USD, rounded to 2 decimal places.
fn inr_to_usd(inr: Decimal) -> Decimal {
    (inr * INR_TO_USD).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inr_price_strips_glyphs_and_commas() {
        assert_eq!(parse_inr_price("₹1,099.00"), Some(dec!(1099.00)));
        assert_eq!(parse_inr_price("399"), Some(dec!(399)));
    }

    #[test]
    fn test_parse_inr_price_rejects_non_numeric() {
        assert_eq!(parse_inr_price(""), None);
        assert_eq!(parse_inr_price("N/A"), None);
    }

    #[test]
    fn test_inr_to_usd_rounds_to_cents() {
        assert_eq!(inr_to_usd(dec!(1099)), dec!(13.19));
        assert_eq!(inr_to_usd(dec!(399)), dec!(4.79));
    }

    #[test]
    fn test_sales_row_ignores_unknown_columns() {
        let csv = "product_name,discounted_price,actual_price,product_link,rating\n\
                   Cable,\"₹399\",\"₹1,099\",https://example.com/cable,4.2\n";
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let row: SalesRow = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(row.product_name.as_deref(), Some("Cable"));
        assert_eq!(row.discounted_price.as_deref(), Some("₹399"));
    }
}
