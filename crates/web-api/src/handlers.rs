use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use shop_viz_data::{NewProduct, NewSnapshot, ProductDetail, SnapshotRecord};

use crate::server::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_history_days")]
    pub days: i64,
}

const fn default_history_days() -> i64 {
    7
}

#[derive(Deserialize)]
pub struct BestPriceParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Creates a product and bootstraps its first snapshot batch through the
/// shopping assistant when one is configured.
///
/// Assistant failure is logged and degrades to a product with zero
/// snapshots; it never fails the request.
///
/// # Errors
/// Returns `StatusCode::INTERNAL_SERVER_ERROR` if a database operation fails.
pub async fn create_product(
    State(ctx): State<Arc<ApiContext>>,
    Json(product_in): Json<NewProduct>,
) -> Result<Json<ProductDetail>, StatusCode> {
    let product = ctx
        .products
        .create(&product_in)
        .await
        .map_err(internal_error)?;

    if let Some(assistant) = &ctx.assistant {
        let prompt = product.prompt.as_deref().unwrap_or(&product.name);
        match assistant.fetch_items(prompt).await {
            Ok(items) => {
                if let Err(e) = ctx.bridge.ingest(product.id, &items).await {
                    tracing::error!("Failed to ingest bootstrap batch: {}", e);
                }
            }
            Err(e) => tracing::warn!("Assistant fetch failed, product starts empty: {}", e),
        }
    }

    let detail = ctx
        .products
        .get_detail(product.id)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(detail))
}

/// Lists all products with their snapshot collections, id ascending.
///
/// # Errors
/// Returns `StatusCode::INTERNAL_SERVER_ERROR` if a database query fails.
pub async fn list_products(
    State(ctx): State<Arc<ApiContext>>,
) -> Result<Json<Vec<ProductDetail>>, StatusCode> {
    let products = ctx.products.list_detail().await.map_err(internal_error)?;
    Ok(Json(products))
}

/// Gets a single product and all its snapshots.
///
/// # Errors
/// Returns `StatusCode::NOT_FOUND` if the product doesn't exist, or
/// `StatusCode::INTERNAL_SERVER_ERROR` if a database query fails.
pub async fn read_product(
    State(ctx): State<Arc<ApiContext>>,
    Path(product_id): Path<i64>,
) -> Result<Json<ProductDetail>, StatusCode> {
    let detail = ctx
        .products
        .get_detail(product_id)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(detail))
}

/// Deletes a product; its snapshots go with it via the store-level cascade.
///
/// # Errors
/// Returns `StatusCode::NOT_FOUND` if the product doesn't exist, or
/// `StatusCode::INTERNAL_SERVER_ERROR` if the database operation fails.
pub async fn delete_product(
    State(ctx): State<Arc<ApiContext>>,
    Path(product_id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let deleted = ctx
        .products
        .delete(product_id)
        .await
        .map_err(internal_error)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

/// Appends a snapshot for an existing product.
///
/// # Errors
/// Returns `StatusCode::NOT_FOUND` if the referenced product doesn't exist,
/// or `StatusCode::INTERNAL_SERVER_ERROR` if the database operation fails.
pub async fn create_snapshot(
    State(ctx): State<Arc<ApiContext>>,
    Json(snap_in): Json<NewSnapshot>,
) -> Result<Json<SnapshotRecord>, StatusCode> {
    let exists = ctx
        .products
        .exists(snap_in.product_id)
        .await
        .map_err(internal_error)?;
    if !exists {
        return Err(StatusCode::NOT_FOUND);
    }

    let record = ctx.snapshots.insert(&snap_in).await.map_err(internal_error)?;
    Ok(Json(record))
}

/// Gets all snapshots for a product at its most recent capture time.
///
/// # Errors
/// Returns `StatusCode::NOT_FOUND` if the product has no snapshots, or
/// `StatusCode::INTERNAL_SERVER_ERROR` if the database query fails.
pub async fn latest_snapshots(
    State(ctx): State<Arc<ApiContext>>,
    Path(product_id): Path<i64>,
) -> Result<Json<Vec<SnapshotRecord>>, StatusCode> {
    let snaps = ctx
        .snapshots
        .latest_batch(product_id)
        .await
        .map_err(internal_error)?;

    if snaps.is_empty() {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(snaps))
}

/// Gets a product's snapshots over the past `days` days (default 7),
/// ordered ascending by capture time. An unknown product yields an empty
/// list, matching the core's uniform empty-result contract.
///
/// # Errors
/// Returns `StatusCode::INTERNAL_SERVER_ERROR` if the database query fails.
pub async fn snapshot_history(
    State(ctx): State<Arc<ApiContext>>,
    Path(product_id): Path<i64>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<SnapshotRecord>>, StatusCode> {
    let snaps = ctx
        .snapshots
        .history(product_id, params.days)
        .await
        .map_err(internal_error)?;

    Ok(Json(snaps))
}

/// Gets the lowest-priced snapshot between `start_date` and `end_date`
/// inclusive. A missing `start_date` leaves the window unbounded below; a
/// missing `end_date` bounds it at the current time so future-dated rows
/// are excluded.
///
/// # Errors
/// Returns `StatusCode::NOT_FOUND` if no priced snapshot falls in the
/// window, or `StatusCode::INTERNAL_SERVER_ERROR` if the query fails.
pub async fn best_price(
    State(ctx): State<Arc<ApiContext>>,
    Path(product_id): Path<i64>,
    Query(params): Query<BestPriceParams>,
) -> Result<Json<SnapshotRecord>, StatusCode> {
    let (start, end) = period_bounds(params.start_date, params.end_date, Utc::now());

    let snap = ctx
        .snapshots
        .lowest_price_in_period(product_id, start, end)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(snap))
}

/// Converts optional query dates to the inclusive UTC window the query
/// engine expects: start-of-day for the lower bound, end-of-day for the
/// upper, and `now` when no upper date was given.
fn period_bounds(
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let start = start_date.map(|d| d.and_time(NaiveTime::MIN).and_utc());
    let end = end_date
        .and_then(|d| d.and_hms_micro_opt(23, 59, 59, 999_999))
        .map(|ndt| ndt.and_utc())
        .or(Some(now));

    (start, end)
}

fn internal_error(e: anyhow::Error) -> StatusCode {
    tracing::error!("Request failed: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_history_days_defaults_to_seven() {
        let params: HistoryParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.days, 7);
    }

    #[test]
    fn test_period_bounds_both_dates() {
        let start_date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let end_date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let (start, end) = period_bounds(Some(start_date), Some(end_date), sample_now());

        assert_eq!(
            start.unwrap(),
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
        );
        // End of day, inclusive.
        let end = end.unwrap();
        assert_eq!(end.date_naive(), end_date);
        assert!(end > Utc.with_ymd_and_hms(2025, 6, 10, 23, 59, 58).unwrap());
    }

    #[test]
    fn test_period_bounds_missing_start_is_unbounded() {
        let (start, _) = period_bounds(None, None, sample_now());
        assert!(start.is_none());
    }

    #[test]
    fn test_period_bounds_missing_end_defaults_to_now() {
        let (_, end) = period_bounds(None, None, sample_now());
        assert_eq!(end, Some(sample_now()));
    }

    #[test]
    fn test_best_price_params_parse_dates() {
        let params: BestPriceParams =
            serde_urlencoded::from_str("start_date=2025-06-01&end_date=2025-06-10").unwrap();
        assert_eq!(
            params.start_date,
            Some(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
        );
        assert_eq!(
            params.end_date,
            Some(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap())
        );
    }
}
