//! Reporting handlers over persisted bills and ledgers.

use crate::startup::AppState;
use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub active_suppliers: i64,
    pub total_outstanding: Decimal,
}

/// Financial overview: supplier count and total outstanding dues.
pub async fn overview(State(state): State<AppState>) -> Result<Json<OverviewResponse>, AppError> {
    let (active_suppliers, total_outstanding) = state.db.overview().await?;
    Ok(Json(OverviewResponse {
        active_suppliers,
        total_outstanding,
    }))
}

#[derive(Debug, Deserialize)]
pub struct VarianceQuery {
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct VarianceRow {
    pub bill_date: NaiveDate,
    pub supplier_id: Uuid,
    pub item_name: String,
    pub expected_rate: Decimal,
    pub vendor_rate: Decimal,
    pub variance: Decimal,
    pub variance_pct: Decimal,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct VarianceResponse {
    pub rows: Vec<VarianceRow>,
}

/// Bill rows with non-zero variance, newest first.
pub async fn variance_report(
    State(state): State<AppState>,
    Query(query): Query<VarianceQuery>,
) -> Result<Json<VarianceResponse>, AppError> {
    let entries = state.db.variance_entries(query.supplier_id).await?;

    let rows = entries
        .into_iter()
        .map(|entry| {
            let expected_amount = (entry.net_qty * entry.expected_rate).round_dp(2);
            let variance_pct = if expected_amount.is_zero() {
                Decimal::ZERO
            } else {
                (entry.variance / expected_amount * Decimal::ONE_HUNDRED).round_dp(2)
            };
            VarianceRow {
                bill_date: entry.bill_date,
                supplier_id: entry.supplier_id,
                item_name: entry.item_name,
                expected_rate: entry.expected_rate,
                vendor_rate: entry.vendor_rate,
                variance: entry.variance,
                variance_pct,
                status: entry.status,
            }
        })
        .collect();

    Ok(Json(VarianceResponse { rows }))
}
