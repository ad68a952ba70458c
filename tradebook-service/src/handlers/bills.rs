//! Bill entry handlers: grid seeding, row reconciliation, and the save path.

use crate::handlers::{non_blank, non_negative};
use crate::models::{
    reconcile_row, resolve_expected_rate, BillComputation, BillEntry, MarkupFormula, NewBillRow,
    RowStatus,
};
use crate::services::metrics::record_bill_saved;
use crate::startup::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct BillQuery {
    pub supplier_id: Uuid,
    pub bill_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct GridRow {
    pub item_name: String,
    pub expected_rate: Decimal,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct GridResponse {
    pub supplier_id: Uuid,
    pub bill_date: NaiveDate,
    /// True when the supplier has no markup rules configured; the grid is
    /// empty and callers warn rather than error.
    pub no_rules: bool,
    pub rows: Vec<GridRow>,
}

/// Seed the bill grid: every configured item with its resolved expected rate.
pub async fn bill_grid(
    State(state): State<AppState>,
    Query(query): Query<BillQuery>,
) -> Result<Json<GridResponse>, AppError> {
    state.db.get_supplier(query.supplier_id).await?;

    let rules = state.db.list_markup_rules(query.supplier_id).await?;
    let rates = state.db.get_daily_rates(query.bill_date).await?;

    let mut rows = Vec::with_capacity(rules.len());
    for rule in &rules {
        let expected_rate = match state
            .rate_cache
            .get(query.bill_date, query.supplier_id, &rule.item_name)
        {
            Some(rate) => rate,
            None => {
                let formula = decode_formula(rule.formula(), &rule.item_name)?;
                let rate = resolve_expected_rate(rates.as_ref(), Some(&formula));
                state
                    .rate_cache
                    .insert(query.bill_date, query.supplier_id, &rule.item_name, rate);
                rate
            }
        };

        let status = if expected_rate.is_zero() {
            RowStatus::NoRateData
        } else {
            RowStatus::Okay
        };
        rows.push(GridRow {
            item_name: rule.item_name.clone(),
            expected_rate,
            status: status.as_str(),
        });
    }

    Ok(Json(GridResponse {
        supplier_id: query.supplier_id,
        bill_date: query.bill_date,
        no_rules: rows.is_empty(),
        rows,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReconcilePayload {
    #[validate(custom(function = "non_negative"))]
    pub qty_received: Decimal,
    #[validate(custom(function = "non_negative"))]
    pub qty_damaged: Decimal,
    #[validate(custom(function = "non_negative"))]
    pub vendor_rate: Decimal,
    #[validate(custom(function = "non_negative"))]
    pub expected_rate: Decimal,
}

/// Recompute the full derived set for one row. Pure; called on every cell
/// edit.
pub async fn reconcile(
    Json(payload): Json<ReconcilePayload>,
) -> Result<Json<BillComputation>, AppError> {
    payload.validate()?;
    Ok(Json(reconcile_row(
        payload.qty_received,
        payload.qty_damaged,
        payload.vendor_rate,
        payload.expected_rate,
    )))
}

#[derive(Debug, Deserialize, Validate)]
pub struct BillRowPayload {
    #[validate(custom(function = "non_blank"))]
    pub item_name: String,
    #[validate(custom(function = "non_negative"))]
    pub qty_received: Decimal,
    #[validate(custom(function = "non_negative"))]
    pub qty_damaged: Decimal,
    #[validate(custom(function = "non_negative"))]
    pub vendor_rate: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SaveBillPayload {
    pub supplier_id: Uuid,
    pub bill_date: NaiveDate,
    #[serde(default)]
    pub overwrite: bool,
    #[validate(nested)]
    pub rows: Vec<BillRowPayload>,
}

#[derive(Debug, Serialize)]
pub struct SaveBillResponse {
    pub supplier_id: Uuid,
    pub bill_date: NaiveDate,
    pub rows_saved: usize,
    pub total_amount: Decimal,
    pub overwritten: bool,
}

/// Save a completed bill. Rows are reconciled server-side from their raw
/// inputs, rows without positive net quantity are dropped, and the rest are
/// persisted together with one aggregated Bill ledger transaction.
pub async fn save_bill(
    State(state): State<AppState>,
    Json(payload): Json<SaveBillPayload>,
) -> Result<(StatusCode, Json<SaveBillResponse>), AppError> {
    payload.validate()?;

    state.db.get_supplier(payload.supplier_id).await?;

    let mut seen = std::collections::HashSet::new();
    for row in &payload.rows {
        if !seen.insert(row.item_name.trim().to_string()) {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Duplicate item '{}' in bill rows",
                row.item_name.trim()
            )));
        }
    }

    let rates = state.db.get_daily_rates(payload.bill_date).await?;
    let rules = state.db.list_markup_rules(payload.supplier_id).await?;
    let formulas: HashMap<String, MarkupFormula> = rules
        .into_iter()
        .map(|rule| {
            let formula = decode_formula(rule.formula(), &rule.item_name)?;
            Ok((rule.item_name, formula))
        })
        .collect::<Result<_, AppError>>()?;

    let mut to_save = Vec::new();
    for row in &payload.rows {
        let item_name = row.item_name.trim().to_string();
        let expected_rate =
            resolve_expected_rate(rates.as_ref(), formulas.get(&item_name));
        let computed = reconcile_row(
            row.qty_received,
            row.qty_damaged,
            row.vendor_rate,
            expected_rate,
        );

        if computed.net_qty > Decimal::ZERO {
            to_save.push(NewBillRow {
                item_name,
                net_qty: computed.net_qty,
                vendor_rate: row.vendor_rate,
                expected_rate,
                variance: computed.variance,
                status: computed.status,
            });
        }
    }

    if to_save.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "No entries with positive net quantity to save"
        )));
    }

    let outcome = state
        .db
        .save_bill(
            payload.supplier_id,
            payload.bill_date,
            &to_save,
            payload.overwrite,
        )
        .await?;

    record_bill_saved(if outcome.overwritten { "overwritten" } else { "saved" });

    Ok((
        StatusCode::CREATED,
        Json(SaveBillResponse {
            supplier_id: payload.supplier_id,
            bill_date: payload.bill_date,
            rows_saved: outcome.rows_saved,
            total_amount: outcome.total_amount,
            overwritten: outcome.overwritten,
        }),
    ))
}

/// Persisted rows for a supplier's bill on a date.
pub async fn list_bill_entries(
    State(state): State<AppState>,
    Query(query): Query<BillQuery>,
) -> Result<Json<Vec<BillEntry>>, AppError> {
    state.db.get_supplier(query.supplier_id).await?;
    Ok(Json(
        state
            .db
            .list_bill_entries(query.supplier_id, query.bill_date)
            .await?,
    ))
}

fn decode_formula(
    formula: Option<MarkupFormula>,
    item_name: &str,
) -> Result<MarkupFormula, AppError> {
    formula.ok_or_else(|| {
        AppError::DatabaseError(anyhow::anyhow!(
            "Stored markup rule for item '{}' is not decodable",
            item_name
        ))
    })
}
