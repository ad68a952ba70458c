//! Vendor ledger handlers: payments, statements, net-due balance.

use crate::handlers::positive;
use crate::models::{BalanceStanding, LedgerLine, LedgerTransaction};
use crate::services::metrics::record_payment_recorded;
use crate::startup::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentPayload {
    pub supplier_id: Uuid,
    pub txn_date: NaiveDate,
    #[validate(custom(function = "positive"))]
    pub amount: Decimal,
    pub details: Option<String>,
}

/// Record a vendor payment; the amount is stored as a negative ledger credit.
pub async fn record_payment(
    State(state): State<AppState>,
    Json(payload): Json<RecordPaymentPayload>,
) -> Result<(StatusCode, Json<LedgerTransaction>), AppError> {
    payload.validate()?;

    state.db.get_supplier(payload.supplier_id).await?;
    let transaction = state
        .db
        .record_payment(
            payload.supplier_id,
            payload.txn_date,
            payload.amount,
            payload.details,
        )
        .await?;

    record_payment_recorded("recorded");

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Raw ledger transactions for a supplier, newest first.
pub async fn list_transactions(
    State(state): State<AppState>,
    Path(supplier_id): Path<Uuid>,
) -> Result<Json<Vec<LedgerTransaction>>, AppError> {
    state.db.get_supplier(supplier_id).await?;
    Ok(Json(state.db.list_ledger_transactions(supplier_id).await?))
}

#[derive(Debug, Serialize)]
pub struct StatementResponse {
    pub supplier_id: Uuid,
    pub lines: Vec<LedgerLine>,
}

/// Merged statement: per-date bill totals plus payments, newest first.
pub async fn ledger_statement(
    State(state): State<AppState>,
    Path(supplier_id): Path<Uuid>,
) -> Result<Json<StatementResponse>, AppError> {
    state.db.get_supplier(supplier_id).await?;
    let lines = state.db.ledger_statement(supplier_id).await?;
    Ok(Json(StatementResponse { supplier_id, lines }))
}

#[derive(Debug, Serialize)]
pub struct NetDueResponse {
    pub supplier_id: Uuid,
    pub net_due: Decimal,
    pub standing: &'static str,
}

/// Signed net-due balance. Positive means the vendor is owed money, negative
/// means the business has overpaid.
pub async fn net_due(
    State(state): State<AppState>,
    Path(supplier_id): Path<Uuid>,
) -> Result<Json<NetDueResponse>, AppError> {
    state.db.get_supplier(supplier_id).await?;
    let balance = state.db.compute_net_due(supplier_id).await?;
    Ok(Json(NetDueResponse {
        supplier_id,
        net_due: balance,
        standing: BalanceStanding::of(balance).as_str(),
    }))
}
