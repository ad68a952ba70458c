//! Supplier management handlers.

use crate::handlers::non_blank;
use crate::models::{CreateSupplier, Supplier, UpdateSupplier, VendorType};
use crate::startup::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SupplierPayload {
    #[validate(custom(function = "non_blank"))]
    pub name: String,
    pub phone: Option<String>,
    #[serde(default = "default_payment_type")]
    pub preferred_payment_type: String,
    #[serde(default = "default_payment_frequency")]
    pub payment_frequency: String,
    pub vendor_type: VendorType,
    #[serde(default = "default_markup_required")]
    pub markup_required: bool,
}

fn default_payment_type() -> String {
    "Cash".to_string()
}

fn default_payment_frequency() -> String {
    "Daily".to_string()
}

fn default_markup_required() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct CreateSupplierResponse {
    #[serde(flatten)]
    pub supplier: Supplier,
    pub default_rules_seeded: u64,
}

/// Create a supplier. New Chicken vendors with markup validation enabled get
/// the default rule set.
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(payload): Json<SupplierPayload>,
) -> Result<(StatusCode, Json<CreateSupplierResponse>), AppError> {
    payload.validate()?;

    let input = CreateSupplier {
        name: payload.name.trim().to_string(),
        phone: payload.phone,
        preferred_payment_type: payload.preferred_payment_type,
        payment_frequency: payload.payment_frequency,
        vendor_type: payload.vendor_type,
        markup_required: payload.markup_required,
    };
    let supplier = state.db.create_supplier(&input).await?;

    let default_rules_seeded = if input.vendor_type == VendorType::Chicken && input.markup_required
    {
        state.db.seed_default_markup_rules(supplier.supplier_id).await?
    } else {
        0
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateSupplierResponse {
            supplier,
            default_rules_seeded,
        }),
    ))
}

pub async fn list_suppliers(
    State(state): State<AppState>,
) -> Result<Json<Vec<Supplier>>, AppError> {
    Ok(Json(state.db.list_suppliers().await?))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    Path(supplier_id): Path<Uuid>,
) -> Result<Json<Supplier>, AppError> {
    Ok(Json(state.db.get_supplier(supplier_id).await?))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    Path(supplier_id): Path<Uuid>,
    Json(payload): Json<SupplierPayload>,
) -> Result<Json<Supplier>, AppError> {
    payload.validate()?;

    let input = UpdateSupplier {
        name: payload.name.trim().to_string(),
        phone: payload.phone,
        preferred_payment_type: payload.preferred_payment_type,
        payment_frequency: payload.payment_frequency,
        vendor_type: payload.vendor_type,
        markup_required: payload.markup_required,
    };
    let supplier = state.db.update_supplier(supplier_id, &input).await?;

    Ok(Json(supplier))
}

/// Delete a supplier together with its markup rules, bills, and ledger.
pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(supplier_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.db.delete_supplier(supplier_id).await?;
    state.rate_cache.invalidate_supplier(supplier_id);
    Ok(StatusCode::NO_CONTENT)
}
