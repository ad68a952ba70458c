//! Markup rule handlers.

use crate::models::{AdjustStep, MarkupFormula, MarkupRule, RateCategory};
use crate::startup::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct UpsertMarkupPayload {
    pub base_category: RateCategory,
    pub step_one: AdjustStep,
    pub step_two: Option<AdjustStep>,
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub supplier_id: Uuid,
    pub items: Vec<String>,
}

pub async fn list_markup_rules(
    State(state): State<AppState>,
    Path(supplier_id): Path<Uuid>,
) -> Result<Json<Vec<MarkupRule>>, AppError> {
    state.db.get_supplier(supplier_id).await?;
    Ok(Json(state.db.list_markup_rules(supplier_id).await?))
}

/// Ordered item names for a supplier. An empty list means no rules are
/// configured yet; callers surface that as a warning, not an error.
pub async fn list_items(
    State(state): State<AppState>,
    Path(supplier_id): Path<Uuid>,
) -> Result<Json<ItemsResponse>, AppError> {
    state.db.get_supplier(supplier_id).await?;
    let items = state.db.list_item_names(supplier_id).await?;
    Ok(Json(ItemsResponse { supplier_id, items }))
}

/// Upsert a markup rule. Unlike bill saves, rule saves overwrite without a
/// confirmation step.
pub async fn upsert_markup_rule(
    State(state): State<AppState>,
    Path((supplier_id, item_name)): Path<(Uuid, String)>,
    Json(payload): Json<UpsertMarkupPayload>,
) -> Result<Json<MarkupRule>, AppError> {
    let item_name = item_name.trim().to_string();
    if item_name.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Item name cannot be empty"
        )));
    }

    state.db.get_supplier(supplier_id).await?;

    let formula = MarkupFormula {
        category: payload.base_category,
        step_one: payload.step_one,
        step_two: payload.step_two,
    };
    let rule = state
        .db
        .upsert_markup_rule(supplier_id, &item_name, &formula)
        .await?;

    // Cached expected rates for this supplier are stale now.
    state.rate_cache.invalidate_supplier(supplier_id);

    Ok(Json(rule))
}

pub async fn delete_markup_rule(
    State(state): State<AppState>,
    Path((supplier_id, item_name)): Path<(Uuid, String)>,
) -> Result<StatusCode, AppError> {
    state.db.delete_markup_rule(supplier_id, &item_name).await?;
    state.rate_cache.invalidate_supplier(supplier_id);
    Ok(StatusCode::NO_CONTENT)
}
