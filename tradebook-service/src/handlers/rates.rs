//! Daily-rate handlers: per-date upsert and CSV bulk import.

use crate::services::metrics::record_rate_rows_imported;
use crate::models::DailyRates;
use crate::startup::AppState;
use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct UpsertRatesPayload {
    pub tandoor_rate: Decimal,
    pub boiler_rate: Decimal,
    pub egg_rate: Decimal,
    /// Zero or negative rates are rejected unless the caller explicitly
    /// overrides.
    #[serde(default)]
    pub allow_non_positive: bool,
}

#[derive(Debug, Serialize)]
pub struct UpsertRatesResponse {
    #[serde(flatten)]
    pub rates: DailyRates,
    pub bill_entries_updated: u64,
}

pub async fn get_rates(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DailyRates>, AppError> {
    let rates = state
        .db
        .get_daily_rates(date)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No rates recorded for {}", date)))?;
    Ok(Json(rates))
}

pub async fn list_rates(State(state): State<AppState>) -> Result<Json<Vec<DailyRates>>, AppError> {
    Ok(Json(state.db.list_daily_rates().await?))
}

/// Upsert the rates for a date, then bring every persisted bill row on that
/// date back in line with the new rates.
pub async fn upsert_rates(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    Json(payload): Json<UpsertRatesPayload>,
) -> Result<Json<UpsertRatesResponse>, AppError> {
    let non_positive = payload.tandoor_rate <= Decimal::ZERO
        || payload.boiler_rate <= Decimal::ZERO
        || payload.egg_rate <= Decimal::ZERO;
    if non_positive && !payload.allow_non_positive {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Rates are zero or negative; set allow_non_positive to save anyway"
        )));
    }

    let rates = state
        .db
        .upsert_daily_rates(
            date,
            payload.tandoor_rate,
            payload.boiler_rate,
            payload.egg_rate,
        )
        .await?;
    let bill_entries_updated = state.db.refresh_bill_entries_for_date(&rates).await?;
    state.rate_cache.invalidate_date(date);

    Ok(Json(UpsertRatesResponse {
        rates,
        bill_entries_updated,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ImportRatesPayload {
    /// Raw CSV content including a header row.
    pub csv: String,
    #[serde(default = "default_date_column")]
    pub date_column: String,
    #[serde(default = "default_tandoor_column")]
    pub tandoor_column: String,
    #[serde(default = "default_boiler_column")]
    pub boiler_column: String,
    #[serde(default = "default_egg_column")]
    pub egg_column: String,
}

fn default_date_column() -> String {
    "Date".to_string()
}

fn default_tandoor_column() -> String {
    "Tandoor".to_string()
}

fn default_boiler_column() -> String {
    "Boiler".to_string()
}

fn default_egg_column() -> String {
    "Egg".to_string()
}

#[derive(Debug, Serialize)]
pub struct ImportRatesResponse {
    pub imported: u64,
    pub bill_entries_updated: u64,
    pub skipped: Vec<String>,
}

/// Bulk-import daily rates from CSV text with caller-specified column
/// mapping. Rows whose date or rates cannot be parsed are skipped and
/// reported, not fatal.
pub async fn import_rates(
    State(state): State<AppState>,
    Json(payload): Json<ImportRatesPayload>,
) -> Result<Json<ImportRatesResponse>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(payload.csv.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid CSV header: {}", e)))?
        .clone();

    let date_idx = find_column(&headers, &payload.date_column)?;
    let tandoor_idx = find_column(&headers, &payload.tandoor_column)?;
    let boiler_idx = find_column(&headers, &payload.boiler_column)?;
    let egg_idx = find_column(&headers, &payload.egg_column)?;

    let mut imported = 0;
    let mut bill_entries_updated = 0;
    let mut skipped = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                skipped.push(format!("row {}: {}", line + 2, e));
                continue;
            }
        };

        let raw_date = record.get(date_idx).unwrap_or_default();
        let Some(date) = parse_import_date(raw_date) else {
            skipped.push(format!("row {}: could not parse date '{}'", line + 2, raw_date));
            continue;
        };

        let rates: Option<(Decimal, Decimal, Decimal)> = (|| {
            Some((
                record.get(tandoor_idx)?.parse().ok()?,
                record.get(boiler_idx)?.parse().ok()?,
                record.get(egg_idx)?.parse().ok()?,
            ))
        })();
        let Some((tandoor, boiler, egg)) = rates else {
            skipped.push(format!("row {}: could not parse rates", line + 2));
            continue;
        };

        let rates = state.db.upsert_daily_rates(date, tandoor, boiler, egg).await?;
        bill_entries_updated += state.db.refresh_bill_entries_for_date(&rates).await?;
        state.rate_cache.invalidate_date(date);
        imported += 1;
    }

    if !skipped.is_empty() {
        warn!(skipped = skipped.len(), "CSV import skipped rows");
    }
    record_rate_rows_imported("imported", imported);
    record_rate_rows_imported("skipped", skipped.len() as u64);

    Ok(Json(ImportRatesResponse {
        imported,
        bill_entries_updated,
        skipped,
    }))
}

fn find_column(headers: &csv::StringRecord, wanted: &str) -> Result<usize, AppError> {
    // Exact match first, then case-insensitive containment, the same
    // best-effort matching the import has always done.
    if let Some(idx) = headers.iter().position(|h| h == wanted) {
        return Ok(idx);
    }
    let wanted_lower = wanted.to_lowercase();
    headers
        .iter()
        .position(|h| h.to_lowercase().contains(&wanted_lower))
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("CSV column '{}' not found", wanted)))
}

/// Parse an import date, preferring day-first forms for ambiguous input.
fn parse_import_date(raw: &str) -> Option<NaiveDate> {
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d/%m/%y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    None
}
