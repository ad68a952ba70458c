//! Bill rows and the row-reconciliation arithmetic.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Variance beyond this percentage of the expected amount, in either
/// direction, flags the row.
pub const VARIANCE_TOLERANCE_PCT: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Classification of a reconciled bill row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowStatus {
    Okay,
    Variance,
    #[serde(rename = "HIGH (+)")]
    High,
    #[serde(rename = "LOW (-)")]
    Low,
    #[serde(rename = "No Rate Data")]
    NoRateData,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl RowStatus {
    /// Get string representation for database and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Okay => "Okay",
            Self::Variance => "Variance",
            Self::High => "HIGH (+)",
            Self::Low => "LOW (-)",
            Self::NoRateData => "No Rate Data",
            Self::NotApplicable => "N/A",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Okay" => Self::Okay,
            "Variance" => Self::Variance,
            "HIGH (+)" => Self::High,
            "LOW (-)" => Self::Low,
            "No Rate Data" => Self::NoRateData,
            _ => Self::NotApplicable,
        }
    }
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The full derived set for one bill row. All five fields are functions of
/// the same four inputs and are always recomputed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillComputation {
    pub net_qty: Decimal,
    pub expected_amount: Decimal,
    pub vendor_amount: Decimal,
    pub variance: Decimal,
    pub status: RowStatus,
}

/// Reconcile one row: net quantity, both amounts, variance, and status.
///
/// Pure arithmetic; negative quantity/rate inputs are rejected at the
/// request boundary before this runs.
pub fn reconcile_row(
    qty_received: Decimal,
    qty_damaged: Decimal,
    vendor_rate: Decimal,
    expected_rate: Decimal,
) -> BillComputation {
    let net_qty = (qty_received - qty_damaged).max(Decimal::ZERO);
    let expected_amount = (net_qty * expected_rate).round_dp(2);
    let vendor_amount = (net_qty * vendor_rate).round_dp(2);
    let variance = (vendor_amount - expected_amount).round_dp(2);

    let status = if net_qty <= Decimal::ZERO {
        RowStatus::NotApplicable
    } else if expected_rate.is_zero() {
        RowStatus::NoRateData
    } else {
        let variance_pct = if expected_amount.is_zero() {
            Decimal::ZERO
        } else {
            variance / expected_amount * Decimal::ONE_HUNDRED
        };

        if variance_pct > VARIANCE_TOLERANCE_PCT {
            RowStatus::High
        } else if variance_pct < -VARIANCE_TOLERANCE_PCT {
            RowStatus::Low
        } else if !variance.is_zero() {
            RowStatus::Variance
        } else {
            RowStatus::Okay
        }
    };

    BillComputation {
        net_qty,
        expected_amount,
        vendor_amount,
        variance,
        status,
    }
}

/// Persisted bill row, unique per (date, supplier, item).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BillEntry {
    pub entry_id: Uuid,
    pub bill_date: NaiveDate,
    pub supplier_id: Uuid,
    pub item_name: String,
    pub net_qty: Decimal,
    pub vendor_rate: Decimal,
    pub expected_rate: Decimal,
    pub variance: Decimal,
    pub status: String,
    pub created_utc: DateTime<Utc>,
}

impl BillEntry {
    /// Get parsed status.
    pub fn parsed_status(&self) -> RowStatus {
        RowStatus::from_str(&self.status)
    }

    /// The amount this row contributes to the vendor's bill total.
    pub fn vendor_amount(&self) -> Decimal {
        (self.net_qty * self.vendor_rate).round_dp(2)
    }
}

/// Input for persisting one reconciled row in a bill save.
#[derive(Debug, Clone)]
pub struct NewBillRow {
    pub item_name: String,
    pub net_qty: Decimal,
    pub vendor_rate: Decimal,
    pub expected_rate: Decimal,
    pub variance: Decimal,
    pub status: RowStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn net_quantity_never_goes_negative() {
        let row = reconcile_row(dec("3"), dec("5"), dec("10"), dec("10"));
        assert_eq!(row.net_qty, Decimal::ZERO);
        assert_eq!(row.status, RowStatus::NotApplicable);
    }

    #[test]
    fn zero_net_quantity_is_not_applicable_regardless_of_rates() {
        let row = reconcile_row(dec("2"), dec("2"), dec("10"), Decimal::ZERO);
        assert_eq!(row.status, RowStatus::NotApplicable);

        let row = reconcile_row(Decimal::ZERO, Decimal::ZERO, dec("10"), dec("12"));
        assert_eq!(row.status, RowStatus::NotApplicable);
    }

    #[test]
    fn missing_expected_rate_reports_no_rate_data() {
        let row = reconcile_row(dec("10"), Decimal::ZERO, dec("12"), Decimal::ZERO);
        assert_eq!(row.status, RowStatus::NoRateData);
        assert_eq!(row.vendor_amount, dec("120.00"));
        assert_eq!(row.expected_amount, Decimal::ZERO);
    }

    #[test]
    fn overcharge_beyond_tolerance_flags_high() {
        let row = reconcile_row(dec("10"), Decimal::ZERO, dec("12.50"), dec("10.00"));
        assert_eq!(row.expected_amount, dec("100.00"));
        assert_eq!(row.vendor_amount, dec("125.00"));
        assert_eq!(row.variance, dec("25.00"));
        assert_eq!(row.status, RowStatus::High);
    }

    #[test]
    fn undercharge_beyond_tolerance_flags_low() {
        let row = reconcile_row(dec("10"), Decimal::ZERO, dec("9.00"), dec("10.00"));
        assert_eq!(row.variance, dec("-10.00"));
        assert_eq!(row.status, RowStatus::Low);
    }

    #[test]
    fn small_variance_within_tolerance_is_informational() {
        let row = reconcile_row(dec("10"), Decimal::ZERO, dec("10.10"), dec("10.00"));
        assert_eq!(row.variance, dec("1.00"));
        assert_eq!(row.status, RowStatus::Variance);
    }

    #[test]
    fn matching_rates_are_okay() {
        let row = reconcile_row(dec("10"), dec("1"), dec("10.00"), dec("10.00"));
        assert_eq!(row.net_qty, dec("9"));
        assert_eq!(row.expected_amount, dec("90.00"));
        assert_eq!(row.variance, Decimal::ZERO);
        assert_eq!(row.status, RowStatus::Okay);
    }

    #[test]
    fn boundary_variance_of_exactly_five_percent_is_not_high() {
        let row = reconcile_row(dec("10"), Decimal::ZERO, dec("10.50"), dec("10.00"));
        assert_eq!(row.variance, dec("5.00"));
        assert_eq!(row.status, RowStatus::Variance);
    }

    #[test]
    fn damaged_quantity_reduces_amounts() {
        let row = reconcile_row(dec("12"), dec("2"), dec("11.00"), dec("10.00"));
        assert_eq!(row.net_qty, dec("10"));
        assert_eq!(row.vendor_amount, dec("110.00"));
        assert_eq!(row.expected_amount, dec("100.00"));
        assert_eq!(row.variance, dec("10.00"));
        assert_eq!(row.status, RowStatus::High);
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            RowStatus::Okay,
            RowStatus::Variance,
            RowStatus::High,
            RowStatus::Low,
            RowStatus::NoRateData,
            RowStatus::NotApplicable,
        ] {
            assert_eq!(RowStatus::from_str(status.as_str()), status);
        }
    }
}
