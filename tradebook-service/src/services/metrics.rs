//! Metrics module for tradebook-service.
//! Provides Prometheus metrics for bookkeeping operations.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "tradebook_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Bills saved counter
pub static BILLS_SAVED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Payments recorded counter
pub static PAYMENTS_RECORDED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Daily-rate rows imported counter
pub static RATE_ROWS_IMPORTED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    BILLS_SAVED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "tradebook_bills_saved_total",
                "Total bill save operations by outcome"
            ),
            &["outcome"]
        )
        .expect("Failed to register BILLS_SAVED_TOTAL")
    });

    PAYMENTS_RECORDED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "tradebook_payments_recorded_total",
                "Total vendor payments recorded"
            ),
            &["outcome"]
        )
        .expect("Failed to register PAYMENTS_RECORDED_TOTAL")
    });

    RATE_ROWS_IMPORTED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "tradebook_rate_rows_imported_total",
                "Daily-rate rows written via bulk import by outcome"
            ),
            &["outcome"]
        )
        .expect("Failed to register RATE_ROWS_IMPORTED_TOTAL")
    });
}

pub fn record_bill_saved(outcome: &str) {
    if let Some(counter) = BILLS_SAVED_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn record_payment_recorded(outcome: &str) {
    if let Some(counter) = PAYMENTS_RECORDED_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn record_rate_rows_imported(outcome: &str, count: u64) {
    if let Some(counter) = RATE_ROWS_IMPORTED_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc_by(count);
    }
}

/// Render all registered metrics in the Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
