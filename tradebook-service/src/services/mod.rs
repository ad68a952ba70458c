//! Services module for tradebook-service.

pub mod database;
pub mod metrics;
pub mod rate_cache;

pub use database::{BillSaveOutcome, Database};
pub use metrics::{
    get_metrics, init_metrics, record_bill_saved, record_payment_recorded,
    record_rate_rows_imported,
};
pub use rate_cache::RateCache;
