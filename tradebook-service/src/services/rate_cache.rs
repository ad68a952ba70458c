//! Memoization of resolved expected rates.
//!
//! Rate resolution runs once per grid cell per edit cycle, so results are
//! cached keyed by (date, supplier, item). The cache is an explicit object
//! owned by application state and passed where needed, never ambient global
//! state, and it must be invalidated whenever the underlying daily rates or
//! markup rules change.

use chrono::NaiveDate;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

type Key = (NaiveDate, Uuid, String);

#[derive(Clone, Default)]
pub struct RateCache {
    entries: Arc<DashMap<Key, Decimal>>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, date: NaiveDate, supplier_id: Uuid, item: &str) -> Option<Decimal> {
        self.entries
            .get(&(date, supplier_id, item.to_string()))
            .map(|entry| *entry.value())
    }

    pub fn insert(&self, date: NaiveDate, supplier_id: Uuid, item: &str, rate: Decimal) {
        self.entries.insert((date, supplier_id, item.to_string()), rate);
    }

    /// Drop every entry for a date. Called after a daily-rate upsert.
    pub fn invalidate_date(&self, date: NaiveDate) {
        self.entries.retain(|key, _| key.0 != date);
    }

    /// Drop every entry for a supplier. Called after markup-rule or supplier
    /// mutations.
    pub fn invalidate_supplier(&self, supplier_id: Uuid) {
        self.entries.retain(|key, _| key.1 != supplier_id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
