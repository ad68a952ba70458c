//! Domain models for tradebook-service.

#![allow(clippy::should_implement_trait)]

mod bill;
mod daily_rate;
mod ledger;
mod markup;
mod supplier;

pub use bill::{
    reconcile_row, BillComputation, BillEntry, NewBillRow, RowStatus, VARIANCE_TOLERANCE_PCT,
};
pub use daily_rate::{DailyRates, RateCategory};
pub use ledger::{net_due, BalanceStanding, LedgerLine, LedgerTransaction, TransactionType};
pub use markup::{
    default_chicken_rules, AdjustOp, AdjustStep, MarkupFormula, MarkupRule, resolve_expected_rate,
};
pub use supplier::{CreateSupplier, Supplier, UpdateSupplier, VendorType};
