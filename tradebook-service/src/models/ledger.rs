//! Vendor ledger: bills are debits, payments are credits.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Ledger transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Bill,
    Payment,
}

impl TransactionType {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bill => "Bill",
            Self::Payment => "Payment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Bill" => Some(Self::Bill),
            "Payment" => Some(Self::Payment),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted ledger transaction. Bill amounts are stored positive, payment
/// amounts negative (`-abs(amount_paid)` at insertion time).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub transaction_id: Uuid,
    pub txn_date: NaiveDate,
    pub supplier_id: Uuid,
    pub txn_type: String,
    pub amount: Decimal,
    pub details: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl LedgerTransaction {
    /// Get parsed transaction type.
    pub fn parsed_type(&self) -> Option<TransactionType> {
        TransactionType::parse(&self.txn_type)
    }
}

/// One line of a vendor's merged statement: per-date bill totals plus
/// recorded payments.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LedgerLine {
    pub txn_date: NaiveDate,
    pub txn_type: String,
    pub amount: Decimal,
    pub details: Option<String>,
}

/// Signed net-due balance: bills minus payments.
///
/// `total_payments` is already negative (payments are stored as
/// `-abs(amount)`), so this is a plain sum.
pub fn net_due(total_bills: Decimal, total_payments: Decimal) -> Decimal {
    (total_bills + total_payments).round_dp(2)
}

/// User-facing standing derived from the net-due sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceStanding {
    NetDue,
    Overpaid,
    Settled,
}

impl BalanceStanding {
    pub fn of(balance: Decimal) -> Self {
        if balance > Decimal::ZERO {
            Self::NetDue
        } else if balance < Decimal::ZERO {
            Self::Overpaid
        } else {
            Self::Settled
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetDue => "NET DUE",
            Self::Overpaid => "OVERPAID",
            Self::Settled => "SETTLED",
        }
    }
}
