//! Raw daily commodity rates, one record per calendar date.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The three named base-rate categories published on the daily paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateCategory {
    Tandoor,
    Boiler,
    Egg,
}

impl RateCategory {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tandoor => "Tandoor",
            Self::Boiler => "Boiler",
            Self::Egg => "Egg",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Tandoor" => Some(Self::Tandoor),
            "Boiler" => Some(Self::Boiler),
            "Egg" => Some(Self::Egg),
            _ => None,
        }
    }
}

impl std::fmt::Display for RateCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The base rates recorded for one date.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DailyRates {
    pub rate_date: NaiveDate,
    pub tandoor_rate: Decimal,
    pub boiler_rate: Decimal,
    pub egg_rate: Decimal,
    pub updated_utc: DateTime<Utc>,
}

impl DailyRates {
    /// Base value for a category.
    pub fn base(&self, category: RateCategory) -> Decimal {
        match category {
            RateCategory::Tandoor => self.tandoor_rate,
            RateCategory::Boiler => self.boiler_rate,
            RateCategory::Egg => self.egg_rate,
        }
    }
}
