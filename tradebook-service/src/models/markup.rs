//! Markup rules: the per-vendor formula that turns a base commodity rate
//! into an item's expected unit rate.

use super::daily_rate::{DailyRates, RateCategory};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Arithmetic operator of a markup adjustment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustOp {
    #[serde(rename = "+", alias = "add")]
    Add,
    #[serde(rename = "-", alias = "subtract")]
    Subtract,
    #[serde(rename = "*", alias = "multiply")]
    Multiply,
    #[serde(rename = "/", alias = "divide")]
    Divide,
}

impl AdjustOp {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "+" => Some(Self::Add),
            "-" => Some(Self::Subtract),
            "*" => Some(Self::Multiply),
            "/" => Some(Self::Divide),
            _ => None,
        }
    }
}

/// One adjustment: an operator paired with its operand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustStep {
    pub op: AdjustOp,
    pub operand: Decimal,
}

impl AdjustStep {
    /// Apply the step to a running rate. Division by zero leaves the rate
    /// unchanged rather than faulting.
    pub fn apply(&self, rate: Decimal) -> Decimal {
        match self.op {
            AdjustOp::Add => rate + self.operand,
            AdjustOp::Subtract => rate - self.operand,
            AdjustOp::Multiply => rate * self.operand,
            AdjustOp::Divide => {
                if self.operand.is_zero() {
                    rate
                } else {
                    rate / self.operand
                }
            }
        }
    }
}

/// The markup formula: a base-rate category and up to two sequential
/// adjustment steps. The second step being optional is a structural fact of
/// this type, not a null-check convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupFormula {
    pub category: RateCategory,
    pub step_one: AdjustStep,
    pub step_two: Option<AdjustStep>,
}

impl MarkupFormula {
    /// Expected unit rate for the given day's base rates: pick the base by
    /// category, run the steps in order, clamp at zero, round to 2 decimals.
    pub fn expected_rate(&self, rates: &DailyRates) -> Decimal {
        let mut rate = rates.base(self.category);
        rate = self.step_one.apply(rate);
        if let Some(step) = &self.step_two {
            rate = step.apply(rate);
        }
        rate.max(Decimal::ZERO).round_dp(2)
    }
}

/// Resolve the expected rate for a grid cell. A missing raw-rate record or a
/// missing rule yields exactly 0.00, the "no rate data" sentinel.
pub fn resolve_expected_rate(
    rates: Option<&DailyRates>,
    formula: Option<&MarkupFormula>,
) -> Decimal {
    match (rates, formula) {
        (Some(rates), Some(formula)) => formula.expected_rate(rates),
        _ => Decimal::ZERO,
    }
}

/// Persisted markup rule row, unique per (supplier, item name).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MarkupRule {
    pub rule_id: Uuid,
    pub supplier_id: Uuid,
    pub item_name: String,
    pub base_category: String,
    pub op1: String,
    pub value1: Decimal,
    pub op2: Option<String>,
    pub value2: Option<Decimal>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl MarkupRule {
    /// Get the parsed formula. None when the stored category/operator text is
    /// not one of the recognized values.
    pub fn formula(&self) -> Option<MarkupFormula> {
        let category = RateCategory::parse(&self.base_category)?;
        let step_one = AdjustStep {
            op: AdjustOp::parse(&self.op1)?,
            operand: self.value1,
        };
        // Second step only counts when both operator and operand are present.
        let step_two = match (&self.op2, self.value2) {
            (Some(op), Some(operand)) => Some(AdjustStep {
                op: AdjustOp::parse(op)?,
                operand,
            }),
            _ => None,
        };
        Some(MarkupFormula {
            category,
            step_one,
            step_two,
        })
    }
}

/// Default rule set auto-populated for a new Chicken vendor with markup
/// validation enabled.
pub fn default_chicken_rules() -> Vec<(&'static str, MarkupFormula)> {
    let add = |category: RateCategory, operand: i64| MarkupFormula {
        category,
        step_one: AdjustStep {
            op: AdjustOp::Add,
            operand: Decimal::from(operand),
        },
        step_two: None,
    };

    vec![
        ("Tandoori", add(RateCategory::Tandoor, 20)),
        ("Boiler", add(RateCategory::Boiler, 25)),
        (
            "Egg",
            MarkupFormula {
                category: RateCategory::Egg,
                step_one: AdjustStep {
                    op: AdjustOp::Divide,
                    operand: Decimal::from(10),
                },
                step_two: Some(AdjustStep {
                    op: AdjustOp::Add,
                    operand: Decimal::from(5),
                }),
            },
        ),
        ("Spl Leg", add(RateCategory::Tandoor, 25)),
        ("Boneless", add(RateCategory::Tandoor, 95)),
        ("Full Leg", add(RateCategory::Tandoor, 18)),
        ("Wings", add(RateCategory::Tandoor, 15)),
    ]
}
