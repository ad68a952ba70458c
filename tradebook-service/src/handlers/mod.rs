//! HTTP handlers for tradebook-service.

pub mod bills;
pub mod ledger;
pub mod markups;
pub mod rates;
pub mod reports;
pub mod suppliers;

use rust_decimal::Decimal;
use validator::ValidationError;

/// Quantities and rates entered at the boundary must be non-negative.
pub fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("value must be a non-negative number".into());
        return Err(err);
    }
    Ok(())
}

/// Payment amounts must be strictly positive.
pub fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut err = ValidationError::new("positive");
        err.message = Some("value must be a positive number".into());
        return Err(err);
    }
    Ok(())
}

/// Names must contain at least one non-whitespace character.
pub fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("non_blank");
        err.message = Some("value cannot be empty".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_negative_rejects_below_zero() {
        assert!(non_negative(&Decimal::from(-1)).is_err());
        assert!(non_negative(&Decimal::ZERO).is_ok());
        assert!(non_negative(&Decimal::from(3)).is_ok());
    }

    #[test]
    fn positive_rejects_zero() {
        assert!(positive(&Decimal::ZERO).is_err());
        assert!(positive(&Decimal::from(1)).is_ok());
    }

    #[test]
    fn non_blank_rejects_whitespace() {
        assert!(non_blank("  ").is_err());
        assert!(non_blank("Wings").is_ok());
    }
}
