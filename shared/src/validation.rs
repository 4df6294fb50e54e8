//! Input validation for stock adjustments and partial updates

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::forecast::PROJECTION_PERIODS;

/// Upper bound for a transit-day adjustment
pub const MAX_TRANSIT_DAYS: i64 = 365;

/// Reasons an adjustment request is rejected before touching any state
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    #[error("{field} cannot be negative")]
    NegativeQuantity { field: String },

    #[error("{field} must be between 0 and {max}")]
    OutOfRange { field: String, max: i64 },

    #[error("projection index {index} is outside 0..{len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("field {0} cannot be modified")]
    ProtectedField(String),

    #[error("update payload is empty")]
    EmptyUpdate,

    #[error("invalid update payload: {0}")]
    MalformedUpdate(String),
}

/// Validate a unit quantity: non-negative
pub fn validate_quantity(field: &str, value: Decimal) -> Result<Decimal, ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeQuantity {
            field: field.to_string(),
        });
    }
    Ok(value)
}

/// Convert a binary float from an untyped caller into a validated quantity
pub fn quantity_from_f64(field: &str, value: f64) -> Result<Decimal, ValidationError> {
    let decimal = Decimal::from_f64(value).ok_or_else(|| ValidationError::NotFinite {
        field: field.to_string(),
    })?;
    validate_quantity(field, decimal)
}

/// Validate a transit-day count
pub fn validate_transit_days(days: i64) -> Result<u32, ValidationError> {
    if days < 0 {
        return Err(ValidationError::NegativeQuantity {
            field: "days".to_string(),
        });
    }
    if days > MAX_TRANSIT_DAYS {
        return Err(ValidationError::OutOfRange {
            field: "days".to_string(),
            max: MAX_TRANSIT_DAYS,
        });
    }
    Ok(days as u32)
}

/// Validate a zero-based projection index
pub fn validate_projection_index(index: i64) -> Result<usize, ValidationError> {
    if index < 0 || index >= PROJECTION_PERIODS as i64 {
        return Err(ValidationError::IndexOutOfRange {
            index,
            len: PROJECTION_PERIODS,
        });
    }
    Ok(index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_rules() {
        let units = Decimal::new(125, 1);
        assert_eq!(validate_quantity("units", units), Ok(units));
        assert_eq!(validate_quantity("units", Decimal::ZERO), Ok(Decimal::ZERO));
        assert!(matches!(
            validate_quantity("units", Decimal::NEGATIVE_ONE),
            Err(ValidationError::NegativeQuantity { .. })
        ));
    }

    #[test]
    fn test_quantity_from_f64() {
        assert_eq!(quantity_from_f64("units", 0.1), Ok(Decimal::new(1, 1)));
        assert!(matches!(
            quantity_from_f64("units", f64::NAN),
            Err(ValidationError::NotFinite { .. })
        ));
        assert!(matches!(
            quantity_from_f64("units", f64::INFINITY),
            Err(ValidationError::NotFinite { .. })
        ));
        assert!(matches!(
            quantity_from_f64("units", -2.0),
            Err(ValidationError::NegativeQuantity { .. })
        ));
    }

    #[test]
    fn test_projection_index_bounds() {
        assert_eq!(validate_projection_index(0), Ok(0));
        assert_eq!(validate_projection_index(5), Ok(5));
        assert_eq!(
            validate_projection_index(6),
            Err(ValidationError::IndexOutOfRange { index: 6, len: 6 })
        );
        assert!(validate_projection_index(-1).is_err());
    }

    #[test]
    fn test_transit_days_bounds() {
        assert_eq!(validate_transit_days(12), Ok(12));
        assert!(validate_transit_days(-3).is_err());
        assert!(validate_transit_days(400).is_err());
    }
}
