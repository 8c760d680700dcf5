//! Input validation guards for configuration and snapshot values
//!
//! These guards reject values that would otherwise flow silently into a
//! pricing pass: blank identifiers, tax rates outside [0, 1], non-finite
//! amounts.

use thiserror::Error;

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// String parameter is empty or contains only whitespace
    #[error("parameter '{parameter}' cannot be empty or whitespace-only")]
    EmptyString { parameter: String },

    /// Numeric parameter is outside valid range
    #[error("parameter '{parameter}' value {value} is outside valid range [{min}, {max}]")]
    NumericOutOfRange {
        parameter: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Numeric parameter is NaN or infinite
    #[error("parameter '{parameter}' must be a finite number")]
    NotFinite { parameter: String },

    /// Duplicate row identity in a sheet
    #[error("row id '{row_id}' appears more than once")]
    DuplicateRowId { row_id: String },
}

/// Validates that a string parameter is not empty or whitespace-only
///
/// # Examples
///
/// ```
/// use estimate_pipeline::validation::validate_non_empty_string;
///
/// assert!(validate_non_empty_string("row_id", "r-1").is_ok());
/// assert!(validate_non_empty_string("row_id", "   ").is_err());
/// ```
pub fn validate_non_empty_string<'a>(
    parameter_name: &str,
    value: &'a str,
) -> ValidationResult<&'a str> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyString {
            parameter: parameter_name.to_string(),
        })
    } else {
        Ok(value)
    }
}

/// Validates that a value is finite and within `[min, max]`
///
/// # Examples
///
/// ```
/// use estimate_pipeline::validation::validate_numeric_range;
///
/// assert!(validate_numeric_range("percent", 10.0, -100.0, 100.0).is_ok());
/// assert!(validate_numeric_range("percent", 150.0, -100.0, 100.0).is_err());
/// assert!(validate_numeric_range("percent", f64::NAN, -100.0, 100.0).is_err());
/// ```
pub fn validate_numeric_range(
    parameter_name: &str,
    value: f64,
    min: f64,
    max: f64,
) -> ValidationResult<f64> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            parameter: parameter_name.to_string(),
        });
    }
    if value < min || value > max {
        Err(ValidationError::NumericOutOfRange {
            parameter: parameter_name.to_string(),
            value,
            min,
            max,
        })
    } else {
        Ok(value)
    }
}

/// Tax rates are fractions: 0.13 means 13%.
pub fn validate_tax_rate(value: f64) -> ValidationResult<f64> {
    validate_numeric_range("tax_rate", value, 0.0, 1.0)
}

/// Rejects the second occurrence of any row id
pub fn validate_unique_row_ids<'a, I>(row_ids: I) -> ValidationResult<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = std::collections::HashSet::new();
    for row_id in row_ids {
        validate_non_empty_string("row_id", row_id)?;
        if !seen.insert(row_id) {
            return Err(ValidationError::DuplicateRowId {
                row_id: row_id.to_string(),
            });
        }
    }
    Ok(())
}
