//! Common validation utilities.

use crate::period::MonthKey;
use validator::ValidationError;

/// Largest trailing window accepted by the monthly breakdown.
pub const MAX_MONTHS_BACK: u32 = 24;

/// Validates that a month string uses the `YYYY-MM` format.
pub fn validate_month_key(month: &str) -> Result<(), ValidationError> {
    match month.parse::<MonthKey>() {
        Ok(_) => Ok(()),
        Err(_) => {
            let mut err = ValidationError::new("month_format");
            err.message = Some("Month must use the YYYY-MM format".into());
            Err(err)
        }
    }
}

/// Validates the number of trailing months requested for a breakdown.
pub fn validate_months_back(months: u32) -> Result<(), ValidationError> {
    if (1..=MAX_MONTHS_BACK).contains(&months) {
        Ok(())
    } else {
        let mut err = ValidationError::new("months_range");
        err.message = Some(format!("Months must be between 1 and {}", MAX_MONTHS_BACK).into());
        Err(err)
    }
}

/// Validates that a commission rate is a percentage between 0 and 100.
pub fn validate_commission_rate(rate: f64) -> Result<(), ValidationError> {
    if (0.0..=100.0).contains(&rate) {
        Ok(())
    } else {
        let mut err = ValidationError::new("commission_rate_range");
        err.message = Some("Commission rate must be between 0 and 100".into());
        Err(err)
    }
}
