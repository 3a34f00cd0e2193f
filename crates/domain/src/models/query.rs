//! Query parameters accepted by the earnings endpoints.

use serde::Deserialize;
use shared::period::MonthKey;
use shared::validation::{validate_month_key, MAX_MONTHS_BACK};
use validator::Validate;

/// Default number of months in the earnings chart.
pub const DEFAULT_BREAKDOWN_MONTHS: u32 = 6;

/// Default number of entries in the month picker.
pub const DEFAULT_MONTH_OPTIONS: u32 = 12;

/// `?month=YYYY-MM`; absent means the current month.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MonthQuery {
    #[validate(custom(function = "validate_month_key"))]
    pub month: Option<String>,
}

impl MonthQuery {
    /// Parsed month key, if one was supplied. Call after `validate`.
    pub fn month_key(&self) -> Option<MonthKey> {
        self.month.as_deref().and_then(|m| m.parse().ok())
    }
}

/// `?months=N` for the monthly breakdown.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BreakdownQuery {
    #[validate(range(min = 1, max = 24, message = "Months must be between 1 and 24"))]
    pub months: Option<u32>,
}

impl BreakdownQuery {
    pub fn months_or(&self, default: u32) -> u32 {
        self.months.unwrap_or(default).min(MAX_MONTHS_BACK)
    }
}

/// `?count=N` for the month picker.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MonthOptionsQuery {
    #[validate(range(min = 1, max = 36, message = "Count must be between 1 and 36"))]
    pub count: Option<u32>,
}
