//! Month picker options.

use axum::{extract::Query, Json};
use chrono::Utc;
use domain::models::{MonthOption, MonthOptionsQuery, DEFAULT_MONTH_OPTIONS};
use domain::services::month_options;
use validator::Validate;

use crate::error::ApiError;
use crate::extractors::SessionAuth;

/// The last `count` months, newest first.
///
/// GET /api/v1/earnings/months?count=N
pub async fn list_months(
    _auth: SessionAuth,
    Query(query): Query<MonthOptionsQuery>,
) -> Result<Json<Vec<MonthOption>>, ApiError> {
    query.validate()?;

    let count = query.count.unwrap_or(DEFAULT_MONTH_OPTIONS);
    Ok(Json(month_options(Utc::now().date_naive(), count)))
}
