//! Seller earnings endpoint handlers.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use chrono::Utc;
use domain::models::{
    BreakdownQuery, DashboardSummary, EarningsSnapshot, MonthQuery, MonthlyEarningsSummary,
    PlanDistribution,
};
use domain::services::{DashboardState, EarningsDashboard};
use futures::Stream;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::SellerAccess;
use crate::middleware::metrics::{
    record_export, record_integrity_warnings, record_live_session, record_snapshot,
};

/// Earnings snapshot for one month.
///
/// GET /api/v1/sellers/:seller_id/earnings?month=YYYY-MM
///
/// A failed computation still answers 200; the snapshot's `status` carries
/// the failure.
pub async fn get_snapshot(
    State(state): State<AppState>,
    access: SellerAccess,
    Query(query): Query<MonthQuery>,
) -> Result<Json<EarningsSnapshot>, ApiError> {
    query.validate()?;

    let snapshot = state
        .earnings
        .aggregate(Some(access.seller_id), query.month_key())
        .await?;
    record_snapshot(&snapshot, "http");

    Ok(Json(snapshot))
}

/// Monthly earnings for the trailing months, oldest first.
///
/// GET /api/v1/sellers/:seller_id/earnings/monthly?months=N
pub async fn get_monthly(
    State(state): State<AppState>,
    access: SellerAccess,
    Query(query): Query<BreakdownQuery>,
) -> Result<Json<Vec<MonthlyEarningsSummary>>, ApiError> {
    query.validate()?;

    let earnings_config = &state.config.earnings;
    let months = query.months_or(earnings_config.default_breakdown_months);
    if months > earnings_config.max_breakdown_months {
        return Err(ApiError::Validation(format!(
            "Months must be between 1 and {}",
            earnings_config.max_breakdown_months
        )));
    }

    let entries = state
        .earnings
        .breakdown(Some(access.seller_id), months, Utc::now().date_naive())
        .await?;

    let failed = entries.iter().filter(|e| e.failure.is_some()).count();
    if failed > 0 {
        warn!(
            seller_id = %access.seller_id,
            months,
            failed,
            "Monthly breakdown returned with failed months"
        );
    }

    Ok(Json(entries))
}

/// Completed recharges in the month grouped by plan type.
///
/// GET /api/v1/sellers/:seller_id/earnings/distribution?month=YYYY-MM
pub async fn get_distribution(
    State(state): State<AppState>,
    access: SellerAccess,
    Query(query): Query<MonthQuery>,
) -> Result<Json<PlanDistribution>, ApiError> {
    query.validate()?;

    let distribution = state
        .earnings
        .distribution(Some(access.seller_id), query.month_key())
        .await?;

    Ok(Json(distribution))
}

/// Headline growth figures for the dashboard.
///
/// GET /api/v1/sellers/:seller_id/earnings/summary
pub async fn get_summary(
    State(state): State<AppState>,
    access: SellerAccess,
) -> Result<Json<DashboardSummary>, ApiError> {
    let summary = state
        .earnings
        .summary(Some(access.seller_id), Utc::now().date_naive())
        .await?;

    Ok(Json(summary))
}

/// CSV report download.
///
/// GET /api/v1/sellers/:seller_id/earnings/export?month=YYYY-MM
///
/// When the data cannot be loaded the body is the error document and the
/// status is 503.
pub async fn export(
    State(state): State<AppState>,
    access: SellerAccess,
    Query(query): Query<MonthQuery>,
) -> Result<Response, ApiError> {
    query.validate()?;

    let export = state
        .earnings
        .export_csv(Some(access.seller_id), query.month_key())
        .await?;

    let status = if export.is_failed() {
        record_export(0, true);
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        let rows = match export.outcome {
            domain::services::ExportOutcome::Complete { rows } => rows,
            domain::services::ExportOutcome::Failed { .. } => 0,
        };
        record_export(rows, false);
        info!(
            seller_id = %access.seller_id,
            filename = %export.filename,
            rows,
            "Earnings report exported"
        );
        StatusCode::OK
    };

    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    Ok((
        status,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.content,
    )
        .into_response())
}

/// Decrements the live session gauge when the stream is dropped.
struct LiveSession;

impl LiveSession {
    fn start() -> Self {
        record_live_session(1.0);
        LiveSession
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        record_live_session(-1.0);
    }
}

/// Live dashboard state as Server-Sent Events.
///
/// GET /api/v1/sellers/:seller_id/earnings/stream?month=YYYY-MM
///
/// Each connection owns one dashboard session. A `dashboard` event carries
/// the full state after every change; the session is torn down when the
/// client disconnects.
pub async fn stream(
    State(state): State<AppState>,
    access: SellerAccess,
    Query(query): Query<MonthQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    query.validate()?;

    let notifier = if state.config.realtime.enabled {
        state.notifier.clone()
    } else {
        None
    };
    let dashboard = EarningsDashboard::with_breakdown_months(
        state.earnings.clone(),
        notifier,
        state.config.earnings.default_breakdown_months,
    );

    dashboard.init(Some(access.seller_id)).await?;
    if let Some(month) = query.month_key() {
        dashboard.update_month(month).await;
    }
    let initial = dashboard.state();
    record_snapshot(&initial.earnings, "stream");

    info!(
        seller_id = %access.seller_id,
        live = dashboard.is_live(),
        "Earnings stream opened"
    );

    let receiver = dashboard.watch();
    Ok(Sse::new(dashboard_events(dashboard, receiver)).keep_alive(
        KeepAlive::new().interval(Duration::from_secs(15)),
    ))
}

fn dashboard_events(
    dashboard: Arc<EarningsDashboard>,
    receiver: watch::Receiver<DashboardState>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let session = (dashboard, LiveSession::start());
    futures::stream::unfold(
        (session, receiver, true),
        |(session, mut receiver, first)| async move {
            if !first && receiver.changed().await.is_err() {
                return None;
            }
            let current = receiver.borrow_and_update().clone();
            if !first && !current.is_loading {
                record_integrity_warnings(&current.earnings.warnings);
            }
            let event = state_event(&current);
            Some((Ok(event), (session, receiver, false)))
        },
    )
}

fn state_payload(state: &DashboardState) -> Result<String, serde_json::Error> {
    serde_json::to_string(state)
}

fn state_event(state: &DashboardState) -> Event {
    match state_payload(state) {
        Ok(payload) => Event::default().event("dashboard").data(payload),
        Err(err) => {
            warn!(error = %err, "Failed to serialize dashboard state");
            Event::default().event("error").data("serialization failed")
        }
    }
}
