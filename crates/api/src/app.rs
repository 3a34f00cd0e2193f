use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use domain::services::{EarningsNotifier, EarningsService, EarningsStore};
use shared::jwt::{JwtError, SessionVerifier};
use sqlx::PgPool;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AuthConfig, Config};
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{earnings, health, months};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Absent when running on the in-memory store.
    pub pool: Option<PgPool>,
    pub earnings: EarningsService,
    pub notifier: Option<EarningsNotifier>,
    pub verifier: Arc<SessionVerifier>,
}

impl AppState {
    /// Wire the earnings service over `store` according to `config`.
    pub fn new(
        config: Config,
        store: Arc<dyn EarningsStore>,
        pool: Option<PgPool>,
    ) -> Result<Self, JwtError> {
        let verifier = build_verifier(&config.auth)?;
        let earnings = EarningsService::new(store)
            .with_policy(config.earnings.commission_policy())
            .with_timeout(config.earnings.aggregation_timeout())
            .with_recent_limit(config.earnings.recent_transactions_limit);
        let notifier = config
            .realtime
            .enabled
            .then(|| EarningsNotifier::new(config.realtime.channel_capacity));

        Ok(Self {
            config: Arc::new(config),
            pool,
            earnings,
            notifier,
            verifier: Arc::new(verifier),
        })
    }
}

/// RS256 when a public key is configured, HS256 otherwise.
pub fn build_verifier(auth: &AuthConfig) -> Result<SessionVerifier, JwtError> {
    if auth.public_key.is_empty() {
        SessionVerifier::from_secret(&auth.jwt_secret, auth.leeway_secs)
    } else {
        SessionVerifier::from_rsa_public_key(&auth.public_key, auth.leeway_secs)
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Authenticated through the SellerAccess / SessionAuth extractors
    let earnings_routes = Router::new()
        .route(
            "/api/v1/sellers/:seller_id/earnings",
            get(earnings::get_snapshot),
        )
        .route(
            "/api/v1/sellers/:seller_id/earnings/monthly",
            get(earnings::get_monthly),
        )
        .route(
            "/api/v1/sellers/:seller_id/earnings/distribution",
            get(earnings::get_distribution),
        )
        .route(
            "/api/v1/sellers/:seller_id/earnings/summary",
            get(earnings::get_summary),
        )
        .route(
            "/api/v1/sellers/:seller_id/earnings/export",
            get(earnings::export),
        )
        .route("/api/v1/earnings/months", get(months::list_months))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    // Long-lived, so outside the request timeout
    let stream_routes = Router::new().route(
        "/api/v1/sellers/:seller_id/earnings/stream",
        get(earnings::stream),
    );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(earnings_routes)
        .merge(stream_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
