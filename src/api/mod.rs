use crate::config::Config;
use crate::services::auth_service::AuthService;
use crate::services::health_service::HealthService;
use crate::services::rate_limit_service::{IpKeyExtractor, replenish_interval_ns};
use crate::services::user_service::UserService;
use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod health;
pub mod middleware;
pub mod schemas;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub user_service: UserService,
    pub auth_service: AuthService,
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub health_service: HealthService,
}

#[derive(Debug)]
pub struct ServiceContainer {
    pub user_service: UserService,
    pub auth_service: AuthService,
}

/// Configures and returns the primary application router.
///
/// # Panics
/// Panics if the rate limiter configuration cannot be constructed.
pub fn app_router(config: Config, services: ServiceContainer) -> Router {
    let extractor = IpKeyExtractor::new(config.server.trusted_proxies.clone());

    let standard_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(replenish_interval_ns(config.rate_limit.per_second))
            .burst_size(config.rate_limit.burst.max(1))
            .key_extractor(extractor.clone())
            .finish()
            .expect("Failed to build standard rate limiter config"),
    );

    // Create Tier: anyone may register, so it gets the stricter limits
    let create_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(replenish_interval_ns(config.rate_limit.create_per_second))
            .burst_size(config.rate_limit.create_burst.max(1))
            .key_extractor(extractor)
            .finish()
            .expect("Failed to build create rate limiter config"),
    );

    let state = AppState { config, user_service: services.user_service, auth_service: services.auth_service };

    let create_routes =
        Router::new().route("/api/v1/users", post(users::create)).layer(GovernorLayer::new(create_conf));

    let api_routes = Router::new()
        .route("/api/v1/users", get(users::list))
        .route("/api/v1/users/{id}", get(users::show))
        .layer(GovernorLayer::new(standard_conf));

    Router::new()
        .merge(create_routes)
        .merge(api_routes)
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestId>()
                        .and_then(|id| id.header_value().to_str().ok())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                        "user_id" = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        let status = response.status();
                        span.record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER), MakeRequestUuid))
        .with_state(state)
}

pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new().route("/livez", get(health::livez)).route("/readyz", get(health::readyz)).with_state(state)
}
