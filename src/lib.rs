pub mod config;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod services;

use axum::{
    extract::Request,
    http::{header, HeaderName, Method},
    middleware::{self, Next},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub use config::{Config, ConfigError, ServerConfig};
pub use handlers::{AdminState, ApiState};
pub use observability::{init_observability, shutdown_observability, Metrics};

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(handlers::USER_EMAIL_HEADER),
        ])
}

/// Assemble every route with the shared middleware stack
pub fn create_app(
    metrics: Arc<Metrics>,
    api_state: ApiState,
    admin_state: AdminState,
    server: &ServerConfig,
) -> Router {
    let max_request_size = server.max_request_size;
    let observed_metrics = metrics.clone();

    Router::new()
        .route("/health/status", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics)
        .merge(handlers::create_api_router(api_state))
        .merge(handlers::create_admin_router(admin_state))
        .layer(middleware::from_fn(handlers::security_headers_middleware))
        .layer(middleware::from_fn(move |req: Request, next: Next| {
            handlers::request_validation_middleware(max_request_size, req, next)
        }))
        .layer(cors_layer())
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(move |req: Request, next: Next| {
            observability::observability_middleware(observed_metrics.clone(), req, next)
        }))
}
