use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use super::{cart, catalog, order, profile, subscription};
use crate::models::{RepositoryError, ServiceError};
use crate::observability::{BusinessTracingMiddleware, Metrics};
use crate::repositories::UserRepository;
use crate::services::{
    CartService, CatalogService, OrderService, ProfileService, SubscriptionService,
};

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<Value>);

pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Shared application state containing all services
#[derive(Clone)]
pub struct ApiState {
    pub catalog_service: Arc<CatalogService>,
    pub subscription_service: Arc<SubscriptionService>,
    pub cart_service: Arc<CartService>,
    pub order_service: Arc<OrderService>,
    pub profile_service: Arc<ProfileService>,
    pub user_repository: Arc<dyn UserRepository>,
    pub metrics: Arc<Metrics>,
    pub business_tracing: BusinessTracingMiddleware,
}

/// Catalog, profile, subscription, cart and order endpoints
pub fn create_api_router(state: ApiState) -> Router {
    Router::new()
        // Catalog browsing
        .route("/api/categories", get(catalog::list_categories))
        .route(
            "/api/categories/:category_id/products",
            get(catalog::category_menu),
        )
        .route("/api/products/:product_id", get(catalog::product_detail))
        .route("/api/allergies", get(profile::list_allergies))
        // Profile
        .route(
            "/api/users/me/allergies",
            get(profile::get_user_allergies).put(profile::update_user_allergies),
        )
        // Subscriptions
        .route(
            "/api/subscriptions/detail/:category_id",
            get(catalog::category_menu),
        )
        .route(
            "/api/subscriptions/option",
            get(subscription::subscription_option),
        )
        .route(
            "/api/subscriptions/total-price",
            get(subscription::subscription_total_price),
        )
        .route(
            "/api/subscriptions",
            get(subscription::list_subscriptions).post(subscription::create_subscription),
        )
        .route(
            "/api/subscriptions/:subscription_id",
            get(subscription::get_subscription).delete(subscription::delete_subscription),
        )
        // Cart
        .route("/api/cart", get(cart::get_cart))
        .route("/api/cart/items", post(cart::add_cart_item))
        .route("/api/cart/items/:product_id", delete(cart::remove_cart_item))
        .route("/api/cart/clear", post(cart::clear_cart))
        .route("/api/cart/checkout", post(cart::checkout_cart))
        // Orders
        .route("/api/orders", get(order::list_orders))
        .route("/api/orders/:order_id", get(order::get_order))
        .route("/api/orders/:order_id/cancel", post(order::cancel_order))
        .with_state(state)
}

/// JSON error body shared by handlers, extractors and middleware
pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(json!({
            "error": message.into(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

/// Unwrap a JSON body, turning extractor rejections into a 400 JSON error
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            warn!("Rejected request body: {}", rejection.body_text());
            Err(error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid request body: {}", rejection.body_text()),
            ))
        }
    }
}

pub fn service_error_to_response(err: ServiceError) -> ApiError {
    let field = err.field().map(str::to_string);

    let (status, message) = match err {
        ServiceError::InvalidUser { .. } => (StatusCode::UNAUTHORIZED, err.to_string()),
        ServiceError::InvalidProduct { .. }
        | ServiceError::CategoryNotFound { .. }
        | ServiceError::SubscriptionNotFound { .. }
        | ServiceError::CartItemNotFound { .. }
        | ServiceError::OrderNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::ValidationError { .. } | ServiceError::EmptyCart { .. } => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        ServiceError::InvalidOrderState { .. } => (StatusCode::CONFLICT, err.to_string()),
        ServiceError::Repository { source } => match source {
            RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            RepositoryError::ConnectionFailed => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database connection failed".to_string(),
            ),
            RepositoryError::Timeout => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database timeout".to_string(),
            ),
            RepositoryError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        },
    };

    let (status, Json(mut body)) = error_response(status, message);
    if let Some(field) = field {
        body["field"] = Value::String(field);
    }
    (status, Json(body))
}
