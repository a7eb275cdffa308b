pub mod admin;
pub mod api;
pub mod cart;
pub mod catalog;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod order;
pub mod profile;
pub mod subscription;
pub mod user;

pub use admin::{create_admin_router, AdminState, DEMO_USER_EMAIL};
pub use api::{create_api_router, service_error_to_response, ApiError, ApiResult, ApiState};
pub use health::health_check;
pub use metrics::metrics_handler;
pub use middleware::{request_validation_middleware, security_headers_middleware};
pub use user::{CurrentUser, USER_EMAIL_HEADER};
