use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::api::{service_error_to_response, ApiError, ApiState};
use crate::models::{validate_email, ServiceError, User};

/// Header carrying the signed-in user's email, set by the auth proxy
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// The resolved identity of the caller
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

fn invalid_user(reason: impl Into<String>) -> ApiError {
    service_error_to_response(ServiceError::InvalidUser {
        reason: reason.into(),
    })
}

#[async_trait]
impl FromRequestParts<ApiState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| invalid_user(format!("Missing {} header", USER_EMAIL_HEADER)))?;

        validate_email(email).map_err(|e| invalid_user(e.to_string()))?;

        match state.user_repository.find_by_email(email).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => {
                warn!("No user registered for identity header");
                Err(invalid_user("Unknown user"))
            }
            Err(err) => Err(service_error_to_response(err.into())),
        }
    }
}
