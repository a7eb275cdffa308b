use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use std::collections::HashMap;
use tracing::{error, info, instrument};

use super::api::{json_body, service_error_to_response, ApiError, ApiResult, ApiState};
use super::user::CurrentUser;
use crate::models::{
    parse_quote_params, CreateSubscriptionRequest, CreateSubscriptionResponse, ServiceError,
    SubscriptionDetailResponse, SubscriptionListResponse, SubscriptionOptionResponse,
    SubscriptionPriceResponse, SubscriptionQuoteRequest,
};
use crate::observability::BusinessDomain;

fn quote_request(params: &HashMap<String, String>) -> Result<SubscriptionQuoteRequest, ApiError> {
    parse_quote_params(params).map_err(|err| service_error_to_response(ServiceError::from(err)))
}

/// Food count and the products that would fill the box
#[instrument(name = "subscription_option", skip(state, params))]
pub async fn subscription_option(
    State(state): State<ApiState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<SubscriptionOptionResponse> {
    let request = quote_request(&params)?;

    match state
        .business_tracing
        .trace_operation(
            BusinessDomain::Subscription,
            "quote",
            state.subscription_service.quote(request),
        )
        .await
    {
        Ok(response) => {
            state.metrics.record_food_count(response.food_count);
            Ok(Json(response))
        }
        Err(err) => {
            error!("Failed to quote subscription: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Food count and total price of the quoted box
#[instrument(name = "subscription_total_price", skip(state, params))]
pub async fn subscription_total_price(
    State(state): State<ApiState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<SubscriptionPriceResponse> {
    let request = quote_request(&params)?;

    match state
        .business_tracing
        .trace_operation(
            BusinessDomain::Subscription,
            "price",
            state.subscription_service.price(request),
        )
        .await
    {
        Ok(response) => {
            state.metrics.record_food_count(response.food_count);
            Ok(Json(response))
        }
        Err(err) => {
            error!("Failed to price subscription: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

#[instrument(name = "create_subscription", skip_all, fields(user_id = %user.id))]
pub async fn create_subscription(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<CreateSubscriptionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateSubscriptionResponse>), ApiError> {
    let request = json_body(payload)?;

    match state
        .business_tracing
        .trace_operation(
            BusinessDomain::Subscription,
            "create",
            state.subscription_service.create(&user, request),
        )
        .await
    {
        Ok(response) => {
            state.metrics.record_food_count(response.food_count);
            crate::info_with_trace!(
                subscription_id = %response.subscription_id,
                "Subscription created"
            );
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(err) => {
            error!("Failed to create subscription: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

#[instrument(name = "list_subscriptions", skip_all, fields(user_id = %user.id))]
pub async fn list_subscriptions(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<SubscriptionListResponse> {
    let response = state
        .business_tracing
        .trace_operation(
            BusinessDomain::Subscription,
            "list",
            state.subscription_service.list(&user),
        )
        .await
        .map_err(service_error_to_response)?;

    info!("Returning {} subscriptions", response.total_count);
    Ok(Json(response))
}

#[instrument(name = "get_subscription", skip_all, fields(user_id = %user.id, subscription_id = %subscription_id))]
pub async fn get_subscription(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(subscription_id): Path<String>,
) -> ApiResult<SubscriptionDetailResponse> {
    state
        .business_tracing
        .trace_operation(
            BusinessDomain::Subscription,
            "get",
            state.subscription_service.get(&user, &subscription_id),
        )
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "delete_subscription", skip_all, fields(user_id = %user.id, subscription_id = %subscription_id))]
pub async fn delete_subscription(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(subscription_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .business_tracing
        .trace_operation(
            BusinessDomain::Subscription,
            "delete",
            state.subscription_service.delete(&user, &subscription_id),
        )
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(service_error_to_response)
}
