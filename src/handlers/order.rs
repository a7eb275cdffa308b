use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::instrument;

use super::api::{service_error_to_response, ApiResult, ApiState};
use super::user::CurrentUser;
use crate::models::{OrderListResponse, OrderResponse};
use crate::observability::BusinessDomain;

#[instrument(name = "list_orders", skip_all, fields(user_id = %user.id))]
pub async fn list_orders(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<OrderListResponse> {
    state
        .business_tracing
        .trace_operation(
            BusinessDomain::Order,
            "list",
            state.order_service.list_orders(&user.id),
        )
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

/// Tracking view: per-item status and tracking number
#[instrument(name = "get_order", skip_all, fields(user_id = %user.id, order_id = %order_id))]
pub async fn get_order(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<String>,
) -> ApiResult<OrderResponse> {
    state
        .business_tracing
        .trace_operation(
            BusinessDomain::Order,
            "get",
            state.order_service.get_order(&user.id, &order_id),
        )
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "cancel_order", skip_all, fields(user_id = %user.id, order_id = %order_id))]
pub async fn cancel_order(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<String>,
) -> ApiResult<OrderResponse> {
    state
        .business_tracing
        .trace_operation(
            BusinessDomain::Order,
            "cancel",
            state.order_service.cancel_order(&user.id, &order_id),
        )
        .await
        .map(Json)
        .map_err(service_error_to_response)
}
