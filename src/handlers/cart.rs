use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, instrument};

use super::api::{json_body, service_error_to_response, ApiError, ApiResult, ApiState};
use super::user::CurrentUser;
use crate::models::{AddCartItemRequest, CartResponse, OrderResponse};
use crate::observability::BusinessDomain;

#[instrument(name = "get_cart", skip_all, fields(user_id = %user.id))]
pub async fn get_cart(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<CartResponse> {
    match state
        .business_tracing
        .trace_operation(
            BusinessDomain::Cart,
            "get_cart",
            state.cart_service.get_cart(&user.id),
        )
        .await
    {
        Ok(cart) => {
            info!("Retrieved cart with {} items", cart.total_items);
            Ok(Json(cart))
        }
        Err(err) => {
            error!("Failed to get cart: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

#[instrument(name = "add_cart_item", skip_all, fields(user_id = %user.id))]
pub async fn add_cart_item(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<AddCartItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CartResponse>), ApiError> {
    let request = json_body(payload)?;
    crate::info_with_trace!(
        product_id = request.product_id,
        quantity = request.quantity,
        "Adding item to cart"
    );

    state
        .business_tracing
        .trace_operation(
            BusinessDomain::Cart,
            "add_item",
            state.cart_service.add_item(&user.id, request),
        )
        .await
        .map(|cart| (StatusCode::CREATED, Json(cart)))
        .map_err(service_error_to_response)
}

#[instrument(name = "remove_cart_item", skip_all, fields(user_id = %user.id, product_id = product_id))]
pub async fn remove_cart_item(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<u64>,
) -> ApiResult<CartResponse> {
    state
        .business_tracing
        .trace_operation(
            BusinessDomain::Cart,
            "remove_item",
            state.cart_service.remove_item(&user.id, product_id),
        )
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "clear_cart", skip_all, fields(user_id = %user.id))]
pub async fn clear_cart(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, ApiError> {
    state
        .business_tracing
        .trace_operation(
            BusinessDomain::Cart,
            "clear",
            state.cart_service.clear_cart(&user.id),
        )
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(service_error_to_response)
}

/// Place an order for the cart contents
#[instrument(name = "checkout_cart", skip_all, fields(user_id = %user.id))]
pub async fn checkout_cart(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    match state
        .business_tracing
        .trace_operation(
            BusinessDomain::Order,
            "checkout",
            state.order_service.checkout(&user.id),
        )
        .await
    {
        Ok(order) => {
            crate::info_with_trace!(order_id = %order.order.id, "Checkout completed");
            Ok((StatusCode::CREATED, Json(order)))
        }
        Err(err) => {
            error!("Checkout failed: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
