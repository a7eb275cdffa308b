use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::{error, info, instrument};

use super::api::{service_error_to_response, ApiResult, ApiState};
use crate::models::{CategoryListResponse, ProductDetailResponse, ProductListResponse};
use crate::observability::BusinessDomain;

#[instrument(name = "list_categories", skip(state))]
pub async fn list_categories(State(state): State<ApiState>) -> ApiResult<CategoryListResponse> {
    state
        .business_tracing
        .trace_operation(
            BusinessDomain::Catalog,
            "list_categories",
            state.catalog_service.list_categories(),
        )
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

/// Products of one category in catalog order
#[instrument(name = "category_menu", skip(state), fields(category_id = category_id))]
pub async fn category_menu(
    State(state): State<ApiState>,
    Path(category_id): Path<u64>,
) -> ApiResult<ProductListResponse> {
    match state
        .business_tracing
        .trace_operation(
            BusinessDomain::Catalog,
            "category_menu",
            state.catalog_service.category_menu(category_id),
        )
        .await
    {
        Ok(menu) => {
            info!("Returning {} products", menu.total_count);
            Ok(Json(menu))
        }
        Err(err) => {
            error!("Failed to load menu for category {}: {}", category_id, err);
            Err(service_error_to_response(err))
        }
    }
}

#[instrument(name = "product_detail", skip(state), fields(product_id = product_id))]
pub async fn product_detail(
    State(state): State<ApiState>,
    Path(product_id): Path<u64>,
) -> ApiResult<ProductDetailResponse> {
    state
        .business_tracing
        .trace_operation(
            BusinessDomain::Catalog,
            "product_detail",
            state.catalog_service.product_detail(product_id),
        )
        .await
        .map(Json)
        .map_err(service_error_to_response)
}
