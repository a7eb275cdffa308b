use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use tracing::{info, instrument};

use super::api::{json_body, service_error_to_response, ApiResult, ApiState};
use super::user::CurrentUser;
use crate::models::{AllergyListResponse, UpdateAllergiesRequest, UserAllergiesResponse};
use crate::observability::BusinessDomain;

/// Allergens that appear anywhere in the catalog
#[instrument(name = "list_allergies", skip(state))]
pub async fn list_allergies(State(state): State<ApiState>) -> ApiResult<AllergyListResponse> {
    state
        .business_tracing
        .trace_operation(
            BusinessDomain::Catalog,
            "list_allergies",
            state.catalog_service.list_allergies(),
        )
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "get_user_allergies", skip_all, fields(user_id = %user.id))]
pub async fn get_user_allergies(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<UserAllergiesResponse> {
    let response = state.profile_service.allergies(&user);
    state
        .metrics
        .record_business_operation(BusinessDomain::Profile, "get_allergies", true);
    Ok(Json(response))
}

#[instrument(name = "update_user_allergies", skip_all, fields(user_id = %user.id))]
pub async fn update_user_allergies(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<UpdateAllergiesRequest>, JsonRejection>,
) -> ApiResult<UserAllergiesResponse> {
    let request = json_body(payload)?;

    let response = state
        .business_tracing
        .trace_operation(
            BusinessDomain::Profile,
            "update_allergies",
            state.profile_service.update_allergies(&user, request),
        )
        .await
        .map_err(service_error_to_response)?;

    info!("Stored {} allergy preferences", response.allergies.len());
    Ok(Json(response))
}
