use std::sync::Arc;
use tracing::instrument;

use super::CatalogService;
use crate::models::{
    normalize_allergies, ServiceError, ServiceResult, UpdateAllergiesRequest, User,
    UserAllergiesResponse, Validate,
};
use crate::repositories::UserRepository;

/// Per-user preferences kept on the user record
pub struct ProfileService {
    user_repository: Arc<dyn UserRepository>,
    catalog_service: Arc<CatalogService>,
}

impl ProfileService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        catalog_service: Arc<CatalogService>,
    ) -> Self {
        Self {
            user_repository,
            catalog_service,
        }
    }

    pub fn allergies(&self, user: &User) -> UserAllergiesResponse {
        UserAllergiesResponse {
            user_id: user.id.clone(),
            allergies: user.allergies.clone(),
        }
    }

    /// Replace the user's allergy set. Every entry must name an allergen in the catalog.
    #[instrument(skip(self, user, request), fields(user_id = %user.id, requested = request.allergies.len()))]
    pub async fn update_allergies(
        &self,
        user: &User,
        request: UpdateAllergiesRequest,
    ) -> ServiceResult<UserAllergiesResponse> {
        request.validate()?;

        let allergies = normalize_allergies(&request.allergies);
        let known = self.catalog_service.list_allergies().await?.allergies;

        if let Some(unknown) = allergies.iter().find(|allergy| !known.contains(allergy)) {
            crate::warn_with_trace!(allergy = %unknown, "Unknown allergy requested");
            return Err(ServiceError::ValidationError {
                message: format!("Unknown allergy: {}", unknown),
                field: Some("allergies".to_string()),
            });
        }

        let updated = User {
            allergies,
            ..user.clone()
        };
        let saved = self.user_repository.save(updated).await?;

        crate::info_with_trace!("Saved {} allergy preferences", saved.allergies.len());

        Ok(self.allergies(&saved))
    }
}
