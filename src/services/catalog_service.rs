use std::sync::Arc;
use tracing::instrument;

use crate::models::{
    normalize_allergies, AllergyListResponse, Category, CategoryListResponse,
    CreateProductRequest, Product, ProductDetailResponse, ProductListResponse, RepositoryError,
    ServiceError, ServiceResult, Validate,
};
use crate::repositories::{CategoryRepository, ProductRepository};

/// Read access to categories and products, plus admin writes
pub struct CatalogService {
    product_repository: Arc<dyn ProductRepository>,
    category_repository: Arc<dyn CategoryRepository>,
}

impl CatalogService {
    pub fn new(
        product_repository: Arc<dyn ProductRepository>,
        category_repository: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            product_repository,
            category_repository,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> ServiceResult<CategoryListResponse> {
        let categories = self.category_repository.find_all().await?;

        crate::info_with_trace!("Found {} categories", categories.len());

        Ok(CategoryListResponse {
            total_count: categories.len(),
            categories,
        })
    }

    /// Every product of a category, in catalog order
    #[instrument(skip(self))]
    pub async fn category_menu(&self, category_id: u64) -> ServiceResult<ProductListResponse> {
        self.require_category(category_id).await?;

        let products = self.product_repository.find_by_category(category_id).await?;

        crate::info_with_trace!("Found {} products in category", products.len());

        Ok(ProductListResponse {
            category_id,
            total_count: products.len(),
            products,
        })
    }

    #[instrument(skip(self))]
    pub async fn product_detail(&self, product_id: u64) -> ServiceResult<ProductDetailResponse> {
        let product = self
            .product_repository
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| {
                crate::warn_with_trace!("Product not found");
                ServiceError::InvalidProduct { product_id }
            })?;

        let category = self.require_category(product.category_id).await?;

        Ok(product.into_detail(category.name))
    }

    /// Every allergen named by some product, across all categories
    #[instrument(skip(self))]
    pub async fn list_allergies(&self) -> ServiceResult<AllergyListResponse> {
        let mut products = Vec::new();
        for category in self.category_repository.find_all().await? {
            products.extend(self.product_repository.find_by_category(category.id).await?);
        }

        let allergies =
            normalize_allergies(products.iter().flat_map(|product| product.allergies.iter()));

        crate::info_with_trace!("Found {} allergies in catalog", allergies.len());

        Ok(AllergyListResponse {
            total_count: allergies.len(),
            allergies,
        })
    }

    #[instrument(skip(self, request), fields(product_id = request.id, category_id = request.category_id))]
    pub async fn create_product(&self, request: CreateProductRequest) -> ServiceResult<Product> {
        request.validate()?;
        self.require_category(request.category_id).await?;

        let product_id = request.id;
        match self.product_repository.create(Product::new(request)).await {
            Ok(product) => {
                crate::info_with_trace!("Product created");
                Ok(product)
            }
            Err(RepositoryError::ConstraintViolation { .. }) => {
                crate::warn_with_trace!("Product id already taken");
                Err(ServiceError::ValidationError {
                    message: format!("Product {} already exists", product_id),
                    field: Some("id".to_string()),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Create or replace a category
    #[instrument(skip(self, category), fields(category_id = category.id))]
    pub async fn save_category(&self, category: Category) -> ServiceResult<Category> {
        if category.name.trim().is_empty() {
            return Err(ServiceError::ValidationError {
                message: "Category name cannot be empty".to_string(),
                field: Some("name".to_string()),
            });
        }

        Ok(self.category_repository.save(category).await?)
    }

    async fn require_category(&self, category_id: u64) -> ServiceResult<Category> {
        self.category_repository
            .find_by_id(category_id)
            .await?
            .ok_or(ServiceError::CategoryNotFound { category_id })
    }
}
