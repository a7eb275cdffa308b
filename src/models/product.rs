use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Product category; catalog reads are always scoped to one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
}

/// Core catalog product model
///
/// Catalog order is ascending `id` within a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub category_id: u64,
    pub name: String,
    pub price: u64,
    pub description: String,
    pub allergies: Vec<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Lightweight product projection returned by subscription quotes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: u64,
    pub name: String,
    pub price: u64,
}

/// Request model for adding a product to the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub id: u64,
    pub category_id: u64,
    pub name: String,
    pub price: u64,
    pub description: String,
    #[serde(default)]
    pub allergies: Vec<String>,
    pub image_url: Option<String>,
}

/// Product detail view with the owning category resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetailResponse {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub price: u64,
    pub description: String,
    pub allergies: Vec<String>,
    pub image_url: Option<String>,
}

/// Distinct allergens present anywhere in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllergyListResponse {
    pub allergies: Vec<String>,
    pub total_count: usize,
}

/// Response model for a category menu
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub category_id: u64,
    pub products: Vec<Product>,
    pub total_count: usize,
}

/// Response model for category listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
    pub total_count: usize,
}

impl Product {
    pub fn new(request: CreateProductRequest) -> Self {
        Self {
            id: request.id,
            category_id: request.category_id,
            name: request.name,
            price: request.price,
            description: request.description,
            allergies: request.allergies,
            image_url: request.image_url,
            created_at: Utc::now(),
        }
    }

    pub fn to_ref(&self) -> ProductRef {
        ProductRef {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
        }
    }

    pub fn into_detail(self, category_name: String) -> ProductDetailResponse {
        ProductDetailResponse {
            id: self.id,
            name: self.name,
            category: category_name,
            price: self.price,
            description: self.description,
            allergies: self.allergies,
            image_url: self.image_url,
        }
    }
}

impl From<&Product> for ProductRef {
    fn from(product: &Product) -> Self {
        product.to_ref()
    }
}
