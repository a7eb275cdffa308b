use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::api::{json_body, service_error_to_response, ApiError};
use crate::config::DatabaseConfig;
use crate::models::{Category, CreateProductRequest, Product, ServiceError, User};
use crate::repositories::{TableManager, UserRepository};
use crate::services::CatalogService;

/// Email of the account created by seeding
pub const DEMO_USER_EMAIL: &str = "demo@mealbox.example";

/// Admin state containing services
#[derive(Clone)]
pub struct AdminState {
    pub catalog_service: Arc<CatalogService>,
    pub user_repository: Arc<dyn UserRepository>,
    pub table_manager: Arc<TableManager>,
    pub database: DatabaseConfig,
}

/// Response for seeding operations
#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub message: String,
    pub categories_created: usize,
    pub products_created: usize,
    pub products_skipped: usize,
    pub demo_user: String,
    pub timestamp: String,
}

/// Response for table setup operations
#[derive(Debug, Serialize)]
pub struct SetupTablesResponse {
    pub message: String,
    pub tables_created: Vec<String>,
    pub timestamp: String,
}

/// Create admin router with database management endpoints
pub fn create_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/api/admin/setup-tables", post(setup_tables))
        .route("/api/admin/seed", post(seed_database))
        .route("/api/admin/products", post(create_product))
        .with_state(state)
}

/// Set up the required DynamoDB tables
#[instrument(skip(state))]
pub async fn setup_tables(
    State(state): State<AdminState>,
) -> Result<Json<SetupTablesResponse>, ApiError> {
    let timestamp = chrono::Utc::now().to_rfc3339();

    info!("Setting up DynamoDB tables");

    match state.table_manager.create_all_tables(&state.database).await {
        Ok(tables_created) => {
            info!("Tables ready: {:?}", tables_created);

            Ok(Json(SetupTablesResponse {
                message: format!("Successfully created {} tables", tables_created.len()),
                tables_created,
                timestamp,
            }))
        }
        Err(err) => {
            error!("Failed to create tables: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to create tables",
                    "message": err.to_string(),
                    "timestamp": timestamp,
                })),
            ))
        }
    }
}

/// Seed categories, products and the demo user.
///
/// Products that already exist are skipped, so the endpoint can be re-run.
#[instrument(skip(state))]
pub async fn seed_database(
    State(state): State<AdminState>,
) -> Result<Json<SeedResponse>, (StatusCode, Json<Value>)> {
    let timestamp = chrono::Utc::now().to_rfc3339();

    info!("Seeding database with sample catalog");

    let mut errors = Vec::new();
    let mut categories_created = 0;
    let mut products_created = 0;
    let mut products_skipped = 0;

    for category in sample_categories() {
        let name = category.name.clone();
        match state.catalog_service.save_category(category).await {
            Ok(_) => categories_created += 1,
            Err(err) => {
                warn!("Failed to seed category {}: {}", name, err);
                errors.push(format!("{}: {}", name, err));
            }
        }
    }

    for product in sample_products() {
        let name = product.name.clone();
        match state.catalog_service.create_product(product).await {
            Ok(_) => {
                products_created += 1;
                info!("Seeded product: {}", name);
            }
            Err(ServiceError::ValidationError {
                field: Some(field), ..
            }) if field == "id" => {
                products_skipped += 1;
            }
            Err(err) => {
                warn!("Failed to seed product {}: {}", name, err);
                errors.push(format!("{}: {}", name, err));
            }
        }
    }

    let demo_user = match ensure_demo_user(state.user_repository.as_ref()).await {
        Ok(user) => user.email,
        Err(err) => {
            warn!("Failed to seed demo user: {}", err);
            errors.push(format!("{}: {}", DEMO_USER_EMAIL, err));
            String::new()
        }
    };

    if errors.is_empty() {
        info!(
            "Seeded {} categories and {} products",
            categories_created, products_created
        );

        return Ok(Json(SeedResponse {
            message: format!(
                "Database seeded successfully with {} products",
                products_created
            ),
            categories_created,
            products_created,
            products_skipped,
            demo_user,
            timestamp,
        }));
    }

    warn!("Database seeding completed with {} errors", errors.len());

    if categories_created > 0 || products_created > 0 {
        Ok(Json(SeedResponse {
            message: format!(
                "Database seeded with {} products, {} errors occurred",
                products_created,
                errors.len()
            ),
            categories_created,
            products_created,
            products_skipped,
            demo_user,
            timestamp,
        }))
    } else {
        Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Failed to seed database",
                "details": errors,
                "timestamp": timestamp,
            })),
        ))
    }
}

/// Add one product to the catalog
#[instrument(skip_all)]
pub async fn create_product(
    State(state): State<AdminState>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let request = json_body(payload)?;

    state
        .catalog_service
        .create_product(request)
        .await
        .map(|product| (StatusCode::CREATED, Json(product)))
        .map_err(service_error_to_response)
}

async fn ensure_demo_user(
    user_repository: &dyn UserRepository,
) -> Result<User, crate::models::RepositoryError> {
    if let Some(user) = user_repository.find_by_email(DEMO_USER_EMAIL).await? {
        return Ok(user);
    }

    user_repository
        .save(User::new(DEMO_USER_EMAIL.to_string(), "Demo Diner".to_string()))
        .await
}

// =============================================================================
// SAMPLE DATA
// =============================================================================

pub fn sample_categories() -> Vec<Category> {
    vec![
        Category {
            id: 1,
            name: "Salads".to_string(),
        },
        Category {
            id: 2,
            name: "Rice Bowls".to_string(),
        },
        Category {
            id: 3,
            name: "Soups".to_string(),
        },
    ]
}

fn sample_product(
    id: u64,
    category_id: u64,
    name: &str,
    price: u64,
    description: &str,
    allergies: &[&str],
) -> CreateProductRequest {
    CreateProductRequest {
        id,
        category_id,
        name: name.to_string(),
        price,
        description: description.to_string(),
        allergies: allergies.iter().map(|a| a.to_string()).collect(),
        image_url: None,
    }
}

/// Catalog rows for the sample categories; the soup category is short on
/// purpose so boxes drawn from it come up under-filled.
pub fn sample_products() -> Vec<CreateProductRequest> {
    vec![
        // Salads
        sample_product(101, 1, "Chicken Caesar Salad", 7900, "Grilled chicken, romaine and parmesan.", &["milk", "egg", "wheat"]),
        sample_product(102, 1, "Salmon Poke Salad", 9900, "Cured salmon over greens with sesame dressing.", &["fish", "sesame", "soy"]),
        sample_product(103, 1, "Quinoa Garden Salad", 6900, "Quinoa, roasted vegetables and lemon vinaigrette.", &[]),
        sample_product(104, 1, "Tofu Avocado Salad", 7500, "Pan-seared tofu with avocado and mixed leaves.", &["soy"]),
        sample_product(105, 1, "Shrimp Cobb Salad", 9500, "Shrimp, bacon, egg and blue cheese.", &["shellfish", "egg", "milk"]),
        sample_product(106, 1, "Greek Salad", 6500, "Feta, olives, cucumber and tomato.", &["milk"]),
        // Rice bowls
        sample_product(201, 2, "Bulgogi Rice Bowl", 8900, "Marinated beef over steamed rice.", &["soy", "wheat", "sesame"]),
        sample_product(202, 2, "Spicy Pork Rice Bowl", 8500, "Gochujang pork with kimchi.", &["soy", "wheat"]),
        sample_product(203, 2, "Teriyaki Chicken Bowl", 8200, "Glazed chicken thigh with greens.", &["soy", "wheat"]),
        sample_product(204, 2, "Mushroom Bibimbap", 7800, "Seasoned vegetables and mushrooms with egg.", &["egg", "sesame"]),
        sample_product(205, 2, "Tuna Mayo Bowl", 7200, "Tuna, mayonnaise and seaweed flakes.", &["fish", "egg"]),
        // Soups
        sample_product(301, 3, "Miso Soup", 1000, "Tofu and wakame in miso broth.", &["soy"]),
        sample_product(302, 3, "Pumpkin Soup", 2000, "Roasted pumpkin blended with cream.", &["milk"]),
        sample_product(303, 3, "Beef Brisket Soup", 3000, "Slow-simmered brisket with radish.", &[]),
    ]
}
