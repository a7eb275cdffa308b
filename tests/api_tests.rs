use mealbox_rs::models::{
    AllergyListResponse, CartResponse, CategoryListResponse, CreateSubscriptionResponse, OrderListResponse,
    OrderResponse, OrderStatus, ProductDetailResponse, ProductListResponse,
    SubscriptionDetailResponse, SubscriptionListResponse, SubscriptionOptionResponse,
    SubscriptionPriceResponse, UserAllergiesResponse,
};
use serde_json::{json, Value};

mod common;
use common::*;

const SALADS: u64 = 1;
const SOUPS: u64 = 3;

/// Sum of the first five salads (ids 101..=105)
const SALAD_BATCH_PRICE: u64 = 7900 + 9900 + 6900 + 7500 + 9500;

fn quote_query(category_id: u64, day: u64, week: u64, period: u64) -> String {
    format!(
        "category_id={}&food_day_count={}&food_week_count={}&food_period={}",
        category_id, day, week, period
    )
}

#[tokio::test]
async fn test_health_and_metrics() {
    let env = TestEnvironment::new().await;

    let response = env
        .client
        .get(env.url("/health/status"))
        .send()
        .await
        .expect("Failed to call health");
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");

    let body: Value = response.json().await.expect("Failed to parse health");
    assert_eq!(body["status"], "healthy");

    let response = env
        .client
        .get(env.url("/metrics"))
        .send()
        .await
        .expect("Failed to call metrics");
    assert_eq!(response.status().as_u16(), 200);
    let text = response.text().await.expect("Failed to read metrics");
    assert!(text.contains("subscription_food_count"));
}

#[tokio::test]
async fn test_catalog_browsing() {
    let env = TestEnvironment::seeded().await;

    let categories: CategoryListResponse = env
        .client
        .get(env.url("/api/categories"))
        .send()
        .await
        .expect("Failed to list categories")
        .json()
        .await
        .expect("Failed to parse categories");
    assert_eq!(categories.total_count, 3);
    assert_eq!(categories.categories[0].name, "Salads");

    let menu: Value = env
        .client
        .get(env.url(&format!("/api/categories/{}/products", SOUPS)))
        .send()
        .await
        .expect("Failed to load menu")
        .json()
        .await
        .expect("Failed to parse menu");
    let ids: Vec<u64> = menu["products"]
        .as_array()
        .expect("Expected products array")
        .iter()
        .map(|p| p["id"].as_u64().expect("Expected id"))
        .collect();
    assert_eq!(ids, vec![301, 302, 303]);

    let detail: ProductDetailResponse = env
        .client
        .get(env.url("/api/products/102"))
        .send()
        .await
        .expect("Failed to load product")
        .json()
        .await
        .expect("Failed to parse product");
    assert_eq!(detail.category, "Salads");
    assert!(detail.allergies.contains(&"fish".to_string()));

    let response = env
        .client
        .get(env.url("/api/products/999"))
        .send()
        .await
        .expect("Failed to call product detail");
    assert_eq!(response.status().as_u16(), 404);

    let response = env
        .client
        .get(env.url("/api/categories/42/products"))
        .send()
        .await
        .expect("Failed to call menu");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_subscription_detail_lists_category_menu() {
    let env = TestEnvironment::seeded().await;

    let detail: ProductListResponse = env
        .client
        .get(env.url(&format!("/api/subscriptions/detail/{}", SOUPS)))
        .send()
        .await
        .expect("Failed to load subscription detail")
        .json()
        .await
        .expect("Failed to parse subscription detail");
    assert_eq!(detail.category_id, SOUPS);
    assert_eq!(detail.total_count, 3);

    let response = env
        .client
        .get(env.url("/api/subscriptions/detail/42"))
        .send()
        .await
        .expect("Failed to call subscription detail");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_allergy_catalog_and_preferences() {
    let env = TestEnvironment::seeded().await;

    let catalog: AllergyListResponse = env
        .client
        .get(env.url("/api/allergies"))
        .send()
        .await
        .expect("Failed to list allergies")
        .json()
        .await
        .expect("Failed to parse allergies");
    assert_eq!(
        catalog.allergies,
        vec!["egg", "fish", "milk", "sesame", "shellfish", "soy", "wheat"]
    );

    let initial: UserAllergiesResponse = env
        .get("/api/users/me/allergies")
        .send()
        .await
        .expect("Failed to get allergies")
        .json()
        .await
        .expect("Failed to parse allergies");
    assert!(initial.allergies.is_empty());

    let response = env
        .put("/api/users/me/allergies")
        .json(&json!({"allergies": ["Soy", " fish", "soy"]}))
        .send()
        .await
        .expect("Failed to update allergies");
    assert_eq!(response.status().as_u16(), 200);
    let updated: UserAllergiesResponse = response.json().await.expect("Failed to parse update");
    assert_eq!(updated.allergies, vec!["fish", "soy"]);

    let stored: UserAllergiesResponse = env
        .get("/api/users/me/allergies")
        .send()
        .await
        .expect("Failed to get allergies")
        .json()
        .await
        .expect("Failed to parse allergies");
    assert_eq!(stored.allergies, vec!["fish", "soy"]);

    let response = env
        .put("/api/users/me/allergies")
        .json(&json!({"allergies": ["gluten"]}))
        .send()
        .await
        .expect("Failed to update allergies");
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body["field"], "allergies");

    let response = env
        .client
        .get(env.url("/api/users/me/allergies"))
        .send()
        .await
        .expect("Failed to call allergies");
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_subscription_quote_fills_batches() {
    let env = TestEnvironment::seeded().await;

    let quote: SubscriptionOptionResponse = env
        .client
        .get(env.url(&format!(
            "/api/subscriptions/option?{}",
            quote_query(SALADS, 2, 3, 2)
        )))
        .send()
        .await
        .expect("Failed to quote")
        .json()
        .await
        .expect("Failed to parse quote");

    assert_eq!(quote.food_count, 12);
    let ids: Vec<u64> = quote.food_list.iter().map(|p| p.id).collect();
    assert_eq!(
        ids,
        vec![101, 102, 103, 104, 105, 101, 102, 103, 104, 105, 101, 102]
    );

    let price: SubscriptionPriceResponse = env
        .client
        .get(env.url(&format!(
            "/api/subscriptions/total-price?{}",
            quote_query(SALADS, 2, 3, 2)
        )))
        .send()
        .await
        .expect("Failed to price")
        .json()
        .await
        .expect("Failed to parse price");

    assert_eq!(price.food_count, 12);
    assert_eq!(price.total_price, 2 * SALAD_BATCH_PRICE + 7900 + 9900);
}

#[tokio::test]
async fn test_short_category_under_fills() {
    let env = TestEnvironment::seeded().await;

    let quote: SubscriptionOptionResponse = env
        .client
        .get(env.url(&format!(
            "/api/subscriptions/option?{}",
            quote_query(SOUPS, 1, 7, 1)
        )))
        .send()
        .await
        .expect("Failed to quote")
        .json()
        .await
        .expect("Failed to parse quote");

    assert_eq!(quote.food_count, 7);
    let ids: Vec<u64> = quote.food_list.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![301, 302, 303, 301, 302]);

    let price: SubscriptionPriceResponse = env
        .client
        .get(env.url(&format!(
            "/api/subscriptions/total-price?{}",
            quote_query(SOUPS, 1, 7, 1)
        )))
        .send()
        .await
        .expect("Failed to price")
        .json()
        .await
        .expect("Failed to parse price");

    assert_eq!(price.total_price, 9000);
}

#[tokio::test]
async fn test_zero_quantity_quotes_empty_box() {
    let env = TestEnvironment::seeded().await;

    let price: SubscriptionPriceResponse = env
        .client
        .get(env.url(&format!(
            "/api/subscriptions/total-price?{}",
            quote_query(SALADS, 0, 5, 4)
        )))
        .send()
        .await
        .expect("Failed to price")
        .json()
        .await
        .expect("Failed to parse price");

    assert_eq!(price.food_count, 0);
    assert_eq!(price.total_price, 0);
}

#[tokio::test]
async fn test_quote_rejects_missing_and_unknown_inputs() {
    let env = TestEnvironment::seeded().await;

    let response = env
        .client
        .get(env.url(
            "/api/subscriptions/option?category_id=1&food_day_count=1&food_week_count=1",
        ))
        .send()
        .await
        .expect("Failed to quote");
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body["field"], "food_period");

    let response = env
        .client
        .get(env.url(&format!(
            "/api/subscriptions/option?{}",
            quote_query(42, 1, 1, 1)
        )))
        .send()
        .await
        .expect("Failed to quote");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_subscription_lifecycle() {
    let env = TestEnvironment::seeded().await;

    let response = env
        .post("/api/subscriptions")
        .json(&json!({
            "category_id": SALADS,
            "box_size": "small",
            "food_day_count": 1,
            "food_week_count": 5,
            "food_period": 1,
            "food_start": "2024-03-01"
        }))
        .send()
        .await
        .expect("Failed to create subscription");
    assert_eq!(response.status().as_u16(), 201);

    let created: CreateSubscriptionResponse =
        response.json().await.expect("Failed to parse subscription");
    assert_eq!(created.food_count, 5);
    assert_eq!(created.linked_count, 5);
    assert_eq!(created.total_price, SALAD_BATCH_PRICE);
    assert_eq!(created.food_end.to_string(), "2024-03-31");

    let detail: SubscriptionDetailResponse = env
        .get(&format!("/api/subscriptions/{}", created.subscription_id))
        .send()
        .await
        .expect("Failed to get subscription")
        .json()
        .await
        .expect("Failed to parse subscription");
    assert_eq!(detail.subscription.product_ids, vec![101, 102, 103, 104, 105]);
    assert_eq!(detail.subtotal, SALAD_BATCH_PRICE);

    let listing: SubscriptionListResponse = env
        .get("/api/subscriptions")
        .send()
        .await
        .expect("Failed to list subscriptions")
        .json()
        .await
        .expect("Failed to parse listing");
    assert_eq!(listing.total_count, 1);
    assert_eq!(listing.total_price, SALAD_BATCH_PRICE);

    let response = env
        .delete(&format!("/api/subscriptions/{}", created.subscription_id))
        .send()
        .await
        .expect("Failed to delete subscription");
    assert_eq!(response.status().as_u16(), 204);

    let response = env
        .get(&format!("/api/subscriptions/{}", created.subscription_id))
        .send()
        .await
        .expect("Failed to get subscription");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_subscription_with_explicit_products() {
    let env = TestEnvironment::seeded().await;

    let created: CreateSubscriptionResponse = env
        .post("/api/subscriptions")
        .json(&json!({
            "category_id": SOUPS,
            "box_size": "medium",
            "food_day_count": 1,
            "food_week_count": 3,
            "food_period": 1,
            "product_ids": [303, 303, 301]
        }))
        .send()
        .await
        .expect("Failed to create subscription")
        .json()
        .await
        .expect("Failed to parse subscription");

    assert_eq!(created.linked_count, 3);
    assert_eq!(created.total_price, 7000);

    let response = env
        .post("/api/subscriptions")
        .json(&json!({
            "category_id": SOUPS,
            "box_size": "medium",
            "food_day_count": 1,
            "food_week_count": 1,
            "food_period": 1,
            "product_ids": [999]
        }))
        .send()
        .await
        .expect("Failed to create subscription");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_subscription_requires_every_field() {
    let env = TestEnvironment::seeded().await;

    let response = env
        .post("/api/subscriptions")
        .json(&json!({
            "category_id": SALADS,
            "food_day_count": 1,
            "food_week_count": 1,
            "food_period": 1
        }))
        .send()
        .await
        .expect("Failed to create subscription");

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body["field"], "box_size");
}

#[tokio::test]
async fn test_subscriptions_are_private() {
    let env = TestEnvironment::seeded().await;
    let other = env.register_user("other@mealbox.example").await;

    let created: CreateSubscriptionResponse = env
        .post("/api/subscriptions")
        .json(&json!({
            "category_id": SALADS,
            "box_size": "large",
            "food_day_count": 1,
            "food_week_count": 1,
            "food_period": 1
        }))
        .send()
        .await
        .expect("Failed to create subscription")
        .json()
        .await
        .expect("Failed to parse subscription");

    let response = env
        .get_as(&format!("/api/subscriptions/{}", created.subscription_id), &other)
        .send()
        .await
        .expect("Failed to get subscription");
    assert_eq!(response.status().as_u16(), 404);

    let listing: SubscriptionListResponse = env
        .get_as("/api/subscriptions", &other)
        .send()
        .await
        .expect("Failed to list subscriptions")
        .json()
        .await
        .expect("Failed to parse listing");
    assert_eq!(listing.total_count, 0);
}

#[tokio::test]
async fn test_user_endpoints_require_identity() {
    let env = TestEnvironment::seeded().await;

    let response = env
        .client
        .get(env.url("/api/cart"))
        .send()
        .await
        .expect("Failed to get cart");
    assert_eq!(response.status().as_u16(), 401);

    let response = env
        .get_as("/api/subscriptions", "stranger@mealbox.example")
        .send()
        .await
        .expect("Failed to list subscriptions");
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_cart_checkout_and_cancel() {
    let env = TestEnvironment::seeded().await;

    let response = env
        .post("/api/cart/items")
        .json(&json!({"product_id": 101, "quantity": 2}))
        .send()
        .await
        .expect("Failed to add item");
    assert_eq!(response.status().as_u16(), 201);

    let cart: CartResponse = env
        .post("/api/cart/items")
        .json(&json!({"product_id": 303, "quantity": 1}))
        .send()
        .await
        .expect("Failed to add item")
        .json()
        .await
        .expect("Failed to parse cart");
    assert_eq!(cart.total_items, 3);
    assert_eq!(cart.subtotal, 2 * 7900 + 3000);

    let cart: CartResponse = env
        .delete("/api/cart/items/303")
        .send()
        .await
        .expect("Failed to remove item")
        .json()
        .await
        .expect("Failed to parse cart");
    assert_eq!(cart.items.len(), 1);

    let response = env
        .delete("/api/cart/items/303")
        .send()
        .await
        .expect("Failed to remove item");
    assert_eq!(response.status().as_u16(), 404);

    let response = env
        .post("/api/cart/checkout")
        .send()
        .await
        .expect("Failed to checkout");
    assert_eq!(response.status().as_u16(), 201);

    let order: OrderResponse = response.json().await.expect("Failed to parse order");
    assert_eq!(order.order.status, OrderStatus::Pending);
    assert_eq!(order.subtotal, 2 * 7900);
    assert_eq!(order.order.items[0].product_name, "Chicken Caesar Salad");

    let cart: CartResponse = env
        .get("/api/cart")
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Failed to parse cart");
    assert!(cart.items.is_empty());

    let orders: OrderListResponse = env
        .get("/api/orders")
        .send()
        .await
        .expect("Failed to list orders")
        .json()
        .await
        .expect("Failed to parse orders");
    assert_eq!(orders.total_count, 1);

    let cancelled: OrderResponse = env
        .post(&format!("/api/orders/{}/cancel", order.order.id))
        .send()
        .await
        .expect("Failed to cancel order")
        .json()
        .await
        .expect("Failed to parse order");
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);

    let response = env
        .post(&format!("/api/orders/{}/cancel", order.order.id))
        .send()
        .await
        .expect("Failed to cancel order");
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn test_checkout_empty_cart() {
    let env = TestEnvironment::seeded().await;

    let response = env
        .post("/api/cart/clear")
        .send()
        .await
        .expect("Failed to clear cart");
    assert_eq!(response.status().as_u16(), 204);

    let response = env
        .post("/api/cart/checkout")
        .send()
        .await
        .expect("Failed to checkout");
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_admin_product_creation() {
    let env = TestEnvironment::seeded().await;

    let response = env
        .client
        .post(env.url("/api/admin/products"))
        .json(&json!({
            "id": 304,
            "category_id": SOUPS,
            "name": "Kimchi Stew",
            "price": 4000,
            "description": "Aged kimchi with pork and tofu.",
            "allergies": ["soy"]
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(response.status().as_u16(), 201);

    let response = env
        .client
        .post(env.url("/api/admin/products"))
        .json(&json!({
            "id": 304,
            "category_id": SOUPS,
            "name": "Duplicate",
            "price": 4000,
            "description": "Same id again."
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(response.status().as_u16(), 400);

    // Re-seeding skips existing rows
    env.seed_test_data().await;
}

#[tokio::test]
async fn test_rejects_non_json_body() {
    let env = TestEnvironment::seeded().await;

    let response = env
        .post("/api/cart/items")
        .header("content-type", "text/plain")
        .body("product_id=101")
        .send()
        .await
        .expect("Failed to add item");

    assert_eq!(response.status().as_u16(), 415);
}
