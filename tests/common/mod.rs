#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::config::{BehaviorVersion, Region};
use reqwest::Client;
use tokio::net::TcpListener;

use mealbox_rs::config::{DatabaseConfig, ServerConfig, SubscriptionConfig};
use mealbox_rs::handlers::{AdminState, ApiState, DEMO_USER_EMAIL, USER_EMAIL_HEADER};
use mealbox_rs::models::{
    Cart, Category, Order, Product, RepositoryError, RepositoryResult, Subscription,
    SubscriptionFields, SubscriptionId, User,
};
use mealbox_rs::observability::{BusinessTracingMiddleware, Metrics};
use mealbox_rs::repositories::{
    CartRepository, CategoryRepository, OrderRepository, ProductRepository,
    SubscriptionRepository, TableManager, UserRepository,
};
use mealbox_rs::services::{
    CartService, CatalogService, OrderService, ProfileService, SubscriptionService,
};
use mealbox_rs::create_app;

// =============================================================================
// IN-MEMORY REPOSITORIES
// =============================================================================

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: Mutex<HashMap<u64, Product>>,
}

impl InMemoryProductRepository {
    fn sorted_in_category(&self, category_id: u64) -> Vec<Product> {
        let products = self.products.lock().unwrap();
        let mut matching: Vec<Product> = products
            .values()
            .filter(|p| p.category_id == category_id)
            .cloned()
            .collect();
        matching.sort_by_key(|p| p.id);
        matching
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn fetch_products(
        &self,
        category_id: u64,
        limit: usize,
    ) -> RepositoryResult<Vec<Product>> {
        let mut products = self.sorted_in_category(category_id);
        products.truncate(limit);
        Ok(products)
    }

    async fn find_by_id(&self, id: u64) -> RepositoryResult<Option<Product>> {
        Ok(self.products.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_category(&self, category_id: u64) -> RepositoryResult<Vec<Product>> {
        Ok(self.sorted_in_category(category_id))
    }

    async fn create(&self, product: Product) -> RepositoryResult<Product> {
        let mut products = self.products.lock().unwrap();
        if products.contains_key(&product.id) {
            return Err(RepositoryError::ConstraintViolation {
                message: format!("Product {} already exists", product.id),
            });
        }
        products.insert(product.id, product.clone());
        Ok(product)
    }
}

#[derive(Default)]
pub struct InMemoryCategoryRepository {
    categories: Mutex<HashMap<u64, Category>>,
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_id(&self, id: u64) -> RepositoryResult<Option<Category>> {
        Ok(self.categories.lock().unwrap().get(&id).cloned())
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Category>> {
        let mut categories: Vec<Category> =
            self.categories.lock().unwrap().values().cloned().collect();
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }

    async fn save(&self, category: Category) -> RepositoryResult<Category> {
        self.categories
            .lock()
            .unwrap()
            .insert(category.id, category.clone());
        Ok(category)
    }
}

#[derive(Default)]
pub struct InMemoryCartRepository {
    carts: Mutex<HashMap<String, Cart>>,
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn find_cart(&self, user_id: &str) -> RepositoryResult<Option<Cart>> {
        Ok(self.carts.lock().unwrap().get(user_id).cloned())
    }

    async fn save_cart(&self, cart: Cart) -> RepositoryResult<Cart> {
        self.carts
            .lock()
            .unwrap()
            .insert(cart.user_id.clone(), cart.clone());
        Ok(cart)
    }

    async fn delete_cart(&self, user_id: &str) -> RepositoryResult<()> {
        self.carts.lock().unwrap().remove(user_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    subscriptions: Mutex<HashMap<String, Subscription>>,
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn create_subscription(
        &self,
        fields: SubscriptionFields,
    ) -> RepositoryResult<SubscriptionId> {
        let subscription = Subscription::new(fields);
        let id = subscription.id.clone();
        self.subscriptions
            .lock()
            .unwrap()
            .insert(id.clone(), subscription);
        Ok(id)
    }

    async fn link_product(&self, subscription_id: &str, product_id: u64) -> RepositoryResult<()> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let subscription = subscriptions
            .get_mut(subscription_id)
            .ok_or(RepositoryError::NotFound)?;
        subscription.product_ids.push(product_id);
        Ok(())
    }

    async fn find_by_id(&self, subscription_id: &str) -> RepositoryResult<Option<Subscription>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .get(subscription_id)
            .cloned())
    }

    async fn find_by_user(&self, user_id: &str) -> RepositoryResult<Vec<Subscription>> {
        let mut owned: Vec<Subscription> = self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn delete(&self, subscription_id: &str) -> RepositoryResult<()> {
        self.subscriptions.lock().unwrap().remove(subscription_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<HashMap<String, Order>>,
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: Order) -> RepositoryResult<Order> {
        self.orders
            .lock()
            .unwrap()
            .insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<Order>> {
        Ok(self.orders.lock().unwrap().get(order_id).cloned())
    }

    async fn find_by_user(&self, user_id: &str) -> RepositoryResult<Vec<Order>> {
        let mut owned: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.ordered_at.cmp(&a.ordered_at));
        Ok(owned)
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn save(&self, user: User) -> RepositoryResult<User> {
        self.users
            .lock()
            .unwrap()
            .insert(user.id.clone(), user.clone());
        Ok(user)
    }
}

// =============================================================================
// TEST ENVIRONMENT
// =============================================================================

pub fn test_server_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 8080,
        request_timeout_seconds: 30,
        max_request_size: 1024 * 1024,
    }
}

pub fn test_database_config() -> DatabaseConfig {
    DatabaseConfig {
        region: "us-east-1".to_string(),
        endpoint_url: None,
        products_table_name: "test-products".to_string(),
        categories_table_name: "test-categories".to_string(),
        carts_table_name: "test-carts".to_string(),
        subscriptions_table_name: "test-subscriptions".to_string(),
        orders_table_name: "test-orders".to_string(),
        users_table_name: "test-users".to_string(),
    }
}

/// A client that is never called; admin table setup is not exercised here
fn offline_dynamodb_client() -> aws_sdk_dynamodb::Client {
    let config = aws_sdk_dynamodb::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .build();
    aws_sdk_dynamodb::Client::from_conf(config)
}

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub users: Arc<InMemoryUserRepository>,
    pub products: Arc<InMemoryProductRepository>,
    pub categories: Arc<InMemoryCategoryRepository>,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let products = Arc::new(InMemoryProductRepository::default());
        let categories = Arc::new(InMemoryCategoryRepository::default());
        let carts = Arc::new(InMemoryCartRepository::default());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::default());
        let orders = Arc::new(InMemoryOrderRepository::default());
        let users = Arc::new(InMemoryUserRepository::default());

        let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));

        let catalog_service = Arc::new(CatalogService::new(products.clone(), categories.clone()));
        let api_state = ApiState {
            catalog_service: catalog_service.clone(),
            subscription_service: Arc::new(SubscriptionService::new(
                products.clone(),
                subscriptions,
                SubscriptionConfig::default(),
            )),
            cart_service: Arc::new(CartService::new(carts.clone(), products.clone())),
            order_service: Arc::new(OrderService::new(orders, carts, products.clone())),
            profile_service: Arc::new(ProfileService::new(users.clone(), catalog_service.clone())),
            user_repository: users.clone(),
            metrics: metrics.clone(),
            business_tracing: BusinessTracingMiddleware::new(metrics.clone()),
        };
        let admin_state = AdminState {
            catalog_service,
            user_repository: users.clone(),
            table_manager: Arc::new(TableManager::new(Arc::new(offline_dynamodb_client()))),
            database: test_database_config(),
        };

        let app = create_app(metrics, api_state, admin_state, &test_server_config());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        tokio::time::sleep(Duration::from_millis(100)).await;

        Self {
            client: Client::new(),
            base_url,
            users,
            products,
            categories,
        }
    }

    /// Start a server and load the sample catalog and demo user
    pub async fn seeded() -> Self {
        let env = Self::new().await;
        env.seed_test_data().await;
        env
    }

    pub async fn seed_test_data(&self) {
        let response = self
            .client
            .post(self.url("/api/admin/seed"))
            .send()
            .await
            .expect("Failed to seed test data");

        assert_eq!(response.status().as_u16(), 200);
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get_as(&self, path: &str, email: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header(USER_EMAIL_HEADER, email)
    }

    pub fn post_as(&self, path: &str, email: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header(USER_EMAIL_HEADER, email)
    }

    pub fn put_as(&self, path: &str, email: &str) -> reqwest::RequestBuilder {
        self.client
            .put(self.url(path))
            .header(USER_EMAIL_HEADER, email)
    }

    pub fn delete_as(&self, path: &str, email: &str) -> reqwest::RequestBuilder {
        self.client
            .delete(self.url(path))
            .header(USER_EMAIL_HEADER, email)
    }

    /// Requests signed in as the seeded demo user
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.get_as(path, DEMO_USER_EMAIL)
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.post_as(path, DEMO_USER_EMAIL)
    }

    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.put_as(path, DEMO_USER_EMAIL)
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.delete_as(path, DEMO_USER_EMAIL)
    }

    /// Register another diner and return their email
    pub async fn register_user(&self, email: &str) -> String {
        self.users
            .save(User::new(email.to_string(), "Other Diner".to_string()))
            .await
            .expect("Failed to register user");
        email.to_string()
    }
}
