//! mockall doubles for the repository traits, shared by service tests

use async_trait::async_trait;
use mockall::mock;

use crate::models::{
    Cart, Category, Order, Product, RepositoryError, Subscription, SubscriptionFields,
    SubscriptionId, User,
};
use crate::repositories::{
    CartRepository, CategoryRepository, OrderRepository, ProductRepository,
    SubscriptionRepository, UserRepository,
};

mock! {
    pub ProductRepo {}

    #[async_trait]
    impl ProductRepository for ProductRepo {
        async fn fetch_products(&self, category_id: u64, limit: usize) -> Result<Vec<Product>, RepositoryError>;
        async fn find_by_id(&self, id: u64) -> Result<Option<Product>, RepositoryError>;
        async fn find_by_category(&self, category_id: u64) -> Result<Vec<Product>, RepositoryError>;
        async fn create(&self, product: Product) -> Result<Product, RepositoryError>;
    }
}

mock! {
    pub CategoryRepo {}

    #[async_trait]
    impl CategoryRepository for CategoryRepo {
        async fn find_by_id(&self, id: u64) -> Result<Option<Category>, RepositoryError>;
        async fn find_all(&self) -> Result<Vec<Category>, RepositoryError>;
        async fn save(&self, category: Category) -> Result<Category, RepositoryError>;
    }
}

mock! {
    pub SubscriptionRepo {}

    #[async_trait]
    impl SubscriptionRepository for SubscriptionRepo {
        async fn create_subscription(&self, fields: SubscriptionFields) -> Result<SubscriptionId, RepositoryError>;
        async fn link_product(&self, subscription_id: &str, product_id: u64) -> Result<(), RepositoryError>;
        async fn find_by_id(&self, subscription_id: &str) -> Result<Option<Subscription>, RepositoryError>;
        async fn find_by_user(&self, user_id: &str) -> Result<Vec<Subscription>, RepositoryError>;
        async fn delete(&self, subscription_id: &str) -> Result<(), RepositoryError>;
    }
}

mock! {
    pub CartRepo {}

    #[async_trait]
    impl CartRepository for CartRepo {
        async fn find_cart(&self, user_id: &str) -> Result<Option<Cart>, RepositoryError>;
        async fn save_cart(&self, cart: Cart) -> Result<Cart, RepositoryError>;
        async fn delete_cart(&self, user_id: &str) -> Result<(), RepositoryError>;
    }
}

mock! {
    pub OrderRepo {}

    #[async_trait]
    impl OrderRepository for OrderRepo {
        async fn save(&self, order: Order) -> Result<Order, RepositoryError>;
        async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, RepositoryError>;
        async fn find_by_user(&self, user_id: &str) -> Result<Vec<Order>, RepositoryError>;
    }
}

mock! {
    pub UserRepo {}

    #[async_trait]
    impl UserRepository for UserRepo {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
        async fn save(&self, user: User) -> Result<User, RepositoryError>;
    }
}

pub fn test_product(id: u64, category_id: u64, price: u64) -> Product {
    Product {
        id,
        category_id,
        name: format!("Meal {}", id),
        price,
        description: "Test meal".to_string(),
        allergies: vec![],
        image_url: None,
        created_at: chrono::Utc::now(),
    }
}

pub fn test_user() -> User {
    User {
        id: "U1".to_string(),
        email: "diner@example.com".to_string(),
        name: "Diner".to_string(),
        allergies: vec![],
        created_at: chrono::Utc::now(),
    }
}
