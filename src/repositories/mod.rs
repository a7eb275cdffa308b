// Repositories module - data access layer

pub mod cart_repository;
pub mod category_repository;
pub mod dynamodb;
pub mod order_repository;
pub mod product_repository;
pub mod subscription_repository;
pub mod table_manager;
pub mod user_repository;

pub use cart_repository::{CartRepository, DynamoDbCartRepository};
pub use category_repository::{CategoryRepository, DynamoDbCategoryRepository};
pub use order_repository::{DynamoDbOrderRepository, OrderRepository};
pub use product_repository::{DynamoDbProductRepository, ProductRepository};
pub use subscription_repository::{DynamoDbSubscriptionRepository, SubscriptionRepository};
pub use table_manager::{TableDefinition, TableManager};
pub use user_repository::{DynamoDbUserRepository, UserRepository};
