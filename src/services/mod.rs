// Services module - business logic layer

pub mod cart_service;
pub mod catalog_service;
pub mod order_service;
pub mod pricing;
pub mod profile_service;
pub mod sizing;
pub mod subscription_service;

#[cfg(test)]
pub(crate) mod mocks;

pub use cart_service::CartService;
pub use catalog_service::CatalogService;
pub use order_service::OrderService;
pub use pricing::total_price;
pub use profile_service::ProfileService;
pub use sizing::{batch_sizes, cycle_count, SizingEngine, BATCH_SIZE};
pub use subscription_service::SubscriptionService;
