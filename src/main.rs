use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use mealbox_rs::{
    create_app,
    handlers::{AdminState, ApiState},
    init_observability,
    observability::{BusinessTracingMiddleware, ObservabilitySettings},
    repositories::{
        DynamoDbCartRepository, DynamoDbCategoryRepository, DynamoDbOrderRepository,
        DynamoDbProductRepository, DynamoDbSubscriptionRepository, DynamoDbUserRepository,
        TableManager,
    },
    services::{CartService, CatalogService, OrderService, ProfileService, SubscriptionService},
    shutdown_observability, Config, Metrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment()
        .await
        .context("Failed to load configuration")?;

    init_observability(&ObservabilitySettings {
        service_name: &config.observability.service_name,
        service_version: &config.observability.service_version,
        otlp_endpoint: config.observability.otlp_endpoint.as_deref(),
        log_level: &config.observability.log_level,
        enable_json_logging: config.observability.enable_json_logging,
    })
    .context("Failed to initialize observability")?;

    info!("Starting mealbox-rs service");
    info!(
        "Service: {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Region: {}", config.aws.region);

    let metrics = Arc::new(Metrics::new().context("Failed to initialize metrics")?);

    let client = Arc::new(config.aws.dynamodb_client.clone());
    let region = config.aws.region.clone();
    let database = &config.database;

    let product_repository = Arc::new(DynamoDbProductRepository::new(
        client.clone(),
        database.products_table_name.clone(),
        region.clone(),
    ));
    let category_repository = Arc::new(DynamoDbCategoryRepository::new(
        client.clone(),
        database.categories_table_name.clone(),
        region.clone(),
    ));
    let cart_repository = Arc::new(DynamoDbCartRepository::new(
        client.clone(),
        database.carts_table_name.clone(),
        region.clone(),
    ));
    let subscription_repository = Arc::new(DynamoDbSubscriptionRepository::new(
        client.clone(),
        database.subscriptions_table_name.clone(),
        region.clone(),
    ));
    let order_repository = Arc::new(DynamoDbOrderRepository::new(
        client.clone(),
        database.orders_table_name.clone(),
        region.clone(),
    ));
    let user_repository = Arc::new(DynamoDbUserRepository::new(
        client.clone(),
        database.users_table_name.clone(),
        region,
    ));

    let catalog_service = Arc::new(CatalogService::new(
        product_repository.clone(),
        category_repository,
    ));
    let subscription_service = Arc::new(SubscriptionService::new(
        product_repository.clone(),
        subscription_repository,
        config.subscription.clone(),
    ));
    let cart_service = Arc::new(CartService::new(
        cart_repository.clone(),
        product_repository.clone(),
    ));
    let order_service = Arc::new(OrderService::new(
        order_repository,
        cart_repository,
        product_repository,
    ));

    let profile_service = Arc::new(ProfileService::new(
        user_repository.clone(),
        catalog_service.clone(),
    ));

    let api_state = ApiState {
        catalog_service: catalog_service.clone(),
        subscription_service,
        cart_service,
        order_service,
        profile_service,
        user_repository: user_repository.clone(),
        metrics: metrics.clone(),
        business_tracing: BusinessTracingMiddleware::new(metrics.clone()),
    };
    let admin_state = AdminState {
        catalog_service,
        user_repository,
        table_manager: Arc::new(TableManager::new(client)),
        database: config.database.clone(),
    };

    let app = create_app(metrics, api_state, admin_state, &config.server);

    let host = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid host address: {}", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server listening on {}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    shutdown_observability().await;

    served.context("Server error")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => {
            error!("Failed to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    }
}
