use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const ENV_PREFIX: &str = "MEALBOX";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub subscription: SubscriptionConfig,
    pub aws: AwsConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_region")]
    pub region: String,
    /// Override for DynamoDB Local or LocalStack
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default = "default_products_table")]
    pub products_table_name: String,
    #[serde(default = "default_categories_table")]
    pub categories_table_name: String,
    #[serde(default = "default_carts_table")]
    pub carts_table_name: String,
    #[serde(default = "default_subscriptions_table")]
    pub subscriptions_table_name: String,
    #[serde(default = "default_orders_table")]
    pub orders_table_name: String,
    #[serde(default = "default_users_table")]
    pub users_table_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionConfig {
    /// Days between food_start and food_end
    #[serde(default = "default_term_days")]
    pub term_days: i64,
    /// Upper bound on day x week x period
    #[serde(default = "default_max_food_count")]
    pub max_food_count: u64,
}

#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,
    pub dynamodb_client: DynamoDbClient,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub enable_json_logging: bool,
}

/// Deserialize one config section from an already-built source
fn section<T: DeserializeOwned>(settings: &config::Config, name: &str) -> Result<T, ConfigError> {
    settings
        .clone()
        .try_deserialize()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to deserialize {} config: {}", name, e),
        })
}

fn environment_settings() -> Result<config::Config, ConfigError> {
    config::Config::builder()
        .add_source(config::Environment::with_prefix(ENV_PREFIX))
        .build()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to load environment config: {}", e),
        })
}

impl Config {
    pub async fn from_environment() -> Result<Self, ConfigError> {
        info!("Loading configuration from environment");

        let settings = environment_settings()?;
        let server = ServerConfig::from_settings(&settings)?;
        let database = DatabaseConfig::from_settings(&settings)?;
        let subscription = SubscriptionConfig::from_settings(&settings)?;
        let observability = ObservabilityConfig::from_settings(&settings)?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(database.region.clone()));
        if let Some(endpoint_url) = &database.endpoint_url {
            info!(endpoint_url = %endpoint_url, "Using custom DynamoDB endpoint");
            loader = loader.endpoint_url(endpoint_url);
        }
        let aws_config = loader.load().await;

        let aws = AwsConfig {
            region: database.region.clone(),
            dynamodb_client: DynamoDbClient::new(&aws_config),
        };

        let config = Config {
            server,
            database,
            subscription,
            aws,
            observability,
        };

        config.validate()?;

        info!("Configuration loaded successfully");
        debug!("Configuration: {:?}", config);

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.subscription.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    pub fn from_settings(settings: &config::Config) -> Result<Self, ConfigError> {
        section(settings, "server")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ValidationError {
                message: "Server port cannot be 0".to_string(),
            });
        }

        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "Request timeout cannot be 0".to_string(),
            });
        }

        if self.max_request_size == 0 {
            return Err(ConfigError::ValidationError {
                message: "Max request size cannot be 0".to_string(),
            });
        }

        Ok(())
    }
}

impl DatabaseConfig {
    pub fn from_settings(settings: &config::Config) -> Result<Self, ConfigError> {
        section(settings, "database")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let tables = [
            ("Products", &self.products_table_name),
            ("Categories", &self.categories_table_name),
            ("Carts", &self.carts_table_name),
            ("Subscriptions", &self.subscriptions_table_name),
            ("Orders", &self.orders_table_name),
            ("Users", &self.users_table_name),
        ];

        for (label, name) in tables {
            if name.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    message: format!("{} table name cannot be empty", label),
                });
            }
        }

        Ok(())
    }
}

impl SubscriptionConfig {
    pub fn from_settings(settings: &config::Config) -> Result<Self, ConfigError> {
        section(settings, "subscription")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.term_days <= 0 {
            return Err(ConfigError::ValidationError {
                message: "Subscription term must be at least one day".to_string(),
            });
        }

        if self.max_food_count == 0 {
            return Err(ConfigError::ValidationError {
                message: "Max food count cannot be 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            term_days: default_term_days(),
            max_food_count: default_max_food_count(),
        }
    }
}

impl ObservabilityConfig {
    pub fn from_settings(settings: &config::Config) -> Result<Self, ConfigError> {
        section(settings, "observability")
    }
}

// Default value functions
pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    8080
}

pub(crate) fn default_timeout() -> u64 {
    30
}

pub(crate) fn default_max_request_size() -> usize {
    1024 * 1024 // 1MB
}

pub(crate) fn default_region() -> String {
    "us-west-2".to_string()
}

pub(crate) fn default_products_table() -> String {
    "MealboxProducts".to_string()
}

pub(crate) fn default_categories_table() -> String {
    "MealboxCategories".to_string()
}

pub(crate) fn default_carts_table() -> String {
    "MealboxCarts".to_string()
}

pub(crate) fn default_subscriptions_table() -> String {
    "MealboxSubscriptions".to_string()
}

pub(crate) fn default_orders_table() -> String {
    "MealboxOrders".to_string()
}

pub(crate) fn default_users_table() -> String {
    "MealboxUsers".to_string()
}

pub(crate) fn default_term_days() -> i64 {
    30
}

pub(crate) fn default_max_food_count() -> u64 {
    1000
}

pub(crate) fn default_service_name() -> String {
    "mealbox-rs".to_string()
}

pub(crate) fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn default_metrics_port() -> u16 {
    9090
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}
