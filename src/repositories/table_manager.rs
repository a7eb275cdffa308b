use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection,
    ProjectionType, ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use super::dynamodb::map_dynamodb_error;
use crate::config::DatabaseConfig;
use crate::models::{RepositoryError, RepositoryResult};

/// A key attribute: name and scalar type
#[derive(Debug, Clone, PartialEq)]
pub struct KeyAttribute {
    pub name: &'static str,
    pub attribute_type: ScalarAttributeType,
}

/// Global secondary index with hash and optional range key
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub name: &'static str,
    pub hash_key: KeyAttribute,
    pub range_key: Option<KeyAttribute>,
}

/// Shape of one table created by the manager
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub table_name: String,
    pub hash_key: KeyAttribute,
    pub indexes: Vec<IndexDefinition>,
}

fn key(name: &'static str, attribute_type: ScalarAttributeType) -> KeyAttribute {
    KeyAttribute {
        name,
        attribute_type,
    }
}

impl TableDefinition {
    /// Every table the service reads or writes
    pub fn all(config: &DatabaseConfig) -> Vec<TableDefinition> {
        vec![
            TableDefinition {
                table_name: config.products_table_name.clone(),
                hash_key: key("id", ScalarAttributeType::N),
                indexes: vec![IndexDefinition {
                    name: "CategoryIndex",
                    hash_key: key("category_id", ScalarAttributeType::N),
                    range_key: Some(key("id", ScalarAttributeType::N)),
                }],
            },
            TableDefinition {
                table_name: config.categories_table_name.clone(),
                hash_key: key("id", ScalarAttributeType::N),
                indexes: vec![],
            },
            TableDefinition {
                table_name: config.carts_table_name.clone(),
                hash_key: key("user_id", ScalarAttributeType::S),
                indexes: vec![],
            },
            TableDefinition {
                table_name: config.subscriptions_table_name.clone(),
                hash_key: key("id", ScalarAttributeType::S),
                indexes: vec![IndexDefinition {
                    name: "UserIndex",
                    hash_key: key("user_id", ScalarAttributeType::S),
                    range_key: None,
                }],
            },
            TableDefinition {
                table_name: config.orders_table_name.clone(),
                hash_key: key("id", ScalarAttributeType::S),
                indexes: vec![IndexDefinition {
                    name: "UserIndex",
                    hash_key: key("user_id", ScalarAttributeType::S),
                    range_key: None,
                }],
            },
            TableDefinition {
                table_name: config.users_table_name.clone(),
                hash_key: key("id", ScalarAttributeType::S),
                indexes: vec![IndexDefinition {
                    name: "EmailIndex",
                    hash_key: key("email", ScalarAttributeType::S),
                    range_key: None,
                }],
            },
        ]
    }

    /// Distinct key attributes across the table and its indexes
    pub fn attribute_definitions(&self) -> Vec<&KeyAttribute> {
        let mut attributes = vec![&self.hash_key];
        for index in &self.indexes {
            for attribute in std::iter::once(&index.hash_key).chain(index.range_key.as_ref()) {
                if !attributes.iter().any(|a| a.name == attribute.name) {
                    attributes.push(attribute);
                }
            }
        }
        attributes
    }
}

fn sdk_build_error(what: &str, e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::AwsSdk {
        message: format!("Failed to build {}: {}", what, e),
    }
}

fn key_schema_element(name: &str, key_type: KeyType) -> RepositoryResult<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|e| sdk_build_error("key schema", e))
}

/// Manages DynamoDB table creation and configuration
pub struct TableManager {
    client: Arc<DynamoDbClient>,
}

impl TableManager {
    pub fn new(client: Arc<DynamoDbClient>) -> Self {
        Self { client }
    }

    /// Create a table with its GSIs unless it already exists
    #[instrument(skip(self, definition), fields(table_name = %definition.table_name))]
    pub async fn create_table(&self, definition: &TableDefinition) -> RepositoryResult<()> {
        let table_name = definition.table_name.as_str();

        if self.table_exists(table_name).await? {
            info!("Table {} already exists", table_name);
            return Ok(());
        }

        let attribute_definitions = definition
            .attribute_definitions()
            .into_iter()
            .map(|attribute| {
                AttributeDefinition::builder()
                    .attribute_name(attribute.name)
                    .attribute_type(attribute.attribute_type.clone())
                    .build()
                    .map_err(|e| sdk_build_error("attribute definition", e))
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        let mut request = self
            .client
            .create_table()
            .table_name(table_name)
            .set_attribute_definitions(Some(attribute_definitions))
            .key_schema(key_schema_element(definition.hash_key.name, KeyType::Hash)?)
            .billing_mode(BillingMode::PayPerRequest);

        for index in &definition.indexes {
            let mut gsi = GlobalSecondaryIndex::builder()
                .index_name(index.name)
                .key_schema(key_schema_element(index.hash_key.name, KeyType::Hash)?)
                .projection(
                    Projection::builder()
                        .projection_type(ProjectionType::All)
                        .build(),
                );
            if let Some(range_key) = &index.range_key {
                gsi = gsi.key_schema(key_schema_element(range_key.name, KeyType::Range)?);
            }
            request = request.global_secondary_indexes(
                gsi.build().map_err(|e| sdk_build_error("GSI", e))?,
            );
        }

        request
            .send()
            .await
            .map_err(|e| map_dynamodb_error(table_name, e.into()))?;

        info!("Table creation initiated, waiting for table to become active");
        self.wait_for_table_active(table_name).await?;
        info!("Table {} created successfully", table_name);

        Ok(())
    }

    /// Check if a table exists
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn table_exists(&self, table_name: &str) -> RepositoryResult<bool> {
        match self.client.describe_table().table_name(table_name).send().await {
            Ok(_) => Ok(true),
            Err(e) => match DynamoDbError::from(e) {
                DynamoDbError::ResourceNotFoundException(_) => {
                    info!("Table {} does not exist", table_name);
                    Ok(false)
                }
                other => {
                    error!("Error checking table existence: {}", other);
                    Err(RepositoryError::ConnectionFailed)
                }
            },
        }
    }

    /// Wait for a table to become active
    #[instrument(skip(self), fields(table_name = %table_name))]
    async fn wait_for_table_active(&self, table_name: &str) -> RepositoryResult<()> {
        let mut attempts = 0;
        let max_attempts = 30;
        let wait_duration = Duration::from_secs(2);

        loop {
            let response = self
                .client
                .describe_table()
                .table_name(table_name)
                .send()
                .await
                .map_err(|e| map_dynamodb_error(table_name, e.into()))?;

            match response.table.and_then(|table| table.table_status) {
                Some(TableStatus::Active) => {
                    info!("Table {} is now active", table_name);
                    return Ok(());
                }
                Some(status) => info!("Table {} status: {:?}, waiting...", table_name, status),
                None => warn!("Table {} status unknown, waiting...", table_name),
            }

            attempts += 1;
            if attempts >= max_attempts {
                error!("Timeout waiting for table {} to become active", table_name);
                return Err(RepositoryError::Timeout);
            }

            tokio::time::sleep(wait_duration).await;
        }
    }

    /// Create every table the service needs; returns the table names
    #[instrument(skip(self, config))]
    pub async fn create_all_tables(&self, config: &DatabaseConfig) -> RepositoryResult<Vec<String>> {
        info!("Creating all tables");

        let definitions = TableDefinition::all(config);
        for definition in &definitions {
            self.create_table(definition).await?;
        }

        info!("All tables created successfully");
        Ok(definitions
            .into_iter()
            .map(|definition| definition.table_name)
            .collect())
    }
}
