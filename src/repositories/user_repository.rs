use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use super::dynamodb::{
    dynamodb_span, get_datetime, get_string, get_string_list, map_dynamodb_error, string, Item,
};
use crate::models::{RepositoryResult, User};

/// Trait defining the interface for resolving user identities
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    /// Create or replace a user record
    async fn save(&self, user: User) -> RepositoryResult<User>;
}

/// DynamoDB implementation of the UserRepository trait
pub struct DynamoDbUserRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    email_index: String,
    region: String,
}

impl DynamoDbUserRepository {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            email_index: "EmailIndex".to_string(),
            region,
        }
    }

    pub fn user_to_item(&self, user: &User) -> Item {
        let mut item = HashMap::new();
        item.insert("id".to_string(), string(user.id.clone()));
        item.insert("email".to_string(), string(user.email.clone()));
        item.insert("name".to_string(), string(user.name.clone()));
        let allergies: Vec<AttributeValue> = user
            .allergies
            .iter()
            .map(|allergy| string(allergy.clone()))
            .collect();
        item.insert("allergies".to_string(), AttributeValue::L(allergies));
        item.insert("created_at".to_string(), string(user.created_at.to_rfc3339()));
        item
    }

    pub fn item_to_user(&self, item: &Item) -> RepositoryResult<User> {
        Ok(User {
            id: get_string(item, "id")?,
            email: get_string(item, "email")?,
            name: get_string(item, "name")?,
            allergies: get_string_list(item, "allergies"),
            created_at: get_datetime(item, "created_at")?,
        })
    }
}

#[async_trait]
impl UserRepository for DynamoDbUserRepository {
    #[instrument(skip(self, email), fields(table = %self.table_name))]
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let query_span = dynamodb_span(&self.table_name, &self.region, "Query");
        let normalized = email.trim().to_lowercase();

        let response = async {
            self.client
                .query()
                .table_name(&self.table_name)
                .index_name(&self.email_index)
                .key_condition_expression("email = :email")
                .expression_attribute_values(":email", string(normalized))
                .limit(1)
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(query_span)
        .await?;

        let Some(item) = response.items.unwrap_or_default().into_iter().next() else {
            info!("No user registered for email");
            return Ok(None);
        };

        match self.item_to_user(&item) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!("Failed to parse user item: {}", e);
                Err(e)
            }
        }
    }

    #[instrument(skip(self, user), fields(table = %self.table_name, user_id = %user.id))]
    async fn save(&self, user: User) -> RepositoryResult<User> {
        let item = self.user_to_item(&user);
        let put_span = dynamodb_span(&self.table_name, &self.region, "PutItem");

        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(put_span)
        .await?;

        info!("User saved");
        Ok(user)
    }
}
