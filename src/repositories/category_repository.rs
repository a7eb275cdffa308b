use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use super::dynamodb::{
    collect_pages, dynamodb_span, get_number, get_string, map_dynamodb_error, number, string,
    Item, Page,
};
use crate::models::{Category, RepositoryResult};

/// Trait defining the interface for category data access
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_by_id(&self, id: u64) -> RepositoryResult<Option<Category>>;

    /// All categories ordered by ID
    async fn find_all(&self) -> RepositoryResult<Vec<Category>>;

    /// Create or replace a category
    async fn save(&self, category: Category) -> RepositoryResult<Category>;
}

/// DynamoDB implementation of the CategoryRepository trait
pub struct DynamoDbCategoryRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbCategoryRepository {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

    pub fn category_to_item(&self, category: &Category) -> Item {
        let mut item = HashMap::new();
        item.insert("id".to_string(), number(category.id));
        item.insert("name".to_string(), string(category.name.clone()));
        item
    }

    pub fn item_to_category(&self, item: &Item) -> RepositoryResult<Category> {
        Ok(Category {
            id: get_number(item, "id")?,
            name: get_string(item, "name")?,
        })
    }
}

#[async_trait]
impl CategoryRepository for DynamoDbCategoryRepository {
    #[instrument(skip(self), fields(table = %self.table_name, id = id))]
    async fn find_by_id(&self, id: u64) -> RepositoryResult<Option<Category>> {
        let get_span = dynamodb_span(&self.table_name, &self.region, "GetItem");

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("id", number(id))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(get_span)
        .await?;

        response
            .item
            .map(|item| self.item_to_category(&item))
            .transpose()
    }

    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self) -> RepositoryResult<Vec<Category>> {
        info!("Finding all categories");

        let items = collect_pages(|start_key| {
            let scan_span = dynamodb_span(&self.table_name, &self.region, "Scan");
            async move {
                self.client
                    .scan()
                    .table_name(&self.table_name)
                    .set_exclusive_start_key(start_key)
                    .send()
                    .await
                    .map(|response| Page::new(response.items, response.last_evaluated_key))
                    .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
            }
            .instrument(scan_span)
        })
        .await?;

        let mut categories = Vec::new();
        for item in items {
            match self.item_to_category(&item) {
                Ok(category) => categories.push(category),
                Err(e) => {
                    warn!("Failed to parse category item: {}", e);
                    continue;
                }
            }
        }
        categories.sort_by_key(|category| category.id);

        info!("Found {} categories", categories.len());
        Ok(categories)
    }

    #[instrument(skip(self, category), fields(table = %self.table_name, id = category.id))]
    async fn save(&self, category: Category) -> RepositoryResult<Category> {
        let item = self.category_to_item(&category);
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

        info!("Category saved");
        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_item_conversion() {
        let config = aws_sdk_dynamodb::Config::builder()
            .region(aws_sdk_dynamodb::config::Region::new("us-east-1"))
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .build();
        let client = Arc::new(aws_sdk_dynamodb::Client::from_conf(config));
        let repo = DynamoDbCategoryRepository::new(
            client,
            "test-categories".to_string(),
            "us-east-1".to_string(),
        );

        let category = Category {
            id: 3,
            name: "Salads".to_string(),
        };
        let item = repo.category_to_item(&category);
        assert_eq!(repo.item_to_category(&item).unwrap(), category);
    }
}
