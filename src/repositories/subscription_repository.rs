use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use super::dynamodb::{
    collect_pages, dynamodb_span, get_date, get_datetime, get_number, get_number_list, get_parsed,
    get_string, map_dynamodb_error, number, string, Item, Page,
};
use crate::models::{RepositoryResult, Subscription, SubscriptionFields, SubscriptionId};

/// Trait defining the interface for subscription persistence
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Persist a new subscription with no linked products
    async fn create_subscription(&self, fields: SubscriptionFields)
        -> RepositoryResult<SubscriptionId>;

    /// Append one product instance to a subscription
    async fn link_product(&self, subscription_id: &str, product_id: u64) -> RepositoryResult<()>;

    async fn find_by_id(&self, subscription_id: &str) -> RepositoryResult<Option<Subscription>>;

    /// All subscriptions owned by a user, newest first
    async fn find_by_user(&self, user_id: &str) -> RepositoryResult<Vec<Subscription>>;

    async fn delete(&self, subscription_id: &str) -> RepositoryResult<()>;
}

/// DynamoDB implementation of the SubscriptionRepository trait
pub struct DynamoDbSubscriptionRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    user_index: String,
    region: String,
}

impl DynamoDbSubscriptionRepository {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            user_index: "UserIndex".to_string(),
            region,
        }
    }

    pub fn subscription_to_item(&self, subscription: &Subscription) -> Item {
        let mut item = HashMap::new();

        item.insert("id".to_string(), string(subscription.id.clone()));
        item.insert("user_id".to_string(), string(subscription.user_id.clone()));
        item.insert(
            "box_size".to_string(),
            string(subscription.box_size.to_string()),
        );
        item.insert("category_id".to_string(), number(subscription.category_id));
        item.insert(
            "food_day_count".to_string(),
            number(subscription.food_day_count),
        );
        item.insert(
            "food_week_count".to_string(),
            number(subscription.food_week_count),
        );
        item.insert("food_period".to_string(), number(subscription.food_period));
        item.insert(
            "food_start".to_string(),
            string(subscription.food_start.format("%Y-%m-%d").to_string()),
        );
        item.insert(
            "food_end".to_string(),
            string(subscription.food_end.format("%Y-%m-%d").to_string()),
        );
        let product_ids: Vec<AttributeValue> = subscription
            .product_ids
            .iter()
            .map(|id| number(*id))
            .collect();
        item.insert("product_ids".to_string(), AttributeValue::L(product_ids));
        item.insert(
            "created_at".to_string(),
            string(subscription.created_at.to_rfc3339()),
        );

        item
    }

    pub fn item_to_subscription(&self, item: &Item) -> RepositoryResult<Subscription> {
        Ok(Subscription {
            id: get_string(item, "id")?,
            user_id: get_string(item, "user_id")?,
            box_size: get_parsed(item, "box_size")?,
            category_id: get_number(item, "category_id")?,
            food_day_count: get_number(item, "food_day_count")?,
            food_week_count: get_number(item, "food_week_count")?,
            food_period: get_number(item, "food_period")?,
            food_start: get_date(item, "food_start")?,
            food_end: get_date(item, "food_end")?,
            product_ids: get_number_list(item, "product_ids")?,
            created_at: get_datetime(item, "created_at")?,
        })
    }
}

#[async_trait]
impl SubscriptionRepository for DynamoDbSubscriptionRepository {
    #[instrument(skip(self, new_subscription), fields(table = %self.table_name, user_id = %new_subscription.user_id, category_id = new_subscription.category_id))]
    async fn create_subscription(
        &self,
        new_subscription: SubscriptionFields,
    ) -> RepositoryResult<SubscriptionId> {
        let subscription = Subscription::new(new_subscription);
        let item = self.subscription_to_item(&subscription);
        let put_span = dynamodb_span(&self.table_name, &self.region, "PutItem");

        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .condition_expression("attribute_not_exists(id)")
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(put_span)
        .await?;

        info!(subscription_id = %subscription.id, "Subscription created");
        Ok(subscription.id)
    }

    #[instrument(skip(self), fields(table = %self.table_name, subscription_id = %subscription_id, product_id = product_id))]
    async fn link_product(&self, subscription_id: &str, product_id: u64) -> RepositoryResult<()> {
        let update_span = dynamodb_span(&self.table_name, &self.region, "UpdateItem");

        async {
            self.client
                .update_item()
                .table_name(&self.table_name)
                .key("id", string(subscription_id))
                .update_expression(
                    "SET product_ids = list_append(if_not_exists(product_ids, :empty), :product)",
                )
                .expression_attribute_values(":empty", AttributeValue::L(Vec::new()))
                .expression_attribute_values(":product", AttributeValue::L(vec![number(product_id)]))
                .condition_expression("attribute_exists(id)")
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(update_span)
        .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(table = %self.table_name, subscription_id = %subscription_id))]
    async fn find_by_id(&self, subscription_id: &str) -> RepositoryResult<Option<Subscription>> {
        let get_span = dynamodb_span(&self.table_name, &self.region, "GetItem");

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("id", string(subscription_id))
                .consistent_read(true)
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(get_span)
        .await?;

        response
            .item
            .map(|item| self.item_to_subscription(&item))
            .transpose()
    }

    #[instrument(skip(self), fields(table = %self.table_name, user_id = %user_id))]
    async fn find_by_user(&self, user_id: &str) -> RepositoryResult<Vec<Subscription>> {
        info!("Finding subscriptions by user using GSI");

        let items = collect_pages(|start_key| {
            let query_span = dynamodb_span(&self.table_name, &self.region, "Query");
            async move {
                self.client
                    .query()
                    .table_name(&self.table_name)
                    .index_name(&self.user_index)
                    .key_condition_expression("user_id = :user_id")
                    .expression_attribute_values(":user_id", string(user_id))
                    .set_exclusive_start_key(start_key)
                    .send()
                    .await
                    .map(|response| Page::new(response.items, response.last_evaluated_key))
                    .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
            }
            .instrument(query_span)
        })
        .await?;

        let mut subscriptions = Vec::new();
        for item in items {
            match self.item_to_subscription(&item) {
                Ok(subscription) => subscriptions.push(subscription),
                Err(e) => {
                    warn!("Failed to parse subscription item: {}", e);
                    continue;
                }
            }
        }
        subscriptions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        info!("Found {} subscriptions", subscriptions.len());
        Ok(subscriptions)
    }

    #[instrument(skip(self), fields(table = %self.table_name, subscription_id = %subscription_id))]
    async fn delete(&self, subscription_id: &str) -> RepositoryResult<()> {
        let delete_span = dynamodb_span(&self.table_name, &self.region, "DeleteItem");

        async {
            self.client
                .delete_item()
                .table_name(&self.table_name)
                .key("id", string(subscription_id))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))?;

            info!("Subscription deleted");
            Ok(())
        }
        .instrument(delete_span)
        .await
    }
}
