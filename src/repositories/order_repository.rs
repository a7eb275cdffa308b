use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use super::dynamodb::{
    collect_pages, dynamodb_span, get_datetime, get_map_list, get_number, get_parsed, get_string,
    map_dynamodb_error, number, string, Item, Page,
};
use crate::models::{Order, OrderItem, RepositoryResult};

/// Trait defining the interface for order persistence
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Create or replace an order
    async fn save(&self, order: Order) -> RepositoryResult<Order>;

    async fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<Order>>;

    /// All orders placed by a user, newest first
    async fn find_by_user(&self, user_id: &str) -> RepositoryResult<Vec<Order>>;
}

/// DynamoDB implementation of the OrderRepository trait
pub struct DynamoDbOrderRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    user_index: String,
    region: String,
}

impl DynamoDbOrderRepository {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            user_index: "UserIndex".to_string(),
            region,
        }
    }

    pub fn order_to_item(&self, order: &Order) -> Item {
        let mut item = HashMap::new();

        item.insert("id".to_string(), string(order.id.clone()));
        item.insert(
            "order_number".to_string(),
            string(order.order_number.clone()),
        );
        item.insert("user_id".to_string(), string(order.user_id.clone()));
        item.insert("status".to_string(), string(order.status.to_string()));

        let items: Vec<AttributeValue> = order
            .items
            .iter()
            .map(|order_item| {
                let mut item_map = HashMap::new();
                item_map.insert("product_id".to_string(), number(order_item.product_id));
                item_map.insert(
                    "product_name".to_string(),
                    string(order_item.product_name.clone()),
                );
                item_map.insert("quantity".to_string(), number(order_item.quantity));
                item_map.insert("unit_price".to_string(), number(order_item.unit_price));
                item_map.insert("total_price".to_string(), number(order_item.total_price));
                item_map.insert(
                    "tracking_number".to_string(),
                    number(order_item.tracking_number),
                );
                item_map.insert("status".to_string(), string(order_item.status.to_string()));
                AttributeValue::M(item_map)
            })
            .collect();
        item.insert("items".to_string(), AttributeValue::L(items));

        item.insert(
            "ordered_at".to_string(),
            string(order.ordered_at.to_rfc3339()),
        );
        item.insert(
            "updated_at".to_string(),
            string(order.updated_at.to_rfc3339()),
        );

        item
    }

    pub fn item_to_order(&self, item: &Item) -> RepositoryResult<Order> {
        let items = get_map_list(item, "items")
            .into_iter()
            .map(|item_map| {
                Ok(OrderItem {
                    product_id: get_number(item_map, "product_id")?,
                    product_name: get_string(item_map, "product_name")?,
                    quantity: get_number(item_map, "quantity")?,
                    unit_price: get_number(item_map, "unit_price")?,
                    total_price: get_number(item_map, "total_price")?,
                    tracking_number: get_number(item_map, "tracking_number")?,
                    status: get_parsed(item_map, "status")?,
                })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        let ordered_at = get_datetime(item, "ordered_at")?;

        Ok(Order {
            id: get_string(item, "id")?,
            order_number: get_string(item, "order_number")?,
            user_id: get_string(item, "user_id")?,
            status: get_parsed(item, "status")?,
            items,
            ordered_at,
            updated_at: get_datetime(item, "updated_at").unwrap_or(ordered_at),
        })
    }
}

#[async_trait]
impl OrderRepository for DynamoDbOrderRepository {
    #[instrument(skip(self, order), fields(table = %self.table_name, order_id = %order.id, status = %order.status))]
    async fn save(&self, order: Order) -> RepositoryResult<Order> {
        let item = self.order_to_item(&order);
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

        info!("Order saved");
        Ok(order)
    }

    #[instrument(skip(self), fields(table = %self.table_name, order_id = %order_id))]
    async fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<Order>> {
        let get_span = dynamodb_span(&self.table_name, &self.region, "GetItem");

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("id", string(order_id))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(get_span)
        .await?;

        response.item.map(|item| self.item_to_order(&item)).transpose()
    }

    #[instrument(skip(self), fields(table = %self.table_name, user_id = %user_id))]
    async fn find_by_user(&self, user_id: &str) -> RepositoryResult<Vec<Order>> {
        info!("Finding orders by user using GSI");

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

        let mut orders = Vec::new();
        for item in items {
            match self.item_to_order(&item) {
                Ok(order) => orders.push(order),
                Err(e) => {
                    warn!("Failed to parse order item: {}", e);
                    continue;
                }
            }
        }
        orders.sort_by(|a, b| b.ordered_at.cmp(&a.ordered_at));

        info!("Found {} orders", orders.len());
        Ok(orders)
    }
}
