use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, Instrument};

use super::dynamodb::{
    dynamodb_span, get_datetime, get_map_list, get_number, get_string, map_dynamodb_error,
    number, string, Item,
};
use crate::models::{Cart, CartItem, RepositoryResult};

/// Persistence for one cart per user
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Find a cart by user ID
    async fn find_cart(&self, user_id: &str) -> RepositoryResult<Option<Cart>>;

    /// Save a cart (create or update)
    async fn save_cart(&self, cart: Cart) -> RepositoryResult<Cart>;

    /// Delete a cart
    async fn delete_cart(&self, user_id: &str) -> RepositoryResult<()>;
}

/// DynamoDB implementation of the CartRepository trait
pub struct DynamoDbCartRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl DynamoDbCartRepository {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

    /// Convert a Cart struct to DynamoDB attribute values
    pub fn cart_to_item(&self, cart: &Cart) -> Item {
        let mut item = HashMap::new();

        item.insert("user_id".to_string(), string(cart.user_id.clone()));

        let items: Vec<AttributeValue> = cart
            .items
            .iter()
            .map(|cart_item| {
                let mut item_map = HashMap::new();
                item_map.insert("product_id".to_string(), number(cart_item.product_id));
                item_map.insert("quantity".to_string(), number(cart_item.quantity));
                item_map.insert("unit_price".to_string(), number(cart_item.unit_price));
                item_map.insert(
                    "added_at".to_string(),
                    string(cart_item.added_at.to_rfc3339()),
                );
                AttributeValue::M(item_map)
            })
            .collect();
        item.insert("items".to_string(), AttributeValue::L(items));

        item.insert(
            "created_at".to_string(),
            string(cart.created_at.to_rfc3339()),
        );
        item.insert(
            "updated_at".to_string(),
            string(cart.updated_at.to_rfc3339()),
        );

        item
    }

    /// Convert DynamoDB item to Cart struct
    pub fn item_to_cart(&self, item: &Item) -> RepositoryResult<Cart> {
        let items = get_map_list(item, "items")
            .into_iter()
            .map(|item_map| self.map_to_cart_item(item_map))
            .collect::<RepositoryResult<Vec<_>>>()?;

        let created_at = get_datetime(item, "created_at")?;
        // Legacy rows may not carry updated_at
        let updated_at = get_datetime(item, "updated_at").unwrap_or(created_at);

        Ok(Cart {
            user_id: get_string(item, "user_id")?,
            items,
            created_at,
            updated_at,
        })
    }

    pub fn map_to_cart_item(&self, item_map: &Item) -> RepositoryResult<CartItem> {
        Ok(CartItem {
            product_id: get_number(item_map, "product_id")?,
            quantity: get_number(item_map, "quantity")?,
            unit_price: get_number(item_map, "unit_price")?,
            added_at: get_datetime(item_map, "added_at")?,
        })
    }
}

#[async_trait]
impl CartRepository for DynamoDbCartRepository {
    #[instrument(skip(self), fields(table = %self.table_name, user_id = %user_id))]
    async fn find_cart(&self, user_id: &str) -> RepositoryResult<Option<Cart>> {
        info!("Finding cart");

        let get_span = dynamodb_span(&self.table_name, &self.region, "GetItem");

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("user_id", string(user_id))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(get_span)
        .await?;

        response.item.map(|item| self.item_to_cart(&item)).transpose()
    }

    #[instrument(skip(self, cart), fields(table = %self.table_name, user_id = %cart.user_id, item_count = cart.items.len()))]
    async fn save_cart(&self, cart: Cart) -> RepositoryResult<Cart> {
        info!("Saving cart");

        let item = self.cart_to_item(&cart);
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

        info!("Cart saved successfully");
        Ok(cart)
    }

    #[instrument(skip(self), fields(table = %self.table_name, user_id = %user_id))]
    async fn delete_cart(&self, user_id: &str) -> RepositoryResult<()> {
        info!("Deleting cart");

        let delete_span = dynamodb_span(&self.table_name, &self.region, "DeleteItem");

        async {
            self.client
                .delete_item()
                .table_name(&self.table_name)
                .key("user_id", string(user_id))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))?;

            info!("Cart deleted successfully");
            Ok(())
        }
        .instrument(delete_span)
        .await
    }
}
