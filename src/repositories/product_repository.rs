use async_trait::async_trait;
use aws_sdk_dynamodb::operation::RequestId;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Instrument};

use super::dynamodb::{
    collect_pages, dynamodb_span, get_datetime, get_number, get_optional_string, get_string,
    get_string_list, map_dynamodb_error, number, string, Item, Page,
};
use crate::models::{Product, RepositoryResult};

/// Trait defining the interface for catalog product access
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// First `limit` products of a category in catalog order
    async fn fetch_products(&self, category_id: u64, limit: usize)
        -> RepositoryResult<Vec<Product>>;

    /// Find a product by its ID
    async fn find_by_id(&self, id: u64) -> RepositoryResult<Option<Product>>;

    /// Every product of a category in catalog order
    async fn find_by_category(&self, category_id: u64) -> RepositoryResult<Vec<Product>>;

    /// Create a new product
    async fn create(&self, product: Product) -> RepositoryResult<Product>;
}

/// DynamoDB implementation of the ProductRepository trait
pub struct DynamoDbProductRepository {
    client: Arc<DynamoDbClient>,
    table_name: String,
    category_index: String,
    region: String,
}

impl DynamoDbProductRepository {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            category_index: "CategoryIndex".to_string(),
            region,
        }
    }

    pub fn product_to_item(&self, product: &Product) -> Item {
        let mut item = HashMap::new();

        item.insert("id".to_string(), number(product.id));
        item.insert("category_id".to_string(), number(product.category_id));
        item.insert("name".to_string(), string(product.name.clone()));
        item.insert("price".to_string(), number(product.price));
        item.insert(
            "description".to_string(),
            string(product.description.clone()),
        );
        let allergies: Vec<AttributeValue> = product
            .allergies
            .iter()
            .map(|allergy| string(allergy.clone()))
            .collect();
        item.insert("allergies".to_string(), AttributeValue::L(allergies));
        if let Some(ref image_url) = product.image_url {
            item.insert("image_url".to_string(), string(image_url.clone()));
        }
        item.insert(
            "created_at".to_string(),
            string(product.created_at.to_rfc3339()),
        );

        item
    }

    pub fn item_to_product(&self, item: &Item) -> RepositoryResult<Product> {
        Ok(Product {
            id: get_number(item, "id")?,
            category_id: get_number(item, "category_id")?,
            name: get_string(item, "name")?,
            price: get_number(item, "price")?,
            description: get_string(item, "description")?,
            allergies: get_string_list(item, "allergies"),
            image_url: get_optional_string(item, "image_url"),
            created_at: get_datetime(item, "created_at")?,
        })
    }

    /// Decode every item, failing on the first malformed one
    pub fn parse_batch(&self, items: Option<Vec<Item>>) -> RepositoryResult<Vec<Product>> {
        items
            .unwrap_or_default()
            .iter()
            .map(|item| self.item_to_product(item))
            .collect()
    }

    fn parse_items(&self, items: Vec<Item>) -> Vec<Product> {
        let mut products = Vec::new();
        for item in items {
            match self.item_to_product(&item) {
                Ok(product) => products.push(product),
                Err(e) => {
                    warn!("Failed to parse product item: {}", e);
                    continue;
                }
            }
        }
        products
    }
}

#[async_trait]
impl ProductRepository for DynamoDbProductRepository {
    #[instrument(skip(self), fields(table = %self.table_name, category_id = category_id, limit = limit))]
    async fn fetch_products(
        &self,
        category_id: u64,
        limit: usize,
    ) -> RepositoryResult<Vec<Product>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let query_span = dynamodb_span(&self.table_name, &self.region, "Query");

        let response = async {
            self.client
                .query()
                .table_name(&self.table_name)
                .index_name(&self.category_index)
                .key_condition_expression("category_id = :category_id")
                .expression_attribute_values(":category_id", number(category_id))
                .scan_index_forward(true)
                .limit(i32::try_from(limit).unwrap_or(i32::MAX))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(query_span)
        .await?;

        let products = self.parse_batch(response.items)?;
        info!("Fetched {} products", products.len());
        Ok(products)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = id))]
    async fn find_by_id(&self, id: u64) -> RepositoryResult<Option<Product>> {
        info!("Finding product by ID");

        let get_span = dynamodb_span(&self.table_name, &self.region, "GetItem");

        let response = async {
            let result = self
                .client
                .get_item()
                .table_name(&self.table_name)
                .key("id", number(id))
                .send()
                .await;

            match &result {
                Ok(output) => {
                    tracing::Span::current().record("http.status_code", 200);
                    if let Some(request_id) = output.request_id() {
                        tracing::Span::current().record("aws.request_id", request_id);
                    }
                }
                Err(e) => {
                    tracing::Span::current().record("http.status_code", 400);
                    error!("DynamoDB GetItem failed: {}", e);
                }
            }

            result.map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(get_span)
        .await?;

        match response.item {
            Some(item) => Ok(Some(self.item_to_product(&item)?)),
            None => {
                info!("Product not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self), fields(table = %self.table_name, category_id = category_id))]
    async fn find_by_category(&self, category_id: u64) -> RepositoryResult<Vec<Product>> {
        info!("Finding products by category using GSI");

        let items = collect_pages(|start_key| {
            let query_span = dynamodb_span(&self.table_name, &self.region, "Query");
            async move {
                self.client
                    .query()
                    .table_name(&self.table_name)
                    .index_name(&self.category_index)
                    .key_condition_expression("category_id = :category_id")
                    .expression_attribute_values(":category_id", number(category_id))
                    .scan_index_forward(true)
                    .set_exclusive_start_key(start_key)
                    .send()
                    .await
                    .map(|response| Page::new(response.items, response.last_evaluated_key))
                    .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
            }
            .instrument(query_span)
        })
        .await?;

        let products = self.parse_items(items);
        info!("Found {} products", products.len());
        Ok(products)
    }

    #[instrument(skip(self, product), fields(table = %self.table_name, id = product.id))]
    async fn create(&self, product: Product) -> RepositoryResult<Product> {
        info!("Creating new product");

        let item = self.product_to_item(&product);
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

        info!("Product created successfully");
        Ok(product)
    }
}
