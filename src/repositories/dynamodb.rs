//! Helpers shared by the DynamoDB repository implementations: client span
//! construction, SDK error mapping, and attribute decoding.

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Error as DynamoDbError;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;
use tracing::error;

use crate::models::{RepositoryError, RepositoryResult};

pub type Item = HashMap<String, AttributeValue>;

/// Create a DynamoDB client span carrying X-Ray and OpenTelemetry attributes
pub fn dynamodb_span(table_name: &str, region: &str, operation: &str) -> tracing::Span {
    tracing::info_span!(
        "DynamoDB",
        // AWS X-Ray specific attributes
        "aws.service" = "DynamoDB",
        "aws.operation" = operation,
        "aws.region" = %region,
        "aws.dynamodb.table_name" = %table_name,
        "aws.request_id" = tracing::field::Empty,
        "aws.agent" = "rust-aws-sdk",

        // Resource identification for X-Ray
        "aws.remote.service" = "AWS::DynamoDB",
        "aws.remote.operation" = operation,
        "aws.remote.resource.type" = "AWS::DynamoDB::Table",
        "aws.remote.resource.identifier" = %table_name,

        "table_name" = %table_name,
        "endpoint" = format!("https://dynamodb.{}.amazonaws.com", region),

        // OpenTelemetry semantic conventions
        "otel.kind" = "client",
        "otel.name" = format!("DynamoDB.{}", operation),

        "rpc.system" = "aws-api",
        "rpc.service" = "AmazonDynamoDBv2",
        "rpc.method" = operation,

        "http.method" = "POST",
        "http.status_code" = tracing::field::Empty,

        // Database semantic conventions
        "db.system" = "dynamodb",
        "db.name" = %table_name,
        "db.operation" = operation,

        "component" = "aws-sdk-dynamodb",
    )
}

/// Convert a DynamoDB error to RepositoryError
pub fn map_dynamodb_error(table_name: &str, error: DynamoDbError) -> RepositoryError {
    error!("DynamoDB error: {:?}", error);

    match &error {
        DynamoDbError::ResourceNotFoundException(_) => RepositoryError::TableNotFound {
            table_name: table_name.to_string(),
        },
        DynamoDbError::ConditionalCheckFailedException(_) => {
            RepositoryError::ConstraintViolation {
                message: format!("Conditional check failed on {}", table_name),
            }
        }
        DynamoDbError::ProvisionedThroughputExceededException(_)
        | DynamoDbError::RequestLimitExceeded(_) => RepositoryError::RateLimitExceeded,
        _ => RepositoryError::AwsSdk {
            message: error.to_string(),
        },
    }
}

fn missing(field: &str) -> RepositoryError {
    RepositoryError::InvalidQuery {
        message: format!("Missing {}", field),
    }
}

fn invalid(field: &str) -> RepositoryError {
    RepositoryError::InvalidQuery {
        message: format!("Invalid {}", field),
    }
}

pub fn get_string(item: &Item, field: &str) -> RepositoryResult<String> {
    item.get(field)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| missing(field))
}

pub fn get_optional_string(item: &Item, field: &str) -> Option<String> {
    item.get(field).and_then(|v| v.as_s().ok()).cloned()
}

/// Read a numeric attribute and parse it into `T`
pub fn get_number<T: FromStr>(item: &Item, field: &str) -> RepositoryResult<T> {
    item.get(field)
        .and_then(|v| v.as_n().ok())
        .ok_or_else(|| missing(field))?
        .parse::<T>()
        .map_err(|_| invalid(field))
}

/// Read an enum-like attribute stored as its Display string
pub fn get_parsed<T: FromStr>(item: &Item, field: &str) -> RepositoryResult<T> {
    get_string(item, field)?
        .parse::<T>()
        .map_err(|_| invalid(field))
}

pub fn get_datetime(item: &Item, field: &str) -> RepositoryResult<DateTime<Utc>> {
    let raw = get_string(item, field)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| invalid(field))
}

pub fn get_date(item: &Item, field: &str) -> RepositoryResult<NaiveDate> {
    let raw = get_string(item, field)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| invalid(field))
}

/// String list attribute; absent means empty
pub fn get_string_list(item: &Item, field: &str) -> Vec<String> {
    item.get(field)
        .and_then(|v| v.as_l().ok())
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_s().ok().cloned())
                .collect()
        })
        .unwrap_or_default()
}

/// Numeric list attribute; absent means empty, malformed entries are errors
pub fn get_number_list(item: &Item, field: &str) -> RepositoryResult<Vec<u64>> {
    let Some(values) = item.get(field).and_then(|v| v.as_l().ok()) else {
        return Ok(Vec::new());
    };

    values
        .iter()
        .map(|v| {
            v.as_n()
                .ok()
                .and_then(|n| n.parse::<u64>().ok())
                .ok_or_else(|| invalid(field))
        })
        .collect()
}

pub fn get_map_list<'a>(item: &'a Item, field: &str) -> Vec<&'a Item> {
    item.get(field)
        .and_then(|v| v.as_l().ok())
        .map(|values| values.iter().filter_map(|v| v.as_m().ok()).collect())
        .unwrap_or_default()
}

/// One page of a Query or Scan response
#[derive(Debug, Default)]
pub struct Page {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<Item>,
}

impl Page {
    pub fn new(items: Option<Vec<Item>>, last_evaluated_key: Option<Item>) -> Self {
        Self {
            items: items.unwrap_or_default(),
            last_evaluated_key,
        }
    }
}

/// Follow `last_evaluated_key` until the result set is exhausted.
/// `fetch_page` receives the exclusive start key for the next request.
pub async fn collect_pages<F, Fut>(mut fetch_page: F) -> RepositoryResult<Vec<Item>>
where
    F: FnMut(Option<Item>) -> Fut,
    Fut: Future<Output = RepositoryResult<Page>>,
{
    let mut items = Vec::new();
    let mut exclusive_start_key: Option<Item> = None;

    loop {
        let page = fetch_page(exclusive_start_key.take()).await?;
        items.extend(page.items);

        match page.last_evaluated_key {
            Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
            _ => break,
        }
    }

    Ok(items)
}

pub fn number(value: impl ToString) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

pub fn string(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}
