use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BoxSize, ProductRef};

pub type SubscriptionId = String;

/// Multiplicative factors that size a subscription box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionQuantity {
    pub food_day_count: u64,
    pub food_week_count: u64,
    pub food_period: u64,
}

impl SubscriptionQuantity {
    pub fn new(food_day_count: u64, food_week_count: u64, food_period: u64) -> Self {
        Self {
            food_day_count,
            food_week_count,
            food_period,
        }
    }

    /// Total number of food items, `None` on overflow
    pub fn food_count(&self) -> Option<u64> {
        self.food_day_count
            .checked_mul(self.food_week_count)?
            .checked_mul(self.food_period)
    }
}

/// A quote request: which category to draw from and how much
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionQuoteRequest {
    pub category_id: u64,
    #[serde(flatten)]
    pub quantity: SubscriptionQuantity,
}

/// Persisted subscription; never mutated after creation except for
/// appended product links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: String,
    pub box_size: BoxSize,
    pub category_id: u64,
    pub food_day_count: u64,
    pub food_week_count: u64,
    pub food_period: u64,
    pub food_start: NaiveDate,
    pub food_end: NaiveDate,
    /// One entry per linked item instance; duplicates are expected
    pub product_ids: Vec<u64>,
    pub created_at: DateTime<Utc>,
}

/// Fields handed to the store when creating a subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionFields {
    pub user_id: String,
    pub box_size: BoxSize,
    pub category_id: u64,
    pub quantity: SubscriptionQuantity,
    pub food_start: NaiveDate,
    pub food_end: NaiveDate,
}

impl SubscriptionFields {
    pub fn new(
        user_id: String,
        box_size: BoxSize,
        category_id: u64,
        quantity: SubscriptionQuantity,
        food_start: NaiveDate,
        term_days: i64,
    ) -> Self {
        Self {
            user_id,
            box_size,
            category_id,
            quantity,
            food_start,
            food_end: food_start + Duration::days(term_days),
        }
    }
}

impl Subscription {
    /// Build a subscription with a generated ID and no linked products
    pub fn new(fields: SubscriptionFields) -> Self {
        Self {
            id: format!(
                "S{}",
                Uuid::new_v4()
                    .simple()
                    .to_string()
                    .get(0..8)
                    .unwrap_or("00000000")
            ),
            user_id: fields.user_id,
            box_size: fields.box_size,
            category_id: fields.category_id,
            food_day_count: fields.quantity.food_day_count,
            food_week_count: fields.quantity.food_week_count,
            food_period: fields.quantity.food_period,
            food_start: fields.food_start,
            food_end: fields.food_end,
            product_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn quantity(&self) -> SubscriptionQuantity {
        SubscriptionQuantity::new(self.food_day_count, self.food_week_count, self.food_period)
    }
}

/// Request model for creating a subscription
///
/// Every field is optional on the wire so a missing one can be reported
/// by name instead of as a generic deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub category_id: Option<u64>,
    pub box_size: Option<BoxSize>,
    pub food_day_count: Option<u64>,
    pub food_week_count: Option<u64>,
    pub food_period: Option<u64>,
    pub food_start: Option<NaiveDate>,
    /// Explicit selection; when absent the sizing engine picks products
    pub product_ids: Option<Vec<u64>>,
}

/// Response for a subscription quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionOptionResponse {
    pub food_count: u64,
    pub food_list: Vec<ProductRef>,
}

/// Response for a subscription price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPriceResponse {
    pub food_count: u64,
    pub total_price: u64,
}

/// Response after a subscription has been persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSubscriptionResponse {
    pub subscription_id: SubscriptionId,
    pub food_count: u64,
    pub linked_count: usize,
    pub total_price: u64,
    pub food_start: NaiveDate,
    pub food_end: NaiveDate,
}

/// A subscription with its linked products resolved and priced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionDetailResponse {
    pub subscription: Subscription,
    pub products: Vec<ProductRef>,
    pub subtotal: u64,
}

/// Response for a user's subscription listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionListResponse {
    pub subscriptions: Vec<SubscriptionDetailResponse>,
    pub total_count: usize,
    pub total_price: u64,
}
