use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderItemStatus, OrderStatus};

/// Tracking numbers are twelve decimal digits
const TRACKING_NUMBER_MODULUS: u128 = 1_000_000_000_000;

/// An order placed from a user's cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub ordered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single line of an order with its own fulfilment tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: u64,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: u64,
    pub total_price: u64,
    pub tracking_number: u64,
    pub status: OrderItemStatus,
}

/// Order with its computed subtotal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub subtotal: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total_count: usize,
}

impl Order {
    pub fn new(user_id: String, items: Vec<OrderItem>) -> Self {
        let now = Utc::now();
        let short_id = Uuid::new_v4()
            .simple()
            .to_string()
            .get(0..8)
            .unwrap_or("00000000")
            .to_string();
        Self {
            id: format!("O{}", short_id),
            order_number: format!("{}-{}", now.format("%Y%m%d"), short_id.to_uppercase()),
            user_id,
            status: OrderStatus::Pending,
            items,
            ordered_at: now,
            updated_at: now,
        }
    }

    pub fn subtotal(&self) -> u64 {
        self.items.iter().map(|item| item.total_price).sum()
    }

    /// Cancel the order and every line; returns false if it already shipped
    pub fn cancel(&mut self) -> bool {
        if !self.status.is_cancellable() {
            return false;
        }
        self.status = OrderStatus::Cancelled;
        for item in &mut self.items {
            item.status = OrderItemStatus::Cancelled;
        }
        self.updated_at = Utc::now();
        true
    }

    pub fn into_response(self) -> OrderResponse {
        let subtotal = self.subtotal();
        OrderResponse {
            order: self,
            subtotal,
        }
    }
}

impl OrderItem {
    pub fn new(product_id: u64, product_name: String, quantity: u32, unit_price: u64) -> Self {
        Self {
            product_id,
            product_name,
            quantity,
            unit_price,
            total_price: unit_price * u64::from(quantity),
            tracking_number: (Uuid::new_v4().as_u128() % TRACKING_NUMBER_MODULUS) as u64,
            status: OrderItemStatus::Preparing,
        }
    }
}
