use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Packaging size of a subscription box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxSize {
    Small,
    Medium,
    Large,
}

impl fmt::Display for BoxSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxSize::Small => write!(f, "small"),
            BoxSize::Medium => write!(f, "medium"),
            BoxSize::Large => write!(f, "large"),
        }
    }
}

impl FromStr for BoxSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" => Ok(BoxSize::Small),
            "medium" => Ok(BoxSize::Medium),
            "large" => Ok(BoxSize::Large),
            _ => Err(format!("Invalid box size: {}", s)),
        }
    }
}

/// Lifecycle status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Orders can only be cancelled before they leave the warehouse
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Paid)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Paid => write!(f, "paid"),
            OrderStatus::Shipped => write!(f, "shipped"),
            OrderStatus::Delivered => write!(f, "delivered"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}

/// Fulfilment status of a single order line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderItemStatus {
    Preparing,
    InTransit,
    Delivered,
    Cancelled,
}

impl fmt::Display for OrderItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderItemStatus::Preparing => write!(f, "preparing"),
            OrderItemStatus::InTransit => write!(f, "in_transit"),
            OrderItemStatus::Delivered => write!(f, "delivered"),
            OrderItemStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preparing" => Ok(OrderItemStatus::Preparing),
            "in_transit" => Ok(OrderItemStatus::InTransit),
            "delivered" => Ok(OrderItemStatus::Delivered),
            "cancelled" => Ok(OrderItemStatus::Cancelled),
            _ => Err(format!("Invalid order item status: {}", s)),
        }
    }
}
