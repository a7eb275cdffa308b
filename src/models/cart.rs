use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A diner's pending meal selection, keyed by user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One product line with the price captured when it was added
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: u64,
    pub quantity: u32,
    pub unit_price: u64,
    pub added_at: DateTime<Utc>,
}

/// Request model for adding an item to cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: u64,
    pub quantity: u32,
}

/// Response model for cart operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartResponse {
    pub user_id: String,
    pub items: Vec<CartItemResponse>,
    pub total_items: u32,
    pub subtotal: u64,
    pub updated_at: DateTime<Utc>,
}

/// Cart item response with product details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemResponse {
    pub product_id: u64,
    pub product_name: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub unit_price: u64,
    pub total_price: u64,
    pub added_at: DateTime<Utc>,
}

impl Cart {
    /// Empty cart owned by `user_id`
    pub fn new(user_id: String) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a product line, merging quantities for a product already present
    pub fn add_item(&mut self, product_id: u64, quantity: u32, unit_price: u64) {
        if let Some(existing_item) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            existing_item.quantity += quantity;
            existing_item.unit_price = unit_price;
        } else {
            self.items.push(CartItem::new(product_id, quantity, unit_price));
        }
        self.updated_at = Utc::now();
    }

    /// Remove an item from the cart
    pub fn remove_item(&mut self, product_id: u64) -> bool {
        let original_len = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        let removed = self.items.len() != original_len;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Clear all items from the cart
    pub fn clear(&mut self) {
        self.items.clear();
        self.updated_at = Utc::now();
    }

    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of per-item totals
    pub fn subtotal(&self) -> u64 {
        self.items.iter().map(CartItem::total_price).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get_item(&self, product_id: u64) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }
}

impl CartItem {
    pub fn new(product_id: u64, quantity: u32, unit_price: u64) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
            added_at: Utc::now(),
        }
    }

    /// unit_price * quantity
    pub fn total_price(&self) -> u64 {
        self.unit_price * u64::from(self.quantity)
    }
}
