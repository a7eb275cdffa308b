use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{
    validate_cart_quantity, AddCartItemRequest, Cart, CartItem, CartItemResponse, CartResponse,
    Product, ServiceError, ServiceResult, Validate,
};
use crate::repositories::{CartRepository, ProductRepository};

/// Service for managing shopping carts
pub struct CartService {
    cart_repository: Arc<dyn CartRepository>,
    product_repository: Arc<dyn ProductRepository>,
}

impl CartService {
    pub fn new(
        cart_repository: Arc<dyn CartRepository>,
        product_repository: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            cart_repository,
            product_repository,
        }
    }

    /// Get a user's cart; a user without one sees an empty cart
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_cart(&self, user_id: &str) -> ServiceResult<CartResponse> {
        let cart = self.load_cart(user_id).await?;
        let response = self.cart_to_response(cart).await?;

        info!("Cart retrieved with {} items", response.items.len());
        Ok(response)
    }

    /// Add a product, merging with an existing line at the current price
    #[instrument(skip(self, request), fields(user_id = %user_id, product_id = request.product_id, quantity = request.quantity))]
    pub async fn add_item(
        &self,
        user_id: &str,
        request: AddCartItemRequest,
    ) -> ServiceResult<CartResponse> {
        request.validate()?;

        let product = self
            .product_repository
            .find_by_id(request.product_id)
            .await?
            .ok_or(ServiceError::InvalidProduct {
                product_id: request.product_id,
            })?;

        let mut cart = self.load_cart(user_id).await?;

        let merged_quantity = cart
            .get_item(product.id)
            .map_or(0, |item| item.quantity)
            .saturating_add(request.quantity);
        validate_cart_quantity(merged_quantity)?;

        cart.add_item(product.id, request.quantity, product.price);
        let cart = self.cart_repository.save_cart(cart).await?;

        crate::info_with_trace!("Item added to cart");
        self.cart_to_response(cart).await
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn remove_item(&self, user_id: &str, product_id: u64) -> ServiceResult<CartResponse> {
        let mut cart = self.load_cart(user_id).await?;

        if !cart.remove_item(product_id) {
            return Err(ServiceError::CartItemNotFound {
                product_id,
                user_id: user_id.to_string(),
            });
        }

        let cart = self.cart_repository.save_cart(cart).await?;

        crate::info_with_trace!("Item removed from cart");
        self.cart_to_response(cart).await
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn clear_cart(&self, user_id: &str) -> ServiceResult<()> {
        match self.cart_repository.find_cart(user_id).await? {
            Some(mut cart) => {
                cart.clear();
                self.cart_repository.save_cart(cart).await?;
                info!("Cart cleared");
            }
            None => info!("Cart not found, nothing to clear"),
        }
        Ok(())
    }

    async fn load_cart(&self, user_id: &str) -> ServiceResult<Cart> {
        Ok(self
            .cart_repository
            .find_cart(user_id)
            .await?
            .unwrap_or_else(|| Cart::new(user_id.to_string())))
    }

    async fn cart_to_response(&self, cart: Cart) -> ServiceResult<CartResponse> {
        let mut items = Vec::with_capacity(cart.items.len());

        for cart_item in &cart.items {
            let product = self.product_repository.find_by_id(cart_item.product_id).await?;
            if product.is_none() {
                warn!("Product not found for cart item: {}", cart_item.product_id);
            }
            items.push(cart_item_to_response(cart_item, product.as_ref()));
        }

        Ok(CartResponse {
            total_items: cart.total_items(),
            subtotal: cart.subtotal(),
            updated_at: cart.updated_at,
            user_id: cart.user_id,
            items,
        })
    }
}

fn cart_item_to_response(cart_item: &CartItem, product: Option<&Product>) -> CartItemResponse {
    CartItemResponse {
        product_id: cart_item.product_id,
        product_name: product
            .map(|product| product.name.clone())
            .unwrap_or_else(|| "Product not found".to_string()),
        image_url: product.and_then(|product| product.image_url.clone()),
        quantity: cart_item.quantity,
        unit_price: cart_item.unit_price,
        total_price: cart_item.total_price(),
        added_at: cart_item.added_at,
    }
}
