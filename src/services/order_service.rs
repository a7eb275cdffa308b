use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    Order, OrderItem, OrderListResponse, OrderResponse, ServiceError, ServiceResult,
};
use crate::repositories::{CartRepository, OrderRepository, ProductRepository};

/// Turns carts into orders and tracks them afterwards
pub struct OrderService {
    order_repository: Arc<dyn OrderRepository>,
    cart_repository: Arc<dyn CartRepository>,
    product_repository: Arc<dyn ProductRepository>,
}

impl OrderService {
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        cart_repository: Arc<dyn CartRepository>,
        product_repository: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            order_repository,
            cart_repository,
            product_repository,
        }
    }

    /// Place an order for everything in the cart, then empty the cart
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn checkout(&self, user_id: &str) -> ServiceResult<OrderResponse> {
        let cart = match self.cart_repository.find_cart(user_id).await? {
            Some(cart) if !cart.is_empty() => cart,
            _ => {
                return Err(ServiceError::EmptyCart {
                    user_id: user_id.to_string(),
                })
            }
        };

        let mut items = Vec::with_capacity(cart.items.len());
        for cart_item in &cart.items {
            let product = self
                .product_repository
                .find_by_id(cart_item.product_id)
                .await?
                .ok_or(ServiceError::InvalidProduct {
                    product_id: cart_item.product_id,
                })?;
            items.push(OrderItem::new(
                product.id,
                product.name,
                cart_item.quantity,
                cart_item.unit_price,
            ));
        }

        let order = self
            .order_repository
            .save(Order::new(user_id.to_string(), items))
            .await?;
        self.cart_repository.delete_cart(user_id).await?;

        crate::info_with_trace!(order_id = %order.id, order_number = %order.order_number, "Order placed");
        Ok(order.into_response())
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_orders(&self, user_id: &str) -> ServiceResult<OrderListResponse> {
        let orders: Vec<OrderResponse> = self
            .order_repository
            .find_by_user(user_id)
            .await?
            .into_iter()
            .map(Order::into_response)
            .collect();

        info!("Found {} orders", orders.len());

        Ok(OrderListResponse {
            total_count: orders.len(),
            orders,
        })
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_order(&self, user_id: &str, order_id: &str) -> ServiceResult<OrderResponse> {
        Ok(self.find_owned(user_id, order_id).await?.into_response())
    }

    /// Cancel an order that has not shipped yet
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn cancel_order(&self, user_id: &str, order_id: &str) -> ServiceResult<OrderResponse> {
        let mut order = self.find_owned(user_id, order_id).await?;

        if !order.cancel() {
            crate::warn_with_trace!(order_id = %order_id, status = %order.status, "Order can no longer be cancelled");
            return Err(ServiceError::InvalidOrderState {
                order_id: order_id.to_string(),
                status: order.status.to_string(),
            });
        }

        let order = self.order_repository.save(order).await?;

        crate::info_with_trace!(order_id = %order_id, "Order cancelled");
        Ok(order.into_response())
    }

    async fn find_owned(&self, user_id: &str, order_id: &str) -> ServiceResult<Order> {
        self.order_repository
            .find_by_id(order_id)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or_else(|| ServiceError::OrderNotFound {
                order_id: order_id.to_string(),
            })
    }
}
