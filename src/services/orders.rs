//! Checkout and order administration.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::aggregates::{generate_order_number, Order, OrderLine, OrderStatus, PaymentStatus};
use crate::events::EventPublisher;
use crate::services::auth::Claims;
use crate::storage::{CartStore, CatalogStore, OrderFilter, OrderStore};
use crate::{EcommerceError, Result};

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub lines: Vec<OrderLine>,
    pub shipping_cost: Decimal,
    pub shipping_address: String,
}

#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub tracking_number: Option<String>,
}

pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogStore>,
    carts: Arc<dyn CartStore>,
    events: EventPublisher,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogStore>,
        carts: Arc<dyn CartStore>,
        events: EventPublisher,
    ) -> Self {
        Self { orders, catalog, carts, events }
    }

    /// Creates the order and decrements stock in one write, then empties the buyer's cart.
    #[tracing::instrument(skip(self, request), fields(lines = request.lines.len()))]
    pub async fn place(&self, user_id: Uuid, request: PlaceOrder) -> Result<Order> {
        if request.lines.is_empty() {
            return Err(EcommerceError::validation("order must contain at least one item"));
        }
        for line in &request.lines {
            let product = self.catalog.find_product(line.product_id).await?.ok_or(EcommerceError::NotFound("product"))?;
            product.can_supply(line.quantity, line.size.as_deref())?;
        }

        let mut order = Order::place(
            generate_order_number(Utc::now()),
            user_id,
            request.lines,
            request.shipping_cost,
            &request.shipping_address,
        )?;
        self.orders.create_order(&order).await?;
        order.record_stock_decrements();
        tracing::info!(order_number = %order.order_number, total = %order.total, "order placed");
        self.events.publish(order.take_events()).await;

        if let Err(e) = self.carts.clear_cart(user_id).await {
            tracing::warn!(order_number = %order.order_number, "failed to clear cart after checkout: {e}");
        }
        Ok(order)
    }

    /// Admins see every order and may filter by status; everyone else sees their own.
    pub async fn list(&self, caller: &Claims, status: Option<OrderStatus>) -> Result<Vec<Order>> {
        let filter = if caller.is_admin() {
            OrderFilter { user_id: None, status }
        } else {
            OrderFilter { user_id: Some(caller.sub), status }
        };
        self.orders.list_orders(&filter).await
    }

    pub async fn get(&self, caller: &Claims, id: Uuid) -> Result<Order> {
        let order = self.orders.find_order(id).await?.ok_or(EcommerceError::NotFound("order"))?;
        // Someone else's order is reported as missing.
        if !caller.can_access(order.user_id) {
            return Err(EcommerceError::NotFound("order"));
        }
        Ok(order)
    }

    /// Admin status edit. Cancelling does not put stock back.
    pub async fn update(&self, id: Uuid, update: OrderUpdate) -> Result<Order> {
        let mut order = self.orders.find_order(id).await?.ok_or(EcommerceError::NotFound("order"))?;
        order.update_by_admin(update.status, update.payment_status, update.tracking_number);
        self.orders.update_order(&order).await?;
        tracing::info!(order_number = %order.order_number, status = ?order.status, payment_status = ?order.payment_status, "order updated");
        self.events.publish(order.take_events()).await;
        Ok(order)
    }
}
