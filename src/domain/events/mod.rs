//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{OrderStatus, PaymentStatus};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", content = "payload", rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
}

impl DomainEvent {
    /// Subject suffix used when the event is published.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Product(ProductEvent::StockDecremented { .. }) => "product.stock_decremented",
            Self::Order(OrderEvent::Placed { .. }) => "order.placed",
            Self::Order(OrderEvent::PaymentReconciled { .. }) => "order.payment_reconciled",
            Self::Order(OrderEvent::StatusChanged { .. }) => "order.status_changed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProductEvent {
    StockDecremented { product_id: Uuid, quantity: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, order_number: String, user_id: Uuid, total: Decimal },
    PaymentReconciled { order_id: Uuid, transaction_id: String, payment_status: PaymentStatus, status: OrderStatus },
    StatusChanged { order_id: Uuid, status: OrderStatus, payment_status: PaymentStatus, tracking_number: Option<String> },
}
