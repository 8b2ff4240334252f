//! Order Aggregate

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::payment::{Payment, TransactionStatus};
use crate::domain::events::{DomainEvent, OrderEvent, ProductEvent};
use crate::domain::value_objects::ensure_money;
use crate::EcommerceError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub shipping_address: String,
    pub tracking_number: Option<String>,
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
    #[sqlx(skip)]
    pub payments: Vec<Payment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

/// Price is copied from the buyer's cart at placement and never follows later product changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub price: Decimal,
    pub quantity: i32,
    pub size: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
}

/// One requested line at checkout.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: u32,
    pub price: Decimal,
    pub size: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus { #[default] Pending, Confirmed, Processing, Shipped, Delivered, Cancelled }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus { #[default] Pending, Paid, Failed, Cancelled }

/// `ORD-<unix millis>-<4 random digits>`. Uniqueness is left to the database constraint.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("ORD-{}-{:04}", now.timestamp_millis(), suffix)
}

impl Order {
    pub fn place(
        order_number: String,
        user_id: Uuid,
        lines: Vec<OrderLine>,
        shipping_cost: Decimal,
        shipping_address: &str,
    ) -> Result<Self, EcommerceError> {
        if lines.is_empty() { return Err(EcommerceError::validation("order must contain at least one item")); }
        ensure_money(shipping_cost, "shipping cost")?;
        let shipping_address = shipping_address.trim();
        if shipping_address.is_empty() { return Err(EcommerceError::validation("shipping address is required")); }

        let id = Uuid::now_v7();
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity == 0 { return Err(EcommerceError::validation("quantity must be at least 1")); }
            ensure_money(line.price, "price")?;
            let quantity = i32::try_from(line.quantity).map_err(|_| EcommerceError::validation("quantity too large"))?;
            let size = line.size.map(|s| s.trim().to_uppercase()).filter(|s| !s.is_empty());
            items.push(OrderItem { id: Uuid::now_v7(), order_id: id, product_id: line.product_id, price: line.price, quantity, size });
        }

        let subtotal: Decimal = items.iter().map(OrderItem::line_total).sum();
        let total = subtotal + shipping_cost;
        let now = Utc::now();
        let mut order = Self {
            id, order_number, user_id, status: OrderStatus::Pending, payment_status: PaymentStatus::Pending,
            subtotal, shipping_cost, total, shipping_address: shipping_address.to_string(), tracking_number: None,
            items, payments: vec![], created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed {
            order_id: id, order_number: order.order_number.clone(), user_id, total,
        }));
        Ok(order)
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool { self.user_id == user_id }

    pub fn contains_product(&self, product_id: Uuid) -> bool {
        self.items.iter().any(|i| i.product_id == product_id)
    }

    /// Records the stock decrements that were committed together with the order.
    pub fn record_stock_decrements(&mut self) {
        let events: Vec<_> = self.items.iter()
            .map(|i| DomainEvent::Product(ProductEvent::StockDecremented { product_id: i.product_id, quantity: i.quantity.unsigned_abs() }))
            .collect();
        self.events.extend(events);
    }

    /// Moves the order according to a processor notification. Returns the new order status, if any.
    pub fn apply_transaction(&mut self, outcome: TransactionStatus, transaction_id: &str) -> Option<OrderStatus> {
        let (payment_status, status) = outcome.outcome();
        self.payment_status = payment_status;
        if let Some(status) = status { self.status = status; }
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::PaymentReconciled {
            order_id: self.id, transaction_id: transaction_id.to_string(),
            payment_status: self.payment_status, status: self.status,
        }));
        status
    }

    /// Admin edit. An empty tracking number clears it. Cancelling does not restore stock.
    pub fn update_by_admin(&mut self, status: Option<OrderStatus>, payment_status: Option<PaymentStatus>, tracking_number: Option<String>) {
        if let Some(status) = status { self.status = status; }
        if let Some(payment_status) = payment_status { self.payment_status = payment_status; }
        if let Some(tracking) = tracking_number {
            let tracking = tracking.trim().to_string();
            self.tracking_number = (!tracking.is_empty()).then_some(tracking);
        }
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged {
            order_id: self.id, status: self.status, payment_status: self.payment_status,
            tracking_number: self.tracking_number.clone(),
        }));
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: i64, quantity: u32) -> OrderLine {
        OrderLine { product_id: Uuid::now_v7(), quantity, price: Decimal::from(price), size: None }
    }

    #[test]
    fn test_order_totals() {
        let order = Order::place("ORD-1".into(), Uuid::now_v7(), vec![line(100000, 2)], Decimal::from(15000), "Jl. Merdeka 1").unwrap();
        assert_eq!(order.subtotal, Decimal::from(200000));
        assert_eq!(order.total, Decimal::from(215000));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_subtotal_sums_every_line() {
        let order = Order::place("ORD-2".into(), Uuid::now_v7(), vec![line(2500, 3), line(1000, 1), line(0, 4)], Decimal::ZERO, "addr").unwrap();
        assert_eq!(order.subtotal, Decimal::from(8500));
        assert_eq!(order.total, order.subtotal + order.shipping_cost);
    }

    #[test]
    fn test_empty_order_rejected() {
        let result = Order::place("ORD-3".into(), Uuid::now_v7(), vec![], Decimal::ZERO, "addr");
        assert!(matches!(result, Err(EcommerceError::Validation(_))));
    }

    #[test]
    fn test_zero_quantity_and_blank_address_rejected() {
        assert!(Order::place("ORD-4".into(), Uuid::now_v7(), vec![line(10, 0)], Decimal::ZERO, "addr").is_err());
        assert!(Order::place("ORD-5".into(), Uuid::now_v7(), vec![line(10, 1)], Decimal::ZERO, "  ").is_err());
        assert!(Order::place("ORD-6".into(), Uuid::now_v7(), vec![line(10, 1)], Decimal::from(-1), "addr").is_err());
    }

    #[test]
    fn test_settlement_confirms_order() {
        let mut order = Order::place("ORD-7".into(), Uuid::now_v7(), vec![line(10, 1)], Decimal::ZERO, "addr").unwrap();
        order.take_events();
        order.apply_transaction(TransactionStatus::Settlement, "trx-1");
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.take_events().len(), 1);
    }

    #[test]
    fn test_pending_notification_keeps_order_status() {
        let mut order = Order::place("ORD-8".into(), Uuid::now_v7(), vec![line(10, 1)], Decimal::ZERO, "addr").unwrap();
        order.update_by_admin(Some(OrderStatus::Processing), None, None);
        order.apply_transaction(TransactionStatus::Failure, "trx-2");
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert_eq!(order.status, OrderStatus::Processing);
    }

    #[test]
    fn test_admin_update_clears_tracking() {
        let mut order = Order::place("ORD-9".into(), Uuid::now_v7(), vec![line(10, 1)], Decimal::ZERO, "addr").unwrap();
        order.update_by_admin(Some(OrderStatus::Shipped), None, Some("JNE123".into()));
        assert_eq!(order.tracking_number.as_deref(), Some("JNE123"));
        order.update_by_admin(None, None, Some(" ".into()));
        assert_eq!(order.tracking_number, None);
        assert_eq!(order.status, OrderStatus::Shipped);
    }

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number(Utc::now());
        let parts: Vec<_> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[2].len(), 4);
    }
}
