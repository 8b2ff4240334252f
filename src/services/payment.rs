//! Hosted-checkout sessions and processor notifications.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::aggregates::{Order, Payment, TransactionStatus};
use crate::domain::value_objects::parse_amount;
use crate::events::EventPublisher;
use crate::payment::{verify_notification, CustomerDetails, PaymentGateway, Session, SessionLineItem, SessionRequest};
use crate::services::auth::Claims;
use crate::storage::{CatalogStore, OrderStore};
use crate::{EcommerceError, Result};

pub const SHIPPING_ITEM_ID: &str = "SHIPPING";

/// Body of a processor notification. Fields we do not use are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    /// Our order number.
    pub order_id: String,
    pub status_code: String,
    pub gross_amount: String,
    pub signature_key: String,
    pub transaction_status: String,
    pub transaction_id: String,
    #[serde(default)]
    pub payment_type: Option<String>,
}

pub struct PaymentService {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogStore>,
    gateway: Arc<dyn PaymentGateway>,
    server_key: String,
    events: EventPublisher,
}

impl PaymentService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogStore>,
        gateway: Arc<dyn PaymentGateway>,
        server_key: String,
        events: EventPublisher,
    ) -> Self {
        Self { orders, catalog, gateway, server_key, events }
    }

    pub async fn create_session(&self, caller: &Claims, order_id: Uuid, customer: CustomerDetails) -> Result<Session> {
        let order = self.orders.find_order(order_id).await?
            .filter(|o| caller.can_access(o.user_id))
            .ok_or(EcommerceError::NotFound("order"))?;
        let request = self.session_request(&order, customer).await?;
        let session = self.gateway.create_session(request).await.map_err(|e| {
            tracing::error!(order_number = %order.order_number, "payment session failed: {e}");
            EcommerceError::PaymentSession(e)
        })?;
        tracing::info!(order_number = %order.order_number, "payment session created");
        Ok(session)
    }

    async fn session_request(&self, order: &Order, customer: CustomerDetails) -> Result<SessionRequest> {
        let mut items = Vec::with_capacity(order.items.len() + 1);
        for item in &order.items {
            let name = match self.catalog.find_product(item.product_id).await? {
                Some(product) => product.name,
                None => item.product_id.to_string(),
            };
            let name = match &item.size { Some(size) => format!("{name} ({size})"), None => name };
            items.push(SessionLineItem { id: item.product_id.to_string(), name, price: item.price, quantity: item.quantity });
        }
        items.push(SessionLineItem {
            id: SHIPPING_ITEM_ID.to_string(),
            name: "Shipping".to_string(),
            price: order.shipping_cost,
            quantity: 1,
        });
        Ok(SessionRequest { order_number: order.order_number.clone(), gross_amount: order.total, items, customer })
    }

    /// Verifies and applies a notification. Redelivery of the same transaction updates one payment row.
    #[tracing::instrument(skip(self, notification), fields(order_number = %notification.order_id, status = %notification.transaction_status))]
    pub async fn handle_notification(&self, notification: Notification) -> Result<Order> {
        if !verify_notification(
            &notification.order_id,
            &notification.status_code,
            &notification.gross_amount,
            &self.server_key,
            &notification.signature_key,
        ) {
            tracing::warn!("rejected notification with invalid signature");
            return Err(EcommerceError::InvalidSignature);
        }

        let mut order = self.orders.find_order_by_number(&notification.order_id).await?
            .ok_or(EcommerceError::NotFound("order"))?;
        let outcome: TransactionStatus = notification.transaction_status.parse()?;
        let amount = parse_amount(&notification.gross_amount)?;

        let status_change = order.apply_transaction(outcome, &notification.transaction_id);
        let payment = Payment::record(
            order.id,
            &notification.transaction_id,
            amount,
            notification.payment_type.as_deref().unwrap_or("unknown"),
            order.payment_status,
        );
        order.status = self.orders.reconcile_payment(&order, status_change, &payment).await.map_err(|e| {
            tracing::error!("webhook processing failed: {e}");
            EcommerceError::Internal("webhook processing failed")
        })?;
        tracing::info!(payment_status = ?order.payment_status, order_status = ?order.status, "payment reconciled");
        self.events.publish(order.take_events()).await;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Category, OrderLine, OrderStatus, PaymentStatus, Product, ProductDraft};
    use crate::domain::value_objects::Sku;
    use crate::payment::{notification_signature, GatewayError};
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use mockall::mock;
    use rust_decimal::Decimal;

    mock! {
        Gateway {}

        #[async_trait]
        impl PaymentGateway for Gateway {
            async fn create_session(&self, request: SessionRequest) -> std::result::Result<Session, GatewayError>;
        }
    }

    const KEY: &str = "server-key";

    async fn fixture(gateway: MockGateway) -> (PaymentService, Arc<MemoryStore>, Order) {
        let store = Arc::new(MemoryStore::new());
        let category = Category::create("Kemeja").unwrap();
        store.insert_category(&category).await.unwrap();
        let product = Product::create(ProductDraft {
            category_id: category.id, name: "Kemeja Batik".into(), sku: Sku::new("KB-1").unwrap(), description: None,
            price: Decimal::from(100000), sale_price: None, stock: 10, active: true, images: vec![], sizes: vec![],
        }).unwrap();
        store.insert_product(&product).await.unwrap();
        let line = OrderLine { product_id: product.id, quantity: 2, price: product.price, size: None };
        let order = Order::place("ORD-1700000000000-0042".into(), Uuid::now_v7(), vec![line], Decimal::from(15000), "Jl. Sudirman").unwrap();
        store.create_order(&order).await.unwrap();
        let service = PaymentService::new(store.clone(), store.clone(), Arc::new(gateway), KEY.into(), EventPublisher::log_only());
        (service, store, order)
    }

    fn notification(order: &Order, status: &str, signature: Option<String>) -> Notification {
        let gross = "215000.00".to_string();
        Notification {
            signature_key: signature.unwrap_or_else(|| notification_signature(&order.order_number, "200", &gross, KEY)),
            order_id: order.order_number.clone(), status_code: "200".into(), gross_amount: gross,
            transaction_status: status.into(), transaction_id: "trx-9".into(), payment_type: Some("bank_transfer".into()),
        }
    }

    fn customer() -> CustomerDetails {
        CustomerDetails { first_name: "Budi".into(), last_name: None, email: "budi@example.com".into(), phone: None }
    }

    #[tokio::test]
    async fn test_session_includes_shipping_line() {
        let mut gateway = MockGateway::new();
        gateway.expect_create_session()
            .withf(|r| r.gross_amount == Decimal::from(215000)
                && r.items.len() == 2
                && r.items[1].id == SHIPPING_ITEM_ID
                && r.items[1].price == Decimal::from(15000))
            .times(1)
            .returning(|_| Ok(Session { token: "tok".into(), redirect_url: "https://pay/tok".into() }));
        let (service, _, order) = fixture(gateway).await;
        let owner = Claims { sub: order.user_id, role: Default::default(), exp: i64::MAX };
        let session = service.create_session(&owner, order.id, customer()).await.unwrap();
        assert_eq!(session.token, "tok");
    }

    #[tokio::test]
    async fn test_session_hidden_from_other_customers() {
        let (service, _, order) = fixture(MockGateway::new()).await;
        let stranger = Claims { sub: Uuid::now_v7(), role: Default::default(), exp: i64::MAX };
        assert!(matches!(service.create_session(&stranger, order.id, customer()).await, Err(EcommerceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_gateway_failure_is_generic() {
        let mut gateway = MockGateway::new();
        gateway.expect_create_session()
            .returning(|_| Err(GatewayError::Rejected { status: 401, body: "unauthorized".into() }));
        let (service, _, order) = fixture(gateway).await;
        let owner = Claims { sub: order.user_id, role: Default::default(), exp: i64::MAX };
        let err = service.create_session(&owner, order.id, customer()).await.unwrap_err();
        assert_eq!(err.to_string(), "payment session failed");
    }

    #[tokio::test]
    async fn test_bad_signature_changes_nothing() {
        let (service, store, order) = fixture(MockGateway::new()).await;
        let result = service.handle_notification(notification(&order, "settlement", Some("00".into()))).await;
        assert!(matches!(result, Err(EcommerceError::InvalidSignature)));
        let saved = store.find_order(order.id).await.unwrap().unwrap();
        assert_eq!(saved.payment_status, PaymentStatus::Pending);
        assert!(saved.payments.is_empty());
    }

    #[tokio::test]
    async fn test_settlement_is_idempotent() {
        let (service, store, order) = fixture(MockGateway::new()).await;
        service.handle_notification(notification(&order, "settlement", None)).await.unwrap();
        service.handle_notification(notification(&order, "settlement", None)).await.unwrap();
        let saved = store.find_order(order.id).await.unwrap().unwrap();
        assert_eq!(saved.status, OrderStatus::Confirmed);
        assert_eq!(saved.payment_status, PaymentStatus::Paid);
        assert_eq!(saved.payments.len(), 1);
        assert_eq!(saved.payments[0].amount, Decimal::new(21500000, 2));
    }

    #[tokio::test]
    async fn test_unknown_status_rejected() {
        let (service, _, order) = fixture(MockGateway::new()).await;
        let result = service.handle_notification(notification(&order, "refund", None)).await;
        assert!(matches!(result, Err(EcommerceError::Validation(_))));
    }
}
