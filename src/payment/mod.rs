//! Hosted-checkout payment processor adapter.

pub mod signature;
pub mod snap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use signature::{notification_signature, verify_notification};
pub use snap::SnapGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to payment processor failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("payment processor rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("amount {0} cannot be sent to the payment processor")]
    InvalidAmount(Decimal),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionLineItem {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionRequest {
    /// Sent as the processor's order id and echoed back in notifications.
    pub order_number: String,
    pub gross_amount: Decimal,
    pub items: Vec<SessionLineItem>,
    pub customer: CustomerDetails,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub redirect_url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(&self, request: SessionRequest) -> Result<Session, GatewayError>;
}
