//! Snap-style hosted checkout: `POST {base}/transactions` with HTTP basic auth on the server key.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{CustomerDetails, GatewayError, PaymentGateway, Session, SessionRequest};
use crate::config::PaymentConfig;

const MAX_ITEM_NAME: usize = 50;

pub struct SnapGateway {
    client: reqwest::Client,
    base_url: String,
    server_key: String,
}

#[derive(Debug, Serialize)]
struct SnapRequest<'a> {
    transaction_details: TransactionDetails<'a>,
    item_details: Vec<ItemDetails<'a>>,
    customer_details: &'a CustomerDetails,
}

#[derive(Debug, Serialize)]
struct TransactionDetails<'a> {
    order_id: &'a str,
    gross_amount: i64,
}

#[derive(Debug, Serialize)]
struct ItemDetails<'a> {
    id: &'a str,
    price: i64,
    quantity: i32,
    name: String,
}

impl SnapGateway {
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            server_key: config.server_key.clone(),
        }
    }
}

/// The processor only accepts whole currency units.
fn whole_units(amount: Decimal) -> Result<i64, GatewayError> {
    if !amount.fract().is_zero() { return Err(GatewayError::InvalidAmount(amount)); }
    amount.to_i64().ok_or(GatewayError::InvalidAmount(amount))
}

fn build_body(request: &SessionRequest) -> Result<SnapRequest<'_>, GatewayError> {
    let item_details = request.items.iter()
        .map(|item| Ok(ItemDetails {
            id: &item.id,
            price: whole_units(item.price)?,
            quantity: item.quantity,
            name: item.name.chars().take(MAX_ITEM_NAME).collect(),
        }))
        .collect::<Result<Vec<_>, GatewayError>>()?;
    Ok(SnapRequest {
        transaction_details: TransactionDetails { order_id: &request.order_number, gross_amount: whole_units(request.gross_amount)? },
        item_details,
        customer_details: &request.customer,
    })
}

#[async_trait]
impl PaymentGateway for SnapGateway {
    async fn create_session(&self, request: SessionRequest) -> Result<Session, GatewayError> {
        let body = build_body(&request)?;
        let response = self.client
            .post(format!("{}/transactions", self.base_url))
            .basic_auth(&self.server_key, Some(""))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected { status: status.as_u16(), body });
        }
        Ok(response.json::<Session>().await?)
    }
}
