use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::extract::{CurrentUser, ValidatedJson};
use super::AppState;
use crate::domain::aggregates::{OrderStatus, PaymentStatus};
use crate::payment::{CustomerDetails, Session};
use crate::services::Notification;
use crate::{EcommerceError, Result};

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SessionRequestBody {
    pub order_id: Uuid,
    #[validate]
    pub customer: CustomerRequest,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CustomerRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
}

pub async fn create_session(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(r): ValidatedJson<SessionRequestBody>,
) -> Result<Json<Session>> {
    let c = r.customer;
    let customer = CustomerDetails { first_name: c.first_name, last_name: c.last_name, email: c.email, phone: c.phone };
    Ok(Json(s.services.payment.create_session(&user, r.order_id, customer).await?))
}

/// Called by the payment processor. Unknown fields are expected and ignored.
pub async fn webhook(
    State(s): State<AppState>,
    body: std::result::Result<Json<Notification>, JsonRejection>,
) -> Result<Json<WebhookResponse>> {
    let Json(notification) = body.map_err(|e| EcommerceError::validation(format!("malformed notification: {}", e.body_text())))?;
    let order = s.services.payment.handle_notification(notification).await?;
    Ok(Json(WebhookResponse { order_number: order.order_number, status: order.status, payment_status: order.payment_status }))
}
