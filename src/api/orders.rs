use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::extract::{AdminUser, CurrentUser, QueryParams, ValidatedJson};
use super::AppState;
use crate::domain::aggregates::{Order, OrderLine, OrderStatus, PaymentStatus};
use crate::services::{OrderUpdate, PlaceOrder};
use crate::Result;

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 100))]
    pub items: Vec<OrderItemRequest>,
    pub shipping_cost: Decimal,
    #[validate(length(min = 1, max = 1000))]
    pub shipping_address: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
    pub price: Decimal,
    pub size: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    #[validate(length(max = 100))]
    pub tracking_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub status: Option<OrderStatus>,
}

pub async fn create_order(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(r): ValidatedJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let lines = r.items.into_iter()
        .map(|i| OrderLine { product_id: i.product_id, quantity: i.quantity, price: i.price, size: i.size })
        .collect();
    let request = PlaceOrder { lines, shipping_cost: r.shipping_cost, shipping_address: r.shipping_address };
    Ok((StatusCode::CREATED, Json(s.services.orders.place(user.sub, request).await?)))
}

pub async fn list_orders(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    QueryParams(p): QueryParams<OrderListParams>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(s.services.orders.list(&user, p.status).await?))
}

pub async fn get_order(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>> {
    Ok(Json(s.services.orders.get(&user, id).await?))
}

pub async fn update_order(
    State(s): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    ValidatedJson(r): ValidatedJson<UpdateOrderRequest>,
) -> Result<Json<Order>> {
    let update = OrderUpdate { status: r.status, payment_status: r.payment_status, tracking_number: r.tracking_number };
    Ok(Json(s.services.orders.update(id, update).await?))
}
