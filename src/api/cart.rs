use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::extract::{CurrentUser, QueryParams, ValidatedJson};
use super::AppState;
use crate::domain::aggregates::CartLine;
use crate::services::CartView;
use crate::Result;

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CartLineRequest {
    pub product_id: Uuid,
    pub size: Option<String>,
    #[validate(range(max = 999))]
    pub quantity: u32,
}

impl From<CartLineRequest> for CartLine {
    fn from(r: CartLineRequest) -> Self { CartLine::new(r.product_id, r.size, r.quantity) }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct MergeRequest {
    #[validate]
    pub items: Vec<CartLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveParams {
    pub product_id: Option<Uuid>,
    pub size: Option<String>,
}

pub async fn get_cart(State(s): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<CartView>> {
    Ok(Json(s.services.cart.view(user.sub).await?))
}

pub async fn add_to_cart(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(r): ValidatedJson<CartLineRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    Ok((StatusCode::CREATED, Json(s.services.cart.add(user.sub, r.into()).await?)))
}

pub async fn update_cart(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(r): ValidatedJson<CartLineRequest>,
) -> Result<Json<CartView>> {
    Ok(Json(s.services.cart.set_quantity(user.sub, r.into()).await?))
}

/// `?product_id=..[&size=..]` removes one line; no product clears the cart.
pub async fn remove_from_cart(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    QueryParams(p): QueryParams<RemoveParams>,
) -> Result<Response> {
    match p.product_id {
        Some(product_id) => Ok(Json(s.services.cart.remove(user.sub, product_id, p.size).await?).into_response()),
        None => {
            s.services.cart.clear(user.sub).await?;
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

pub async fn merge_cart(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(r): ValidatedJson<MergeRequest>,
) -> Result<Json<CartView>> {
    let local = r.items.into_iter().map(CartLine::from).collect();
    Ok(Json(s.services.cart.merge(user.sub, local).await?))
}
