use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::extract::{CurrentUser, ValidatedJson};
use super::AppState;
use crate::Result;

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ToggleRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub product_id: Uuid,
    pub wishlisted: bool,
}

pub async fn list_wishlist(State(s): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<Vec<Uuid>>> {
    Ok(Json(s.services.wishlist.product_ids(user.sub).await?))
}

pub async fn toggle_wishlist(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(r): ValidatedJson<ToggleRequest>,
) -> Result<Json<ToggleResponse>> {
    let wishlisted = s.services.wishlist.toggle(user.sub, r.product_id).await?;
    Ok(Json(ToggleResponse { product_id: r.product_id, wishlisted }))
}
