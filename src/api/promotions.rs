use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use super::extract::{AdminUser, CurrentUser, ValidatedJson};
use super::AppState;
use crate::domain::aggregates::{Discount, Promotion, PromotionDraft, PromotionType};
use crate::domain::value_objects::PromoCode;
use crate::Result;

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreatePromotionRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[serde(rename = "type")]
    pub promotion_type: PromotionType,
    pub value: Decimal,
    pub min_purchase: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[validate(range(min = 1))]
    pub usage_limit: Option<i32>,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool { true }

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ApplyPromotionRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    pub subtotal: Decimal,
}

pub async fn list_promotions(State(s): State<AppState>, _admin: AdminUser) -> Result<Json<Vec<Promotion>>> {
    Ok(Json(s.services.promotions.list().await?))
}

pub async fn create_promotion(
    State(s): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(r): ValidatedJson<CreatePromotionRequest>,
) -> Result<(StatusCode, Json<Promotion>)> {
    let draft = PromotionDraft {
        code: PromoCode::new(&r.code)?,
        promotion_type: r.promotion_type,
        value: r.value,
        min_purchase: r.min_purchase,
        max_discount: r.max_discount,
        start_date: r.start_date,
        end_date: r.end_date,
        usage_limit: r.usage_limit,
        active: r.active,
    };
    Ok((StatusCode::CREATED, Json(s.services.promotions.create(draft).await?)))
}

pub async fn apply_promotion(
    State(s): State<AppState>,
    _user: CurrentUser,
    ValidatedJson(r): ValidatedJson<ApplyPromotionRequest>,
) -> Result<Json<Discount>> {
    Ok(Json(s.services.promotions.apply(&r.code, r.subtotal, Utc::now()).await?))
}
