use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::extract::{CurrentUser, QueryParams, ValidatedJson};
use super::AppState;
use crate::domain::aggregates::{Review, ReviewError};
use crate::Result;

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ReviewRequest {
    pub product_id: Uuid,
    /// Kept as a raw number so fractional or out-of-range ratings map to the rating error.
    pub rating: serde_json::Number,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewListParams {
    pub product_id: Uuid,
}

pub async fn list_reviews(
    State(s): State<AppState>,
    QueryParams(p): QueryParams<ReviewListParams>,
) -> Result<Json<Vec<Review>>> {
    Ok(Json(s.services.reviews.list(p.product_id).await?))
}

pub async fn create_review(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(r): ValidatedJson<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    let rating = r.rating.as_i64().ok_or(ReviewError::InvalidRating)?;
    let review = s.services.reviews.submit(user.sub, r.product_id, rating, r.comment).await?;
    Ok((StatusCode::CREATED, Json(review)))
}
