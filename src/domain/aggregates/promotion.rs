//! Promotion Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::{ensure_money, PromoCode};
use crate::EcommerceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "promotion_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionType { Percentage, FixedAmount }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Promotion {
    pub id: Uuid,
    pub code: String,
    pub promotion_type: PromotionType,
    pub value: Decimal,
    pub min_purchase: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromotionError {
    #[error("promotion code not found")]
    NotFound,
    #[error("promotion is not active")]
    InvalidState,
    #[error("promotion is not valid at this time")]
    Expired,
    #[error("promotion usage limit reached")]
    LimitReached,
    #[error("minimum purchase of {minimum} not met")]
    BelowMinimum { minimum: Decimal },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Discount {
    pub discount_amount: Decimal,
    pub final_total: Decimal,
}

/// Validated admin input for a new promotion.
#[derive(Clone, Debug)]
pub struct PromotionDraft {
    pub code: PromoCode,
    pub promotion_type: PromotionType,
    pub value: Decimal,
    pub min_purchase: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub usage_limit: Option<i32>,
    pub active: bool,
}

impl Promotion {
    pub fn create(draft: PromotionDraft) -> Result<Self, EcommerceError> {
        if draft.value <= Decimal::ZERO { return Err(EcommerceError::validation("value must be positive")); }
        ensure_money(draft.value, "value")?;
        if draft.promotion_type == PromotionType::Percentage && draft.value > Decimal::ONE_HUNDRED {
            return Err(EcommerceError::validation("percentage value must not exceed 100"));
        }
        if let Some(min) = draft.min_purchase { ensure_money(min, "minimum purchase")?; }
        if let Some(max) = draft.max_discount { ensure_money(max, "maximum discount")?; }
        if draft.start_date >= draft.end_date { return Err(EcommerceError::validation("start date must be before end date")); }
        if matches!(draft.usage_limit, Some(limit) if limit <= 0) {
            return Err(EcommerceError::validation("usage limit must be positive"));
        }
        Ok(Self {
            id: Uuid::now_v7(), code: draft.code.into_inner(), promotion_type: draft.promotion_type, value: draft.value,
            min_purchase: draft.min_purchase, max_discount: draft.max_discount, start_date: draft.start_date,
            end_date: draft.end_date, usage_limit: draft.usage_limit, usage_count: 0, active: draft.active,
            created_at: Utc::now(),
        })
    }

    /// Checks eligibility and prices the discount. Does not consume a usage.
    pub fn evaluate(&self, subtotal: Decimal, now: DateTime<Utc>) -> Result<Discount, PromotionError> {
        if !self.active { return Err(PromotionError::InvalidState); }
        if now < self.start_date || now > self.end_date { return Err(PromotionError::Expired); }
        if let Some(limit) = self.usage_limit {
            if self.usage_count >= limit { return Err(PromotionError::LimitReached); }
        }
        if let Some(minimum) = self.min_purchase {
            if subtotal < minimum { return Err(PromotionError::BelowMinimum { minimum }); }
        }
        let discount_amount = self.discount_for(subtotal);
        Ok(Discount { discount_amount, final_total: subtotal - discount_amount })
    }

    /// Never more than `subtotal` nor than `max_discount`.
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        let raw = match self.promotion_type {
            PromotionType::Percentage => {
                let pct = subtotal * self.value / Decimal::ONE_HUNDRED;
                match self.max_discount { Some(max) => pct.min(max), None => pct }
            }
            PromotionType::FixedAmount => self.value,
        };
        raw.min(subtotal).max(Decimal::ZERO)
    }
}
