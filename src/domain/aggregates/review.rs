//! Review Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::order::{Order, OrderStatus, PaymentStatus};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("product already reviewed")]
    AlreadyReviewed,
    #[error("only buyers with a delivered and paid order can review this product")]
    NotEligible,
    #[error("rating must be between 1 and 5")]
    InvalidRating,
}

/// What the store knows about a (user, product) pair at submission time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReviewContext {
    pub already_reviewed: bool,
    pub has_qualifying_purchase: bool,
}

impl Review {
    pub fn submit(user_id: Uuid, product_id: Uuid, rating: i64, comment: Option<String>, ctx: ReviewContext) -> Result<Self, ReviewError> {
        let rating = i16::try_from(rating).ok().filter(|r| (1..=5).contains(r)).ok_or(ReviewError::InvalidRating)?;
        if ctx.already_reviewed { return Err(ReviewError::AlreadyReviewed); }
        if !ctx.has_qualifying_purchase { return Err(ReviewError::NotEligible); }
        let comment = comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        Ok(Self { id: Uuid::now_v7(), user_id, product_id, rating, comment, created_at: Utc::now() })
    }
}

/// A delivered and paid order of `user_id` containing `product_id`.
pub fn qualifies_for_review(order: &Order, user_id: Uuid, product_id: Uuid) -> bool {
    order.is_owned_by(user_id)
        && order.status == OrderStatus::Delivered
        && order.payment_status == PaymentStatus::Paid
        && order.contains_product(product_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::OrderLine;
    use rust_decimal::Decimal;

    const ELIGIBLE: ReviewContext = ReviewContext { already_reviewed: false, has_qualifying_purchase: true };

    #[test]
    fn test_rating_bounds() {
        let (u, p) = (Uuid::now_v7(), Uuid::now_v7());
        assert_eq!(Review::submit(u, p, 0, None, ELIGIBLE), Err(ReviewError::InvalidRating));
        assert_eq!(Review::submit(u, p, 6, None, ELIGIBLE), Err(ReviewError::InvalidRating));
        assert_eq!(Review::submit(u, p, 5, Some("  ".into()), ELIGIBLE).unwrap().comment, None);
    }

    #[test]
    fn test_eligibility_gates() {
        let (u, p) = (Uuid::now_v7(), Uuid::now_v7());
        let reviewed = ReviewContext { already_reviewed: true, has_qualifying_purchase: true };
        assert_eq!(Review::submit(u, p, 4, None, reviewed), Err(ReviewError::AlreadyReviewed));
        let not_bought = ReviewContext { already_reviewed: false, has_qualifying_purchase: false };
        assert_eq!(Review::submit(u, p, 4, None, not_bought), Err(ReviewError::NotEligible));
    }

    #[test]
    fn test_shipped_order_does_not_qualify() {
        let (u, p) = (Uuid::now_v7(), Uuid::now_v7());
        let line = OrderLine { product_id: p, quantity: 1, price: Decimal::from(10), size: None };
        let mut order = Order::place("ORD-1".into(), u, vec![line], Decimal::ZERO, "addr").unwrap();
        order.update_by_admin(Some(OrderStatus::Shipped), Some(PaymentStatus::Paid), None);
        assert!(!qualifies_for_review(&order, u, p));
        order.update_by_admin(Some(OrderStatus::Delivered), None, None);
        assert!(qualifies_for_review(&order, u, p));
        assert!(!qualifies_for_review(&order, Uuid::now_v7(), p));
        assert!(!qualifies_for_review(&order, u, Uuid::now_v7()));

        for unpaid in [PaymentStatus::Pending, PaymentStatus::Failed] {
            order.update_by_admin(None, Some(unpaid), None);
            assert_eq!(order.status, OrderStatus::Delivered);
            assert!(!qualifies_for_review(&order, u, p));
        }
    }
}
