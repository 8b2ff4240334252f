//! Payment records and processor transaction statuses

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::aggregates::order::{OrderStatus, PaymentStatus};
use crate::EcommerceError;

/// Unique on `(order_id, transaction_id)`; redelivered notifications update the same row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub transaction_id: String,
    pub amount: Decimal,
    pub method: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn record(order_id: Uuid, transaction_id: &str, amount: Decimal, method: &str, status: PaymentStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), order_id, transaction_id: transaction_id.to_string(), amount,
            method: method.to_string(), status, created_at: now, updated_at: now,
        }
    }
}

/// `transaction_status` values sent by the processor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionStatus { Capture, Settlement, Pending, Deny, Cancel, Expire, Failure }

impl TransactionStatus {
    /// Payment status to record and, when it changes, the new order status.
    pub fn outcome(self) -> (PaymentStatus, Option<OrderStatus>) {
        match self {
            Self::Capture | Self::Settlement => (PaymentStatus::Paid, Some(OrderStatus::Confirmed)),
            Self::Pending => (PaymentStatus::Pending, None),
            Self::Deny | Self::Cancel | Self::Expire => (PaymentStatus::Failed, Some(OrderStatus::Cancelled)),
            Self::Failure => (PaymentStatus::Failed, None),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = EcommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "capture" => Ok(Self::Capture),
            "settlement" => Ok(Self::Settlement),
            "pending" => Ok(Self::Pending),
            "deny" => Ok(Self::Deny),
            "cancel" => Ok(Self::Cancel),
            "expire" => Ok(Self::Expire),
            "failure" => Ok(Self::Failure),
            other => Err(EcommerceError::validation(format!("unknown transaction status {other:?}"))),
        }
    }
}
