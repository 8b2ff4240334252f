//! Storefront back-end
//!
//! Order lifecycle and payment reconciliation for a conventional online shop.
//!
//! ## Features
//! - Product catalog and category management
//! - Server-side cart with login-time reconciliation
//! - Checkout with stock decrement in a single transaction
//! - Promotion code evaluation
//! - Hosted-checkout payment sessions and signed webhook reconciliation
//! - Purchase-gated product reviews

pub mod api;
pub mod config;
pub mod domain;
pub mod events;
pub mod payment;
pub mod services;
pub mod storage;

use thiserror::Error;

pub use domain::aggregates::{PromotionError, ReviewError};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum EcommerceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("admin access required")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error(transparent)]
    Promotion(#[from] PromotionError),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error("payment session failed")]
    PaymentSession(#[source] payment::GatewayError),

    /// Server-side failure whose message is safe to show; the cause is logged where it happens.
    #[error("{0}")]
    Internal(&'static str),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EcommerceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<sqlx::Error> for EcommerceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(format!("duplicate value: {}", db.constraint().unwrap_or("unique key")))
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                Self::Conflict("record is still referenced".to_string())
            }
            _ => Self::Storage(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, EcommerceError>;
