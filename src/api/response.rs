use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::{EcommerceError, PromotionError, ReviewError};

/// Every error leaves the service in this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
}

impl EcommerceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidSignature => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Promotion(PromotionError::NotFound) => StatusCode::NOT_FOUND,
            Self::Promotion(_) => StatusCode::BAD_REQUEST,
            Self::Review(ReviewError::AlreadyReviewed) => StatusCode::CONFLICT,
            Self::Review(ReviewError::NotEligible) => StatusCode::FORBIDDEN,
            Self::Review(ReviewError::InvalidRating) => StatusCode::BAD_REQUEST,
            Self::PaymentSession(_) | Self::Internal(_) | Self::Storage(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Storage and IO details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Storage(_) | Self::Io(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for EcommerceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            match std::error::Error::source(&self) {
                Some(cause) => tracing::error!("CODE: {}, MESSAGE: {self}, CAUSE: {cause}", status.as_u16()),
                None => tracing::error!("CODE: {}, MESSAGE: {self}", status.as_u16()),
            }
        }
        let body = ErrorBody { status: status.as_u16(), message: self.public_message() };
        (status, Json(body)).into_response()
    }
}
