//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use core_kernel::PortError;
use domain_billing::BillingError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },

    /// Stored data contradicts itself, e.g. a line without a price-list entry
    #[error("Data integrity error: {0}")]
    Integrity(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Validation { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                message,
                (!details.is_empty()).then_some(details),
            ),
            ApiError::Integrity(msg) => (StatusCode::CONFLICT, "integrity_error", msg, None),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg, None),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg, None),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        let message = err.to_string();

        if err.is_not_found() {
            ApiError::NotFound(message)
        } else if err.is_integrity_violation() {
            warn!(error = %message, "Data integrity violation");
            ApiError::Integrity(message)
        } else if err.is_validation() {
            ApiError::validation(message)
        } else if err.is_transient() {
            warn!(error = %message, "Store unavailable");
            ApiError::Unavailable(message)
        } else if let BillingError::Port(PortError::Conflict { .. }) = err {
            ApiError::Conflict(message)
        } else {
            error!(error = %message, "Unhandled billing error");
            ApiError::Internal(message)
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{field}: {msg}"),
                    None => format!("{field}: {}", e.code),
                })
            })
            .collect();

        ApiError::Validation {
            message: "Request validation failed".to_string(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{CustomerId, ProductId};

    fn status(err: BillingError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_billing_error_status_codes() {
        assert_eq!(status(BillingError::CustomerNotFound(CustomerId::new(1))), StatusCode::NOT_FOUND);
        assert_eq!(status(BillingError::EmptyInvoice), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status(BillingError::MissingPrice {
                customer_id: CustomerId::new(1),
                product_id: ProductId::new(2),
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(BillingError::Port(PortError::connection("refused"))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(BillingError::Port(PortError::internal("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
