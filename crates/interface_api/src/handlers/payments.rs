//! Payment handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use core_kernel::PaymentId;
use domain_billing::{Payment, SavedPayment};

use crate::dto::payments::PaymentRequest;
use crate::{error::ApiError, AppState};

/// Lists payments, newest first
pub async fn list_payments(State(state): State<AppState>) -> Json<Vec<Payment>> {
    Json(state.service.payments().await)
}

pub async fn record_payment(
    State(state): State<AppState>,
    Json(request): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<SavedPayment>), ApiError> {
    request.validate()?;
    let payment = request.into_new_payment(state.service.today());
    let saved = state.service.record_payment(payment).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<SavedPayment>, ApiError> {
    request.validate()?;
    let payment = request.into_new_payment(state.service.today());
    Ok(Json(state.service.update_payment(PaymentId::new(id), payment).await?))
}
