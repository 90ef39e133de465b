//! Customer, price-list and balance handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use core_kernel::CustomerId;
use domain_billing::{Customer, Price, ReconciliationReport};

use crate::dto::customers::CustomerRequest;
use crate::{error::ApiError, AppState};

/// Lists customers by id
pub async fn list_customers(State(state): State<AppState>) -> Json<Vec<Customer>> {
    Json(state.service.customers().await)
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Customer>, ApiError> {
    let id = CustomerId::new(id);
    state
        .service
        .customer(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Customer not found: {id}")))
}

/// Creates a customer together with its price list
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    request.validate()?;
    let (details, prices) = request.into_parts()?;
    let customer = state.service.create_customer(details, prices).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<CustomerRequest>,
) -> Result<Json<Customer>, ApiError> {
    request.validate()?;
    let (details, prices) = request.into_parts()?;
    let customer = state
        .service
        .update_customer(CustomerId::new(id), details, prices)
        .await?;
    Ok(Json(customer))
}

/// Price list completed with a zero entry for every active product
pub async fn get_prices(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Price>>, ApiError> {
    Ok(Json(state.service.editable_prices(CustomerId::new(id)).await?))
}

/// Recomputes the customer's running balances
pub async fn recalculate_balance(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ReconciliationReport>, ApiError> {
    Ok(Json(state.service.recalculate(CustomerId::new(id)).await?))
}
