//! Product handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use core_kernel::ProductId;
use domain_billing::Product;

use crate::dto::products::ProductRequest;
use crate::{error::ApiError, AppState};

/// Lists active products in display order
pub async fn list_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.service.products().await)
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    request.validate()?;
    let product = state.service.create_product(request.into()).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ProductRequest>,
) -> Result<Json<Product>, ApiError> {
    request.validate()?;
    let product = state
        .service
        .update_product(ProductId::new(id), request.into())
        .await?;
    Ok(Json(product))
}
