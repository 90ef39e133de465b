//! Invoice handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use validator::Validate;

use core_kernel::{CustomerId, InvoiceId, ProductId};
use domain_billing::{Invoice, InvoiceDraft, InvoiceWithLines, Price, SavedInvoice, UnitPrice};

use crate::dto::invoices::{AcceptPriceChangesRequest, InvoiceRequest, NextNumberResponse};
use crate::dto::{money, percentage};
use crate::{error::ApiError, AppState};

/// Lists invoices, newest first
pub async fn list_invoices(State(state): State<AppState>) -> Json<Vec<Invoice>> {
    Json(state.service.invoices().await)
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<InvoiceWithLines>, ApiError> {
    Ok(Json(state.service.invoice_with_lines(InvoiceId::new(id)).await?))
}

/// Reference number the next invoice would receive
pub async fn next_number(State(state): State<AppState>) -> Result<Json<NextNumberResponse>, ApiError> {
    let number = state.service.next_invoice_number().await?;
    Ok(Json(NextNumberResponse {
        ref_no: number.to_string(),
    }))
}

/// Saves a new invoice
///
/// The response lists any lines sold at other than the customer's list
/// price; they are applied only through `accept_price_changes`.
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(request): Json<InvoiceRequest>,
) -> Result<(StatusCode, Json<SavedInvoice>), ApiError> {
    request.validate()?;
    let date = request.date.unwrap_or_else(|| state.service.today());
    let draft = build_draft(&state, request, date).await?;
    let saved = state.service.create_invoice(draft).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<InvoiceRequest>,
) -> Result<Json<SavedInvoice>, ApiError> {
    request.validate()?;
    let id = InvoiceId::new(id);
    let date = match request.date {
        Some(date) => date,
        None => state.service.invoice_with_lines(id).await?.invoice.date,
    };
    let draft = build_draft(&state, request, date).await?;
    Ok(Json(state.service.update_invoice(id, draft).await?))
}

/// Writes accepted price changes to the customers' price lists
pub async fn accept_price_changes(
    State(state): State<AppState>,
    Json(request): Json<AcceptPriceChangesRequest>,
) -> Result<Json<Vec<Price>>, ApiError> {
    Ok(Json(state.service.accept_price_changes(&request.changes).await?))
}

async fn build_draft(
    state: &AppState,
    request: InvoiceRequest,
    date: NaiveDate,
) -> Result<InvoiceDraft, ApiError> {
    let customer_id = CustomerId::new(request.customer_id);
    let customer = state
        .service
        .customer(customer_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Customer not found: {customer_id}")))?;

    let mut draft = InvoiceDraft::for_customer(&customer, date);
    if let Some(days) = request.payment_terms_days {
        draft.payment_terms_days = days;
    }

    for line in request.lines {
        let price = match line.price {
            Some(p) => Some(UnitPrice::new(money(p.price), percentage(p.discount)?)),
            None => None,
        };
        let item = state
            .service
            .line_item(customer_id, ProductId::new(line.product_id), line.unit, line.count, price)
            .await?;
        draft.add_line(item);
    }

    Ok(draft)
}
