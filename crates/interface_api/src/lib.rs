//! HTTP API Layer
//!
//! This crate provides the REST API for the invoicing system using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for customers, products, invoices and payments
//! - **Middleware**: Request ids, tracing, audit logging
//! - **DTOs**: Validated request bodies
//! - **Error Handling**: Consistent error responses
//!
//! Handlers talk only to [`BillingService`]; the store behind it is chosen
//! by the binary (PostgreSQL) or by tests (in-memory).
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(service, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_billing::{BillingService, BillingStore};

use crate::config::ApiConfig;
use crate::handlers::{customers, health, invoices, payments, products};
use crate::middleware::audit_middleware;

/// Billing service over whichever store the application was started with
pub type SharedBillingService = Arc<BillingService<dyn BillingStore>>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: SharedBillingService,
    pub config: ApiConfig,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `service` - Billing service; its cache should be refreshed before serving
/// * `config` - API configuration
pub fn create_router(service: SharedBillingService, config: ApiConfig) -> Router {
    let state = AppState { service, config };

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let customer_routes = Router::new()
        .route("/", get(customers::list_customers).post(customers::create_customer))
        .route("/:id", get(customers::get_customer).put(customers::update_customer))
        .route("/:id/prices", get(customers::get_prices))
        .route("/:id/recalculate", post(customers::recalculate_balance));

    let product_routes = Router::new()
        .route("/", get(products::list_products).post(products::create_product))
        .route("/:id", put(products::update_product));

    let invoice_routes = Router::new()
        .route("/", get(invoices::list_invoices).post(invoices::create_invoice))
        .route("/next-number", get(invoices::next_number))
        .route("/price-changes", post(invoices::accept_price_changes))
        .route("/:id", get(invoices::get_invoice).put(invoices::update_invoice));

    let payment_routes = Router::new()
        .route("/", get(payments::list_payments).post(payments::record_payment))
        .route("/:id", put(payments::update_payment));

    let api_routes = Router::new()
        .nest("/customers", customer_routes)
        .nest("/products", product_routes)
        .nest("/invoices", invoice_routes)
        .nest("/payments", payment_routes)
        .layer(axum_middleware::from_fn(audit_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
