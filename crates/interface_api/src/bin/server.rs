//! Invoicing API Server Binary
//!
//! Starts the HTTP API server backed by PostgreSQL.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin invoicing-api
//!
//! # Run with environment variables
//! INVOICING_PORT=8080 INVOICING_DATABASE_URL=postgres://... cargo run --bin invoicing-api
//! ```
//!
//! # Environment Variables
//!
//! * `INVOICING_HOST` - Server host (default: 0.0.0.0)
//! * `INVOICING_PORT` - Server port (default: 8080)
//! * `INVOICING_DATABASE_URL` - PostgreSQL connection string
//! * `INVOICING_LOG_LEVEL` - Log level or filter directive (default: info)
//! * `INVOICING_LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! * `INVOICING_TIMEZONE` - IANA timezone of the business (default: UTC)
//! * `INVOICING_DB_MAX_CONNECTIONS` / `INVOICING_DB_MIN_CONNECTIONS` - Pool size

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::{Clock, SystemClock};
use domain_billing::{BillingService, BillingStore};
use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresBillingAdapter};
use interface_api::config::{ApiConfig, LogFormat};
use interface_api::{create_router, SharedBillingService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid INVOICING_* configuration")?;

    init_tracing(&config.log_level, config.log_format);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        timezone = %config.timezone,
        "Starting invoicing API server"
    );

    let timezone = config.business_timezone()?;

    let db_config = DatabaseConfig::new(config.database_url.clone())
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections);
    let pool = create_pool(db_config)
        .await
        .context("failed to connect to the database")?;

    run_migrations(&pool).await.context("failed to apply migrations")?;
    tracing::info!("Database ready");

    let store: Arc<dyn BillingStore> = Arc::new(PostgresBillingAdapter::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(timezone));
    let service: SharedBillingService = Arc::new(BillingService::new(store, clock));
    service.refresh().await.context("failed to load billing data")?;

    let app = create_router(service, config.clone());

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

/// Waits for Ctrl+C or SIGTERM so in-flight requests can complete
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
