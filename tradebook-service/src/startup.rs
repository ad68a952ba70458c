//! Application startup and lifecycle management.
//!
//! Builds the HTTP server exposing the bookkeeping API plus the usual
//! health/readiness/metrics endpoints.

use crate::config::TradebookConfig;
use crate::handlers::{bills, ledger, markups, rates, reports, suppliers};
use crate::services::{get_metrics, Database, RateCache};
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use service_core::error::AppError;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub rate_cache: RateCache,
    pub config: TradebookConfig,
}

/// Health check endpoint for liveness probes.
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "tradebook-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness check endpoint.
async fn readiness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ready" })))
}

/// Prometheus metrics endpoint.
async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: TradebookConfig) -> Result<Self, AppError> {
        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;

        db.run_migrations().await?;

        let state = AppState {
            db,
            rate_cache: RateCache::new(),
            config: config.clone(),
        };

        // Port 0 binds a random port, used by the test harness.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Tradebook service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = Router::new()
            .route("/health", get(health_check))
            .route("/ready", get(readiness_check))
            .route("/metrics", get(metrics_endpoint))
            .route(
                "/suppliers",
                get(suppliers::list_suppliers).post(suppliers::create_supplier),
            )
            .route(
                "/suppliers/:supplier_id",
                get(suppliers::get_supplier)
                    .put(suppliers::update_supplier)
                    .delete(suppliers::delete_supplier),
            )
            .route("/suppliers/:supplier_id/items", get(markups::list_items))
            .route(
                "/suppliers/:supplier_id/markup-rules",
                get(markups::list_markup_rules),
            )
            .route(
                "/suppliers/:supplier_id/markup-rules/:item_name",
                put(markups::upsert_markup_rule).delete(markups::delete_markup_rule),
            )
            .route("/suppliers/:supplier_id/ledger", get(ledger::ledger_statement))
            .route(
                "/suppliers/:supplier_id/transactions",
                get(ledger::list_transactions),
            )
            .route("/suppliers/:supplier_id/net-due", get(ledger::net_due))
            .route("/rates", get(rates::list_rates))
            .route("/rates/import", post(rates::import_rates))
            .route("/rates/:date", get(rates::get_rates).put(rates::upsert_rates))
            .route("/bills", get(bills::list_bill_entries).post(bills::save_bill))
            .route("/bills/grid", get(bills::bill_grid))
            .route("/bills/reconcile", post(bills::reconcile))
            .route("/ledger/payments", post(ledger::record_payment))
            .route("/reports/overview", get(reports::overview))
            .route("/reports/variance", get(reports::variance_report))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}
