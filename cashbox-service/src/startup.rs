//! Application startup and lifecycle management.

use crate::config::{CashboxConfig, StorageBackend};
use crate::handlers::{
    self, business_units, categories, dashboard, movements, partners, reports, settings,
};
use crate::middleware::http_metrics_middleware;
use crate::services::{
    init_metrics, AggregationService, Database, InMemoryStore, LedgerService, PartnerService,
    ReportService, SettingsService, SharedStore,
};
use axum::{
    middleware::from_fn,
    routing::{delete, get, patch, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::tracing::{request_id_middleware, REQUEST_ID_HEADER};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub ledger: LedgerService,
    pub aggregation: AggregationService,
    pub partners: PartnerService,
    pub reports: ReportService,
    pub settings: SettingsService,
}

impl AppState {
    pub fn new(store: SharedStore, currency_symbol: &str) -> Self {
        Self {
            ledger: LedgerService::new(store.clone()),
            aggregation: AggregationService::new(store.clone()),
            partners: PartnerService::new(store.clone()),
            reports: ReportService::new(store.clone(), currency_symbol),
            settings: SettingsService::new(store.clone()),
            store,
        }
    }
}

/// Build the HTTP router over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        // Business units & points of sale
        .route(
            "/business-units",
            get(business_units::list_business_units).post(business_units::create_business_unit),
        )
        .route(
            "/business-units/reorder",
            post(business_units::reorder_business_units),
        )
        .route(
            "/business-units/:id",
            get(business_units::get_business_unit)
                .patch(business_units::update_business_unit)
                .delete(business_units::deactivate_business_unit),
        )
        .route(
            "/business-units/:id/points-of-sale",
            get(business_units::list_points_of_sale).post(business_units::create_point_of_sale),
        )
        .route(
            "/business-units/:id/close-period",
            post(business_units::close_period),
        )
        .route(
            "/points-of-sale/:id",
            delete(business_units::deactivate_point_of_sale),
        )
        // Categories
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route("/categories/:id", patch(categories::update_category))
        // Movements
        .route(
            "/movements",
            get(movements::list_movements).post(movements::record_movement),
        )
        .route(
            "/movements/:id",
            get(movements::get_movement).delete(movements::delete_movement),
        )
        // Aggregates
        .route("/balance", get(dashboard::get_balance))
        .route("/balance/units", get(dashboard::unit_balances))
        .route("/sales/daily", get(dashboard::daily_sales))
        .route("/sales/series", get(dashboard::sales_series))
        .route("/activity", get(dashboard::activity_feed))
        .route("/dashboard", get(dashboard::dashboard))
        // Partners
        .route(
            "/partners",
            get(partners::list_partners).post(partners::create_partner),
        )
        .route(
            "/partners/:id",
            patch(partners::update_partner).delete(partners::deactivate_partner),
        )
        .route(
            "/partners/:id/managing",
            post(partners::change_managing_partner),
        )
        .route(
            "/partners/:id/accounts",
            get(partners::list_accounts).post(partners::open_account),
        )
        // Reports
        .route("/reports/movements", get(reports::movement_report))
        // Settings & audit
        .route("/config", get(settings::list_config))
        .route(
            "/config/:key",
            get(settings::get_config).put(settings::set_config),
        )
        .route("/audit-logs", get(settings::list_audit_logs))
        .route_layer(from_fn(http_metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Open the configured storage backend.
async fn connect_store(config: &CashboxConfig) -> Result<SharedStore, AppError> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage - data is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let database = config.database.as_ref().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
            })?;
            let db = Database::new(
                database.url.expose_secret(),
                database.max_connections,
                database.min_connections,
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                e
            })?;
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
            Ok(Arc::new(db))
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: CashboxConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await?;
        Self::build_with_store(config, store).await
    }

    /// Build the application over an existing store.
    pub async fn build_with_store(
        config: CashboxConfig,
        store: SharedStore,
    ) -> Result<Self, AppError> {
        init_metrics();

        let state = AppState::new(store, &config.currency_symbol);

        // Port 0 = random port for testing
        let addr = config.common.bind_address();
        let listener = TcpListener::bind(addr.as_str()).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, storage = ?config.storage, "Cashbox service listener bound");

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

    /// Get the application state.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);
        axum::serve(self.listener, router).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
