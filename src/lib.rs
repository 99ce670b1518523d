pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use handlers::AppServices;
use services::{CatalogService, DocumentService, MaterialMovementService};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let sender = Arc::new(event_sender.clone());
        let services = AppServices {
            documents: Arc::new(DocumentService::new(db.clone(), sender.clone())),
            movements: Arc::new(MaterialMovementService::new(
                db.clone(),
                sender.clone(),
                config.iva_rate_decimal(),
            )),
            catalog: Arc::new(CatalogService::new(db.clone())),
        };

        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

// Common response wrappers
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    let documents = Router::new()
        .route(
            "/documents",
            post(handlers::documents::create_document).get(handlers::documents::list_documents),
        )
        .route(
            "/documents/:id",
            get(handlers::documents::get_document)
                .put(handlers::documents::update_document)
                .delete(handlers::documents::delete_document),
        )
        .route("/documents/:id/lines", post(handlers::documents::add_document_line))
        .route(
            "/documents/:id/lines/:product_id",
            put(handlers::documents::update_document_line)
                .delete(handlers::documents::remove_document_line),
        )
        .route(
            "/documents/:id/confirm",
            post(handlers::documents::confirm_document),
        )
        .route(
            "/documents/:id/cancel",
            post(handlers::documents::cancel_document),
        )
        .route(
            "/documents/:id/signatures",
            post(handlers::documents::complete_signatures),
        )
        .route(
            "/documents/:id/movements",
            get(handlers::documents::get_document_movements),
        );

    let movements = Router::new()
        .route(
            "/material-movements",
            post(handlers::movements::record_movement).get(handlers::movements::list_movements),
        )
        .route(
            "/material-movements/availability",
            get(handlers::movements::get_availability),
        )
        .route(
            "/material-movements/:id",
            get(handlers::movements::get_movement),
        );

    let catalog = Router::new()
        .route(
            "/warehouses",
            post(handlers::catalog::create_warehouse).get(handlers::catalog::list_warehouses),
        )
        .route(
            "/products",
            post(handlers::catalog::create_product).get(handlers::catalog::list_products),
        );

    Router::new()
        .merge(documents)
        .merge(movements)
        .merge(catalog)
        .route("/status", get(api_status))
        .route("/health", get(health_check))
}

async fn api_status() -> ApiResult<Value> {
    Ok(Json(ApiResponse::success(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))))
}

/// Liveness plus a database ping.
async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    db::check_connection(&state.db).await?;
    Ok(Json(ApiResponse::success(json!({
        "status": "healthy",
        "database": "connected",
        "timestamp": Utc::now().to_rfc3339(),
    }))))
}

/// Root banner for humans poking at the service.
pub async fn root_banner() -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "api": "/api/v1",
        "metrics": "/metrics",
    }))
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn success_response_carries_data() {
        let response = ApiResponse::success(42);
        assert!(response.success);
        assert_eq!(response.data, Some(42));
        assert!(response.message.is_none());
    }

    #[test]
    fn error_response_carries_message() {
        let response = ApiResponse::<()>::error("oops".into());
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("oops"));
    }
}
