use std::sync::Arc;

use almacen_api::{
    db::{self, DbConfig, DbPool},
    entities::{product, warehouse},
    events::{self, EventSender},
    services::{CatalogService, DocumentService, MaterialMovementService},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;

/// Valid base64 payload standing in for a signature raster image.
#[allow(dead_code)]
pub const SIGNATURE_BLOB: &str = "aW1hZ2VfZmlybWE=";

/// Test harness wiring services to a fresh in-memory SQLite database. A
/// single pooled connection keeps every query on the same in-memory store.
pub struct TestContext {
    pub db: Arc<DbPool>,
    pub documents: DocumentService,
    pub movements: MaterialMovementService,
    pub catalog: CatalogService,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_iva_rate(dec!(0.16)).await
    }

    pub async fn with_iva_rate(iva_rate: Decimal) -> Self {
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&config)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        Self {
            documents: DocumentService::new(db.clone(), event_sender.clone()),
            movements: MaterialMovementService::new(db.clone(), event_sender.clone(), iva_rate),
            catalog: CatalogService::new(db.clone()),
            db,
            _event_task: event_task,
        }
    }

    #[allow(dead_code)]
    pub async fn seed_warehouse(&self, code: &str) -> warehouse::Model {
        self.catalog
            .create_warehouse(code.to_string(), format!("Warehouse {}", code))
            .await
            .expect("failed to seed warehouse")
    }

    #[allow(dead_code)]
    pub async fn seed_product(&self, sku: &str) -> product::Model {
        self.catalog
            .create_product(sku.to_string(), format!("Product {}", sku))
            .await
            .expect("failed to seed product")
    }
}
