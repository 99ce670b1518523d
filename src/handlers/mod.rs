use crate::services::{CatalogService, DocumentService, MaterialMovementService};
use std::sync::Arc;

pub mod catalog;
pub mod documents;
pub mod movements;

/// Service registry shared through the application state.
#[derive(Clone)]
pub struct AppServices {
    pub documents: Arc<DocumentService>,
    pub movements: Arc<MaterialMovementService>,
    pub catalog: Arc<CatalogService>,
}
