pub mod catalog;
pub mod documents;
pub mod movements;

pub use catalog::CatalogService;
pub use documents::DocumentService;
pub use movements::MaterialMovementService;
