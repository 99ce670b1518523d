pub mod document_number_sequence;
pub mod inventory_document;
pub mod inventory_document_line;
pub mod material_movement;
pub mod material_movement_line;
pub mod product;
pub mod stock_movement;
pub mod warehouse;
