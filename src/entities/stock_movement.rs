use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::inventory_document::DocumentType;

/// Warehouse stock movement generated when a document passes the signature
/// gate. Append-only: cancelling a document never reverts its movements.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Uuid")]
    pub id: Uuid,

    #[sea_orm(column_type = "Uuid")]
    pub document_id: Uuid,

    #[sea_orm(column_type = "Uuid")]
    pub warehouse_id: Uuid,

    #[sea_orm(column_type = "Uuid")]
    pub product_id: Uuid,

    pub direction: DocumentType,

    pub quantity: i32,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_document::Entity",
        from = "Column::DocumentId",
        to = "super::inventory_document::Column::Id"
    )]
    Document,
}

impl Related<super::inventory_document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// One movement per document line, scoped to the document's warehouse
    /// and carrying the document's own direction.
    pub fn for_line(
        document: &super::inventory_document::Model,
        warehouse_id: Uuid,
        line: &super::inventory_document_line::Model,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id: document.id,
            warehouse_id,
            product_id: line.product_id,
            direction: document.document_type,
            quantity: line.quantity,
            created_at: Utc::now(),
        }
    }
}
