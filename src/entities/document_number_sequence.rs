use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-type counter backing the human-readable document numbers
/// (`ENT-000001`, `SAL-000001`). Read and incremented inside the same
/// transaction that inserts the document.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document_number_sequences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub document_type: String,

    pub next_value: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
