use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One product within an inventory document. At most one line per product
/// per document; repeated additions merge into the existing line.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_document_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Uuid")]
    pub id: Uuid,

    #[sea_orm(column_type = "Uuid")]
    pub document_id: Uuid,

    #[sea_orm(column_type = "Uuid")]
    pub product_id: Uuid,

    pub quantity: i32,

    pub observation: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_document::Entity",
        from = "Column::DocumentId",
        to = "super::inventory_document::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Document,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::inventory_document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// In-memory line used while assembling a document payload, before any row
/// exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineDraft {
    pub product_id: Uuid,
    pub quantity: i32,
    pub observation: Option<String>,
}

/// Add-or-merge accumulator: repeated scans of the same product fold into a
/// single quantity-bearing line. Merging clamps the resulting quantity to
/// at least 1; a fresh line starts at `delta` (also clamped). The first
/// non-empty observation wins.
pub fn merge_line_draft(
    lines: &mut Vec<LineDraft>,
    product_id: Uuid,
    delta: i32,
    observation: Option<String>,
) {
    if let Some(line) = lines.iter_mut().find(|l| l.product_id == product_id) {
        line.quantity = (line.quantity + delta).max(1);
        if line.observation.is_none() {
            line.observation = observation;
        }
    } else {
        lines.push(LineDraft {
            product_id,
            quantity: delta.max(1),
            observation,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_product_merges_into_one_line() {
        let a = Uuid::new_v4();
        let mut lines = Vec::new();
        merge_line_draft(&mut lines, a, 2, None);
        merge_line_draft(&mut lines, a, 3, None);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
    }

    #[test]
    fn distinct_products_keep_distinct_lines() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut lines = Vec::new();
        merge_line_draft(&mut lines, a, 1, None);
        merge_line_draft(&mut lines, b, 4, None);

        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn merge_clamps_quantity_at_one() {
        let a = Uuid::new_v4();
        let mut lines = Vec::new();
        merge_line_draft(&mut lines, a, 2, None);
        merge_line_draft(&mut lines, a, -10, None);

        assert_eq!(lines[0].quantity, 1);
    }

    #[test]
    fn first_observation_is_kept() {
        let a = Uuid::new_v4();
        let mut lines = Vec::new();
        merge_line_draft(&mut lines, a, 1, Some("caja abierta".into()));
        merge_line_draft(&mut lines, a, 1, Some("otra nota".into()));

        assert_eq!(lines[0].observation.as_deref(), Some("caja abierta"));
    }
}
