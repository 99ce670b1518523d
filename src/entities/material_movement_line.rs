use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::QuerySelect;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::material_movement::{self, MovementType};

/// One product line of a material movement: quantity plus the unit cost it
/// was issued or returned at.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "material_movement_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Uuid")]
    pub id: Uuid,

    #[sea_orm(column_type = "Uuid")]
    pub movement_id: Uuid,

    #[sea_orm(column_type = "Uuid")]
    pub product_id: Uuid,

    pub quantity: i32,

    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_cost: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::material_movement::Entity",
        from = "Column::MovementId",
        to = "super::material_movement::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Movement,
}

impl Related<super::material_movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movement.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Total quantity of `product_id` across all movements of `movement_type`
/// recorded for `event_id`. Feeds the return reconciliation: issued minus
/// already-returned bounds any new retorno line.
pub async fn total_quantity<C: ConnectionTrait>(
    db: &C,
    event_id: Uuid,
    movement_type: MovementType,
    product_id: Uuid,
) -> Result<i64, DbErr> {
    let movement_ids: Vec<Uuid> = material_movement::Entity::find()
        .filter(material_movement::Column::EventId.eq(event_id))
        .filter(material_movement::Column::MovementType.eq(movement_type))
        .select_only()
        .column(material_movement::Column::Id)
        .into_tuple()
        .all(db)
        .await?;

    if movement_ids.is_empty() {
        return Ok(0);
    }

    let lines = Entity::find()
        .filter(Column::MovementId.is_in(movement_ids))
        .filter(Column::ProductId.eq(product_id))
        .all(db)
        .await?;

    Ok(lines.iter().map(|line| i64::from(line.quantity)).sum())
}
