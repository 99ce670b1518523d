use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use super::inventory_document::DocumentType;

/// Kind of event-scoped material movement. A gasto issues material from the
/// warehouse toward an event; a retorno brings unused material back.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    #[sea_orm(string_value = "gasto")]
    Gasto,

    #[sea_orm(string_value = "retorno")]
    Retorno,
}

impl MovementType {
    /// Direction of the warehouse document a movement generates when it
    /// affects inventory: stock leaves for a purchase (gasto → salida) and
    /// comes back for a return (retorno → entrada).
    pub fn counterpart_document_type(self) -> DocumentType {
        match self {
            MovementType::Gasto => DocumentType::Salida,
            MovementType::Retorno => DocumentType::Entrada,
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementType::Gasto => write!(f, "gasto"),
            MovementType::Retorno => write!(f, "retorno"),
        }
    }
}

/// Material movement entity model: a gasto or retorno recorded against an
/// event, with computed money totals and an optional link to the warehouse
/// document it generated.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "material_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Uuid")]
    pub id: Uuid,

    #[sea_orm(column_type = "Uuid")]
    pub event_id: Uuid,

    pub movement_type: MovementType,

    pub category: Option<String>,

    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub subtotal: Decimal,

    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub iva: Decimal,

    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total: Decimal,

    pub notes: Option<String>,

    #[sea_orm(column_type = "Uuid", nullable)]
    pub inventory_document_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::material_movement_line::Entity")]
    Lines,
    #[sea_orm(
        belongs_to = "super::inventory_document::Entity",
        from = "Column::InventoryDocumentId",
        to = "super::inventory_document::Column::Id"
    )]
    InventoryDocument,
}

impl Related<super::material_movement_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl Related<super::inventory_document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryDocument.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Money totals for a movement. Rounding is half-away-from-zero to two
/// decimal places; the IVA rate comes from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct MovementTotals {
    pub subtotal: Decimal,
    pub iva: Decimal,
    pub total: Decimal,
}

impl MovementTotals {
    /// `subtotal = Σ(qty × unit_cost)`, `iva = round(subtotal × rate, 2)`,
    /// `total = round(subtotal + iva, 2)`.
    pub fn compute(lines: &[(i32, Decimal)], iva_rate: Decimal) -> Self {
        let subtotal: Decimal = lines
            .iter()
            .map(|(quantity, unit_cost)| Decimal::from(*quantity) * unit_cost)
            .sum();
        let iva = (subtotal * iva_rate)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let total =
            (subtotal + iva).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self {
            subtotal,
            iva,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn gasto_generates_salida_and_retorno_generates_entrada() {
        assert_eq!(
            MovementType::Gasto.counterpart_document_type(),
            DocumentType::Salida
        );
        assert_eq!(
            MovementType::Retorno.counterpart_document_type(),
            DocumentType::Entrada
        );
    }

    #[rstest]
    #[case(vec![(10, dec!(100.00))], dec!(0.16), dec!(1000.00), dec!(160.00), dec!(1160.00))]
    #[case(vec![(1, dec!(0.10))], dec!(0.05), dec!(0.10), dec!(0.01), dec!(0.11))]
    #[case(vec![(3, dec!(33.33)), (2, dec!(0.005))], dec!(0.16), dec!(100.00), dec!(16.00), dec!(116.00))]
    #[case(vec![(1, dec!(10.03))], dec!(0.075), dec!(10.03), dec!(0.75), dec!(10.78))]
    fn totals_round_half_away_from_zero(
        #[case] lines: Vec<(i32, Decimal)>,
        #[case] rate: Decimal,
        #[case] subtotal: Decimal,
        #[case] iva: Decimal,
        #[case] total: Decimal,
    ) {
        let totals = MovementTotals::compute(&lines, rate);
        assert_eq!(totals.subtotal, subtotal);
        assert_eq!(totals.iva, iva);
        assert_eq!(totals.total, total);
    }

    #[test]
    fn zero_lines_yield_zero_total() {
        let totals = MovementTotals::compute(&[], dec!(0.16));
        assert_eq!(totals.total, Decimal::ZERO);
    }
}
