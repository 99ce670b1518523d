use crate::{
    commands::{
        movements::record_material_movement_command::{
            AffectInventoryInput, MovementLineInput, RecordMaterialMovementResult,
        },
        movements::RecordMaterialMovementCommand,
        Command,
    },
    db::DbPool,
    entities::{
        material_movement::{self, MovementType},
        material_movement_line,
    },
    errors::ServiceError,
    events::EventSender,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use uuid::Uuid;

/// Service for event-scoped material movements (gasto/retorno). Carries the
/// configured IVA rate so the command never reads configuration itself.
#[derive(Clone)]
pub struct MaterialMovementService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    iva_rate: Decimal,
}

impl MaterialMovementService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, iva_rate: Decimal) -> Self {
        Self {
            db_pool,
            event_sender,
            iva_rate,
        }
    }

    pub fn iva_rate(&self) -> Decimal {
        self.iva_rate
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn record_movement(
        &self,
        event_id: Uuid,
        movement_type: MovementType,
        category: Option<String>,
        notes: Option<String>,
        lines: Vec<MovementLineInput>,
        affect_inventory: Option<AffectInventoryInput>,
    ) -> Result<RecordMaterialMovementResult, ServiceError> {
        RecordMaterialMovementCommand {
            event_id,
            movement_type,
            category,
            notes,
            lines,
            iva_rate: self.iva_rate,
            affect_inventory,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    pub async fn get_movement(
        &self,
        movement_id: Uuid,
    ) -> Result<
        (
            material_movement::Model,
            Vec<material_movement_line::Model>,
        ),
        ServiceError,
    > {
        let movement = material_movement::Entity::find_by_id(movement_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Material movement {} not found", movement_id))
            })?;

        let lines = material_movement_line::Entity::find()
            .filter(material_movement_line::Column::MovementId.eq(movement_id))
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((movement, lines))
    }

    pub async fn list_movements(
        &self,
        event_id: Option<Uuid>,
        movement_type: Option<MovementType>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<material_movement::Model>, u64), ServiceError> {
        let mut query = material_movement::Entity::find();
        if let Some(event_id) = event_id {
            query = query.filter(material_movement::Column::EventId.eq(event_id));
        }
        if let Some(movement_type) = movement_type {
            query = query.filter(material_movement::Column::MovementType.eq(movement_type));
        }

        let paginator = query
            .order_by_desc(material_movement::Column::CreatedAt)
            .paginate(&*self.db_pool, per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let movements = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((movements, total))
    }

    /// Units of a product still out with an event: issued (gasto) minus
    /// already returned (retorno), floored at zero.
    pub async fn available_for_return(
        &self,
        event_id: Uuid,
        product_id: Uuid,
    ) -> Result<i64, ServiceError> {
        let issued = material_movement_line::total_quantity(
            &*self.db_pool,
            event_id,
            MovementType::Gasto,
            product_id,
        )
        .await
        .map_err(ServiceError::DatabaseError)?;

        let returned = material_movement_line::total_quantity(
            &*self.db_pool,
            event_id,
            MovementType::Retorno,
            product_id,
        )
        .await
        .map_err(ServiceError::DatabaseError)?;

        Ok((issued - returned).max(0))
    }
}
