use crate::{
    commands::{
        documents::{allocate_document_number, emit_stock_movements},
        Command,
    },
    db::DbPool,
    entities::{
        inventory_document::{self, validate_signature_blob, DocumentStatus},
        inventory_document_line::{self, merge_line_draft, LineDraft},
        material_movement::{self, MovementTotals, MovementType},
        material_movement_line,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};
use rust_decimal::Decimal;
use sea_orm::{Set, *};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref MOVEMENT_RECORDINGS: IntCounter = register_int_counter!(
        "material_movement_recordings_total",
        "Total number of material movements recorded"
    )
    .expect("metric can be created");
    static ref MOVEMENT_RECORDING_FAILURES: IntCounter = register_int_counter!(
        "material_movement_recording_failures_total",
        "Total number of failed material movement recordings"
    )
    .expect("metric can be created");
    static ref MOVEMENT_DOCUMENT_WARNINGS: IntCounter = register_int_counter!(
        "material_movement_document_warnings_total",
        "Material movements saved whose inventory document step failed"
    )
    .expect("metric can be created");
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MovementLineInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    pub unit_cost: Decimal,
}

/// Optional affect-inventory step: when a warehouse is supplied the movement
/// also generates a warehouse document with the opposite direction (gasto
/// issues a salida, retorno receives an entrada).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectInventoryInput {
    pub warehouse_id: Uuid,
    pub delivered_by_name: Option<String>,
    pub delivered_by_signature: Option<String>,
    pub received_by_name: Option<String>,
    pub received_by_signature: Option<String>,
}

/// Records a gasto or retorno against an event. Money totals are computed
/// from the lines and the configured IVA rate; a retorno is bounded per
/// product by what the event has issued minus what it has already returned.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordMaterialMovementCommand {
    pub event_id: Uuid,
    pub movement_type: MovementType,
    pub category: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "At least one line is required"))]
    pub lines: Vec<MovementLineInput>,
    /// Injected from configuration by the service layer, not taken from the
    /// request body.
    #[serde(skip)]
    pub iva_rate: Decimal,
    pub affect_inventory: Option<AffectInventoryInput>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordMaterialMovementResult {
    pub movement: material_movement::Model,
    pub lines: Vec<material_movement_line::Model>,
    pub inventory_document: Option<inventory_document::Model>,
    pub warnings: Vec<String>,
}

#[async_trait::async_trait]
impl Command for RecordMaterialMovementCommand {
    type Result = RecordMaterialMovementResult;

    #[instrument(skip(self, db_pool, event_sender), fields(event_id = %self.event_id, movement_type = %self.movement_type))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate_input()?;

        let db = db_pool.as_ref();

        let totals = MovementTotals::compute(
            &self
                .lines
                .iter()
                .map(|line| (line.quantity, line.unit_cost))
                .collect::<Vec<_>>(),
            self.iva_rate,
        );
        if totals.total <= Decimal::ZERO {
            MOVEMENT_RECORDING_FAILURES.inc();
            return Err(ServiceError::ValidationError(format!(
                "Movement total must be positive, computed {}",
                totals.total
            )));
        }

        if self.movement_type == MovementType::Retorno {
            self.check_return_availability(db).await?;
        }

        let (movement, lines) = self.record_movement(db, totals).await?;

        info!(
            movement_id = %movement.id,
            total = %movement.total,
            "Material movement recorded"
        );

        let mut warnings = Vec::new();
        let mut inventory_document = None;
        let mut movement = movement;

        // Optional step: failure here never rolls back the saved movement.
        if let Some(affect) = &self.affect_inventory {
            match self
                .generate_inventory_document(db, &event_sender, &movement, affect)
                .await
            {
                Ok(document) => {
                    let mut active = movement.clone().into_active_model();
                    active.inventory_document_id = Set(Some(document.id));
                    movement = active
                        .update(db)
                        .await
                        .map_err(ServiceError::DatabaseError)?;
                    inventory_document = Some(document);
                }
                Err(e) => {
                    MOVEMENT_DOCUMENT_WARNINGS.inc();
                    warn!(
                        movement_id = %movement.id,
                        "Inventory document generation failed: {}", e
                    );
                    warnings.push(format!(
                        "Movement saved, but the inventory document could not be generated: {}",
                        e.response_message()
                    ));
                }
            }
        }

        event_sender
            .send(Event::MaterialMovementRecorded {
                movement_id: movement.id,
                event_id: self.event_id,
                movement_type: self.movement_type.to_string(),
                total: movement.total,
            })
            .await
            .map_err(|e| {
                ServiceError::EventError(format!("Failed to send movement event: {}", e))
            })?;

        MOVEMENT_RECORDINGS.inc();

        Ok(RecordMaterialMovementResult {
            movement,
            lines,
            inventory_document,
            warnings,
        })
    }
}

impl RecordMaterialMovementCommand {
    fn validate_input(&self) -> Result<(), ServiceError> {
        self.validate().map_err(|e| {
            MOVEMENT_RECORDING_FAILURES.inc();
            ServiceError::ValidationError(format!("Invalid input: {}", e))
        })?;
        for line in &self.lines {
            line.validate().map_err(|e| {
                MOVEMENT_RECORDING_FAILURES.inc();
                ServiceError::ValidationError(format!("Invalid line: {}", e))
            })?;
        }

        if self.lines.iter().any(|line| line.unit_cost < Decimal::ZERO) {
            MOVEMENT_RECORDING_FAILURES.inc();
            return Err(ServiceError::ValidationError(
                "unit_cost must not be negative".to_string(),
            ));
        }

        if let Some(affect) = &self.affect_inventory {
            for blob in [&affect.delivered_by_signature, &affect.received_by_signature]
                .into_iter()
                .flatten()
            {
                if !validate_signature_blob(blob) {
                    MOVEMENT_RECORDING_FAILURES.inc();
                    return Err(ServiceError::ValidationError(
                        "Signature image must be a non-empty base64 payload".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// A retorno may not return more of a product than the event still holds:
    /// issued (gasto) minus already returned (retorno). Products never issued
    /// for the event are rejected outright.
    async fn check_return_availability(&self, db: &DatabaseConnection) -> Result<(), ServiceError> {
        let mut proposed: HashMap<Uuid, i64> = HashMap::new();
        for line in &self.lines {
            *proposed.entry(line.product_id).or_insert(0) += i64::from(line.quantity);
        }

        for (product_id, quantity) in proposed {
            let issued = material_movement_line::total_quantity(
                db,
                self.event_id,
                MovementType::Gasto,
                product_id,
            )
            .await
            .map_err(ServiceError::DatabaseError)?;

            if issued == 0 {
                MOVEMENT_RECORDING_FAILURES.inc();
                return Err(ServiceError::InsufficientStock(format!(
                    "Product {} was never issued for event {}",
                    product_id, self.event_id
                )));
            }

            let returned = material_movement_line::total_quantity(
                db,
                self.event_id,
                MovementType::Retorno,
                product_id,
            )
            .await
            .map_err(ServiceError::DatabaseError)?;

            let available = (issued - returned).max(0);
            if quantity > available {
                MOVEMENT_RECORDING_FAILURES.inc();
                return Err(ServiceError::InsufficientStock(format!(
                    "Cannot return {} of product {}: only {} available for return",
                    quantity, product_id, available
                )));
            }
        }

        Ok(())
    }

    async fn record_movement(
        &self,
        db: &DatabaseConnection,
        totals: MovementTotals,
    ) -> Result<
        (
            material_movement::Model,
            Vec<material_movement_line::Model>,
        ),
        ServiceError,
    > {
        let command = self.clone();

        db.transaction::<_, (material_movement::Model, Vec<material_movement_line::Model>), ServiceError>(
            move |txn| {
                Box::pin(async move {
                    let movement = material_movement::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        event_id: Set(command.event_id),
                        movement_type: Set(command.movement_type),
                        category: Set(command.category.clone()),
                        subtotal: Set(totals.subtotal),
                        iva: Set(totals.iva),
                        total: Set(totals.total),
                        notes: Set(command.notes.clone()),
                        inventory_document_id: Set(None),
                        created_at: Set(Utc::now()),
                    }
                    .insert(txn)
                    .await
                    .map_err(|e| {
                        error!("Failed to insert material movement: {}", e);
                        ServiceError::DatabaseError(e)
                    })?;

                    let mut lines = Vec::with_capacity(command.lines.len());
                    for input in &command.lines {
                        let line = material_movement_line::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            movement_id: Set(movement.id),
                            product_id: Set(input.product_id),
                            quantity: Set(input.quantity),
                            unit_cost: Set(input.unit_cost),
                        }
                        .insert(txn)
                        .await
                        .map_err(|e| {
                            error!("Failed to insert movement line: {}", e);
                            ServiceError::DatabaseError(e)
                        })?;
                        lines.push(line);
                    }

                    Ok((movement, lines))
                })
            },
        )
        .await
        .map_err(|e| {
            MOVEMENT_RECORDING_FAILURES.inc();
            ServiceError::from(e)
        })
    }

    /// Builds the counterpart warehouse document (opposite direction),
    /// confirms it, and lets the signature gate decide whether its stock
    /// movements flow immediately.
    async fn generate_inventory_document(
        &self,
        db: &DatabaseConnection,
        event_sender: &EventSender,
        movement: &material_movement::Model,
        affect: &AffectInventoryInput,
    ) -> Result<inventory_document::Model, ServiceError> {
        let document_type = self.movement_type.counterpart_document_type();
        let event_id = self.event_id;
        let warehouse_id = affect.warehouse_id;
        let affect = affect.clone();
        let movement_id = movement.id;
        let inputs: Vec<LineDraft> = {
            let mut drafts = Vec::new();
            for line in &self.lines {
                merge_line_draft(&mut drafts, line.product_id, line.quantity, None);
            }
            drafts
        };

        let (document, movement_count) = db
            .transaction::<_, (inventory_document::Model, usize), ServiceError>(move |txn| {
                Box::pin(async move {
                    let document_number = allocate_document_number(txn, document_type).await?;

                    let now = Utc::now();
                    let document = inventory_document::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        document_number: Set(document_number),
                        document_type: Set(document_type),
                        document_date: Set(now.date_naive()),
                        warehouse_id: Set(Some(warehouse_id)),
                        event_id: Set(Some(event_id)),
                        delivered_by_name: Set(affect.delivered_by_name.clone()),
                        delivered_by_signature: Set(affect.delivered_by_signature.clone()),
                        received_by_name: Set(affect.received_by_name.clone()),
                        received_by_signature: Set(affect.received_by_signature.clone()),
                        notes: Set(Some(format!("Generated from material movement {}", movement_id))),
                        status: Set(DocumentStatus::Confirmed),
                        movements_emitted_at: Set(None),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?;

                    let mut lines = Vec::with_capacity(inputs.len());
                    for draft in inputs {
                        let line = inventory_document_line::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            document_id: Set(document.id),
                            product_id: Set(draft.product_id),
                            quantity: Set(draft.quantity),
                            observation: Set(None),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;
                        lines.push(line);
                    }

                    let movement_count = if document.has_complete_signatures() {
                        emit_stock_movements(txn, &document, &lines).await?
                    } else {
                        0
                    };

                    let document = inventory_document::Entity::find_by_id(document.id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?
                        .ok_or_else(|| {
                            ServiceError::InternalError(
                                "Generated document vanished mid-transaction".to_string(),
                            )
                        })?;

                    Ok((document, movement_count))
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(
            document_number = %document.document_number,
            document_type = %document.document_type,
            movements_emitted = %(movement_count > 0),
            "Inventory document generated from material movement"
        );

        event_sender
            .send(Event::DocumentCreated {
                document_id: document.id,
                document_number: document.document_number.clone(),
            })
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;
        event_sender
            .send(Event::DocumentConfirmed {
                document_id: document.id,
                movements_emitted: movement_count > 0,
            })
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;
        if movement_count > 0 {
            event_sender
                .send(Event::StockMovementsEmitted {
                    document_id: document.id,
                    movement_count,
                })
                .await
                .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;
        }

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_command(lines: Vec<MovementLineInput>) -> RecordMaterialMovementCommand {
        RecordMaterialMovementCommand {
            event_id: Uuid::new_v4(),
            movement_type: MovementType::Gasto,
            category: None,
            notes: None,
            lines,
            iva_rate: dec!(0.16),
            affect_inventory: None,
        }
    }

    #[test]
    fn empty_lines_fail_validation() {
        let command = base_command(vec![]);
        assert!(command.validate_input().is_err());
    }

    #[test]
    fn negative_unit_cost_fails_validation() {
        let command = base_command(vec![MovementLineInput {
            product_id: Uuid::new_v4(),
            quantity: 1,
            unit_cost: dec!(-1.00),
        }]);
        assert!(command.validate_input().is_err());
    }

    #[test]
    fn zero_quantity_fails_validation() {
        let command = base_command(vec![MovementLineInput {
            product_id: Uuid::new_v4(),
            quantity: 0,
            unit_cost: dec!(1.00),
        }]);
        assert!(command.validate_input().is_err());
    }
}
