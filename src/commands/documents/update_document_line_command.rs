use crate::{
    commands::{documents::load_document, Command},
    db::DbPool,
    entities::inventory_document_line,
    errors::ServiceError,
    events::{Event, EventSender},
};
use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};
use sea_orm::{Set, *};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref LINE_UPDATES: IntCounter = register_int_counter!(
        "inventory_document_line_updates_total",
        "Total number of document line quantity overwrites"
    )
    .expect("metric can be created");
    static ref LINE_UPDATE_FAILURES: IntCounter = register_int_counter!(
        "inventory_document_line_update_failures_total",
        "Total number of failed document line updates"
    )
    .expect("metric can be created");
}

/// Direct overwrite of a line's quantity. Unlike the add-or-merge path, a
/// value below 1 is rejected rather than clamped.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateDocumentLineCommand {
    pub document_id: Uuid,
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    pub observation: Option<String>,
}

#[async_trait::async_trait]
impl Command for UpdateDocumentLineCommand {
    type Result = inventory_document_line::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(document_id = %self.document_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            LINE_UPDATE_FAILURES.inc();
            ServiceError::ValidationError(format!("Invalid input: {}", e))
        })?;

        let db = db_pool.as_ref();
        let document = load_document(db, self.document_id).await?;

        if !document.is_editable() {
            LINE_UPDATE_FAILURES.inc();
            return Err(ServiceError::InvalidOperation(format!(
                "Document {} is {} and cannot be edited",
                document.document_number, document.status
            )));
        }

        let line = inventory_document_line::Entity::find()
            .filter(inventory_document_line::Column::DocumentId.eq(self.document_id))
            .filter(inventory_document_line::Column::ProductId.eq(self.product_id))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Document {} has no line for product {}",
                    self.document_id, self.product_id
                ))
            })?;

        let mut active = line.into_active_model();
        active.quantity = Set(self.quantity);
        if let Some(observation) = &self.observation {
            active.observation = Set(Some(observation.clone()));
        }

        let updated = active.update(db).await.map_err(|e| {
            LINE_UPDATE_FAILURES.inc();
            error!("Failed to update line: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        info!(
            product_id = %self.product_id,
            quantity = %updated.quantity,
            "Document line updated"
        );

        event_sender
            .send(Event::DocumentLineUpdated {
                document_id: self.document_id,
                product_id: self.product_id,
                quantity: updated.quantity,
            })
            .await
            .map_err(|e| {
                LINE_UPDATE_FAILURES.inc();
                ServiceError::EventError(format!("Failed to send line-updated event: {}", e))
            })?;

        LINE_UPDATES.inc();

        Ok(updated)
    }
}
