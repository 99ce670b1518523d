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

lazy_static! {
    static ref LINE_ADDITIONS: IntCounter = register_int_counter!(
        "inventory_document_line_additions_total",
        "Total number of document line additions (including merges)"
    )
    .expect("metric can be created");
    static ref LINE_ADDITION_FAILURES: IntCounter = register_int_counter!(
        "inventory_document_line_addition_failures_total",
        "Total number of failed document line additions"
    )
    .expect("metric can be created");
}

/// Add-or-merge: a second addition of the same product folds into the
/// existing line instead of creating a duplicate. The delta may be negative
/// to decrement an existing line; the resulting quantity is clamped to at
/// least 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDocumentLineCommand {
    pub document_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub observation: Option<String>,
}

#[async_trait::async_trait]
impl Command for AddDocumentLineCommand {
    type Result = inventory_document_line::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(document_id = %self.document_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = db_pool.as_ref();
        let document = load_document(db, self.document_id).await?;

        if !document.is_editable() {
            LINE_ADDITION_FAILURES.inc();
            return Err(ServiceError::InvalidOperation(format!(
                "Document {} is {} and cannot be edited",
                document.document_number, document.status
            )));
        }

        let existing = inventory_document_line::Entity::find()
            .filter(inventory_document_line::Column::DocumentId.eq(self.document_id))
            .filter(inventory_document_line::Column::ProductId.eq(self.product_id))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let line = match existing {
            Some(line) => {
                let merged_quantity = (line.quantity + self.quantity).max(1);
                let keep_observation = line.observation.clone();
                let mut active = line.into_active_model();
                active.quantity = Set(merged_quantity);
                if keep_observation.is_none() {
                    active.observation = Set(self.observation.clone());
                }
                active.update(db).await.map_err(|e| {
                    LINE_ADDITION_FAILURES.inc();
                    error!("Failed to merge line: {}", e);
                    ServiceError::DatabaseError(e)
                })?
            }
            None => inventory_document_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                document_id: Set(self.document_id),
                product_id: Set(self.product_id),
                quantity: Set(self.quantity.max(1)),
                observation: Set(self.observation.clone()),
            }
            .insert(db)
            .await
            .map_err(|e| {
                LINE_ADDITION_FAILURES.inc();
                error!("Failed to insert line: {}", e);
                ServiceError::DatabaseError(e)
            })?,
        };

        info!(
            product_id = %self.product_id,
            quantity = %line.quantity,
            "Document line added or merged"
        );

        event_sender
            .send(Event::DocumentLineAdded {
                document_id: self.document_id,
                product_id: self.product_id,
                quantity: line.quantity,
            })
            .await
            .map_err(|e| {
                LINE_ADDITION_FAILURES.inc();
                ServiceError::EventError(format!("Failed to send line-added event: {}", e))
            })?;

        LINE_ADDITIONS.inc();

        Ok(line)
    }
}
