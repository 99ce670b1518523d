use crate::{
    commands::{documents::load_document, Command},
    db::DbPool,
    entities::inventory_document_line,
    errors::ServiceError,
    events::{Event, EventSender},
};
use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};
use sea_orm::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

lazy_static! {
    static ref LINE_REMOVALS: IntCounter = register_int_counter!(
        "inventory_document_line_removals_total",
        "Total number of document lines removed"
    )
    .expect("metric can be created");
    static ref LINE_REMOVAL_FAILURES: IntCounter = register_int_counter!(
        "inventory_document_line_removal_failures_total",
        "Total number of failed document line removals"
    )
    .expect("metric can be created");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveDocumentLineCommand {
    pub document_id: Uuid,
    pub product_id: Uuid,
}

#[async_trait::async_trait]
impl Command for RemoveDocumentLineCommand {
    type Result = ();

    #[instrument(skip(self, db_pool, event_sender), fields(document_id = %self.document_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = db_pool.as_ref();
        let document = load_document(db, self.document_id).await?;

        if !document.is_editable() {
            LINE_REMOVAL_FAILURES.inc();
            return Err(ServiceError::InvalidOperation(format!(
                "Document {} is {} and cannot be edited",
                document.document_number, document.status
            )));
        }

        let result = inventory_document_line::Entity::delete_many()
            .filter(inventory_document_line::Column::DocumentId.eq(self.document_id))
            .filter(inventory_document_line::Column::ProductId.eq(self.product_id))
            .exec(db)
            .await
            .map_err(|e| {
                LINE_REMOVAL_FAILURES.inc();
                error!("Failed to remove line: {}", e);
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            LINE_REMOVAL_FAILURES.inc();
            return Err(ServiceError::NotFound(format!(
                "Document {} has no line for product {}",
                self.document_id, self.product_id
            )));
        }

        info!(product_id = %self.product_id, "Document line removed");

        event_sender
            .send(Event::DocumentLineRemoved {
                document_id: self.document_id,
                product_id: self.product_id,
            })
            .await
            .map_err(|e| {
                LINE_REMOVAL_FAILURES.inc();
                ServiceError::EventError(format!("Failed to send line-removed event: {}", e))
            })?;

        LINE_REMOVALS.inc();

        Ok(())
    }
}
