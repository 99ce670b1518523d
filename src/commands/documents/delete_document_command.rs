use crate::{
    commands::{documents::load_document, Command},
    db::DbPool,
    entities::{inventory_document, inventory_document_line},
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
    static ref DOCUMENT_DELETIONS: IntCounter = register_int_counter!(
        "inventory_document_deletions_total",
        "Total number of draft inventory documents deleted"
    )
    .expect("metric can be created");
    static ref DOCUMENT_DELETION_FAILURES: IntCounter = register_int_counter!(
        "inventory_document_deletion_failures_total",
        "Total number of failed inventory document deletions"
    )
    .expect("metric can be created");
}

/// Hard delete, drafts only. Lines are removed in the same transaction;
/// confirmed documents must be cancelled instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDocumentCommand {
    pub document_id: Uuid,
}

#[async_trait::async_trait]
impl Command for DeleteDocumentCommand {
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
            DOCUMENT_DELETION_FAILURES.inc();
            return Err(ServiceError::InvalidOperation(format!(
                "Document {} is {} and cannot be deleted; cancel it instead",
                document.document_number, document.status
            )));
        }

        let document_id = self.document_id;
        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                inventory_document_line::Entity::delete_many()
                    .filter(inventory_document_line::Column::DocumentId.eq(document_id))
                    .exec(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?;

                inventory_document::Entity::delete_by_id(document_id)
                    .exec(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?;

                Ok(())
            })
        })
        .await
        .map_err(|e| {
            DOCUMENT_DELETION_FAILURES.inc();
            error!("Failed to delete document {}: {}", document_id, e);
            ServiceError::from(e)
        })?;

        info!(document_number = %document.document_number, "Draft document deleted");

        event_sender
            .send(Event::DocumentDeleted(self.document_id))
            .await
            .map_err(|e| {
                DOCUMENT_DELETION_FAILURES.inc();
                ServiceError::EventError(format!("Failed to send deletion event: {}", e))
            })?;

        DOCUMENT_DELETIONS.inc();

        Ok(())
    }
}
