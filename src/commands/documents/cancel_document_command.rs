use crate::{
    commands::{documents::load_document, Command},
    db::DbPool,
    entities::inventory_document::{self, DocumentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};
use sea_orm::{Set, *};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

lazy_static! {
    static ref DOCUMENT_CANCELLATIONS: IntCounter = register_int_counter!(
        "inventory_document_cancellations_total",
        "Total number of inventory documents cancelled"
    )
    .expect("metric can be created");
    static ref DOCUMENT_CANCELLATION_FAILURES: IntCounter = register_int_counter!(
        "inventory_document_cancellation_failures_total",
        "Total number of failed inventory document cancellations"
    )
    .expect("metric can be created");
}

/// Cancels a draft or confirmed document. Cancellation is terminal and does
/// not revert stock movements already written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelDocumentCommand {
    pub document_id: Uuid,
    pub reason: Option<String>,
}

#[async_trait::async_trait]
impl Command for CancelDocumentCommand {
    type Result = inventory_document::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(document_id = %self.document_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = db_pool.as_ref();
        let document = load_document(db, self.document_id).await?;

        if !document.status.can_transition_to(DocumentStatus::Cancelled) {
            DOCUMENT_CANCELLATION_FAILURES.inc();
            return Err(ServiceError::InvalidOperation(format!(
                "Document {} is {} and cannot be cancelled",
                document.document_number, document.status
            )));
        }

        let notes = match (&document.notes, &self.reason) {
            (Some(notes), Some(reason)) => Some(format!("{}\nCancelled: {}", notes, reason)),
            (None, Some(reason)) => Some(format!("Cancelled: {}", reason)),
            (notes, None) => notes.clone(),
        };

        let mut active = document.into_active_model();
        active.status = Set(DocumentStatus::Cancelled);
        active.notes = Set(notes);
        active.updated_at = Set(Utc::now());

        let cancelled = active.update(db).await.map_err(|e| {
            DOCUMENT_CANCELLATION_FAILURES.inc();
            error!("Failed to cancel document {}: {}", self.document_id, e);
            ServiceError::DatabaseError(e)
        })?;

        info!(document_number = %cancelled.document_number, "Inventory document cancelled");

        event_sender
            .send(Event::DocumentCancelled(cancelled.id))
            .await
            .map_err(|e| {
                DOCUMENT_CANCELLATION_FAILURES.inc();
                ServiceError::EventError(format!("Failed to send cancellation event: {}", e))
            })?;

        DOCUMENT_CANCELLATIONS.inc();

        Ok(cancelled)
    }
}
