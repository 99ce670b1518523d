use crate::{
    commands::{documents::load_document, Command},
    db::DbPool,
    entities::inventory_document::{self, validate_signature_blob},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};
use sea_orm::{Set, *};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

lazy_static! {
    static ref DOCUMENT_UPDATES: IntCounter = register_int_counter!(
        "inventory_document_updates_total",
        "Total number of inventory document header updates"
    )
    .expect("metric can be created");
    static ref DOCUMENT_UPDATE_FAILURES: IntCounter = register_int_counter!(
        "inventory_document_update_failures_total",
        "Total number of failed inventory document header updates"
    )
    .expect("metric can be created");
}

/// Header update on a draft document. Absent fields are left untouched;
/// confirmed and cancelled documents reject all edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDocumentCommand {
    pub document_id: Uuid,
    pub document_date: Option<NaiveDate>,
    pub warehouse_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub delivered_by_name: Option<String>,
    pub delivered_by_signature: Option<String>,
    pub received_by_name: Option<String>,
    pub received_by_signature: Option<String>,
    pub notes: Option<String>,
}

#[async_trait::async_trait]
impl Command for UpdateDocumentCommand {
    type Result = inventory_document::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(document_id = %self.document_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        for blob in [&self.delivered_by_signature, &self.received_by_signature]
            .into_iter()
            .flatten()
        {
            if !validate_signature_blob(blob) {
                DOCUMENT_UPDATE_FAILURES.inc();
                return Err(ServiceError::ValidationError(
                    "Signature image must be a non-empty base64 payload".to_string(),
                ));
            }
        }

        let db = db_pool.as_ref();
        let document = load_document(db, self.document_id).await?;

        if !document.is_editable() {
            DOCUMENT_UPDATE_FAILURES.inc();
            return Err(ServiceError::InvalidOperation(format!(
                "Document {} is {} and cannot be edited",
                document.document_number, document.status
            )));
        }

        let mut active = document.into_active_model();
        if let Some(date) = self.document_date {
            active.document_date = Set(date);
        }
        if let Some(warehouse_id) = self.warehouse_id {
            active.warehouse_id = Set(Some(warehouse_id));
        }
        if let Some(event_id) = self.event_id {
            active.event_id = Set(Some(event_id));
        }
        if let Some(name) = &self.delivered_by_name {
            active.delivered_by_name = Set(Some(name.clone()));
        }
        if let Some(blob) = &self.delivered_by_signature {
            active.delivered_by_signature = Set(Some(blob.clone()));
        }
        if let Some(name) = &self.received_by_name {
            active.received_by_name = Set(Some(name.clone()));
        }
        if let Some(blob) = &self.received_by_signature {
            active.received_by_signature = Set(Some(blob.clone()));
        }
        if let Some(notes) = &self.notes {
            active.notes = Set(Some(notes.clone()));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await.map_err(|e| {
            DOCUMENT_UPDATE_FAILURES.inc();
            error!("Failed to update document {}: {}", self.document_id, e);
            ServiceError::DatabaseError(e)
        })?;

        info!(document_number = %updated.document_number, "Inventory document updated");

        event_sender
            .send(Event::DocumentUpdated(updated.id))
            .await
            .map_err(|e| {
                DOCUMENT_UPDATE_FAILURES.inc();
                ServiceError::EventError(format!("Failed to send document update event: {}", e))
            })?;

        DOCUMENT_UPDATES.inc();

        Ok(updated)
    }
}
