use crate::{
    commands::{
        documents::{emit_stock_movements, load_lines},
        Command,
    },
    db::DbPool,
    entities::inventory_document::{self, validate_signature_blob, DocumentStatus},
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
    static ref SIGNATURE_COMPLETIONS: IntCounter = register_int_counter!(
        "inventory_document_signature_completions_total",
        "Total number of documents whose signatures were completed"
    )
    .expect("metric can be created");
    static ref SIGNATURE_COMPLETION_FAILURES: IntCounter = register_int_counter!(
        "inventory_document_signature_completion_failures_total",
        "Total number of failed signature completions"
    )
    .expect("metric can be created");
}

/// Fills in counterpart names and signature images on a draft or confirmed
/// document. If the document is confirmed, still outstanding, and the
/// signatures become complete, the deferred stock movements are written here
/// (exactly once; `movements_emitted_at` guards replays).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteSignaturesCommand {
    pub document_id: Uuid,
    pub delivered_by_name: Option<String>,
    pub delivered_by_signature: Option<String>,
    pub received_by_name: Option<String>,
    pub received_by_signature: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteSignaturesResult {
    pub document: inventory_document::Model,
    pub signatures_complete: bool,
    pub movements_emitted: bool,
    pub movement_count: usize,
}

#[async_trait::async_trait]
impl Command for CompleteSignaturesCommand {
    type Result = CompleteSignaturesResult;

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
                SIGNATURE_COMPLETION_FAILURES.inc();
                return Err(ServiceError::ValidationError(
                    "Signature image must be a non-empty base64 payload".to_string(),
                ));
            }
        }

        let db = db_pool.as_ref();
        let command = self.clone();
        let document_id = self.document_id;

        let (document, movement_count) = db
            .transaction::<_, (inventory_document::Model, usize), ServiceError>(move |txn| {
                Box::pin(async move {
                    let document = inventory_document::Entity::find_by_id(document_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Document {} not found", document_id))
                        })?;

                    if document.status == DocumentStatus::Cancelled {
                        return Err(ServiceError::InvalidOperation(format!(
                            "Document {} is cancelled and cannot receive signatures",
                            document.document_number
                        )));
                    }

                    let mut active = document.clone().into_active_model();
                    if let Some(name) = &command.delivered_by_name {
                        active.delivered_by_name = Set(Some(name.clone()));
                    }
                    if let Some(blob) = &command.delivered_by_signature {
                        active.delivered_by_signature = Set(Some(blob.clone()));
                    }
                    if let Some(name) = &command.received_by_name {
                        active.received_by_name = Set(Some(name.clone()));
                    }
                    if let Some(blob) = &command.received_by_signature {
                        active.received_by_signature = Set(Some(blob.clone()));
                    }
                    active.updated_at = Set(Utc::now());

                    let signed = active
                        .update(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;

                    let due = signed.status == DocumentStatus::Confirmed
                        && !signed.movements_emitted()
                        && signed.has_complete_signatures();

                    let movement_count = if due {
                        let lines = load_lines(txn, document_id).await?;
                        emit_stock_movements(txn, &signed, &lines).await?
                    } else {
                        0
                    };

                    let document = inventory_document::Entity::find_by_id(document_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Document {} not found", document_id))
                        })?;

                    Ok((document, movement_count))
                })
            })
            .await
            .map_err(|e| {
                SIGNATURE_COMPLETION_FAILURES.inc();
                error!("Failed to complete signatures for {}: {}", document_id, e);
                ServiceError::from(e)
            })?;

        let signatures_complete = document.has_complete_signatures();
        let movements_emitted = movement_count > 0;

        info!(
            document_number = %document.document_number,
            signatures_complete = %signatures_complete,
            movements_emitted = %movements_emitted,
            "Document signatures updated"
        );

        if signatures_complete {
            event_sender
                .send(Event::SignaturesCompleted(document.id))
                .await
                .map_err(|e| {
                    ServiceError::EventError(format!("Failed to send signatures event: {}", e))
                })?;
        }
        if movements_emitted {
            event_sender
                .send(Event::StockMovementsEmitted {
                    document_id: document.id,
                    movement_count,
                })
                .await
                .map_err(|e| {
                    ServiceError::EventError(format!("Failed to send movements event: {}", e))
                })?;
        }

        SIGNATURE_COMPLETIONS.inc();

        Ok(CompleteSignaturesResult {
            document,
            signatures_complete,
            movements_emitted,
            movement_count,
        })
    }
}
