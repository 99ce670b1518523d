use crate::{
    commands::{
        documents::{emit_stock_movements, load_lines},
        Command,
    },
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
    static ref DOCUMENT_CONFIRMATIONS: IntCounter = register_int_counter!(
        "inventory_document_confirmations_total",
        "Total number of inventory documents confirmed"
    )
    .expect("metric can be created");
    static ref DOCUMENT_CONFIRMATION_FAILURES: IntCounter = register_int_counter!(
        "inventory_document_confirmation_failures_total",
        "Total number of failed inventory document confirmations"
    )
    .expect("metric can be created");
    static ref STOCK_MOVEMENTS_EMITTED: IntCounter = register_int_counter!(
        "stock_movements_emitted_total",
        "Total number of stock movements written"
    )
    .expect("metric can be created");
}

/// Confirms a draft document. Requires at least one line and a warehouse.
/// Confirmation succeeds with or without signatures; stock movements are
/// only written when all four signature fields are already populated,
/// otherwise the document stays confirmed and outstanding until
/// [`CompleteSignaturesCommand`] closes the gate.
///
/// [`CompleteSignaturesCommand`]: super::CompleteSignaturesCommand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmDocumentCommand {
    pub document_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmDocumentResult {
    pub document: inventory_document::Model,
    pub movements_emitted: bool,
    pub movement_count: usize,
}

#[async_trait::async_trait]
impl Command for ConfirmDocumentCommand {
    type Result = ConfirmDocumentResult;

    #[instrument(skip(self, db_pool, event_sender), fields(document_id = %self.document_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = db_pool.as_ref();
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

                    if document.status != DocumentStatus::Draft {
                        return Err(ServiceError::InvalidOperation(format!(
                            "Document {} is {} and cannot be confirmed",
                            document.document_number, document.status
                        )));
                    }

                    let lines = load_lines(txn, document_id).await?;
                    if lines.is_empty() {
                        return Err(ServiceError::ValidationError(
                            "Cannot confirm a document with no lines".to_string(),
                        ));
                    }
                    if document.warehouse_id.is_none() {
                        return Err(ServiceError::ValidationError(
                            "Cannot confirm a document without a warehouse".to_string(),
                        ));
                    }

                    let mut active = document.into_active_model();
                    active.status = Set(DocumentStatus::Confirmed);
                    active.updated_at = Set(Utc::now());
                    let confirmed = active
                        .update(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;

                    // Signature gate: movements only flow once both
                    // counterparts have signed.
                    let movement_count = if confirmed.has_complete_signatures() {
                        emit_stock_movements(txn, &confirmed, &lines).await?
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
                DOCUMENT_CONFIRMATION_FAILURES.inc();
                error!("Failed to confirm document {}: {}", document_id, e);
                ServiceError::from(e)
            })?;

        let movements_emitted = movement_count > 0;

        info!(
            document_number = %document.document_number,
            movements_emitted = %movements_emitted,
            movement_count = %movement_count,
            "Inventory document confirmed"
        );

        event_sender
            .send(Event::DocumentConfirmed {
                document_id: document.id,
                movements_emitted,
            })
            .await
            .map_err(|e| {
                ServiceError::EventError(format!("Failed to send confirmation event: {}", e))
            })?;

        if movements_emitted {
            STOCK_MOVEMENTS_EMITTED.inc_by(movement_count as u64);
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

        DOCUMENT_CONFIRMATIONS.inc();

        Ok(ConfirmDocumentResult {
            document,
            movements_emitted,
            movement_count,
        })
    }
}
