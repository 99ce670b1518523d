use crate::{
    commands::{
        documents::{allocate_document_number, DocumentLineInput},
        Command,
    },
    db::DbPool,
    entities::{
        inventory_document::{self, DocumentStatus, DocumentType},
        inventory_document_line::{self, merge_line_draft, LineDraft},
    },
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
use validator::Validate;

lazy_static! {
    static ref DOCUMENT_CREATIONS: IntCounter = register_int_counter!(
        "inventory_document_creations_total",
        "Total number of inventory documents created"
    )
    .expect("metric can be created");
    static ref DOCUMENT_CREATION_FAILURES: IntCounter = register_int_counter!(
        "inventory_document_creation_failures_total",
        "Total number of failed inventory document creations"
    )
    .expect("metric can be created");
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDocumentCommand {
    pub document_type: DocumentType,
    pub document_date: NaiveDate,
    pub warehouse_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub notes: Option<String>,
    /// Initial lines; duplicate products are merged into one line.
    #[serde(default)]
    pub lines: Vec<DocumentLineInput>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateDocumentResult {
    pub document: inventory_document::Model,
    pub lines: Vec<inventory_document_line::Model>,
}

#[async_trait::async_trait]
impl Command for CreateDocumentCommand {
    type Result = CreateDocumentResult;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            DOCUMENT_CREATION_FAILURES.inc();
            let msg = format!("Invalid input: {}", e);
            error!("{}", msg);
            ServiceError::ValidationError(msg)
        })?;
        for line in &self.lines {
            line.validate().map_err(|e| {
                DOCUMENT_CREATION_FAILURES.inc();
                ServiceError::ValidationError(format!("Invalid line: {}", e))
            })?;
        }

        let db = db_pool.as_ref();
        let (document, lines) = self.create_document(db).await?;

        info!(
            document_id = %document.id,
            document_number = %document.document_number,
            document_type = %document.document_type,
            line_count = %lines.len(),
            "Inventory document created"
        );

        event_sender
            .send(Event::DocumentCreated {
                document_id: document.id,
                document_number: document.document_number.clone(),
            })
            .await
            .map_err(|e| {
                DOCUMENT_CREATION_FAILURES.inc();
                let msg = format!("Failed to send event for created document: {}", e);
                error!("{}", msg);
                ServiceError::EventError(msg)
            })?;

        DOCUMENT_CREATIONS.inc();

        Ok(CreateDocumentResult { document, lines })
    }
}

impl CreateDocumentCommand {
    async fn create_document(
        &self,
        db: &DatabaseConnection,
    ) -> Result<
        (
            inventory_document::Model,
            Vec<inventory_document_line::Model>,
        ),
        ServiceError,
    > {
        let command = self.clone();

        db.transaction::<_, (inventory_document::Model, Vec<inventory_document_line::Model>), ServiceError>(
            move |txn| {
                Box::pin(async move {
                    let document_number =
                        allocate_document_number(txn, command.document_type).await?;

                    let now = Utc::now();
                    let document = inventory_document::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        document_number: Set(document_number),
                        document_type: Set(command.document_type),
                        document_date: Set(command.document_date),
                        warehouse_id: Set(command.warehouse_id),
                        event_id: Set(command.event_id),
                        delivered_by_name: Set(None),
                        delivered_by_signature: Set(None),
                        received_by_name: Set(None),
                        received_by_signature: Set(None),
                        notes: Set(command.notes.clone()),
                        status: Set(DocumentStatus::Draft),
                        movements_emitted_at: Set(None),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(|e| {
                        error!("Failed to insert inventory document: {}", e);
                        ServiceError::DatabaseError(e)
                    })?;

                    let mut drafts: Vec<LineDraft> = Vec::new();
                    for input in &command.lines {
                        merge_line_draft(
                            &mut drafts,
                            input.product_id,
                            input.quantity,
                            input.observation.clone(),
                        );
                    }

                    let mut lines = Vec::with_capacity(drafts.len());
                    for draft in drafts {
                        let line = inventory_document_line::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            document_id: Set(document.id),
                            product_id: Set(draft.product_id),
                            quantity: Set(draft.quantity),
                            observation: Set(draft.observation),
                        }
                        .insert(txn)
                        .await
                        .map_err(|e| {
                            error!(
                                "Failed to insert line for document {}: {}",
                                document.id, e
                            );
                            ServiceError::DatabaseError(e)
                        })?;
                        lines.push(line);
                    }

                    Ok((document, lines))
                })
            },
        )
        .await
        .map_err(ServiceError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_payload_merges_duplicate_products() {
        let product = Uuid::new_v4();
        let command = CreateDocumentCommand {
            document_type: DocumentType::Entrada,
            document_date: NaiveDate::from_ymd_opt(2026, 5, 2).unwrap(),
            warehouse_id: None,
            event_id: None,
            notes: None,
            lines: vec![
                DocumentLineInput {
                    product_id: product,
                    quantity: 2,
                    observation: None,
                },
                DocumentLineInput {
                    product_id: product,
                    quantity: 3,
                    observation: None,
                },
            ],
        };

        let mut drafts = Vec::new();
        for input in &command.lines {
            merge_line_draft(
                &mut drafts,
                input.product_id,
                input.quantity,
                input.observation.clone(),
            );
        }
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].quantity, 5);
    }

    #[test]
    fn zero_quantity_line_fails_validation() {
        let line = DocumentLineInput {
            product_id: Uuid::new_v4(),
            quantity: 0,
            observation: None,
        };
        assert!(line.validate().is_err());

        let line = DocumentLineInput {
            product_id: Uuid::new_v4(),
            quantity: 1,
            observation: None,
        };
        assert!(line.validate().is_ok());
    }
}
