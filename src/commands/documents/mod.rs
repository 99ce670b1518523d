use crate::{
    entities::{
        document_number_sequence,
        inventory_document::{self, DocumentType},
        inventory_document_line, stock_movement,
    },
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;
use validator::Validate;

pub mod add_document_line_command;
pub mod cancel_document_command;
pub mod complete_signatures_command;
pub mod confirm_document_command;
pub mod create_document_command;
pub mod delete_document_command;
pub mod remove_document_line_command;
pub mod update_document_command;
pub mod update_document_line_command;

pub use add_document_line_command::AddDocumentLineCommand;
pub use cancel_document_command::CancelDocumentCommand;
pub use complete_signatures_command::CompleteSignaturesCommand;
pub use confirm_document_command::ConfirmDocumentCommand;
pub use create_document_command::CreateDocumentCommand;
pub use delete_document_command::DeleteDocumentCommand;
pub use remove_document_line_command::RemoveDocumentLineCommand;
pub use update_document_command::UpdateDocumentCommand;
pub use update_document_line_command::UpdateDocumentLineCommand;

/// Line payload shared by document creation and line addition.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DocumentLineInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    pub observation: Option<String>,
}

/// Allocates the next human-readable document number (`ENT-000001`,
/// `SAL-000042`) from the per-type sequence table. Must run inside the same
/// transaction that inserts the document.
pub(crate) async fn allocate_document_number<C: ConnectionTrait>(
    txn: &C,
    document_type: DocumentType,
) -> Result<String, ServiceError> {
    let key = document_type.to_string();

    let current = document_number_sequence::Entity::find_by_id(key.clone())
        .one(txn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    let value = match current {
        Some(row) => {
            let value = row.next_value;
            let mut active = row.into_active_model();
            active.next_value = Set(value + 1);
            active
                .update(txn)
                .await
                .map_err(ServiceError::DatabaseError)?;
            value
        }
        None => {
            let seed = document_number_sequence::ActiveModel {
                document_type: Set(key),
                next_value: Set(2),
            };
            document_number_sequence::Entity::insert(seed)
                .exec(txn)
                .await
                .map_err(ServiceError::DatabaseError)?;
            1
        }
    };

    Ok(format!("{}-{:06}", document_type.number_prefix(), value))
}

/// Loads a document or surfaces a 404.
pub(crate) async fn load_document<C: ConnectionTrait>(
    db: &C,
    document_id: Uuid,
) -> Result<inventory_document::Model, ServiceError> {
    inventory_document::Entity::find_by_id(document_id)
        .one(db)
        .await
        .map_err(ServiceError::DatabaseError)?
        .ok_or_else(|| ServiceError::NotFound(format!("Document {} not found", document_id)))
}

/// Writes one stock movement per document line and stamps
/// `movements_emitted_at`. Callers must hold the signature gate open: the
/// document is confirmed and all four signature fields are populated.
pub(crate) async fn emit_stock_movements<C: ConnectionTrait>(
    txn: &C,
    document: &inventory_document::Model,
    lines: &[inventory_document_line::Model],
) -> Result<usize, ServiceError> {
    let warehouse_id = document.warehouse_id.ok_or_else(|| {
        ServiceError::InvalidOperation("Document has no warehouse selected".to_string())
    })?;

    for line in lines {
        let movement = stock_movement::Model::for_line(document, warehouse_id, line);
        movement
            .into_active_model()
            .insert(txn)
            .await
            .map_err(|e| {
                error!("Failed to insert stock movement for document {}: {}", document.id, e);
                ServiceError::DatabaseError(e)
            })?;
    }

    let mut active = document.clone().into_active_model();
    active.movements_emitted_at = Set(Some(Utc::now()));
    active.updated_at = Set(Utc::now());
    active
        .update(txn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    Ok(lines.len())
}

/// Lines of a document, ordered by insertion id for stable output.
pub(crate) async fn load_lines<C: ConnectionTrait>(
    db: &C,
    document_id: Uuid,
) -> Result<Vec<inventory_document_line::Model>, ServiceError> {
    inventory_document_line::Entity::find()
        .filter(inventory_document_line::Column::DocumentId.eq(document_id))
        .all(db)
        .await
        .map_err(ServiceError::DatabaseError)
}
