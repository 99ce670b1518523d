use crate::{
    commands::{
        documents::{
            complete_signatures_command::CompleteSignaturesResult,
            confirm_document_command::ConfirmDocumentResult,
            create_document_command::CreateDocumentResult, AddDocumentLineCommand,
            CancelDocumentCommand, CompleteSignaturesCommand, ConfirmDocumentCommand,
            CreateDocumentCommand, DeleteDocumentCommand, RemoveDocumentLineCommand,
            UpdateDocumentCommand, UpdateDocumentLineCommand,
        },
        Command,
    },
    db::DbPool,
    entities::{
        inventory_document::{self, DocumentStatus, DocumentType},
        inventory_document_line, stock_movement,
    },
    errors::ServiceError,
    events::EventSender,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use uuid::Uuid;

/// Filters accepted by the document list query.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub status: Option<DocumentStatus>,
    pub document_type: Option<DocumentType>,
    pub event_id: Option<Uuid>,
}

/// Service for the inventory document lifecycle. Mutations go through
/// commands; reads query the entities directly.
#[derive(Clone)]
pub struct DocumentService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl DocumentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    pub async fn create_document(
        &self,
        command: CreateDocumentCommand,
    ) -> Result<CreateDocumentResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn update_document(
        &self,
        command: UpdateDocumentCommand,
    ) -> Result<inventory_document::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn add_line(
        &self,
        command: AddDocumentLineCommand,
    ) -> Result<inventory_document_line::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn update_line(
        &self,
        command: UpdateDocumentLineCommand,
    ) -> Result<inventory_document_line::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn remove_line(&self, command: RemoveDocumentLineCommand) -> Result<(), ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn confirm_document(
        &self,
        document_id: Uuid,
    ) -> Result<ConfirmDocumentResult, ServiceError> {
        ConfirmDocumentCommand { document_id }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn complete_signatures(
        &self,
        command: CompleteSignaturesCommand,
    ) -> Result<CompleteSignaturesResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn cancel_document(
        &self,
        document_id: Uuid,
        reason: Option<String>,
    ) -> Result<inventory_document::Model, ServiceError> {
        CancelDocumentCommand {
            document_id,
            reason,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    pub async fn delete_document(&self, document_id: Uuid) -> Result<(), ServiceError> {
        DeleteDocumentCommand { document_id }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    pub async fn get_document(
        &self,
        document_id: Uuid,
    ) -> Result<
        (
            inventory_document::Model,
            Vec<inventory_document_line::Model>,
        ),
        ServiceError,
    > {
        let document = inventory_document::Entity::find_by_id(document_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Document {} not found", document_id))
            })?;

        let lines = inventory_document_line::Entity::find()
            .filter(inventory_document_line::Column::DocumentId.eq(document_id))
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((document, lines))
    }

    pub async fn list_documents(
        &self,
        filter: DocumentFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<inventory_document::Model>, u64), ServiceError> {
        let mut query = inventory_document::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(inventory_document::Column::Status.eq(status));
        }
        if let Some(document_type) = filter.document_type {
            query = query.filter(inventory_document::Column::DocumentType.eq(document_type));
        }
        if let Some(event_id) = filter.event_id {
            query = query.filter(inventory_document::Column::EventId.eq(event_id));
        }

        let paginator = query
            .order_by_desc(inventory_document::Column::CreatedAt)
            .paginate(&*self.db_pool, per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let documents = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((documents, total))
    }

    /// Stock movements generated by a document (empty while the signature
    /// gate is still open).
    pub async fn document_stock_movements(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        // Surface a 404 for unknown documents rather than an empty list.
        inventory_document::Entity::find_by_id(document_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Document {} not found", document_id))
            })?;

        stock_movement::Entity::find()
            .filter(stock_movement::Column::DocumentId.eq(document_id))
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
