use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::commands::documents::{
    AddDocumentLineCommand, CompleteSignaturesCommand, CreateDocumentCommand, DocumentLineInput,
    RemoveDocumentLineCommand, UpdateDocumentCommand, UpdateDocumentLineCommand,
};
use crate::entities::{
    inventory_document::{self, DocumentStatus, DocumentType},
    inventory_document_line, stock_movement,
};
use crate::errors::ServiceError;
use crate::services::documents::DocumentFilter;
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DocumentLineRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    pub observation: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDocumentRequest {
    pub document_type: DocumentType,
    pub document_date: NaiveDate,
    pub warehouse_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub notes: Option<String>,
    #[serde(default)]
    pub lines: Vec<DocumentLineRequest>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDocumentRequest {
    pub document_date: Option<NaiveDate>,
    pub warehouse_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub delivered_by_name: Option<String>,
    pub delivered_by_signature: Option<String>,
    pub received_by_name: Option<String>,
    pub received_by_signature: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDocumentLineRequest {
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    pub observation: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelDocumentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignaturesRequest {
    pub delivered_by_name: Option<String>,
    pub delivered_by_signature: Option<String>,
    pub received_by_name: Option<String>,
    pub received_by_signature: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListDocumentsQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub status: Option<DocumentStatus>,
    pub document_type: Option<DocumentType>,
    pub event_id: Option<Uuid>,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub observation: Option<String>,
}

impl From<inventory_document_line::Model> for DocumentLineResponse {
    fn from(line: inventory_document_line::Model) -> Self {
        Self {
            id: line.id,
            product_id: line.product_id,
            quantity: line.quantity,
            observation: line.observation,
        }
    }
}

/// Document payload returned by the API. Signature images stay server-side;
/// callers only see whether the set is complete.
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub document_number: String,
    pub document_type: DocumentType,
    pub document_date: NaiveDate,
    pub warehouse_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub delivered_by_name: Option<String>,
    pub received_by_name: Option<String>,
    pub signatures_complete: bool,
    pub notes: Option<String>,
    pub status: DocumentStatus,
    pub movements_emitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<DocumentLineResponse>>,
}

impl DocumentResponse {
    pub(crate) fn from_model(document: inventory_document::Model) -> Self {
        let signatures_complete = document.has_complete_signatures();
        Self {
            id: document.id,
            document_number: document.document_number,
            document_type: document.document_type,
            document_date: document.document_date,
            warehouse_id: document.warehouse_id,
            event_id: document.event_id,
            delivered_by_name: document.delivered_by_name,
            received_by_name: document.received_by_name,
            signatures_complete,
            notes: document.notes,
            status: document.status,
            movements_emitted_at: document.movements_emitted_at,
            created_at: document.created_at,
            updated_at: document.updated_at,
            lines: None,
        }
    }

    pub(crate) fn with_lines(
        document: inventory_document::Model,
        lines: Vec<inventory_document_line::Model>,
    ) -> Self {
        let mut response = Self::from_model(document);
        response.lines = Some(lines.into_iter().map(DocumentLineResponse::from).collect());
        response
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConfirmDocumentResponse {
    pub document: DocumentResponse,
    pub movements_emitted: bool,
    pub movement_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockMovementResponse {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub product_id: Uuid,
    pub direction: DocumentType,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<stock_movement::Model> for StockMovementResponse {
    fn from(movement: stock_movement::Model) -> Self {
        Self {
            id: movement.id,
            warehouse_id: movement.warehouse_id,
            product_id: movement.product_id,
            direction: movement.direction,
            quantity: movement.quantity,
            created_at: movement.created_at,
        }
    }
}

pub async fn create_document(
    State(state): State<AppState>,
    Json(request): Json<CreateDocumentRequest>,
) -> ApiResult<DocumentResponse> {
    request
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let command = CreateDocumentCommand {
        document_type: request.document_type,
        document_date: request.document_date,
        warehouse_id: request.warehouse_id,
        event_id: request.event_id,
        notes: request.notes,
        lines: request
            .lines
            .into_iter()
            .map(|line| DocumentLineInput {
                product_id: line.product_id,
                quantity: line.quantity,
                observation: line.observation,
            })
            .collect(),
    };

    let result = state.services.documents.create_document(command).await?;
    Ok(Json(ApiResponse::success(DocumentResponse::with_lines(
        result.document,
        result.lines,
    ))))
}

pub async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<ListDocumentsQuery>,
) -> ApiResult<PaginatedResponse<DocumentResponse>> {
    let filter = DocumentFilter {
        status: query.status,
        document_type: query.document_type,
        event_id: query.event_id,
    };
    let (documents, total) = state
        .services
        .documents
        .list_documents(filter, query.page, query.limit)
        .await?;

    let limit = query.limit.max(1);
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: documents
            .into_iter()
            .map(DocumentResponse::from_model)
            .collect(),
        total,
        page: query.page,
        limit,
        total_pages: total.div_ceil(limit),
    })))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<DocumentResponse> {
    let (document, lines) = state.services.documents.get_document(id).await?;
    Ok(Json(ApiResponse::success(DocumentResponse::with_lines(
        document, lines,
    ))))
}

pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDocumentRequest>,
) -> ApiResult<DocumentResponse> {
    let command = UpdateDocumentCommand {
        document_id: id,
        document_date: request.document_date,
        warehouse_id: request.warehouse_id,
        event_id: request.event_id,
        delivered_by_name: request.delivered_by_name,
        delivered_by_signature: request.delivered_by_signature,
        received_by_name: request.received_by_name,
        received_by_signature: request.received_by_signature,
        notes: request.notes,
    };

    let document = state.services.documents.update_document(command).await?;
    Ok(Json(ApiResponse::success(DocumentResponse::from_model(
        document,
    ))))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    state.services.documents.delete_document(id).await?;
    Ok(Json(ApiResponse::success(())))
}

pub async fn add_document_line(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DocumentLineRequest>,
) -> ApiResult<DocumentLineResponse> {
    let command = AddDocumentLineCommand {
        document_id: id,
        product_id: request.product_id,
        quantity: request.quantity,
        observation: request.observation,
    };

    let line = state.services.documents.add_line(command).await?;
    Ok(Json(ApiResponse::success(line.into())))
}

pub async fn update_document_line(
    State(state): State<AppState>,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateDocumentLineRequest>,
) -> ApiResult<DocumentLineResponse> {
    let command = UpdateDocumentLineCommand {
        document_id: id,
        product_id,
        quantity: request.quantity,
        observation: request.observation,
    };

    let line = state.services.documents.update_line(command).await?;
    Ok(Json(ApiResponse::success(line.into())))
}

pub async fn remove_document_line(
    State(state): State<AppState>,
    Path((id, product_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    let command = RemoveDocumentLineCommand {
        document_id: id,
        product_id,
    };
    state.services.documents.remove_line(command).await?;
    Ok(Json(ApiResponse::success(())))
}

pub async fn confirm_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ConfirmDocumentResponse> {
    let result = state.services.documents.confirm_document(id).await?;
    Ok(Json(ApiResponse::success(ConfirmDocumentResponse {
        document: DocumentResponse::from_model(result.document),
        movements_emitted: result.movements_emitted,
        movement_count: result.movement_count,
    })))
}

pub async fn cancel_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<CancelDocumentRequest>>,
) -> ApiResult<DocumentResponse> {
    let reason = body.and_then(|Json(request)| request.reason);
    let document = state.services.documents.cancel_document(id, reason).await?;
    Ok(Json(ApiResponse::success(DocumentResponse::from_model(
        document,
    ))))
}

pub async fn complete_signatures(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SignaturesRequest>,
) -> ApiResult<ConfirmDocumentResponse> {
    let command = CompleteSignaturesCommand {
        document_id: id,
        delivered_by_name: request.delivered_by_name,
        delivered_by_signature: request.delivered_by_signature,
        received_by_name: request.received_by_name,
        received_by_signature: request.received_by_signature,
    };

    let result = state.services.documents.complete_signatures(command).await?;
    Ok(Json(ApiResponse::success(ConfirmDocumentResponse {
        document: DocumentResponse::from_model(result.document),
        movements_emitted: result.movements_emitted,
        movement_count: result.movement_count,
    })))
}

pub async fn get_document_movements(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<StockMovementResponse>> {
    let movements = state.services.documents.document_stock_movements(id).await?;
    Ok(Json(ApiResponse::success(
        movements
            .into_iter()
            .map(StockMovementResponse::from)
            .collect(),
    )))
}
