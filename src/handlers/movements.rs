use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::commands::movements::record_material_movement_command::{
    AffectInventoryInput, MovementLineInput,
};
use crate::entities::{
    material_movement::{self, MovementType},
    material_movement_line,
};
use crate::errors::ServiceError;
use crate::handlers::documents::DocumentResponse;
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct MovementLineRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    pub unit_cost: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AffectInventoryRequest {
    pub warehouse_id: Uuid,
    pub delivered_by_name: Option<String>,
    pub delivered_by_signature: Option<String>,
    pub received_by_name: Option<String>,
    pub received_by_signature: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordMovementRequest {
    pub event_id: Uuid,
    pub movement_type: MovementType,
    pub category: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "At least one line is required"))]
    pub lines: Vec<MovementLineRequest>,
    pub affect_inventory: Option<AffectInventoryRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListMovementsQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub event_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AvailabilityQuery {
    pub event_id: Uuid,
    pub product_id: Uuid,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovementLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_cost: Decimal,
}

impl From<material_movement_line::Model> for MovementLineResponse {
    fn from(line: material_movement_line::Model) -> Self {
        Self {
            id: line.id,
            product_id: line.product_id,
            quantity: line.quantity,
            unit_cost: line.unit_cost,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovementResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub movement_type: MovementType,
    pub category: Option<String>,
    pub subtotal: Decimal,
    pub iva: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub inventory_document_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<MovementLineResponse>>,
}

impl MovementResponse {
    fn from_model(movement: material_movement::Model) -> Self {
        Self {
            id: movement.id,
            event_id: movement.event_id,
            movement_type: movement.movement_type,
            category: movement.category,
            subtotal: movement.subtotal,
            iva: movement.iva,
            total: movement.total,
            notes: movement.notes,
            inventory_document_id: movement.inventory_document_id,
            created_at: movement.created_at,
            lines: None,
        }
    }

    fn with_lines(
        movement: material_movement::Model,
        lines: Vec<material_movement_line::Model>,
    ) -> Self {
        let mut response = Self::from_model(movement);
        response.lines = Some(lines.into_iter().map(MovementLineResponse::from).collect());
        response
    }
}

/// Recording succeeded; `warnings` is non-empty when the optional
/// affect-inventory document could not be generated.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordMovementResponse {
    pub movement: MovementResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_document: Option<DocumentResponse>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub event_id: Uuid,
    pub product_id: Uuid,
    pub available_for_return: i64,
}

pub async fn record_movement(
    State(state): State<AppState>,
    Json(request): Json<RecordMovementRequest>,
) -> ApiResult<RecordMovementResponse> {
    request
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let lines = request
        .lines
        .into_iter()
        .map(|line| MovementLineInput {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_cost: line.unit_cost,
        })
        .collect();

    let affect_inventory = request.affect_inventory.map(|affect| AffectInventoryInput {
        warehouse_id: affect.warehouse_id,
        delivered_by_name: affect.delivered_by_name,
        delivered_by_signature: affect.delivered_by_signature,
        received_by_name: affect.received_by_name,
        received_by_signature: affect.received_by_signature,
    });

    let result = state
        .services
        .movements
        .record_movement(
            request.event_id,
            request.movement_type,
            request.category,
            request.notes,
            lines,
            affect_inventory,
        )
        .await?;

    Ok(Json(ApiResponse::success(RecordMovementResponse {
        movement: MovementResponse::with_lines(result.movement, result.lines),
        inventory_document: result.inventory_document.map(DocumentResponse::from_model),
        warnings: result.warnings,
    })))
}

pub async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<ListMovementsQuery>,
) -> ApiResult<PaginatedResponse<MovementResponse>> {
    let (movements, total) = state
        .services
        .movements
        .list_movements(query.event_id, query.movement_type, query.page, query.limit)
        .await?;

    let limit = query.limit.max(1);
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: movements
            .into_iter()
            .map(MovementResponse::from_model)
            .collect(),
        total,
        page: query.page,
        limit,
        total_pages: total.div_ceil(limit),
    })))
}

pub async fn get_movement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<MovementResponse> {
    let (movement, lines) = state.services.movements.get_movement(id).await?;
    Ok(Json(ApiResponse::success(MovementResponse::with_lines(
        movement, lines,
    ))))
}

pub async fn get_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<AvailabilityResponse> {
    let available = state
        .services
        .movements
        .available_for_return(query.event_id, query.product_id)
        .await?;

    Ok(Json(ApiResponse::success(AvailabilityResponse {
        event_id: query.event_id,
        product_id: query.product_id,
        available_for_return: available,
    })))
}
