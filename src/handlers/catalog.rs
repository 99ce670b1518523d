use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{product, warehouse};
use crate::errors::ServiceError;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateWarehouseRequest {
    #[validate(length(min = 1, message = "code is required"))]
    pub code: String,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "sku is required"))]
    pub sku: String,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WarehouseResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<warehouse::Model> for WarehouseResponse {
    fn from(warehouse: warehouse::Model) -> Self {
        Self {
            id: warehouse.id,
            code: warehouse.code,
            name: warehouse.name,
            created_at: warehouse.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<product::Model> for ProductResponse {
    fn from(product: product::Model) -> Self {
        Self {
            id: product.id,
            sku: product.sku,
            name: product.name,
            created_at: product.created_at,
        }
    }
}

pub async fn create_warehouse(
    State(state): State<AppState>,
    Json(request): Json<CreateWarehouseRequest>,
) -> ApiResult<WarehouseResponse> {
    request
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let warehouse = state
        .services
        .catalog
        .create_warehouse(request.code, request.name)
        .await?;
    Ok(Json(ApiResponse::success(warehouse.into())))
}

pub async fn list_warehouses(State(state): State<AppState>) -> ApiResult<Vec<WarehouseResponse>> {
    let warehouses = state.services.catalog.list_warehouses().await?;
    Ok(Json(ApiResponse::success(
        warehouses.into_iter().map(WarehouseResponse::from).collect(),
    )))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> ApiResult<ProductResponse> {
    request
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let product = state
        .services
        .catalog
        .create_product(request.sku, request.name)
        .await?;
    Ok(Json(ApiResponse::success(product.into())))
}

pub async fn list_products(State(state): State<AppState>) -> ApiResult<Vec<ProductResponse>> {
    let products = state.services.catalog.list_products().await?;
    Ok(Json(ApiResponse::success(
        products.into_iter().map(ProductResponse::from).collect(),
    )))
}
