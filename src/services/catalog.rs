use crate::{
    db::DbPool,
    entities::{product, warehouse},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Thin catalog service: warehouses and products exist so documents and
/// movements have real targets to reference.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn create_warehouse(
        &self,
        code: String,
        name: String,
    ) -> Result<warehouse::Model, ServiceError> {
        if code.trim().is_empty() || name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Warehouse code and name are required".to_string(),
            ));
        }

        let existing = warehouse::Entity::find()
            .filter(warehouse::Column::Code.eq(code.clone()))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Warehouse code {} already exists",
                code
            )));
        }

        let created = warehouse::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            name: Set(name),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::DatabaseError)?;

        info!(warehouse_id = %created.id, code = %created.code, "Warehouse created");
        Ok(created)
    }

    pub async fn list_warehouses(&self) -> Result<Vec<warehouse::Model>, ServiceError> {
        warehouse::Entity::find()
            .order_by_asc(warehouse::Column::Code)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        sku: String,
        name: String,
    ) -> Result<product::Model, ServiceError> {
        if sku.trim().is_empty() || name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Product sku and name are required".to_string(),
            ));
        }

        let existing = product::Entity::find()
            .filter(product::Column::Sku.eq(sku.clone()))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Product sku {} already exists",
                sku
            )));
        }

        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(sku),
            name: Set(name),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::DatabaseError)?;

        info!(product_id = %created.id, sku = %created.sku, "Product created");
        Ok(created)
    }

    pub async fn list_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        product::Entity::find()
            .order_by_asc(product::Column::Sku)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
