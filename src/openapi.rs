use utoipa::OpenApi;

use crate::entities::inventory_document::{DocumentStatus, DocumentType};
use crate::entities::material_movement::MovementType;
use crate::errors::ErrorResponse;
use crate::handlers;

/// OpenAPI component registry for the service. The JSON document is served
/// at `/api-docs/openapi.json`; no UI bundle is embedded.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Almacen API",
        version = "0.1.0",
        description = r#"
# Inventory Document Workflow API

Entrada/salida warehouse documents with a draft/confirmed/cancelled
lifecycle, an add-or-merge line accumulator, a signature gate that defers
stock movements until both counterparts have signed, and event-scoped
material movements (gasto/retorno) with return reconciliation and
IVA-bearing money totals.

## Error Handling

Errors use a consistent format with appropriate HTTP status codes:

```json
{
  "error": "Bad Request",
  "message": "Validation error: quantity must be at least 1",
  "timestamp": "2026-01-01T00:00:00Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20).
        "#
    ),
    servers(
        (url = "http://localhost:8080/api/v1", description = "Local development")
    ),
    tags(
        (name = "Documents", description = "Inventory document lifecycle"),
        (name = "Material Movements", description = "Event-scoped gasto/retorno movements"),
        (name = "Catalog", description = "Warehouses and products")
    ),
    components(schemas(
        DocumentType,
        DocumentStatus,
        MovementType,
        ErrorResponse,
        handlers::documents::CreateDocumentRequest,
        handlers::documents::UpdateDocumentRequest,
        handlers::documents::DocumentLineRequest,
        handlers::documents::UpdateDocumentLineRequest,
        handlers::documents::CancelDocumentRequest,
        handlers::documents::SignaturesRequest,
        handlers::documents::DocumentResponse,
        handlers::documents::DocumentLineResponse,
        handlers::documents::ConfirmDocumentResponse,
        handlers::documents::StockMovementResponse,
        handlers::movements::RecordMovementRequest,
        handlers::movements::MovementLineRequest,
        handlers::movements::AffectInventoryRequest,
        handlers::movements::MovementResponse,
        handlers::movements::MovementLineResponse,
        handlers::movements::RecordMovementResponse,
        handlers::movements::AvailabilityResponse,
        handlers::catalog::CreateWarehouseRequest,
        handlers::catalog::CreateProductRequest,
        handlers::catalog::WarehouseResponse,
        handlers::catalog::ProductResponse,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_serializes() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().expect("openapi document should serialize");
        assert!(json.contains("Inventory Document Workflow"));
        assert!(json.contains("DocumentResponse"));
    }
}
