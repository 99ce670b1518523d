mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use almacen_api::commands::documents::{
    AddDocumentLineCommand, CompleteSignaturesCommand, CreateDocumentCommand, DocumentLineInput,
    UpdateDocumentCommand, UpdateDocumentLineCommand,
};
use almacen_api::entities::{
    inventory_document::{DocumentStatus, DocumentType},
    stock_movement,
};
use almacen_api::errors::ServiceError;

use common::{TestContext, SIGNATURE_BLOB};

fn document_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

fn create_command(
    document_type: DocumentType,
    warehouse_id: Option<Uuid>,
    lines: Vec<DocumentLineInput>,
) -> CreateDocumentCommand {
    CreateDocumentCommand {
        document_type,
        document_date: document_date(),
        warehouse_id,
        event_id: None,
        notes: None,
        lines,
    }
}

fn line(product_id: Uuid, quantity: i32) -> DocumentLineInput {
    DocumentLineInput {
        product_id,
        quantity,
        observation: None,
    }
}

fn signatures(document_id: Uuid) -> CompleteSignaturesCommand {
    CompleteSignaturesCommand {
        document_id,
        delivered_by_name: Some("Ana Torres".into()),
        delivered_by_signature: Some(SIGNATURE_BLOB.into()),
        received_by_name: Some("Luis Mena".into()),
        received_by_signature: Some(SIGNATURE_BLOB.into()),
    }
}

#[tokio::test]
async fn empty_document_cannot_confirm() {
    let ctx = TestContext::new().await;
    let warehouse = ctx.seed_warehouse("ALM-01").await;

    let created = ctx
        .documents
        .create_document(create_command(
            DocumentType::Salida,
            Some(warehouse.id),
            vec![],
        ))
        .await
        .unwrap();

    let err = ctx
        .documents
        .confirm_document(created.document.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn document_without_warehouse_cannot_confirm() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("SKU-1").await;

    let created = ctx
        .documents
        .create_document(create_command(
            DocumentType::Salida,
            None,
            vec![line(product.id, 1)],
        ))
        .await
        .unwrap();

    let err = ctx
        .documents
        .confirm_document(created.document.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn repeated_product_additions_merge_into_one_line() {
    let ctx = TestContext::new().await;
    let warehouse = ctx.seed_warehouse("ALM-01").await;
    let product = ctx.seed_product("SKU-A").await;

    let created = ctx
        .documents
        .create_document(create_command(
            DocumentType::Salida,
            Some(warehouse.id),
            vec![line(product.id, 2)],
        ))
        .await
        .unwrap();
    let document_id = created.document.id;

    ctx.documents
        .add_line(AddDocumentLineCommand {
            document_id,
            product_id: product.id,
            quantity: 3,
            observation: None,
        })
        .await
        .unwrap();

    let (_, lines) = ctx.documents.get_document(document_id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 5);
}

#[tokio::test]
async fn confirm_with_signatures_emits_one_movement_per_line() {
    let ctx = TestContext::new().await;
    let warehouse = ctx.seed_warehouse("ALM-01").await;
    let product = ctx.seed_product("SKU-A").await;

    let created = ctx
        .documents
        .create_document(create_command(
            DocumentType::Salida,
            Some(warehouse.id),
            vec![line(product.id, 2), line(product.id, 3)],
        ))
        .await
        .unwrap();
    let document_id = created.document.id;

    ctx.documents
        .complete_signatures(signatures(document_id))
        .await
        .unwrap();

    let result = ctx.documents.confirm_document(document_id).await.unwrap();
    assert_eq!(result.document.status, DocumentStatus::Confirmed);
    assert!(result.movements_emitted);
    assert_eq!(result.movement_count, 1);

    let movements = ctx
        .documents
        .document_stock_movements(document_id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].quantity, 5);
    assert_eq!(movements[0].direction, DocumentType::Salida);
    assert_eq!(movements[0].warehouse_id, warehouse.id);
}

#[tokio::test]
async fn confirm_without_signatures_defers_movements() {
    let ctx = TestContext::new().await;
    let warehouse = ctx.seed_warehouse("ALM-01").await;
    let product = ctx.seed_product("SKU-A").await;

    let created = ctx
        .documents
        .create_document(create_command(
            DocumentType::Entrada,
            Some(warehouse.id),
            vec![line(product.id, 4)],
        ))
        .await
        .unwrap();
    let document_id = created.document.id;

    let result = ctx.documents.confirm_document(document_id).await.unwrap();
    assert_eq!(result.document.status, DocumentStatus::Confirmed);
    assert!(!result.movements_emitted);
    assert!(result.document.movements_emitted_at.is_none());

    let movements = ctx
        .documents
        .document_stock_movements(document_id)
        .await
        .unwrap();
    assert!(movements.is_empty());

    // Completing the signatures later closes the gate exactly once.
    let completed = ctx
        .documents
        .complete_signatures(signatures(document_id))
        .await
        .unwrap();
    assert!(completed.signatures_complete);
    assert!(completed.movements_emitted);
    assert_eq!(completed.movement_count, 1);

    let replay = ctx
        .documents
        .complete_signatures(signatures(document_id))
        .await
        .unwrap();
    assert!(!replay.movements_emitted);

    let movements = stock_movement::Entity::find()
        .filter(stock_movement::Column::DocumentId.eq(document_id))
        .all(&*ctx.db)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].direction, DocumentType::Entrada);
}

#[tokio::test]
async fn confirmed_document_rejects_edits_and_second_confirm() {
    let ctx = TestContext::new().await;
    let warehouse = ctx.seed_warehouse("ALM-01").await;
    let product = ctx.seed_product("SKU-A").await;

    let created = ctx
        .documents
        .create_document(create_command(
            DocumentType::Salida,
            Some(warehouse.id),
            vec![line(product.id, 1)],
        ))
        .await
        .unwrap();
    let document_id = created.document.id;
    ctx.documents.confirm_document(document_id).await.unwrap();

    let err = ctx
        .documents
        .confirm_document(document_id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));

    let err = ctx
        .documents
        .update_document(UpdateDocumentCommand {
            document_id,
            document_date: Some(document_date()),
            warehouse_id: None,
            event_id: None,
            delivered_by_name: None,
            delivered_by_signature: None,
            received_by_name: None,
            received_by_signature: None,
            notes: Some("late edit".into()),
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));

    let err = ctx
        .documents
        .add_line(AddDocumentLineCommand {
            document_id,
            product_id: product.id,
            quantity: 1,
            observation: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn line_overwrite_below_one_is_rejected_not_clamped() {
    let ctx = TestContext::new().await;
    let warehouse = ctx.seed_warehouse("ALM-01").await;
    let product = ctx.seed_product("SKU-A").await;

    let created = ctx
        .documents
        .create_document(create_command(
            DocumentType::Salida,
            Some(warehouse.id),
            vec![line(product.id, 5)],
        ))
        .await
        .unwrap();
    let document_id = created.document.id;

    let err = ctx
        .documents
        .update_line(UpdateDocumentLineCommand {
            document_id,
            product_id: product.id,
            quantity: 0,
            observation: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // Merge path clamps instead.
    let merged = ctx
        .documents
        .add_line(AddDocumentLineCommand {
            document_id,
            product_id: product.id,
            quantity: -100,
            observation: None,
        })
        .await
        .unwrap();
    assert_eq!(merged.quantity, 1);
}

#[tokio::test]
async fn negative_merge_delta_clamps_at_one() {
    let ctx = TestContext::new().await;
    let warehouse = ctx.seed_warehouse("ALM-01").await;
    let product = ctx.seed_product("SKU-A").await;

    let created = ctx
        .documents
        .create_document(create_command(
            DocumentType::Salida,
            Some(warehouse.id),
            vec![line(product.id, 5)],
        ))
        .await
        .unwrap();
    let document_id = created.document.id;

    ctx.documents
        .add_line(AddDocumentLineCommand {
            document_id,
            product_id: product.id,
            quantity: 3,
            observation: None,
        })
        .await
        .unwrap();

    let (_, lines) = ctx.documents.get_document(document_id).await.unwrap();
    assert_eq!(lines[0].quantity, 8);
}

#[tokio::test]
async fn cancellation_is_terminal_and_keeps_movements() {
    let ctx = TestContext::new().await;
    let warehouse = ctx.seed_warehouse("ALM-01").await;
    let product = ctx.seed_product("SKU-A").await;

    let created = ctx
        .documents
        .create_document(create_command(
            DocumentType::Salida,
            Some(warehouse.id),
            vec![line(product.id, 2)],
        ))
        .await
        .unwrap();
    let document_id = created.document.id;

    ctx.documents
        .complete_signatures(signatures(document_id))
        .await
        .unwrap();
    ctx.documents.confirm_document(document_id).await.unwrap();

    let cancelled = ctx
        .documents
        .cancel_document(document_id, Some("wrong warehouse".into()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, DocumentStatus::Cancelled);

    // Stock effects are never reverted.
    let movements = ctx
        .documents
        .document_stock_movements(document_id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);

    let err = ctx
        .documents
        .cancel_document(document_id, None)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn only_drafts_can_be_deleted() {
    let ctx = TestContext::new().await;
    let warehouse = ctx.seed_warehouse("ALM-01").await;
    let product = ctx.seed_product("SKU-A").await;

    let draft = ctx
        .documents
        .create_document(create_command(
            DocumentType::Entrada,
            Some(warehouse.id),
            vec![line(product.id, 1)],
        ))
        .await
        .unwrap();
    ctx.documents
        .delete_document(draft.document.id)
        .await
        .unwrap();
    let err = ctx
        .documents
        .get_document(draft.document.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let confirmed = ctx
        .documents
        .create_document(create_command(
            DocumentType::Entrada,
            Some(warehouse.id),
            vec![line(product.id, 1)],
        ))
        .await
        .unwrap();
    ctx.documents
        .confirm_document(confirmed.document.id)
        .await
        .unwrap();
    let err = ctx
        .documents
        .delete_document(confirmed.document.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn document_numbers_are_sequential_per_type() {
    let ctx = TestContext::new().await;

    let first = ctx
        .documents
        .create_document(create_command(DocumentType::Entrada, None, vec![]))
        .await
        .unwrap();
    let second = ctx
        .documents
        .create_document(create_command(DocumentType::Entrada, None, vec![]))
        .await
        .unwrap();
    let salida = ctx
        .documents
        .create_document(create_command(DocumentType::Salida, None, vec![]))
        .await
        .unwrap();

    assert_eq!(first.document.document_number, "ENT-000001");
    assert_eq!(second.document.document_number, "ENT-000002");
    assert_eq!(salida.document.document_number, "SAL-000001");
}
