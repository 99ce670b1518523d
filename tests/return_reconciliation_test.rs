mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use uuid::Uuid;

use almacen_api::commands::movements::record_material_movement_command::{
    AffectInventoryInput, MovementLineInput,
};
use almacen_api::entities::{
    inventory_document::{DocumentStatus, DocumentType},
    material_movement,
    material_movement::MovementType,
};
use almacen_api::errors::ServiceError;
use rust_decimal::Decimal;

use common::{TestContext, SIGNATURE_BLOB};

fn movement_line(product_id: Uuid, quantity: i32, unit_cost: Decimal) -> MovementLineInput {
    MovementLineInput {
        product_id,
        quantity,
        unit_cost,
    }
}

#[tokio::test]
async fn retorno_is_bounded_by_issued_minus_returned() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("SKU-A").await;
    let event_id = Uuid::new_v4();

    // Issue 10 units.
    ctx.movements
        .record_movement(
            event_id,
            MovementType::Gasto,
            None,
            None,
            vec![movement_line(product.id, 10, dec!(5.00))],
            None,
        )
        .await
        .unwrap();

    let available = ctx
        .movements
        .available_for_return(event_id, product.id)
        .await
        .unwrap();
    assert_eq!(available, 10);

    // Returning 12 exceeds availability.
    let err = ctx
        .movements
        .record_movement(
            event_id,
            MovementType::Retorno,
            None,
            None,
            vec![movement_line(product.id, 12, dec!(5.00))],
            None,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    // Returning 4 is fine; 6 remain out.
    ctx.movements
        .record_movement(
            event_id,
            MovementType::Retorno,
            None,
            None,
            vec![movement_line(product.id, 4, dec!(5.00))],
            None,
        )
        .await
        .unwrap();

    let available = ctx
        .movements
        .available_for_return(event_id, product.id)
        .await
        .unwrap();
    assert_eq!(available, 6);
}

#[tokio::test]
async fn retorno_of_never_issued_product_is_rejected() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("SKU-A").await;
    let other = ctx.seed_product("SKU-B").await;
    let event_id = Uuid::new_v4();

    ctx.movements
        .record_movement(
            event_id,
            MovementType::Gasto,
            None,
            None,
            vec![movement_line(product.id, 3, dec!(2.00))],
            None,
        )
        .await
        .unwrap();

    let err = ctx
        .movements
        .record_movement(
            event_id,
            MovementType::Retorno,
            None,
            None,
            vec![movement_line(other.id, 1, dec!(2.00))],
            None,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));
}

#[tokio::test]
async fn availability_is_scoped_per_event() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("SKU-A").await;
    let event_a = Uuid::new_v4();
    let event_b = Uuid::new_v4();

    ctx.movements
        .record_movement(
            event_a,
            MovementType::Gasto,
            None,
            None,
            vec![movement_line(product.id, 5, dec!(1.00))],
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        ctx.movements
            .available_for_return(event_b, product.id)
            .await
            .unwrap(),
        0
    );

    // Event B cannot return what event A issued.
    let err = ctx
        .movements
        .record_movement(
            event_b,
            MovementType::Retorno,
            None,
            None,
            vec![movement_line(product.id, 1, dec!(1.00))],
            None,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));
}

#[tokio::test]
async fn money_totals_use_configured_rate_and_round_half_away() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("SKU-A").await;
    let event_id = Uuid::new_v4();

    let result = ctx
        .movements
        .record_movement(
            event_id,
            MovementType::Gasto,
            Some("consumibles".into()),
            None,
            vec![movement_line(product.id, 10, dec!(100.00))],
            None,
        )
        .await
        .unwrap();

    assert_eq!(result.movement.subtotal, dec!(1000.00));
    assert_eq!(result.movement.iva, dec!(160.00));
    assert_eq!(result.movement.total, dec!(1160.00));

    // Persisted values match the computed ones.
    let stored = material_movement::Entity::find_by_id(result.movement.id)
        .one(&*ctx.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.total, dec!(1160.00));
}

#[tokio::test]
async fn non_positive_total_is_rejected_before_any_write() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("SKU-A").await;
    let event_id = Uuid::new_v4();

    let err = ctx
        .movements
        .record_movement(
            event_id,
            MovementType::Gasto,
            None,
            None,
            vec![movement_line(product.id, 3, dec!(0.00))],
            None,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let movements = material_movement::Entity::find()
        .all(&*ctx.db)
        .await
        .unwrap();
    assert!(movements.is_empty());
}

#[tokio::test]
async fn gasto_with_affect_inventory_generates_confirmed_salida() {
    let ctx = TestContext::new().await;
    let warehouse = ctx.seed_warehouse("ALM-01").await;
    let product = ctx.seed_product("SKU-A").await;
    let event_id = Uuid::new_v4();

    let result = ctx
        .movements
        .record_movement(
            event_id,
            MovementType::Gasto,
            None,
            None,
            vec![movement_line(product.id, 2, dec!(10.00))],
            Some(AffectInventoryInput {
                warehouse_id: warehouse.id,
                delivered_by_name: Some("Ana Torres".into()),
                delivered_by_signature: Some(SIGNATURE_BLOB.into()),
                received_by_name: Some("Luis Mena".into()),
                received_by_signature: Some(SIGNATURE_BLOB.into()),
            }),
        )
        .await
        .unwrap();

    assert!(result.warnings.is_empty());
    let document = result.inventory_document.expect("document expected");
    assert_eq!(document.document_type, DocumentType::Salida);
    assert_eq!(document.status, DocumentStatus::Confirmed);
    assert!(document.movements_emitted_at.is_some());
    assert_eq!(result.movement.inventory_document_id, Some(document.id));

    let movements = ctx
        .documents
        .document_stock_movements(document.id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].quantity, 2);
    assert_eq!(movements[0].direction, DocumentType::Salida);
}

#[tokio::test]
async fn retorno_with_affect_inventory_generates_entrada() {
    let ctx = TestContext::new().await;
    let warehouse = ctx.seed_warehouse("ALM-01").await;
    let product = ctx.seed_product("SKU-A").await;
    let event_id = Uuid::new_v4();

    ctx.movements
        .record_movement(
            event_id,
            MovementType::Gasto,
            None,
            None,
            vec![movement_line(product.id, 5, dec!(1.00))],
            None,
        )
        .await
        .unwrap();

    let result = ctx
        .movements
        .record_movement(
            event_id,
            MovementType::Retorno,
            None,
            None,
            vec![movement_line(product.id, 3, dec!(1.00))],
            Some(AffectInventoryInput {
                warehouse_id: warehouse.id,
                delivered_by_name: None,
                delivered_by_signature: None,
                received_by_name: None,
                received_by_signature: None,
            }),
        )
        .await
        .unwrap();

    let document = result.inventory_document.expect("document expected");
    assert_eq!(document.document_type, DocumentType::Entrada);
    assert_eq!(document.status, DocumentStatus::Confirmed);

    // Without signatures the gate stays open: no stock movements yet.
    assert!(document.movements_emitted_at.is_none());
    let movements = ctx
        .documents
        .document_stock_movements(document.id)
        .await
        .unwrap();
    assert!(movements.is_empty());
}

#[tokio::test]
async fn list_movements_filters_by_event() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("SKU-A").await;
    let event_a = Uuid::new_v4();
    let event_b = Uuid::new_v4();

    for event_id in [event_a, event_a, event_b] {
        ctx.movements
            .record_movement(
                event_id,
                MovementType::Gasto,
                None,
                None,
                vec![movement_line(product.id, 1, dec!(1.00))],
                None,
            )
            .await
            .unwrap();
    }

    let (movements, total) = ctx
        .movements
        .list_movements(Some(event_a), None, 1, 20)
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(movements.len(), 2);
    assert!(movements.iter().all(|m| m.event_id == event_a));
}
