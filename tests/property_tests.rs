use std::collections::HashSet;

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use almacen_api::entities::inventory_document_line::{merge_line_draft, LineDraft};
use almacen_api::entities::material_movement::MovementTotals;

fn apply_deltas(deltas: &[(u8, i32)]) -> (Vec<LineDraft>, Vec<Uuid>) {
    // A small fixed pool of product ids so sequences actually collide.
    let pool: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();
    let mut lines = Vec::new();
    for (slot, delta) in deltas {
        let product_id = pool[usize::from(*slot) % pool.len()];
        merge_line_draft(&mut lines, product_id, *delta, None);
    }
    (lines, pool)
}

proptest! {
    #[test]
    fn merged_lines_are_unique_per_product_and_at_least_one(
        deltas in proptest::collection::vec((any::<u8>(), -50i32..50), 1..40)
    ) {
        let (lines, _pool) = apply_deltas(&deltas);

        let distinct: HashSet<Uuid> = lines.iter().map(|l| l.product_id).collect();
        prop_assert_eq!(distinct.len(), lines.len());
        prop_assert!(lines.iter().all(|l| l.quantity >= 1));
    }

    #[test]
    fn line_count_matches_distinct_products(
        deltas in proptest::collection::vec((any::<u8>(), -50i32..50), 1..40)
    ) {
        let (lines, pool) = apply_deltas(&deltas);

        let touched: HashSet<Uuid> = deltas
            .iter()
            .map(|(slot, _)| pool[usize::from(*slot) % pool.len()])
            .collect();
        prop_assert_eq!(lines.len(), touched.len());
    }

    #[test]
    fn positive_deltas_sum_exactly(deltas in proptest::collection::vec(1i32..100, 1..30)) {
        let product_id = Uuid::new_v4();
        let mut lines = Vec::new();
        for delta in &deltas {
            merge_line_draft(&mut lines, product_id, *delta, None);
        }

        prop_assert_eq!(lines.len(), 1);
        prop_assert_eq!(lines[0].quantity, deltas.iter().sum::<i32>());
    }

    #[test]
    fn totals_are_consistent_and_iva_has_two_decimals(
        quantities in proptest::collection::vec(1i32..1000, 1..10),
        cents in proptest::collection::vec(0i64..1_000_000, 1..10),
    ) {
        let lines: Vec<(i32, Decimal)> = quantities
            .iter()
            .zip(&cents)
            .map(|(q, c)| (*q, Decimal::new(*c, 2)))
            .collect();

        let totals = MovementTotals::compute(&lines, dec!(0.16));

        let expected_subtotal: Decimal = lines
            .iter()
            .map(|(q, cost)| Decimal::from(*q) * *cost)
            .sum();
        prop_assert_eq!(totals.subtotal, expected_subtotal);
        prop_assert_eq!(totals.total, totals.subtotal + totals.iva);
        prop_assert!(totals.iva.scale() <= 2);
        prop_assert!(totals.iva >= Decimal::ZERO);
    }
}
