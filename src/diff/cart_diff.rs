//! `CartDiff` computation (spec §3/§4.6): before/after snapshots are
//! matched by identity key, never by list position.

use crate::models::{CartItem, CartSnapshot, CartDiff, DiffItem, DiffSummary, QuantityChange};
use std::collections::HashMap;

fn index_by_identity(items: &[CartItem]) -> HashMap<String, &CartItem> {
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        map.insert(item.identity(), item);
    }
    map
}

fn to_diff_item(identity: &str, item: &CartItem) -> DiffItem {
    DiffItem {
        identity: identity.to_string(),
        name: item.name.clone(),
        quantity: item.quantity,
        unit_price: item.unit_price,
    }
}

/// Computes the diff by identity key. Quantity-only changes land in
/// `quantity_changed`, not `added`+`removed`.
pub fn compute_diff(before: &CartSnapshot, after: &CartSnapshot) -> CartDiff {
    let before_index = index_by_identity(&before.items);
    let after_index = index_by_identity(&after.items);

    let mut added = Vec::new();
    let mut quantity_changed = Vec::new();
    let mut unchanged = Vec::new();

    for (identity, after_item) in &after_index {
        match before_index.get(identity) {
            None => added.push(to_diff_item(identity, after_item)),
            Some(before_item) => {
                if before_item.quantity != after_item.quantity {
                    quantity_changed.push(QuantityChange {
                        identity: identity.clone(),
                        name: after_item.name.clone(),
                        before_quantity: before_item.quantity,
                        after_quantity: after_item.quantity,
                    });
                } else {
                    unchanged.push(to_diff_item(identity, after_item));
                }
            }
        }
    }

    let mut removed = Vec::new();
    for (identity, before_item) in &before_index {
        if !after_index.contains_key(identity) {
            removed.push(to_diff_item(identity, before_item));
        }
    }

    added.sort_by(|a, b| a.identity.cmp(&b.identity));
    removed.sort_by(|a, b| a.identity.cmp(&b.identity));
    quantity_changed.sort_by(|a, b| a.identity.cmp(&b.identity));
    unchanged.sort_by(|a, b| a.identity.cmp(&b.identity));

    let summary = DiffSummary {
        price_difference: after.total_price - before.total_price,
        before_total: before.total_price,
        after_total: after.total_price,
    };

    CartDiff {
        added,
        removed,
        quantity_changed,
        unchanged,
        summary,
    }
}

/// Reconstructs `after` from `before` + `diff` (spec §8 diff round-trip
/// law). Inverse of `compute_diff` up to item ordering.
pub fn apply_diff(before: &CartSnapshot, diff: &CartDiff) -> CartSnapshot {
    let mut by_identity: HashMap<String, CartItem> = before
        .items
        .iter()
        .map(|item| (item.identity(), item.clone()))
        .collect();

    for removed in &diff.removed {
        by_identity.remove(&removed.identity);
    }
    for change in &diff.quantity_changed {
        if let Some(item) = by_identity.get_mut(&change.identity) {
            item.quantity = change.after_quantity;
        }
    }
    for added in &diff.added {
        by_identity.insert(
            added.identity.clone(),
            CartItem {
                product_id: Some(added.identity.clone()),
                name: added.name.clone(),
                quantity: added.quantity,
                unit_price: added.unit_price,
                available: true,
            },
        );
    }

    let items: Vec<CartItem> = by_identity.into_values().collect();
    let item_count = items.len() as u32;
    let total_price = items.iter().map(|i| i.unit_price * i.quantity as f64).sum();

    CartSnapshot {
        timestamp: before.timestamp,
        items,
        item_count,
        total_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: &str, name: &str, qty: u32, price: f64) -> CartItem {
        CartItem {
            product_id: Some(id.to_string()),
            name: name.to_string(),
            quantity: qty,
            unit_price: price,
            available: true,
        }
    }

    fn snapshot(items: Vec<CartItem>) -> CartSnapshot {
        let total = items.iter().map(|i| i.quantity as f64 * i.unit_price).sum();
        let count = items.len() as u32;
        CartSnapshot {
            timestamp: Utc::now(),
            items,
            item_count: count,
            total_price: total,
        }
    }

    #[test]
    fn classifies_added_removed_and_requantified_items() {
        let before = snapshot(vec![item("A", "A", 1, 2.0), item("B", "B", 2, 3.0)]);
        let after = snapshot(vec![item("A", "A", 2, 2.0), item("C", "C", 1, 5.0)]);

        let diff = compute_diff(&before, &after);

        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.added[0].identity, "C");
        assert_eq!(diff.removed.len(), 1);
        assert_eq!(diff.removed[0].identity, "B");
        assert_eq!(diff.quantity_changed.len(), 1);
        assert_eq!(diff.quantity_changed[0].before_quantity, 1);
        assert_eq!(diff.quantity_changed[0].after_quantity, 2);
        assert_eq!(diff.summary.before_total, 8.0);
        assert_eq!(diff.summary.after_total, 9.0);
        assert_eq!(diff.summary.price_difference, 1.0);
    }

    #[test]
    fn identical_snapshots_yield_all_unchanged() {
        let snap = snapshot(vec![item("A", "A", 1, 2.0)]);
        let diff = compute_diff(&snap, &snap);
        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
        assert!(diff.quantity_changed.is_empty());
        assert_eq!(diff.unchanged.len(), 1);
        assert_eq!(diff.summary.price_difference, 0.0);
    }

    #[test]
    fn empty_before_and_after_yields_empty_diff() {
        let before = snapshot(vec![]);
        let after = snapshot(vec![]);
        let diff = compute_diff(&before, &after);
        assert!(diff.added.is_empty() && diff.removed.is_empty());
        assert_eq!(diff.summary.price_difference, 0.0);
    }

    #[test]
    fn matches_by_identity_not_list_position() {
        let before = snapshot(vec![item("A", "Leite", 1, 1.0), item("B", "Pao", 1, 1.0)]);
        let after = snapshot(vec![item("B", "Pao", 1, 1.0), item("A", "Leite", 1, 1.0)]);
        let diff = compute_diff(&before, &after);
        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
        assert_eq!(diff.unchanged.len(), 2);
    }

    use proptest::collection::hash_map;
    use proptest::prelude::*;

    fn cart_strategy() -> impl Strategy<Value = Vec<CartItem>> {
        hash_map("[a-f]{1,3}", (1u32..6, 1i64..500), 0..6).prop_map(|entries| {
            entries
                .into_iter()
                .map(|(id, (qty, cents))| item(&id, &id, qty, cents as f64 / 100.0))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn diff_round_trip_reconstructs_after(
            before_items in cart_strategy(),
            after_items in cart_strategy(),
        ) {
            let before = snapshot(before_items);
            let after = snapshot(after_items);
            let diff = compute_diff(&before, &after);
            let reconstructed = apply_diff(&before, &diff);

            let mut expected: Vec<(String, u32)> = after
                .items
                .iter()
                .map(|i| (i.identity(), i.quantity))
                .collect();
            let mut actual: Vec<(String, u32)> = reconstructed
                .items
                .iter()
                .map(|i| (i.identity(), i.quantity))
                .collect();
            expected.sort();
            actual.sort();
            prop_assert_eq!(actual, expected);
        }
    }
}
