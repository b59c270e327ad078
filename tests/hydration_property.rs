use proptest::prelude::*;

use colweave::column::{ColumnRecord, TableRef};
use colweave::graph::{derive_graph, hydrate};
use colweave::types::SemanticType;

fn semantic_type_strategy() -> impl Strategy<Value = SemanticType> {
    prop::sample::select(SemanticType::ALL.to_vec())
}

fn column_strategy() -> impl Strategy<Value = ColumnRecord> {
    (
        "[a-z][a-z0-9_]{0,11}",
        semantic_type_strategy(),
        0.0f64..1.0,
    )
        .prop_map(|(name, semantic_type, confidence)| {
            ColumnRecord::new(&name, semantic_type, confidence)
        })
}

proptest! {
    /// Re-derivation always reproduces the same document, ids included.
    #[test]
    fn derivation_is_deterministic(column in column_strategy(), layout in 0usize..8) {
        let table = TableRef::new("tbl_prop", "events");
        prop_assert_eq!(
            derive_graph(&table, &column, layout),
            derive_graph(&table, &column, layout)
        );
    }

    /// hydrate(c, derive(c), hydrate(c, derive(c), g)) == hydrate(c, derive(c), g)
    #[test]
    fn hydration_is_idempotent(
        column in column_strategy(),
        title in "[A-Za-z][A-Za-z ]{0,15}",
        dx in 0.0f64..300.0,
    ) {
        let table = TableRef::new("tbl_prop", "events");
        let base = derive_graph(&table, &column, 1);

        let mut edited = base.clone();
        if let Some(node) = edited.nodes.last_mut() {
            node.data.title = title;
            node.position.x += dx;
        }
        let stored = serde_json::to_value(&edited).unwrap();

        let once = hydrate(&table, &column, &base, Some(&stored));
        let resaved = serde_json::to_value(&once).unwrap();
        let twice = hydrate(&table, &column, &base, Some(&resaved));

        prop_assert_eq!(once, twice);
    }

    /// Stored confidence never shadows the current record's confidence.
    #[test]
    fn hydration_refreshes_confidence(
        column in column_strategy(),
        stale in 0.0f64..1.0,
    ) {
        let table = TableRef::new("tbl_prop", "events");
        let base = derive_graph(&table, &column, 0);

        let mut edited = base.clone();
        for node in &mut edited.nodes {
            if let Some(identity) = &mut node.data.identity {
                identity.column_confidence = stale;
            }
        }
        let stored = serde_json::to_value(&edited).unwrap();

        let hydrated = hydrate(&table, &column, &base, Some(&stored));
        for node in &hydrated.nodes {
            let identity = node.data.identity.as_ref().unwrap();
            prop_assert_eq!(identity.column_confidence, column.confidence);
        }
    }
}
