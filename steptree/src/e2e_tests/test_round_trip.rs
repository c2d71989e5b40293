//! Test that every inserted value is found, and removing them all empties
//! the tree.

use crate::e2e_tests::helpers::{TestTree, scrambled};
use crate::types::Variant;

#[test]
fn test_insert_search_remove_all() {
    for variant in [Variant::B, Variant::BPlus] {
        for order in 3..=7 {
            let mut test = TestTree::new(order, variant);
            let values = scrambled(100);
            test.insert_all(values.iter().copied());

            let sorted: Vec<i64> = (0..100).collect();
            test.assert_holds(&sorted);
            for &v in &values {
                assert!(test.search(v).result, "{variant} order {order}: {v}");
            }
            assert!(!test.search(100).result);

            for &v in values.iter().rev() {
                assert!(test.remove(v).result, "{variant} order {order}: {v}");
            }
            assert!(test.tree().is_empty());
            assert_eq!(test.tree().root(), None);
            assert_eq!(test.tree().values().count(), 0);
        }
    }
}

#[test]
fn test_counters_only_grow() {
    let mut test = TestTree::new(3, Variant::BPlus);
    let (mut reads, mut writes) = (0, 0);
    for v in scrambled(40) {
        for run in [test.insert(v), test.search(v)] {
            for step in &run.steps {
                assert!(step.snapshot.reads() >= reads);
                assert!(step.snapshot.writes() >= writes);
                reads = step.snapshot.reads();
                writes = step.snapshot.writes();
            }
        }
    }
    assert_eq!(test.tree().reads(), reads);
    assert_eq!(test.tree().writes(), writes);
}
