//! Test that the B+ leaf chain tracks the stored values through splits and
//! merges.

use crate::e2e_tests::helpers::{TestTree, leaf_chain_values, scrambled};
use crate::types::Variant;

#[test]
fn test_leaf_chain_matches_in_order() {
    for order in [3, 4, 5] {
        let mut test = TestTree::new(order, Variant::BPlus);
        for v in scrambled(200) {
            assert!(test.insert(v).result);
        }
        assert_eq!(leaf_chain_values(test.tree()), test.tree().in_order());

        for v in scrambled(200).into_iter().filter(|v| v % 3 == 0) {
            assert!(test.remove(v).result);
            assert_eq!(
                leaf_chain_values(test.tree()),
                test.tree().in_order(),
                "order {order} after removing {v}"
            );
        }

        let expected: Vec<i64> = (0..200).filter(|v| v % 3 != 0).collect();
        test.assert_holds(&expected);
    }
}

#[test]
fn test_leaf_chain_empties_with_tree() {
    let mut test = TestTree::new(3, Variant::BPlus);
    test.insert_all(1..=20);
    for v in (1..=20).rev() {
        assert!(test.remove(v).result);
    }
    assert!(leaf_chain_values(test.tree()).is_empty());
}
