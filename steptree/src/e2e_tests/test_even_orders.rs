//! Regression tests for even orders, where a merge of two minimum nodes and
//! their separator overfills the merged node.

use crate::e2e_tests::helpers::{TestTree, scrambled};
use crate::ops::StepEvent;
use crate::types::Variant;

#[test]
fn test_b_even_order_leaf_merge() {
    let mut test = TestTree::new(4, Variant::B);
    test.insert_all([1, 2, 10, 20, 30]);
    assert_eq!(test.tree().to_string(), "[10]\n[1 2] [20 30]");

    let run = test.remove(20);

    assert!(run.events().contains(&StepEvent::Merged));
    assert_eq!(test.tree().to_string(), "[1 2 10 30]");
    test.assert_holds(&[1, 2, 10, 30]);
}

#[test]
fn test_even_orders_drain() {
    for variant in [Variant::B, Variant::BPlus] {
        for order in [4, 6, 8] {
            let mut test = TestTree::new(order, variant);
            test.insert_all(scrambled(150));

            let mut remaining: Vec<i64> = (0..150).collect();
            for v in (0..150).rev() {
                assert!(test.remove(v).result, "{variant} order {order}: remove {v}");
                remaining.pop();
                let tree = test.tree();
                assert_eq!(
                    tree.validate(),
                    Ok(()),
                    "{variant} order {order} after removing {v}:\n{tree}"
                );
            }
            assert!(remaining.is_empty());
            assert!(test.tree().is_empty());
        }
    }
}

#[test]
fn test_even_order_interleaved() {
    for order in [4, 6] {
        let mut test = TestTree::new(order, Variant::B);
        test.insert_all(0..120);

        let mut expected: Vec<i64> = (0..120).collect();
        for v in scrambled(120).into_iter().step_by(2) {
            assert!(test.remove(v).result);
            expected.retain(|&e| e != v);
            test.assert_holds(&expected);
        }
        for v in 200..240 {
            assert!(test.insert(v).result);
            expected.push(v);
        }
        test.assert_holds(&expected);
    }
}
