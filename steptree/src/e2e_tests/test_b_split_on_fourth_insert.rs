//! Test that the fourth insert into an order-3 B tree splits the leaf.

use crate::e2e_tests::helpers::{TestTree, numbers};
use crate::ops::StepEvent;
use crate::types::Variant;

#[test]
fn test_fourth_insert_splits_leaf() {
    let mut test = TestTree::new(3, Variant::B);
    test.insert_all([1, 2, 3]);
    assert_eq!(test.tree().to_string(), "[1 2 3]");

    let run = test.insert(4);

    assert!(run.result);
    assert_eq!(
        run.events(),
        vec![
            StepEvent::Visited,
            StepEvent::KeyWritten,
            StepEvent::Split,
            StepEvent::RootCreated,
            StepEvent::Completed
        ]
    );

    // The overflowing leaf is visible before it splits.
    let written = &run.steps[1].snapshot;
    assert_eq!(written.to_string(), "*[1 2 3 4]");

    assert_eq!(test.tree().to_string(), "[3]\n[1 2] [4]");
    assert_eq!(test.tree().height(), 2);
    test.assert_holds(&[1, 2, 3, 4]);
}

#[test]
fn test_new_root_is_observed() {
    let mut test = TestTree::new(3, Variant::B);
    test.insert_all([1, 2, 3]);

    let run = test.insert(4);
    let grown = &run.steps[3].snapshot;
    let root = grown.root().expect("tree has a root");

    assert!(root.is_observed());
    assert_eq!(root.keys(), numbers(&[3]).as_slice());
}
