//! Test that a B+ leaf split copies the separator up and links the leaves.

use crate::e2e_tests::helpers::{TestTree, leaf_chain_values, numbers};
use crate::ops::StepEvent;
use crate::tree::snapshot;
use crate::types::Variant;

#[test]
fn test_fourth_insert_copies_separator_up() {
    let mut test = TestTree::new(3, Variant::BPlus);
    test.insert_all([1, 2, 3]);

    let run = test.insert(4);
    assert!(run.events().contains(&StepEvent::Split));
    assert!(run.events().contains(&StepEvent::RootCreated));

    // 3 stays in the right leaf and is duplicated into the root.
    assert_eq!(test.tree().to_string(), "[3]\n[1 2] [3 4]");
    test.assert_holds(&[1, 2, 3, 4]);
}

#[test]
fn test_split_links_left_leaf_to_right() {
    let mut test = TestTree::new(3, Variant::BPlus);
    test.insert_all([1, 2, 3, 4]);

    let frozen = snapshot(test.tree(), None);
    let leaves: Vec<_> = frozen.leaf_chain().collect();
    assert_eq!(leaves.len(), 2);
    assert_eq!(leaves[0].keys(), numbers(&[1, 2]).as_slice());
    assert_eq!(leaves[1].keys(), numbers(&[3, 4]).as_slice());
    assert!(leaves[1].next_leaf().is_none());

    assert_eq!(leaf_chain_values(test.tree()), numbers(&[1, 2, 3, 4]));
}
