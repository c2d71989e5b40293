//! Test that inserting and removing one value leaves an empty tree.

use crate::e2e_tests::helpers::TestTree;
use crate::ops::StepEvent;
use crate::types::Variant;

#[test]
fn test_single_value_round_trip() {
    for variant in [Variant::B, Variant::BPlus] {
        let mut test = TestTree::new(3, variant);

        let inserted = test.insert(7);
        assert_eq!(
            inserted.events(),
            vec![StepEvent::RootCreated, StepEvent::Completed]
        );

        let removed = test.remove(7);
        assert!(removed.result);
        assert!(removed.events().contains(&StepEvent::RootCollapsed));

        let tree = test.tree();
        assert!(tree.is_empty(), "{variant}");
        assert_eq!(tree.root(), None);
        assert_eq!(tree.node_count(), 0);
        assert_eq!(tree.values().count(), 0);
        assert_eq!(tree.to_string(), format!("(empty {variant} tree)"));
    }
}
