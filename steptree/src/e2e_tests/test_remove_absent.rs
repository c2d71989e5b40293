//! Test that removing a value that is not present changes nothing.

use crate::e2e_tests::helpers::TestTree;
use crate::ops::StepEvent;
use crate::types::Variant;

#[test]
fn test_remove_absent_value() {
    for variant in [Variant::B, Variant::BPlus] {
        let mut test = TestTree::new(3, variant);
        test.insert_all(1..=10);
        let before = test.tree().clone();

        let run = test.remove(42);

        assert!(!run.result);
        assert_eq!(run.events(), vec![StepEvent::Rejected]);
        assert_eq!(test.tree(), &before, "{variant}");
    }
}

#[test]
fn test_remove_from_empty_tree() {
    for variant in [Variant::B, Variant::BPlus] {
        let mut test = TestTree::new(4, variant);

        let run = test.remove(1);

        assert!(!run.result);
        assert_eq!(run.events(), vec![StepEvent::Rejected]);
        assert!(test.tree().is_empty());
    }
}
