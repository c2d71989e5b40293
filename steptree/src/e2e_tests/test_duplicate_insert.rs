//! Test that inserting a value twice is a no-op.

use crate::e2e_tests::helpers::TestTree;
use crate::ops::StepEvent;
use crate::types::Variant;

#[test]
fn test_duplicate_insert_is_rejected() {
    for variant in [Variant::B, Variant::BPlus] {
        let mut test = TestTree::new(3, variant);
        test.insert_all([5, 1, 9, 3, 7]);
        let before = test.tree().clone();

        let run = test.insert(3);

        assert!(!run.result);
        assert_eq!(run.events(), vec![StepEvent::Rejected]);
        // No reads or writes were charged.
        assert_eq!(run.steps[0].snapshot.reads(), before.reads());
        assert_eq!(run.steps[0].snapshot.writes(), before.writes());
        assert_eq!(test.tree(), &before);
        test.assert_holds(&[1, 3, 5, 7, 9]);
    }
}
