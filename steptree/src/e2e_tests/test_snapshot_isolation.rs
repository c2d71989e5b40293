//! Test that snapshots are independent of each other and of the source tree.

use crate::e2e_tests::helpers::TestTree;
use crate::ops::{self, StepEvent};
use crate::types::{Value, Variant};

#[test]
fn test_earlier_snapshots_are_frozen() {
    let mut test = TestTree::new(3, Variant::BPlus);
    test.insert_all(1..=5);
    let source = test.tree().clone();

    let mut steps = ops::insert(&source, Value::Number(6)).expect("numeric value");
    let mut seen = Vec::new();
    for step in steps.by_ref() {
        // Render at pull time, compare once everything has run.
        seen.push((step.snapshot.to_string(), step));
    }

    for (rendered, step) in &seen {
        assert_eq!(&step.snapshot.to_string(), rendered);
        assert!(step.snapshot.observed_count() <= 1);
    }
    assert_eq!(steps.outcome(), Some(true));
    assert_eq!(test.tree(), &source);

    // The split is shown before the separator reaches the parent.
    let split = seen
        .iter()
        .position(|(_, s)| s.event == StepEvent::Split)
        .expect("6 splits a leaf");
    assert_eq!(seen[split + 1].1.event, StepEvent::Promoted);
    assert_ne!(seen[split].0, seen[split + 1].0);
}

#[test]
fn test_accepted_snapshot_does_not_alias() {
    let mut test = TestTree::new(3, Variant::B);
    test.insert_all(1..=6);

    let done = ops::insert(test.tree(), Value::Number(7))
        .expect("numeric value")
        .finish();
    let first = done.steps[0].snapshot.clone();
    let rendered = first.to_string();

    // Keep building on the final state; the first snapshot is unaffected.
    let mut next = done.into_tree();
    for v in 8..=20 {
        next = ops::insert(&next, Value::Number(v))
            .expect("numeric value")
            .finish()
            .into_tree();
    }

    assert_eq!(first.to_string(), rendered);
    assert!(!first.contains(&Value::Number(20)));
    assert!(next.contains(&Value::Number(20)));
}

#[test]
fn test_presence_moves_with_structure() {
    let mut test = TestTree::new(3, Variant::B);
    test.insert_all([10, 20, 30, 40, 50]);

    let run = test.remove(30);
    for step in &run.steps {
        let in_structure = step
            .snapshot
            .tree()
            .in_order()
            .contains(&Value::Number(30));
        assert_eq!(
            step.snapshot.contains(&Value::Number(30)),
            in_structure,
            "{:?}",
            step.event
        );
    }
}
