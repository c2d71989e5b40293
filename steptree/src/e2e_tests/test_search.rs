//! Test search step sequences for both variants.

use crate::e2e_tests::helpers::{TestTree, numbers};
use crate::ops::StepEvent;
use crate::types::Variant;

#[test]
fn test_b_search_stops_at_internal_match() {
    let mut test = TestTree::new(3, Variant::B);
    test.insert_all([10, 20, 30, 40, 50]);
    let reads = test.tree().reads();
    let writes = test.tree().writes();

    let run = test.search(30);

    assert!(run.result);
    assert_eq!(run.events(), vec![StepEvent::Visited, StepEvent::Found]);
    let found = run.steps[1].snapshot.observed().expect("match is observed");
    assert!(!found.is_leaf());
    assert_eq!(found.keys(), numbers(&[30]).as_slice());

    assert_eq!(test.tree().reads(), reads + 1);
    assert_eq!(test.tree().writes(), writes);
}

#[test]
fn test_bplus_search_ends_in_leaf() {
    let mut test = TestTree::new(3, Variant::BPlus);
    test.insert_all([1, 2, 3, 4]);
    assert_eq!(test.tree().to_string(), "[3]\n[1 2] [3 4]");

    // 3 is also a separator, but only the leaf copy counts.
    let run = test.search(3);

    assert!(run.result);
    assert_eq!(
        run.events(),
        vec![StepEvent::Visited, StepEvent::Visited, StepEvent::Found]
    );
    let found = run.steps[2].snapshot.observed().expect("match is observed");
    assert!(found.is_leaf());
    assert_eq!(found.keys(), numbers(&[3, 4]).as_slice());
}

#[test]
fn test_search_miss() {
    for variant in [Variant::B, Variant::BPlus] {
        let mut test = TestTree::new(3, variant);
        test.insert_all(1..=9);

        let run = test.search(100);

        assert!(!run.result);
        assert_eq!(run.events().last(), Some(&StepEvent::NotFound));
        let visits = run
            .events()
            .iter()
            .filter(|e| **e == StepEvent::Visited)
            .count();
        assert_eq!(visits, test.tree().height());
    }
}

#[test]
fn test_search_empty_tree() {
    let mut test = TestTree::new(5, Variant::BPlus);

    let run = test.search(1);

    assert!(!run.result);
    assert_eq!(run.events(), vec![StepEvent::NotFound]);
    assert_eq!(test.tree().reads(), 0);
}
