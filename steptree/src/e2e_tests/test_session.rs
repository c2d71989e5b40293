//! Test session stepping, busy rejection and abandonment.

use crate::e2e_tests::helpers::TestTree;
use crate::ops::{Operation, StepEvent};
use crate::session::{Progress, SessionError};
use crate::types::{Value, ValueDomain, Variant};

#[test]
fn test_tree_changes_only_at_terminal_step() {
    let mut test = TestTree::new(3, Variant::B);
    test.insert_all([1, 2, 3]);
    let before = test.tree().clone();

    test.session
        .begin_input(Operation::Insert, "4")
        .expect("idle session");
    assert_eq!(
        test.session.current_operation(),
        Some((Operation::Insert, &Value::Number(4)))
    );

    let mut events = Vec::new();
    while let Some(Progress::Step(step)) = test.session.step() {
        events.push(step.event);
        if step.event != StepEvent::Completed {
            assert_eq!(test.tree(), &before);
        }
    }

    assert_eq!(events.len(), 5);
    assert!(!test.session.is_busy());
    assert_eq!(test.tree().to_string(), "[3]\n[1 2] [4]");
}

#[test]
fn test_busy_rejects_second_operation() {
    let mut test = TestTree::new(3, Variant::BPlus);
    test.session
        .begin_input(Operation::Insert, "1")
        .expect("idle session");

    assert_eq!(
        test.session.begin_input(Operation::Insert, "2"),
        Err(SessionError::Busy)
    );
    assert_eq!(
        test.session.reset(3, Variant::B, ValueDomain::Numeric),
        Err(SessionError::Busy)
    );

    let outcome = test.session.skip().expect("in flight");
    assert!(outcome.result);
    assert_eq!(outcome.value, Value::Number(1));
    assert!(test.session.begin_input(Operation::Insert, "2").is_ok());
}

#[test]
fn test_abandon_mid_split() {
    let mut test = TestTree::new(3, Variant::BPlus);
    test.insert_all(1..=9);
    let before = test.tree().clone();

    test.session
        .begin_input(Operation::Insert, "10")
        .expect("idle session");
    loop {
        match test.session.step() {
            Some(Progress::Step(step)) if step.event == StepEvent::Split => break,
            Some(Progress::Step(_)) => {}
            other => panic!("expected a split, got {other:?}"),
        }
    }

    assert!(test.session.abandon());
    assert_eq!(test.tree(), &before);
    assert!(!test.tree().contains(&Value::Number(10)));

    // The same request runs normally afterwards.
    assert!(test.insert(10).result);
    test.assert_holds(&(1..=10).collect::<Vec<_>>());
}

#[test]
fn test_reset_discards_tree() {
    let mut test = TestTree::new(3, Variant::B);
    test.insert_all(1..=5);

    test.session
        .reset(4, Variant::BPlus, ValueDomain::Lexical)
        .expect("idle session");

    assert!(test.tree().is_empty());
    assert_eq!(test.tree().order(), 4);
    assert_eq!(test.tree().domain(), ValueDomain::Lexical);
    assert_eq!(test.tree().reads(), 0);
}
