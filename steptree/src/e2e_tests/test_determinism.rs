//! Test that the same sequence of operations produces identical steps.

use crate::e2e_tests::helpers::{TestTree, scrambled};
use crate::ops::StepEvent;
use crate::types::Variant;

fn run_sequence(variant: Variant) -> Vec<(StepEvent, String, u64, u64)> {
    let mut test = TestTree::new(4, variant);
    let mut trace = Vec::new();

    let values = scrambled(60);
    let mut runs = Vec::new();
    for &v in &values {
        runs.push(test.insert(v));
    }
    for &v in values.iter().step_by(4) {
        runs.push(test.search(v));
        runs.push(test.remove(v));
    }

    for run in runs {
        for step in run.steps {
            trace.push((
                step.event,
                step.snapshot.to_string(),
                step.snapshot.reads(),
                step.snapshot.writes(),
            ));
        }
    }
    trace
}

#[test]
fn test_deterministic_sequence() {
    for variant in [Variant::B, Variant::BPlus] {
        let run1 = run_sequence(variant);
        let run2 = run_sequence(variant);

        assert!(!run1.is_empty());
        assert_eq!(run1, run2);
    }
}
