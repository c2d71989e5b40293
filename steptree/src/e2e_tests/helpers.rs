//! Common helpers for end-to-end tests.

use crate::ops::{Operation, Step, StepEvent};
use crate::session::{Progress, Session};
use crate::tree::{Tree, snapshot};
use crate::types::{Value, ValueDomain, Variant};

/// A session over a fresh tree, driven one request at a time.
pub struct TestTree {
    pub session: Session,
}

/// Everything one finished request produced.
pub struct Run {
    pub result: bool,
    pub steps: Vec<Step>,
}

impl Run {
    #[must_use]
    pub fn events(&self) -> Vec<StepEvent> {
        self.steps.iter().map(|s| s.event).collect()
    }
}

impl TestTree {
    /// Create a numeric tree.
    #[must_use]
    pub fn new(order: usize, variant: Variant) -> Self {
        Self::with_domain(order, variant, ValueDomain::Numeric)
    }

    #[must_use]
    pub fn with_domain(order: usize, variant: Variant, domain: ValueDomain) -> Self {
        #[allow(clippy::expect_used)]
        let session = Session::create(order, variant, domain).expect("Failed to create tree");
        Self { session }
    }

    #[must_use]
    pub const fn tree(&self) -> &Tree {
        self.session.tree()
    }

    /// Run one request to completion, collecting every step.
    #[allow(clippy::expect_used)]
    pub fn run(&mut self, operation: Operation, input: &str) -> Run {
        self.session
            .begin_input(operation, input)
            .expect("Request should be accepted");

        let mut steps = Vec::new();
        loop {
            match self.session.step().expect("Operation should be in flight") {
                Progress::Step(step) => steps.push(step),
                Progress::Finished(outcome) => {
                    assert_eq!(outcome.steps, steps.len());
                    return Run {
                        result: outcome.result,
                        steps,
                    };
                }
            }
        }
    }

    pub fn insert(&mut self, value: i64) -> Run {
        self.run(Operation::Insert, &value.to_string())
    }

    pub fn remove(&mut self, value: i64) -> Run {
        self.run(Operation::Remove, &value.to_string())
    }

    pub fn search(&mut self, value: i64) -> Run {
        self.run(Operation::Search, &value.to_string())
    }

    /// Insert every value, asserting each is new.
    pub fn insert_all(&mut self, values: impl IntoIterator<Item = i64>) {
        for v in values {
            assert!(self.insert(v).result, "{v} should be new");
        }
    }

    /// Assert the current tree is well formed and holds exactly `expected`.
    pub fn assert_holds(&self, expected: &[i64]) {
        let tree = self.tree();
        assert_eq!(tree.validate(), Ok(()), "\n{tree}");
        assert_eq!(tree.in_order(), numbers(expected), "\n{tree}");
        assert_eq!(tree.len(), expected.len());
        for v in expected {
            assert!(tree.contains(&Value::Number(*v)));
        }
    }
}

#[must_use]
pub fn numbers(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Number).collect()
}

/// Values in leaf-chain order, following next links from the leftmost leaf.
#[must_use]
pub fn leaf_chain_values(tree: &Tree) -> Vec<Value> {
    snapshot(tree, None)
        .leaf_chain()
        .flat_map(|leaf| leaf.keys().to_vec())
        .collect()
}

/// A deterministic permutation of `0..n`.
#[must_use]
pub fn scrambled(n: i64) -> Vec<i64> {
    // 7919 is prime, so this is a permutation for any n below it.
    (0..n).map(|i| (i * 7919) % n).collect()
}
