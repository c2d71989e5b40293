//! Invariant checking for deterministic simulation testing.
//!
//! Every completed operation is replayed against a `BTreeSet` model. The
//! checker compares outcomes, step sequences and the resulting tree with
//! what the model says must hold.

use std::collections::BTreeSet;

use crate::ops::{Operation, Step, StepEvent};
use crate::tree::{Tree, snapshot};
use crate::types::{Value, Variant};

/// A recorded operation in the simulation.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    pub operation: Operation,
    pub input: String,
    /// `None` if the input was rejected or the operation abandoned.
    pub result: Option<bool>,
    /// Steps pulled before the operation finished or was abandoned.
    pub steps: usize,
    pub abandoned: bool,
    /// Error message if the input was rejected.
    pub error: Option<String>,
}

/// Tracks the history of operations and the model they imply.
#[derive(Debug, Default)]
pub struct OperationHistory {
    /// All operations in order.
    operations: Vec<OperationRecord>,
    /// Values the tree must hold after the last recorded operation.
    expected: BTreeSet<Value>,
    searches: u64,
    inserts: u64,
    removes: u64,
    rejected_inputs: u64,
    abandoned: u64,
    total_steps: u64,
}

impl OperationHistory {
    /// Create a new empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an operation that ran to completion and apply it to the model.
    pub fn record_completed(
        &mut self,
        operation: Operation,
        input: &str,
        value: &Value,
        result: bool,
        steps: usize,
    ) {
        match operation {
            Operation::Search => self.searches += 1,
            Operation::Insert => {
                self.inserts += 1;
                if result {
                    self.expected.insert(value.clone());
                }
            }
            Operation::Remove => {
                self.removes += 1;
                if result {
                    self.expected.remove(value);
                }
            }
        }
        self.total_steps += steps as u64;
        self.operations.push(OperationRecord {
            operation,
            input: input.to_string(),
            result: Some(result),
            steps,
            abandoned: false,
            error: None,
        });
    }

    /// Record input the tree refused. The model is unchanged.
    pub fn record_rejected(&mut self, operation: Operation, input: &str, error: String) {
        self.rejected_inputs += 1;
        self.operations.push(OperationRecord {
            operation,
            input: input.to_string(),
            result: None,
            steps: 0,
            abandoned: false,
            error: Some(error),
        });
    }

    /// Record an operation dropped part way. The model is unchanged.
    pub fn record_abandoned(&mut self, operation: Operation, input: &str, steps: usize) {
        self.abandoned += 1;
        self.total_steps += steps as u64;
        self.operations.push(OperationRecord {
            operation,
            input: input.to_string(),
            result: None,
            steps,
            abandoned: true,
            error: None,
        });
    }

    /// Get the number of operations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if history is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// All recorded operations, oldest first.
    #[must_use]
    pub fn operations(&self) -> &[OperationRecord] {
        &self.operations
    }

    /// Get statistics.
    #[must_use]
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            total_operations: self.operations.len(),
            searches: self.searches,
            inserts: self.inserts,
            removes: self.removes,
            rejected_inputs: self.rejected_inputs,
            abandoned: self.abandoned,
            total_steps: self.total_steps,
            unique_values: self.expected.len(),
        }
    }

    /// The values the tree should currently hold.
    #[must_use]
    pub const fn expected(&self) -> &BTreeSet<Value> {
        &self.expected
    }
}

/// Statistics about the operation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStats {
    /// Total number of operations.
    pub total_operations: usize,
    pub searches: u64,
    pub inserts: u64,
    pub removes: u64,
    /// Requests refused before any step was produced.
    pub rejected_inputs: u64,
    pub abandoned: u64,
    /// Steps pulled across all operations.
    pub total_steps: u64,
    /// Number of values in the model.
    pub unique_values: usize,
}

/// An invariant violation detected during simulation.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violation.
    pub description: String,
    /// Operation index where it was detected.
    pub operation_index: usize,
    /// Additional context.
    pub context: String,
}

/// Checker for tree invariants.
pub struct InvariantChecker {
    /// Detected violations.
    violations: Vec<InvariantViolation>,
}

impl Default for InvariantChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantChecker {
    /// Create a new invariant checker.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    /// Get all violations.
    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    /// Check if any violations were detected.
    #[must_use]
    pub const fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Clear all recorded violations.
    pub fn clear(&mut self) {
        self.violations.clear();
    }

    /// Add a violation.
    pub fn add_violation(&mut self, violation: InvariantViolation) {
        self.violations.push(violation);
    }

    fn violation(&mut self, operation_index: usize, description: &str, context: String) {
        self.violations.push(InvariantViolation {
            description: description.to_string(),
            operation_index,
            context,
        });
    }

    /// Check the shape of one operation's step sequence.
    ///
    /// Sequences are never empty, every snapshot observes at most one node,
    /// and the read and write counters never go backwards.
    pub fn check_steps(&mut self, operation: Operation, steps: &[Step], operation_index: usize) {
        let Some(last) = steps.last() else {
            self.violation(operation_index, "Operation produced no steps", operation.to_string());
            return;
        };

        for (i, step) in steps.iter().enumerate() {
            let observed = step.snapshot.observed_count();
            if observed > 1 {
                self.violation(
                    operation_index,
                    "Snapshot observes more than one node",
                    format!("step {i} ({:?}) observes {observed} nodes", step.event),
                );
            }
        }

        for (i, pair) in steps.windows(2).enumerate() {
            let (before, after) = (&pair[0].snapshot, &pair[1].snapshot);
            if after.reads() < before.reads() || after.writes() < before.writes() {
                self.violation(
                    operation_index,
                    "Counters went backwards",
                    format!(
                        "step {} -> {}: reads {} -> {}, writes {} -> {}",
                        i,
                        i + 1,
                        before.reads(),
                        after.reads(),
                        before.writes(),
                        after.writes()
                    ),
                );
            }
        }

        let terminal_ok = match operation {
            Operation::Search => matches!(last.event, StepEvent::Found | StepEvent::NotFound),
            Operation::Insert | Operation::Remove => {
                matches!(last.event, StepEvent::Completed | StepEvent::Rejected)
            }
        };
        if !terminal_ok {
            self.violation(
                operation_index,
                "Unexpected terminal event",
                format!("{operation} ended with {:?}", last.event),
            );
        }
    }

    /// Check a finished operation's result against the model as it was
    /// before the operation.
    pub fn check_outcome(
        &mut self,
        operation: Operation,
        value: &Value,
        result: bool,
        model: &BTreeSet<Value>,
        operation_index: usize,
    ) {
        let present = model.contains(value);
        let expected = match operation {
            Operation::Search | Operation::Remove => present,
            Operation::Insert => !present,
        };
        if result != expected {
            self.violation(
                operation_index,
                "Outcome disagrees with model",
                format!("{operation} of {value} returned {result}, expected {expected}"),
            );
        }
    }

    /// Check a tree against the model.
    pub fn check_tree(&mut self, tree: &Tree, model: &BTreeSet<Value>, operation_index: usize) {
        if let Err(e) = tree.validate() {
            self.violation(operation_index, "Structure invalid", format!("{e}\n{tree}"));
        }

        let presence: BTreeSet<Value> = tree.values().cloned().collect();
        if &presence != model {
            self.violation(
                operation_index,
                "Presence set disagrees with model",
                format!("tree has {} values, model has {}", presence.len(), model.len()),
            );
        }

        let expected: Vec<Value> = model.iter().cloned().collect();
        if tree.in_order() != expected {
            self.violation(
                operation_index,
                "In-order traversal disagrees with model",
                tree.to_string(),
            );
        }

        if tree.variant() == Variant::BPlus {
            let frozen = snapshot(tree, None);
            let chained: Vec<Value> = frozen
                .leaf_chain()
                .flat_map(|leaf| leaf.keys().to_vec())
                .collect();
            if chained != expected {
                self.violation(
                    operation_index,
                    "Leaf chain disagrees with model",
                    format!("chain holds {} values, model has {}", chained.len(), expected.len()),
                );
            }
        }
    }

    /// Check that an abandoned operation left the current tree as it was.
    pub fn check_untouched(&mut self, before: &Tree, after: &Tree, operation_index: usize) {
        if before != after {
            self.violation(
                operation_index,
                "Abandoned operation changed the tree",
                format!("before:\n{before}\nafter:\n{after}"),
            );
        }
    }

    /// Check that input was refused exactly when it was generated malformed.
    pub fn check_rejection(
        &mut self,
        input: &str,
        expected_rejection: bool,
        rejected: bool,
        operation_index: usize,
    ) {
        if expected_rejection != rejected {
            let description = if rejected {
                "Well-formed input was rejected"
            } else {
                "Malformed input was accepted"
            };
            self.violation(operation_index, description, format!("input {input:?}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;
    use crate::types::ValueDomain;

    fn tree_with(variant: Variant, values: &[i64]) -> Tree {
        let mut tree = Tree::new(3, variant, ValueDomain::Numeric).expect("valid order");
        for &v in values {
            tree = ops::insert(&tree, Value::Number(v))
                .expect("numeric value")
                .finish()
                .into_tree();
        }
        tree
    }

    #[test]
    fn test_operation_history_record_completed() {
        let mut history = OperationHistory::new();
        history.record_completed(Operation::Insert, "5", &Value::Number(5), true, 3);
        history.record_completed(Operation::Insert, "5", &Value::Number(5), false, 1);
        history.record_completed(Operation::Search, "5", &Value::Number(5), true, 2);

        assert_eq!(history.len(), 3);
        assert!(history.expected().contains(&Value::Number(5)));

        history.record_completed(Operation::Remove, "5", &Value::Number(5), true, 4);
        let stats = history.stats();
        assert_eq!(stats.inserts, 2);
        assert_eq!(stats.searches, 1);
        assert_eq!(stats.removes, 1);
        assert_eq!(stats.total_steps, 10);
        assert_eq!(stats.unique_values, 0);
    }

    #[test]
    fn test_operation_history_rejected_and_abandoned() {
        let mut history = OperationHistory::new();
        history.record_rejected(Operation::Insert, "x", "bad".to_string());
        history.record_abandoned(Operation::Remove, "3", 2);

        let stats = history.stats();
        assert_eq!(stats.rejected_inputs, 1);
        assert_eq!(stats.abandoned, 1);
        assert!(history.expected().is_empty());
        assert!(history.operations()[1].abandoned);
        assert_eq!(history.operations()[0].error.as_deref(), Some("bad"));
    }

    #[test]
    fn test_invariant_checker_accepts_consistent_tree() {
        let tree = tree_with(Variant::BPlus, &[4, 1, 3, 2, 5]);
        let model: BTreeSet<Value> = (1..=5).map(Value::Number).collect();

        let mut checker = InvariantChecker::new();
        checker.check_tree(&tree, &model, 0);
        assert!(!checker.has_violations(), "{:?}", checker.violations());
    }

    #[test]
    fn test_invariant_checker_flags_model_drift() {
        let tree = tree_with(Variant::B, &[1, 2]);
        let model: BTreeSet<Value> = [1, 2, 3].into_iter().map(Value::Number).collect();

        let mut checker = InvariantChecker::new();
        checker.check_tree(&tree, &model, 7);
        assert!(checker.has_violations());
        assert!(checker.violations().iter().all(|v| v.operation_index == 7));

        checker.clear();
        assert!(!checker.has_violations());
    }

    #[test]
    fn test_invariant_checker_outcome() {
        let model: BTreeSet<Value> = [Value::Number(1)].into_iter().collect();
        let mut checker = InvariantChecker::new();

        checker.check_outcome(Operation::Insert, &Value::Number(1), false, &model, 0);
        checker.check_outcome(Operation::Remove, &Value::Number(2), false, &model, 1);
        checker.check_outcome(Operation::Search, &Value::Number(1), true, &model, 2);
        assert!(!checker.has_violations());

        checker.check_outcome(Operation::Insert, &Value::Number(2), false, &model, 3);
        assert_eq!(checker.violations().len(), 1);
    }

    #[test]
    fn test_invariant_checker_steps() {
        let tree = tree_with(Variant::B, &[1, 2, 3]);
        let done = ops::insert(&tree, Value::Number(4)).expect("numeric value").finish();

        let mut checker = InvariantChecker::new();
        checker.check_steps(Operation::Insert, &done.steps, 0);
        assert!(!checker.has_violations(), "{:?}", checker.violations());

        checker.check_steps(Operation::Search, &done.steps, 1);
        assert_eq!(checker.violations().len(), 1);

        checker.check_steps(Operation::Remove, &[], 2);
        assert_eq!(checker.violations().len(), 2);
    }

    #[test]
    fn test_invariant_checker_rejection() {
        let mut checker = InvariantChecker::new();
        checker.check_rejection("4.5", true, true, 0);
        checker.check_rejection("4", false, false, 1);
        assert!(!checker.has_violations());

        checker.check_rejection("4", false, true, 2);
        assert_eq!(
            checker.violations()[0].description,
            "Well-formed input was rejected"
        );
    }
}
