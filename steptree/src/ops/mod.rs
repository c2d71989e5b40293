//! Search, insert and remove as replayable step sequences.
//!
//! Each entry point clones the caller's tree and returns a [`Steps`]
//! iterator. Every call to `next()` advances the algorithm by exactly one
//! event on the private clone and yields a [`Step`]: the event plus an
//! immutable [`Snapshot`] of progress so far. The caller's tree is never
//! touched; dropping a half-consumed sequence is a complete cancellation.
//!
//! # Usage
//!
//! ```
//! use steptree::ops;
//! use steptree::tree::Tree;
//! use steptree::types::{Value, ValueDomain, Variant};
//!
//! let mut tree = Tree::new(3, Variant::B, ValueDomain::Numeric).unwrap();
//! for v in 1..=4 {
//!     tree = ops::insert(&tree, Value::Number(v)).unwrap().finish().into_tree();
//! }
//!
//! let found = ops::search(&tree, Value::Number(3)).unwrap().finish();
//! assert!(found.result);
//! assert_eq!(tree.to_string(), "[3]\n[1 2] [4]");
//! ```

mod insert;
mod rebalance;
mod remove_b;
mod remove_bplus;
mod search;

use std::fmt;
use std::iter::FusedIterator;

use crate::tree::{NodeId, Snapshot, Tree, TreeError, snapshot};
use crate::types::{Value, ValueDomain, Variant};

use insert::Insertion;
use remove_b::BRemoval;
use remove_bplus::BPlusRemoval;
use search::Search;

/// Create an empty tree.
///
/// # Errors
///
/// Returns [`TreeError::InvalidConfiguration`] if `order` is below 3.
pub fn create_tree(order: usize, variant: Variant, domain: ValueDomain) -> Result<Tree, TreeError> {
    Tree::new(order, variant, domain)
}

/// Look `value` up, one node per step.
///
/// # Errors
///
/// Returns [`TreeError::InvalidValue`] if `value` is outside the tree's
/// domain. No steps are produced in that case.
pub fn search(tree: &Tree, value: Value) -> Result<Steps, TreeError> {
    tree.check_value(&value)?;
    Ok(Steps::new(
        Operation::Search,
        Machine::Search(Search::new(tree.clone(), value)),
    ))
}

/// Insert `value`. The outcome is `false` only if it is already present.
///
/// # Errors
///
/// Returns [`TreeError::InvalidValue`] if `value` is outside the tree's
/// domain.
pub fn insert(tree: &Tree, value: Value) -> Result<Steps, TreeError> {
    tree.check_value(&value)?;
    Ok(Steps::new(
        Operation::Insert,
        Machine::Insert(Insertion::new(tree.clone(), value)),
    ))
}

/// Remove `value`. The outcome is `false` only if it is absent.
///
/// # Errors
///
/// Returns [`TreeError::InvalidValue`] if `value` is outside the tree's
/// domain.
pub fn remove(tree: &Tree, value: Value) -> Result<Steps, TreeError> {
    tree.check_value(&value)?;
    let machine = match tree.variant() {
        Variant::B => Machine::RemoveB(BRemoval::new(tree.clone(), value)),
        Variant::BPlus => Machine::RemoveBPlus(BPlusRemoval::new(tree.clone(), value)),
    };
    Ok(Steps::new(Operation::Remove, machine))
}

/// Run `operation` on `tree`.
///
/// # Errors
///
/// Returns [`TreeError::InvalidValue`] if `value` is outside the tree's
/// domain.
pub fn run(operation: Operation, tree: &Tree, value: Value) -> Result<Steps, TreeError> {
    match operation {
        Operation::Search => search(tree, value),
        Operation::Insert => insert(tree, value),
        Operation::Remove => remove(tree, value),
    }
}

/// The three engine entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Search,
    Insert,
    Remove,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Search => "search",
            Self::Insert => "insert",
            Self::Remove => "remove",
        })
    }
}

/// What happened at a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepEvent {
    /// A node was entered during descent.
    Visited,
    /// The value was found in the observed node.
    Found,
    /// The search ended without a match.
    NotFound,
    /// Duplicate insert or absent removal; nothing was changed.
    Rejected,
    /// The value was written into the observed leaf.
    KeyWritten,
    /// A node overflowed and split; the observed node is the new right half.
    Split,
    /// A separator was inserted into the observed parent.
    Promoted,
    /// A new root was created; the tree grew by one level.
    RootCreated,
    /// A key was removed from the observed node.
    KeyRemoved,
    /// An internal key was replaced by its predecessor or successor.
    Replaced,
    /// The observed node took a key from its left sibling.
    BorrowedLeft,
    /// The observed node took a key from its right sibling.
    BorrowedRight,
    /// Two siblings merged into the observed node.
    Merged,
    /// Two siblings were rebalanced instead of merged.
    Redistributed,
    /// The root lost its last key; the tree shrank by one level or emptied.
    RootCollapsed,
    /// The operation finished; the snapshot is the final state.
    Completed,
}

/// One step of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub event: StepEvent,
    pub snapshot: Snapshot,
}

/// Result of advancing a machine by one event.
pub(crate) enum Advance {
    Yield(Step),
    Done(bool),
}

/// Emit a step from the current state of a working tree.
pub(crate) fn emit(tree: &Tree, event: StepEvent, observed: Option<NodeId>) -> Advance {
    Advance::Yield(Step {
        event,
        snapshot: snapshot(tree, observed),
    })
}

/// Assert the working tree is well formed. A failure is an engine bug.
pub(crate) fn assert_valid(tree: &Tree, operation: Operation, value: &Value) {
    if cfg!(debug_assertions) {
        if let Err(e) = tree.validate() {
            panic!("{operation} of {value} left a malformed {} tree: {e}\n{tree}", tree.variant());
        }
    }
}

enum Machine {
    Search(Search),
    Insert(Insertion),
    RemoveB(BRemoval),
    RemoveBPlus(BPlusRemoval),
}

impl Machine {
    fn advance(&mut self) -> Advance {
        match self {
            Self::Search(m) => m.advance(),
            Self::Insert(m) => m.advance(),
            Self::RemoveB(m) => m.advance(),
            Self::RemoveBPlus(m) => m.advance(),
        }
    }
}

/// A lazily produced sequence of steps.
///
/// Pulling a step runs the algorithm up to its next event and no further.
/// Once the iterator returns `None`, [`Steps::outcome`] holds the result.
pub struct Steps {
    operation: Operation,
    machine: Machine,
    outcome: Option<bool>,
}

impl Steps {
    const fn new(operation: Operation, machine: Machine) -> Self {
        Self {
            operation,
            machine,
            outcome: None,
        }
    }

    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    /// The boolean result, once the sequence is exhausted.
    #[must_use]
    pub const fn outcome(&self) -> Option<bool> {
        self.outcome
    }

    /// Drain the remaining steps.
    ///
    /// # Panics
    ///
    /// Panics if the sequence was already exhausted before any step could be
    /// collected, since there is then no final snapshot to report.
    #[must_use]
    pub fn finish(mut self) -> Completion {
        let steps: Vec<Step> = self.by_ref().collect();
        assert!(
            !steps.is_empty(),
            "finish() called on an exhausted {} sequence",
            self.operation
        );
        Completion {
            operation: self.operation,
            result: self.outcome.unwrap_or(false),
            steps,
        }
    }
}

impl Iterator for Steps {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.outcome.is_some() {
            return None;
        }
        match self.machine.advance() {
            Advance::Yield(step) => Some(step),
            Advance::Done(result) => {
                self.outcome = Some(result);
                None
            }
        }
    }
}

impl FusedIterator for Steps {}

impl fmt::Debug for Steps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Steps")
            .field("operation", &self.operation)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

/// A fully drained operation.
#[derive(Debug, Clone)]
pub struct Completion {
    pub operation: Operation,
    pub result: bool,
    /// Every step, in order. Never empty.
    pub steps: Vec<Step>,
}

impl Completion {
    /// The authoritative end state.
    #[must_use]
    pub fn final_snapshot(&self) -> &Snapshot {
        &self.steps[self.steps.len() - 1].snapshot
    }

    /// Events in order.
    #[must_use]
    pub fn events(&self) -> Vec<StepEvent> {
        self.steps.iter().map(|s| s.event).collect()
    }

    /// Accept the final snapshot as the new current tree.
    #[must_use]
    pub fn into_tree(mut self) -> Tree {
        let last = self.steps.swap_remove(self.steps.len() - 1);
        last.snapshot.into_tree()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(variant: Variant) -> Tree {
        create_tree(3, variant, ValueDomain::Numeric).expect("valid order")
    }

    #[test]
    fn test_invalid_value_produces_no_steps() {
        let tree = numeric(Variant::B);
        for operation in [Operation::Search, Operation::Insert, Operation::Remove] {
            let err = run(operation, &tree, Value::from("x")).expect_err("wrong domain");
            assert!(matches!(err, TreeError::InvalidValue { .. }));
        }
    }

    #[test]
    fn test_steps_are_lazy_and_fused() {
        let tree = numeric(Variant::BPlus);
        let mut steps = insert(&tree, Value::Number(1)).expect("valid value");

        assert_eq!(steps.outcome(), None);
        let first = steps.next().expect("first step");
        assert_eq!(first.event, StepEvent::RootCreated);
        assert_eq!(steps.outcome(), None);

        while steps.next().is_some() {}
        assert_eq!(steps.outcome(), Some(true));
        assert!(steps.next().is_none());
    }

    #[test]
    fn test_abandoned_sequence_leaves_tree_untouched() {
        let tree = numeric(Variant::B);
        let before = tree.clone();
        {
            let mut steps = insert(&tree, Value::Number(5)).expect("valid value");
            let _ = steps.next();
        }
        assert_eq!(tree, before);
    }

    #[test]
    fn test_completion_accessors() {
        let tree = numeric(Variant::B);
        let done = insert(&tree, Value::Number(7)).expect("valid value").finish();

        assert!(done.result);
        assert_eq!(done.operation, Operation::Insert);
        assert_eq!(done.events().last(), Some(&StepEvent::Completed));
        assert!(done.final_snapshot().contains(&Value::Number(7)));

        let next = done.into_tree();
        assert_eq!(next.len(), 1);
        assert_eq!(next.validate(), Ok(()));
    }
}
