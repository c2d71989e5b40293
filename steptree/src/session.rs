//! Driver-side ownership of the current tree.
//!
//! A [`Session`] holds the externally visible tree and at most one operation
//! in flight. Steps are pulled one at a time; the current tree is replaced
//! only when the operation reaches its terminal step. Abandoning an
//! operation drops its private clone and leaves the current tree as it was.

use crate::ops::{self, Operation, Step, Steps};
use crate::tree::{Snapshot, Tree, TreeError};
use crate::types::{Value, ValueDomain, Variant};

/// Error returned when a session refuses a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Another operation is still in flight.
    Busy,
    /// The tree rejected the request.
    Tree(TreeError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "an operation is already in progress"),
            Self::Tree(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Busy => None,
            Self::Tree(e) => Some(e),
        }
    }
}

impl From<TreeError> for SessionError {
    fn from(e: TreeError) -> Self {
        Self::Tree(e)
    }
}

/// How a finished operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub operation: Operation,
    pub value: Value,
    pub result: bool,
    /// Number of steps the operation produced.
    pub steps: usize,
}

/// What one call to [`Session::step`] produced.
#[derive(Debug, Clone)]
pub enum Progress {
    Step(Step),
    /// The operation ended and its final snapshot is now the current tree.
    Finished(Outcome),
}

struct InFlight {
    steps: Steps,
    value: Value,
    last: Option<Snapshot>,
    taken: usize,
}

/// The current tree plus the operation being stepped through, if any.
pub struct Session {
    tree: Tree,
    in_flight: Option<InFlight>,
}

impl Session {
    #[must_use]
    pub const fn new(tree: Tree) -> Self {
        Self {
            tree,
            in_flight: None,
        }
    }

    /// Start a session over a fresh empty tree.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidConfiguration`] if `order` is below 3.
    pub fn create(order: usize, variant: Variant, domain: ValueDomain) -> Result<Self, TreeError> {
        Ok(Self::new(ops::create_tree(order, variant, domain)?))
    }

    /// The current tree. Never reflects an unfinished operation.
    #[must_use]
    pub const fn tree(&self) -> &Tree {
        &self.tree
    }

    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The operation in flight, if any.
    #[must_use]
    pub fn current_operation(&self) -> Option<(Operation, &Value)> {
        self.in_flight
            .as_ref()
            .map(|f| (f.steps.operation(), &f.value))
    }

    /// Start an operation on the current tree.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Busy`] if another operation is in flight, or
    /// the tree's error if `value` is outside its domain.
    pub fn begin(&mut self, operation: Operation, value: Value) -> Result<(), SessionError> {
        if self.in_flight.is_some() {
            return Err(SessionError::Busy);
        }
        let steps = ops::run(operation, &self.tree, value.clone())?;

        tracing::debug!("began {operation} of {value}");
        self.in_flight = Some(InFlight {
            steps,
            value,
            last: None,
            taken: 0,
        });
        Ok(())
    }

    /// Parse raw input in the tree's domain and start an operation.
    ///
    /// # Errors
    ///
    /// Same as [`Session::begin`], plus [`TreeError::InvalidValue`] for input
    /// that does not parse.
    pub fn begin_input(&mut self, operation: Operation, input: &str) -> Result<(), SessionError> {
        if self.in_flight.is_some() {
            return Err(SessionError::Busy);
        }
        let value = self.tree.domain().parse(input)?;
        self.begin(operation, value)
    }

    /// Advance the operation in flight by one step.
    ///
    /// Returns `None` when nothing is in flight.
    pub fn step(&mut self) -> Option<Progress> {
        let flight = self.in_flight.as_mut()?;

        if let Some(step) = flight.steps.next() {
            flight.last = Some(step.snapshot.clone());
            flight.taken += 1;
            return Some(Progress::Step(step));
        }

        let flight = self.in_flight.take()?;
        let result = flight.steps.outcome().unwrap_or(false);
        let operation = flight.steps.operation();
        if let Some(last) = flight.last {
            self.tree = last.into_tree();
        }

        tracing::debug!("{operation} of {} finished: {result}", flight.value);
        Some(Progress::Finished(Outcome {
            operation,
            value: flight.value,
            result,
            steps: flight.taken,
        }))
    }

    /// Run the operation in flight to the end.
    pub fn skip(&mut self) -> Option<Outcome> {
        loop {
            match self.step()? {
                Progress::Step(_) => {}
                Progress::Finished(outcome) => return Some(outcome),
            }
        }
    }

    /// Drop the operation in flight. The current tree is untouched.
    ///
    /// Returns whether anything was in flight.
    pub fn abandon(&mut self) -> bool {
        let Some(flight) = self.in_flight.take() else {
            return false;
        };
        tracing::debug!(
            "abandoned {} of {} after {} steps",
            flight.steps.operation(),
            flight.value,
            flight.taken
        );
        true
    }

    /// Replace the current tree with a fresh empty one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Busy`] while an operation is in flight, or
    /// [`TreeError::InvalidConfiguration`] for an order below 3.
    pub fn reset(&mut self, order: usize, variant: Variant, domain: ValueDomain) -> Result<(), SessionError> {
        if self.in_flight.is_some() {
            return Err(SessionError::Busy);
        }
        self.tree = ops::create_tree(order, variant, domain)?;
        Ok(())
    }
}
