//! Main simulator harness for deterministic simulation testing.
//!
//! This module ties together the workload generator, a [`Session`] and the
//! invariant checker to provide a complete testing framework for both tree
//! variants.

use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};

use super::invariants::{InvariantChecker, InvariantViolation, OperationHistory};
use super::workload::{Request, WorkloadConfig, WorkloadGenerator};
use crate::ops::Step;
use crate::session::{Outcome, Progress, Session};
use crate::types::{Value, ValueDomain, Variant};

/// Configuration for the simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility.
    pub seed: u64,
    pub order: usize,
    pub variant: Variant,
    pub domain: ValueDomain,
    /// Workload generation configuration.
    pub workload: WorkloadConfig,
    /// Probability of abandoning an operation part way through.
    pub abandon_rate: f64,
}

impl SimulatorConfig {
    /// Create a new simulator config with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            order: 3,
            variant: Variant::BPlus,
            domain: ValueDomain::Numeric,
            workload: WorkloadConfig::default(),
            abandon_rate: 0.0,
        }
    }

    #[must_use]
    pub const fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub const fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    #[must_use]
    pub const fn with_domain(mut self, domain: ValueDomain) -> Self {
        self.domain = domain;
        self
    }

    /// Set the workload configuration.
    #[must_use]
    pub const fn with_workload_config(mut self, config: WorkloadConfig) -> Self {
        self.workload = config;
        self
    }

    /// Set the malformed input rate.
    #[must_use]
    pub const fn with_malformed_rate(mut self, rate: f64) -> Self {
        self.workload.malformed_rate = rate;
        self
    }

    /// Set the rate at which operations are dropped before finishing.
    #[must_use]
    pub const fn with_abandon_rate(mut self, rate: f64) -> Self {
        self.abandon_rate = rate;
        self
    }
}

/// Results from a simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The seed used for this simulation.
    pub seed: u64,
    /// Number of requests processed.
    pub requests_processed: u64,
    /// Operations that ran to completion.
    pub completed_operations: u64,
    /// Requests refused before any step (expected for malformed input).
    pub rejected_operations: u64,
    /// Operations dropped part way through.
    pub abandoned_operations: u64,
    /// Invariant violations detected.
    pub invariant_violations: Vec<InvariantViolation>,
    /// Whether the simulation completed without panics.
    pub completed_successfully: bool,
    /// Error message if simulation failed.
    pub error: Option<String>,
}

impl SimulationResult {
    /// Check if the simulation passed (no invariant violations).
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.completed_successfully && self.invariant_violations.is_empty()
    }
}

/// The main simulator harness.
///
/// This ties together all simulation components:
/// - Workload generator
/// - Session owning the current tree
/// - Model of the expected contents
/// - Invariant checker
pub struct Simulator {
    config: SimulatorConfig,
    workload: WorkloadGenerator,
    history: OperationHistory,
    checker: InvariantChecker,
    requests_processed: u64,
    completed_operations: u64,
    rejected_operations: u64,
    abandoned_operations: u64,
}

impl Simulator {
    /// Create a new simulator with the given configuration.
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        let workload =
            WorkloadGenerator::with_config(config.seed, config.domain, config.workload.clone());

        Self {
            config,
            workload,
            history: OperationHistory::new(),
            checker: InvariantChecker::new(),
            requests_processed: 0,
            completed_operations: 0,
            rejected_operations: 0,
            abandoned_operations: 0,
        }
    }

    /// Run the simulation for a given number of requests.
    ///
    /// This creates a fresh empty tree, drives the requests through a session
    /// and checks invariants after each operation. An engine panic ends the
    /// run and is reported in the result.
    pub fn run(&mut self, request_count: usize) -> SimulationResult {
        let mut session =
            match Session::create(self.config.order, self.config.variant, self.config.domain) {
                Ok(session) => session,
                Err(e) => return self.result(false, Some(format!("Failed to create tree: {e}"))),
            };

        let run = panic::catch_unwind(AssertUnwindSafe(|| {
            for _ in 0..request_count {
                let request = self.workload.next_request();
                self.process(&mut session, &request);
            }
        }));

        match run {
            Ok(()) => self.result(true, None),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<String>()
                    .cloned()
                    .or_else(|| payload.downcast_ref::<&str>().map(|s| (*s).to_string()))
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(seed = self.config.seed, "simulation panicked: {message}");
                self.result(false, Some(message))
            }
        }
    }

    fn process(&mut self, session: &mut Session, request: &Request) {
        self.requests_processed += 1;
        let index = self.history.len();
        let malformed = request.malformation.is_some();

        if let Err(e) = session.begin_input(request.operation, &request.input) {
            self.checker
                .check_rejection(&request.input, malformed, true, index);
            self.history
                .record_rejected(request.operation, &request.input, e.to_string());
            self.rejected_operations += 1;
            return;
        }
        self.checker
            .check_rejection(&request.input, malformed, false, index);

        let Some(value) = session.current_operation().map(|(_, v)| v.clone()) else {
            self.checker.add_violation(InvariantViolation {
                description: "Accepted request is not in flight".to_string(),
                operation_index: index,
                context: request.input.clone(),
            });
            return;
        };

        let abandon_after = (self.workload.chance() < self.config.abandon_rate)
            .then(|| self.workload.below(4));
        let before = abandon_after.map(|_| session.tree().clone());
        let model_before: BTreeSet<Value> = self.history.expected().clone();

        let mut steps: Vec<Step> = Vec::new();
        let finished = loop {
            if abandon_after == Some(steps.len()) {
                break None;
            }
            match session.step() {
                Some(Progress::Step(step)) => steps.push(step),
                Some(Progress::Finished(outcome)) => break Some(outcome),
                None => break None,
            }
        };

        match finished {
            Some(outcome) => {
                self.check_completed(session, request, &value, &steps, &outcome, &model_before);
            }
            None => {
                session.abandon();
                if let Some(before) = before {
                    self.checker.check_untouched(&before, session.tree(), index);
                }
                self.history
                    .record_abandoned(request.operation, &request.input, steps.len());
                self.abandoned_operations += 1;
            }
        }
    }

    fn check_completed(
        &mut self,
        session: &Session,
        request: &Request,
        value: &Value,
        steps: &[Step],
        outcome: &Outcome,
        model_before: &BTreeSet<Value>,
    ) {
        let index = self.history.len();

        self.checker.check_steps(request.operation, steps, index);
        self.checker
            .check_outcome(request.operation, value, outcome.result, model_before, index);
        if let Some(last) = steps.last() {
            if &last.snapshot.clone().into_tree() != session.tree() {
                self.checker.add_violation(InvariantViolation {
                    description: "Current tree is not the final snapshot".to_string(),
                    operation_index: index,
                    context: format!("{} of {value}", request.operation),
                });
            }
        }

        self.history.record_completed(
            request.operation,
            &request.input,
            value,
            outcome.result,
            outcome.steps,
        );
        self.checker
            .check_tree(session.tree(), self.history.expected(), index);
        self.completed_operations += 1;
    }

    fn result(&self, completed_successfully: bool, error: Option<String>) -> SimulationResult {
        SimulationResult {
            seed: self.config.seed,
            requests_processed: self.requests_processed,
            completed_operations: self.completed_operations,
            rejected_operations: self.rejected_operations,
            abandoned_operations: self.abandoned_operations,
            invariant_violations: self.checker.violations().to_vec(),
            completed_successfully,
            error,
        }
    }

    /// Get the operation history.
    #[must_use]
    pub const fn history(&self) -> &OperationHistory {
        &self.history
    }

    /// Get the invariant checker.
    #[must_use]
    pub const fn checker(&self) -> &InvariantChecker {
        &self.checker
    }

    /// Get statistics about the simulation.
    #[must_use]
    pub fn stats(&self) -> SimulatorStats {
        SimulatorStats {
            requests_processed: self.requests_processed,
            completed_operations: self.completed_operations,
            rejected_operations: self.rejected_operations,
            abandoned_operations: self.abandoned_operations,
            invariant_violations: self.checker.violations().len(),
        }
    }
}

/// Statistics about the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorStats {
    pub requests_processed: u64,
    pub completed_operations: u64,
    pub rejected_operations: u64,
    pub abandoned_operations: u64,
    pub invariant_violations: usize,
}
