//! Deterministic simulation testing of the tree engines.
//!
//! This module drives a [`Session`](crate::session::Session) with:
//! - Reproducible random workloads (inserts, removals, searches)
//! - Malformed input the value domain must refuse
//! - Operations abandoned part way through
//! - Invariant checking against a sorted-set model after each operation
//!
//! # Design Principles
//!
//! 1. All randomness is seeded for reproducibility
//! 2. Given the same seed, execution is identical
//! 3. The model is the source of truth; the tree must agree with it after
//!    every completed operation
//! 4. An engine panic is a failed run, not a crashed test process
//!
//! # Usage
//!
//! ```ignore
//! use steptree::simulation::{Simulator, SimulatorConfig};
//! use steptree::types::Variant;
//!
//! let config = SimulatorConfig::new(12345) // seed
//!     .with_variant(Variant::B)
//!     .with_order(4)
//!     .with_malformed_rate(0.1);
//!
//! let mut sim = Simulator::new(config);
//! let result = sim.run(1000); // Run 1000 requests
//!
//! assert!(result.invariant_violations.is_empty());
//! ```

mod invariants;
mod simulator;
mod workload;

pub use invariants::{
    HistoryStats, InvariantChecker, InvariantViolation, OperationHistory, OperationRecord,
};
pub use simulator::{SimulationResult, Simulator, SimulatorConfig, SimulatorStats};
pub use workload::{MalformationType, Request, WorkloadConfig, WorkloadGenerator};
