// Life of an operation:
// 1. Raw input comes in and is parsed in the tree's value domain
// 2. The engine clones the current tree and hands back a lazy step sequence
// 3. Each pull advances the private clone by one event:
//     - Search: visit nodes until a match or a leaf miss
//     - Insert: descend, write into the leaf, split upward while overfull
//     - Remove: B trees rebalance on the way down, B+ trees repair upward
// 4. Every step carries a frozen snapshot with at most one node observed
// 5. The last snapshot is accepted as the new current tree; dropping the
//    sequence early leaves the current tree as it was
//
// System components:
//  - Arena tree model and snapshots
//  - Step machines for search, insert and the two removals
//  - Session driver and seeded simulation harness

pub mod config;
mod e2e_tests;
pub mod ops;
pub mod session;
pub mod simulation;
pub mod tree;
pub mod types;

pub use ops::{Completion, Operation, Step, StepEvent, Steps};
pub use session::{Progress, Session, SessionError};
pub use tree::{Snapshot, Tree, TreeError};
pub use types::{Value, ValueDomain, Variant};
