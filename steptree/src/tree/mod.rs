//! Tree model shared by the B and B+ engines.
//!
//! # Structure
//!
//! A [`Tree`] owns an arena of [`Node`]s:
//! - Internal nodes: ordered keys and one more child id than keys
//! - Leaf nodes: ordered keys; B+ leaves also link to the next leaf
//!
//! Snapshots ([`Snapshot`]) are deep copies with at most one node observed.
//!
//! # Usage
//!
//! ```
//! use steptree::tree::Tree;
//! use steptree::types::{ValueDomain, Variant};
//!
//! let tree = Tree::new(3, Variant::BPlus, ValueDomain::Numeric).unwrap();
//! assert!(tree.is_empty());
//! assert!(Tree::new(2, Variant::B, ValueDomain::Numeric).is_err());
//! ```

mod error;
mod node;
mod snapshot;
#[allow(clippy::module_inception)]
mod tree;
mod validate;

pub use error::{StructureError, TreeError};
pub use node::{Node, NodeId};
pub use snapshot::{LeafChain, NodeView, Snapshot, snapshot};
pub use tree::Tree;
