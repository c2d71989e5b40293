//! Structural invariant checks.
//!
//! # Invariants
//!
//! - Keys within a node are strictly ascending.
//! - Every leaf is at the same depth.
//! - An internal node with k keys has k + 1 children.
//! - Child i's keys lie between the parent's keys i - 1 and i (open bounds for
//!   B trees; the lower bound is inclusive for B+ routing keys).
//! - Every node holds at most `order` keys; every non-root node holds at
//!   least the variant minimum; the root is never empty.
//! - B+ leaves form an ascending chain from the leftmost leaf; B leaves are
//!   unlinked.
//! - The presence set equals the set of stored values.
//! - Every live arena slot is reachable from the root.

use std::collections::HashSet;

use crate::tree::error::StructureError;
use crate::tree::node::NodeId;
use crate::tree::tree::Tree;
use crate::types::{Value, Variant};

struct Walk<'a> {
    tree: &'a Tree,
    leaf_depth: Option<usize>,
    leaves: Vec<NodeId>,
    seen: HashSet<NodeId>,
    stored: Vec<&'a Value>,
}

impl Tree {
    /// Check every structural invariant.
    ///
    /// Engines call this when a mutation completes; a failure is a bug.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant found.
    pub fn validate(&self) -> Result<(), StructureError> {
        let Some(root) = self.root() else {
            if !self.is_empty() {
                return Err(StructureError::tree(format!(
                    "no root but {} values in presence set",
                    self.len()
                )));
            }
            if self.node_count() != 0 {
                return Err(StructureError::tree(format!(
                    "no root but {} live nodes",
                    self.node_count()
                )));
            }
            return Ok(());
        };

        let mut walk = Walk {
            tree: self,
            leaf_depth: None,
            leaves: Vec::new(),
            seen: HashSet::new(),
            stored: Vec::new(),
        };
        walk.visit(root, 0, None, None)?;

        if walk.seen.len() != self.node_count() {
            return Err(StructureError::tree(format!(
                "{} live nodes but only {} reachable",
                self.node_count(),
                walk.seen.len()
            )));
        }

        walk.check_leaf_links()?;

        let stored: HashSet<&Value> = walk.stored.iter().copied().collect();
        if stored.len() != walk.stored.len() {
            return Err(StructureError::tree("a value is stored more than once"));
        }
        let present: HashSet<&Value> = self.values().collect();
        if stored != present {
            return Err(StructureError::tree(format!(
                "presence set holds {} values but the structure stores {}",
                present.len(),
                stored.len()
            )));
        }

        Ok(())
    }
}

impl<'a> Walk<'a> {
    fn visit(
        &mut self,
        id: NodeId,
        depth: usize,
        lower: Option<&'a Value>,
        upper: Option<&'a Value>,
    ) -> Result<(), StructureError> {
        if !self.seen.insert(id) {
            return Err(StructureError::at(id, "reachable twice"));
        }

        let tree = self.tree;
        let node = tree.node(id);
        let is_root = tree.root() == Some(id);

        if node.is_empty() {
            return Err(StructureError::at(id, "node has no keys"));
        }
        if node.len() > tree.order() {
            return Err(StructureError::at(
                id,
                format!("{} keys exceed order {}", node.len(), tree.order()),
            ));
        }
        let min = tree.min_keys(node.is_leaf());
        if !is_root && node.len() < min {
            return Err(StructureError::at(
                id,
                format!("{} keys below minimum {min}", node.len()),
            ));
        }
        if node.keys().windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(StructureError::at(id, "keys not strictly ascending"));
        }
        if node.is_observed() {
            return Err(StructureError::at(id, "working tree carries an observed marker"));
        }

        // Bounds inherited from the parent.
        let inclusive_lower = tree.variant() == Variant::BPlus;
        for key in node.keys() {
            let above_lower = lower.is_none_or(|l| if inclusive_lower { key >= l } else { key > l });
            let below_upper = upper.is_none_or(|u| key < u);
            if !above_lower || !below_upper {
                return Err(StructureError::at(
                    id,
                    format!("key {key} escapes its parent's separator bounds"),
                ));
            }
        }

        if node.is_leaf() {
            if !node.children().is_empty() {
                return Err(StructureError::at(id, "leaf has children"));
            }
            match self.leaf_depth {
                None => self.leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(StructureError::at(
                        id,
                        format!("leaf at depth {depth}, expected {expected}"),
                    ));
                }
                Some(_) => {}
            }
            self.leaves.push(id);
            self.stored.extend(node.keys());
            return Ok(());
        }

        if node.next().is_some() {
            return Err(StructureError::at(id, "internal node has a next-leaf link"));
        }
        if node.children().len() != node.len() + 1 {
            return Err(StructureError::at(
                id,
                format!(
                    "{} keys but {} children",
                    node.len(),
                    node.children().len()
                ),
            ));
        }
        if tree.variant() == Variant::B {
            self.stored.extend(node.keys());
        }

        let keys = node.keys();
        for (i, &child) in node.children().iter().enumerate() {
            let child_lower = if i == 0 { lower } else { Some(&keys[i - 1]) };
            let child_upper = keys.get(i).or(upper);
            self.visit(child, depth + 1, child_lower, child_upper)?;
        }

        Ok(())
    }

    /// Leaves were collected left to right; the chain must follow them.
    fn check_leaf_links(&self) -> Result<(), StructureError> {
        let linked = self.tree.variant().links_leaves();
        for (i, &leaf) in self.leaves.iter().enumerate() {
            let actual = self.tree.node(leaf).next();
            let expected = if linked {
                self.leaves.get(i + 1).copied()
            } else {
                None
            };
            if actual != expected {
                return Err(StructureError::at(
                    leaf,
                    format!("next-leaf link is {actual:?}, expected {expected:?}"),
                ));
            }
        }
        Ok(())
    }
}
