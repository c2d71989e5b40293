//! B+-tree removal: route to the owning leaf, remove, then repair upward.
//!
//! An underfull node borrows from its right sibling, else its left, else
//! merges with a sibling and the parent is checked next. Separators left
//! behind by a removed leaf key are not rewritten; they still route
//! correctly because every key right of a separator stays at or above it.

use crate::ops::rebalance::{collapse_root, merge, redistribute, take_from_left, take_from_right};
use crate::ops::{Advance, Operation, StepEvent, assert_valid, emit};
use crate::tree::{NodeId, Tree};
use crate::types::Value;

enum Stage {
    Start,
    Enter(NodeId),
    Remove(NodeId),
    Repair(NodeId),
    /// A merge took a separator from this node.
    Merged(NodeId),
    Finish,
    Done(bool),
}

pub(crate) struct BPlusRemoval {
    tree: Tree,
    value: Value,
    /// `(ancestor, child index taken)`, root first.
    path: Vec<(NodeId, usize)>,
    stage: Stage,
}

impl BPlusRemoval {
    pub(crate) const fn new(tree: Tree, value: Value) -> Self {
        Self {
            tree,
            value,
            path: Vec::new(),
            stage: Stage::Start,
        }
    }

    pub(crate) fn advance(&mut self) -> Advance {
        loop {
            match std::mem::replace(&mut self.stage, Stage::Done(true)) {
                Stage::Start => match self.tree.root() {
                    Some(root) if self.tree.contains(&self.value) => {
                        self.stage = Stage::Enter(root);
                    }
                    _ => {
                        tracing::debug!("remove of {} rejected: not present", self.value);
                        self.stage = Stage::Done(false);
                        return emit(&self.tree, StepEvent::Rejected, None);
                    }
                },
                Stage::Enter(id) => {
                    self.tree.record_read();
                    let node = self.tree.node(id);
                    self.stage = if node.is_leaf() {
                        Stage::Remove(id)
                    } else {
                        let index = node.route(&self.value);
                        self.path.push((id, index));
                        Stage::Enter(node.children()[index])
                    };
                    return emit(&self.tree, StepEvent::Visited, Some(id));
                }
                Stage::Remove(id) => {
                    // Unreachable miss while the presence set matches the leaves.
                    let Ok(index) = self.tree.node(id).find(&self.value) else {
                        self.stage = Stage::Finish;
                        continue;
                    };
                    self.tree.node_mut(id).remove_key(index);
                    self.tree.record_writes(1);
                    self.tree.presence_remove(&self.value);
                    self.stage = Stage::Repair(id);
                    return emit(&self.tree, StepEvent::KeyRemoved, Some(id));
                }
                Stage::Repair(id) => {
                    if let Some(step) = self.repair(id) {
                        return step;
                    }
                }
                Stage::Merged(parent) => {
                    let is_root = self.tree.root() == Some(parent);
                    if is_root && self.tree.node(parent).is_empty() {
                        self.stage = Stage::Finish;
                        let root = collapse_root(&mut self.tree);
                        return emit(&self.tree, StepEvent::RootCollapsed, root);
                    }
                    self.stage = Stage::Repair(parent);
                }
                Stage::Finish => {
                    assert_valid(&self.tree, Operation::Remove, &self.value);
                    self.stage = Stage::Done(true);
                    return emit(&self.tree, StepEvent::Completed, None);
                }
                Stage::Done(result) => {
                    self.stage = Stage::Done(result);
                    return Advance::Done(result);
                }
            }
        }
    }

    /// Fix an underfull node using its parent and siblings. Returns `None`
    /// when the node is already satisfied.
    fn repair(&mut self, id: NodeId) -> Option<Advance> {
        let node = self.tree.node(id);
        let len = node.len();
        let leaf = node.is_leaf();

        if self.tree.root() == Some(id) {
            self.stage = Stage::Finish;
            if len == 0 {
                let root = collapse_root(&mut self.tree);
                return Some(emit(&self.tree, StepEvent::RootCollapsed, root));
            }
            return None;
        }

        let min = self.tree.min_keys(leaf);
        if len >= min {
            self.stage = Stage::Finish;
            return None;
        }

        let Some((parent, index)) = self.path.pop() else {
            panic!("non-root node {id} has no recorded parent");
        };
        self.tree.record_read();
        let siblings = self.tree.node(parent).children();
        let left = index.checked_sub(1).map(|i| siblings[i]);
        let right = siblings.get(index + 1).copied();
        for _ in left.iter().chain(right.iter()) {
            self.tree.record_read();
        }

        let surplus = |tree: &Tree, sibling: Option<NodeId>| {
            sibling.is_some_and(|s| tree.node(s).len() > min)
        };

        if surplus(&self.tree, right) {
            take_from_right(&mut self.tree, parent, index);
            self.stage = Stage::Finish;
            return Some(emit(&self.tree, StepEvent::BorrowedRight, Some(id)));
        }
        if surplus(&self.tree, left) {
            take_from_left(&mut self.tree, parent, index);
            self.stage = Stage::Finish;
            return Some(emit(&self.tree, StepEvent::BorrowedLeft, Some(id)));
        }

        // Merge with the right sibling when there is one, else the left.
        let (pair, observed) = match (right, left) {
            (Some(_), _) => (index, id),
            (None, Some(l)) => (index - 1, l),
            (None, None) => panic!("non-root node {id} has no siblings"),
        };

        let separator_moves = usize::from(!leaf);
        let combined = {
            let children = self.tree.node(parent).children();
            self.tree.node(children[pair]).len()
                + self.tree.node(children[pair + 1]).len()
                + separator_moves
        };
        if combined > self.tree.order() {
            redistribute(&mut self.tree, parent, pair);
            self.stage = Stage::Finish;
            return Some(emit(&self.tree, StepEvent::Redistributed, Some(observed)));
        }

        let survivor = merge(&mut self.tree, parent, pair);
        self.stage = Stage::Merged(parent);
        Some(emit(&self.tree, StepEvent::Merged, Some(survivor)))
    }
}
