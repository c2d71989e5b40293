//! B-tree removal, rebalancing on the way down.
//!
//! Before descending into a child that does not hold the target, a child at
//! minimum occupancy is topped up by borrowing from a sibling or merging with
//! one, so the removal never lands in a leaf that would underflow. A key found
//! in an internal node is replaced by its predecessor or successor, or the two
//! children around it are merged and the descent continues in the merged node.
//!
//! At even orders a merge of two minimum nodes plus their separator holds
//! `order + 1` keys. Merged nodes are remembered with their parent; once the
//! leaf removal is done they are revisited deepest-first and split back if
//! they are still too full.

use crate::ops::rebalance::{attach, collapse_root, merge, split, take_from_left, take_from_right};
use crate::ops::{Advance, Operation, StepEvent, assert_valid, emit};
use crate::tree::{NodeId, Tree};
use crate::types::Value;

enum Stage {
    Start,
    Enter(NodeId),
    Decide(NodeId),
    Unwind,
    Promote {
        parent: NodeId,
        left: NodeId,
        separator: Value,
        right: NodeId,
    },
    Collapse,
    Finish,
    Done(bool),
}

pub(crate) struct BRemoval {
    tree: Tree,
    /// The value being removed.
    value: Value,
    /// The key being chased; a predecessor or successor after a replacement.
    target: Value,
    /// `(parent, merged child)` pairs in descent order.
    merged: Vec<(NodeId, NodeId)>,
    stage: Stage,
}

impl BRemoval {
    pub(crate) fn new(tree: Tree, value: Value) -> Self {
        Self {
            tree,
            target: value.clone(),
            value,
            merged: Vec::new(),
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
                    self.stage = Stage::Decide(id);
                    return emit(&self.tree, StepEvent::Visited, Some(id));
                }
                Stage::Decide(id) => {
                    if let Some(step) = self.decide(id) {
                        return step;
                    }
                }
                Stage::Unwind => {
                    let Some((parent, child)) = self.merged.pop() else {
                        self.stage = Stage::Collapse;
                        continue;
                    };
                    if self.tree.node(child).len() <= self.tree.order() {
                        self.stage = Stage::Unwind;
                        continue;
                    }
                    let (separator, right) = split(&mut self.tree, child);
                    self.stage = Stage::Promote {
                        parent,
                        left: child,
                        separator,
                        right,
                    };
                    return emit(&self.tree, StepEvent::Split, Some(right));
                }
                Stage::Promote {
                    parent,
                    left,
                    separator,
                    right,
                } => {
                    attach(&mut self.tree, parent, left, separator, right);
                    self.stage = Stage::Unwind;
                    return emit(&self.tree, StepEvent::Promoted, Some(parent));
                }
                Stage::Collapse => {
                    self.stage = Stage::Finish;
                    let root_is_keyless = self
                        .tree
                        .root()
                        .is_some_and(|root| self.tree.node(root).is_empty());
                    if root_is_keyless {
                        let root = collapse_root(&mut self.tree);
                        return emit(&self.tree, StepEvent::RootCollapsed, root);
                    }
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

    /// Act on a visited node. Returns `None` when the descent moves on
    /// without an event worth a snapshot.
    fn decide(&mut self, id: NodeId) -> Option<Advance> {
        let node = self.tree.node(id);
        let index = node.lower_bound(&self.target);
        let found = node.keys().get(index) == Some(&self.target);
        let leaf = node.is_leaf();

        if found && leaf {
            let removed = self.tree.node_mut(id).remove_key(index);
            self.tree.record_writes(1);
            self.forget(&removed);
            self.stage = Stage::Unwind;
            return Some(emit(&self.tree, StepEvent::KeyRemoved, Some(id)));
        }

        if leaf {
            // Unreachable while the presence set matches the structure.
            self.stage = Stage::Unwind;
            return None;
        }

        let min = self.tree.min_keys(false);
        let children = node.children();

        if found {
            let left = children[index];
            let right = children[index + 1];

            if self.tree.node(left).len() > min {
                let predecessor = self.extreme(left, true);
                return Some(self.replace(id, index, predecessor, left));
            }
            if self.tree.node(right).len() > min {
                let successor = self.extreme(right, false);
                return Some(self.replace(id, index, successor, right));
            }

            let survivor = merge(&mut self.tree, id, index);
            self.merged.push((id, survivor));
            self.stage = Stage::Enter(survivor);
            return Some(emit(&self.tree, StepEvent::Merged, Some(survivor)));
        }

        let child = children[index];
        let min = self.tree.min_keys(self.tree.node(child).is_leaf());
        if self.tree.node(child).len() > min {
            self.stage = Stage::Enter(child);
            return None;
        }

        let left = index.checked_sub(1).map(|i| children[i]);
        let right = children.get(index + 1).copied();

        if left.is_some_and(|l| self.tree.node(l).len() > min) {
            take_from_left(&mut self.tree, id, index);
            self.stage = Stage::Enter(child);
            return Some(emit(&self.tree, StepEvent::BorrowedLeft, Some(child)));
        }
        if right.is_some_and(|r| self.tree.node(r).len() > min) {
            take_from_right(&mut self.tree, id, index);
            self.stage = Stage::Enter(child);
            return Some(emit(&self.tree, StepEvent::BorrowedRight, Some(child)));
        }

        let survivor = if left.is_some() {
            merge(&mut self.tree, id, index - 1)
        } else {
            merge(&mut self.tree, id, index)
        };
        self.merged.push((id, survivor));
        self.stage = Stage::Enter(survivor);
        Some(emit(&self.tree, StepEvent::Merged, Some(survivor)))
    }

    /// Overwrite internal key `index` of `id` and chase the replacement into
    /// `child`.
    fn replace(&mut self, id: NodeId, index: usize, replacement: Value, child: NodeId) -> Advance {
        let old = self.tree.node_mut(id).replace_key(index, replacement.clone());
        self.tree.record_writes(1);
        self.forget(&old);

        tracing::debug!("replaced {old} in {id} with {replacement}");
        self.target = replacement;
        self.stage = Stage::Enter(child);
        emit(&self.tree, StepEvent::Replaced, Some(id))
    }

    /// Largest (`rightmost`) or smallest key in the subtree at `id`.
    fn extreme(&self, mut id: NodeId, rightmost: bool) -> Value {
        loop {
            let node = self.tree.node(id);
            let next = if rightmost {
                node.children().last()
            } else {
                node.children().first()
            };
            match next {
                Some(&child) => id = child,
                None => {
                    let key = if rightmost {
                        node.keys().last()
                    } else {
                        node.keys().first()
                    };
                    let Some(key) = key else {
                        panic!("leaf {id} has no keys");
                    };
                    return key.clone();
                }
            }
        }
    }

    /// Drop the removed value from the presence set once it leaves the
    /// structure.
    fn forget(&mut self, key: &Value) {
        if *key == self.value {
            self.tree.presence_remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ops::{Completion, StepEvent, insert, remove};
    use crate::tree::Tree;
    use crate::types::{Value, ValueDomain, Variant};

    fn build(order: usize, values: impl IntoIterator<Item = i64>) -> Tree {
        let mut tree = Tree::new(order, Variant::B, ValueDomain::Numeric).expect("valid order");
        for v in values {
            tree = insert(&tree, Value::Number(v))
                .expect("numeric value")
                .finish()
                .into_tree();
        }
        tree
    }

    fn remove_one(tree: &Tree, value: i64) -> Completion {
        remove(tree, Value::Number(value)).expect("numeric value").finish()
    }

    #[test]
    fn test_remove_from_leaf() {
        let tree = build(3, [1, 2, 3, 4]);
        let done = remove_one(&tree, 1);

        assert!(done.result);
        assert_eq!(
            done.events(),
            vec![
                StepEvent::Visited,
                StepEvent::Visited,
                StepEvent::KeyRemoved,
                StepEvent::Completed
            ]
        );
        assert_eq!(done.into_tree().to_string(), "[3]\n[2] [4]");
    }

    #[test]
    fn test_internal_key_replaced_by_predecessor() {
        let tree = build(3, [10, 20, 30, 40, 50]);
        assert_eq!(tree.to_string(), "[30]\n[10 20] [40 50]");

        let done = remove_one(&tree, 30);
        assert!(done.events().contains(&StepEvent::Replaced));
        let tree = done.into_tree();
        assert_eq!(tree.to_string(), "[20]\n[10] [40 50]");
        assert!(!tree.contains(&Value::Number(30)));
    }

    #[test]
    fn test_internal_key_replaced_by_successor() {
        let tree = build(3, [10, 20, 30, 40, 50]);
        let tree = remove_one(&tree, 10).into_tree();
        assert_eq!(tree.to_string(), "[30]\n[20] [40 50]");

        // Left child is at minimum, so the right child lends its smallest key.
        let done = remove_one(&tree, 30);
        assert!(done.events().contains(&StepEvent::Replaced));
        assert!(!done.events().contains(&StepEvent::Merged));
        assert_eq!(done.into_tree().to_string(), "[40]\n[20] [50]");
    }

    #[test]
    fn test_merge_around_internal_key_collapses_root() {
        let tree = build(3, [1, 2, 3, 4]);
        let tree = remove_one(&tree, 1).into_tree();
        assert_eq!(tree.to_string(), "[3]\n[2] [4]");

        let done = remove_one(&tree, 3);
        let events = done.events();
        assert!(events.contains(&StepEvent::Merged));
        assert!(events.contains(&StepEvent::RootCollapsed));

        let tree = done.into_tree();
        assert_eq!(tree.to_string(), "[2 4]");
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn test_borrow_before_descending() {
        // [3] over [1] and [4 5]: the left leaf is at minimum, so removing 1
        // first rotates 3 down and 4 up.
        let tree = build(3, [1, 2, 3, 4, 5]);
        let tree = remove_one(&tree, 2).into_tree();
        assert_eq!(tree.to_string(), "[3]\n[1] [4 5]");

        let done = remove_one(&tree, 1);
        assert!(done.events().contains(&StepEvent::BorrowedRight));
        assert_eq!(done.into_tree().to_string(), "[4]\n[3] [5]");
    }

    #[test]
    fn test_last_value_empties_tree() {
        let tree = build(3, [7]);
        let done = remove_one(&tree, 7);

        assert_eq!(done.events().last(), Some(&StepEvent::Completed));
        assert!(done.events().contains(&StepEvent::RootCollapsed));
        let tree = done.into_tree();
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn test_absent_value_rejected() {
        let tree = build(3, [1, 2, 3]);
        let done = remove_one(&tree, 9);

        assert!(!done.result);
        assert_eq!(done.events(), vec![StepEvent::Rejected]);
        assert_eq!(done.into_tree(), tree);
    }

    #[test]
    fn test_even_order_merge_is_split_back() {
        // Order 4: [10] over [1 2] and [20 30]. Removing 20 merges both
        // leaves with 10 into five keys, then removes 20 from the merge.
        let tree = build(4, [1, 2, 10, 20, 30]);
        assert_eq!(tree.to_string(), "[10]\n[1 2] [20 30]");

        let tree = remove_one(&tree, 20).into_tree();
        assert_eq!(tree.to_string(), "[1 2 10 30]");
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn test_even_order_internal_merge_is_split_back() {
        let mut tree = build(4, 1..=40);
        for v in (1..=40).step_by(3) {
            tree = remove_one(&tree, v).into_tree();
            assert_eq!(tree.validate(), Ok(()), "after removing {v}");
        }
        for v in 1..=40 {
            assert_eq!(tree.contains(&Value::Number(v)), v % 3 != 1);
        }
    }
}
