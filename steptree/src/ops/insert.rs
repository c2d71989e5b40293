//! Insertion: descent to the owning leaf, sorted write, then bottom-up split
//! propagation. A root split is the only way the tree grows taller.

use crate::ops::rebalance::{attach, grow_root, split};
use crate::ops::{Advance, Operation, StepEvent, assert_valid, emit};
use crate::tree::{Node, NodeId, Tree};
use crate::types::{Value, Variant};

enum Stage {
    Start,
    Enter(NodeId),
    Write(NodeId),
    /// Split the node if it overflowed.
    Check(NodeId),
    /// Hand a split's separator to the parent, or grow a new root.
    Promote {
        left: NodeId,
        separator: Value,
        right: NodeId,
    },
    Finish,
    Done(bool),
}

pub(crate) struct Insertion {
    tree: Tree,
    value: Value,
    /// Ancestors of the node being worked on, root first.
    path: Vec<NodeId>,
    stage: Stage,
}

impl Insertion {
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
                Stage::Start => {
                    let Some(root) = self.tree.root() else {
                        return self.plant_root();
                    };
                    if self.tree.contains(&self.value) {
                        tracing::debug!("insert of {} rejected: already present", self.value);
                        self.stage = Stage::Done(false);
                        return emit(&self.tree, StepEvent::Rejected, None);
                    }
                    self.stage = Stage::Enter(root);
                }
                Stage::Enter(id) => {
                    self.tree.record_read();
                    let node = self.tree.node(id);
                    self.stage = if node.is_leaf() {
                        Stage::Write(id)
                    } else {
                        let index = match self.tree.variant() {
                            Variant::B => node.lower_bound(&self.value),
                            Variant::BPlus => node.route(&self.value),
                        };
                        self.path.push(id);
                        Stage::Enter(node.children()[index])
                    };
                    return emit(&self.tree, StepEvent::Visited, Some(id));
                }
                Stage::Write(id) => {
                    let index = self.tree.node(id).lower_bound(&self.value);
                    self.tree.node_mut(id).insert_key(index, self.value.clone());
                    self.tree.record_writes(1);
                    self.tree.presence_insert(self.value.clone());
                    self.stage = Stage::Check(id);
                    return emit(&self.tree, StepEvent::KeyWritten, Some(id));
                }
                Stage::Check(id) => {
                    if self.tree.node(id).len() <= self.tree.order() {
                        self.stage = Stage::Finish;
                        continue;
                    }
                    let (separator, right) = split(&mut self.tree, id);
                    self.stage = Stage::Promote {
                        left: id,
                        separator,
                        right,
                    };
                    return emit(&self.tree, StepEvent::Split, Some(right));
                }
                Stage::Promote {
                    left,
                    separator,
                    right,
                } => {
                    if let Some(parent) = self.path.pop() {
                        attach(&mut self.tree, parent, left, separator, right);
                        self.stage = Stage::Check(parent);
                        return emit(&self.tree, StepEvent::Promoted, Some(parent));
                    }
                    let root = grow_root(&mut self.tree, left, separator, right);
                    self.stage = Stage::Finish;
                    return emit(&self.tree, StepEvent::RootCreated, Some(root));
                }
                Stage::Finish => {
                    assert_valid(&self.tree, Operation::Insert, &self.value);
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

    /// First value into an empty tree: a one-key leaf becomes the root.
    fn plant_root(&mut self) -> Advance {
        let mut leaf = Node::leaf();
        leaf.insert_key(0, self.value.clone());
        let root = self.tree.allocate(leaf);
        self.tree.set_root(Some(root));
        self.tree.record_read();
        self.tree.record_writes(1);
        self.tree.presence_insert(self.value.clone());

        tracing::debug!("planted root {root} with {}", self.value);
        self.stage = Stage::Finish;
        emit(&self.tree, StepEvent::RootCreated, Some(root))
    }
}

#[cfg(test)]
mod tests {
    use crate::ops::{StepEvent, insert};
    use crate::tree::Tree;
    use crate::types::{Value, ValueDomain, Variant};

    fn empty(order: usize, variant: Variant) -> Tree {
        Tree::new(order, variant, ValueDomain::Numeric).expect("valid order")
    }

    fn insert_all(mut tree: Tree, values: impl IntoIterator<Item = i64>) -> Tree {
        for v in values {
            tree = insert(&tree, Value::Number(v))
                .expect("numeric value")
                .finish()
                .into_tree();
        }
        tree
    }

    #[test]
    fn test_first_insert_plants_root() {
        let done = insert(&empty(3, Variant::B), Value::Number(5))
            .expect("numeric value")
            .finish();

        assert!(done.result);
        assert_eq!(
            done.events(),
            vec![StepEvent::RootCreated, StepEvent::Completed]
        );
        let first = &done.steps[0].snapshot;
        assert!(first.contains(&Value::Number(5)));
        assert_eq!(first.reads(), 1);
        assert_eq!(first.writes(), 1);
    }

    #[test]
    fn test_write_without_split() {
        let tree = insert_all(empty(3, Variant::B), [1]);
        let done = insert(&tree, Value::Number(2)).expect("numeric value").finish();

        assert_eq!(
            done.events(),
            vec![
                StepEvent::Visited,
                StepEvent::KeyWritten,
                StepEvent::Completed
            ]
        );
        assert_eq!(done.final_snapshot().writes() - tree.writes(), 1);
        assert_eq!(done.into_tree().to_string(), "[1 2]");
    }

    #[test]
    fn test_leaf_split_grows_root() {
        let tree = insert_all(empty(3, Variant::B), [1, 2, 3]);
        let done = insert(&tree, Value::Number(4)).expect("numeric value").finish();

        assert_eq!(
            done.events(),
            vec![
                StepEvent::Visited,
                StepEvent::KeyWritten,
                StepEvent::Split,
                StepEvent::RootCreated,
                StepEvent::Completed
            ]
        );
        // The split step observes the new right half before it is attached.
        let split = &done.steps[2].snapshot;
        let right = split.observed().expect("right half observed");
        assert_eq!(right.keys(), &[Value::Number(4)]);
        // 1 leaf write, 2 for the split, 1 for the new root.
        assert_eq!(done.final_snapshot().writes() - tree.writes(), 4);

        assert_eq!(done.into_tree().to_string(), "[3]\n[1 2] [4]");
    }

    #[test]
    fn test_promotion_into_existing_parent() {
        let tree = insert_all(empty(3, Variant::BPlus), [1, 2, 3, 4, 5]);
        assert_eq!(tree.to_string(), "[3]\n[1 2] [3 4 5]");

        let done = insert(&tree, Value::Number(6)).expect("numeric value").finish();
        assert!(done.events().contains(&StepEvent::Promoted));
        assert!(!done.events().contains(&StepEvent::RootCreated));

        let tree = done.into_tree();
        assert_eq!(tree.to_string(), "[3 5]\n[1 2] [3 4] [5 6]");
        assert_eq!(tree.height(), 2);
    }

    #[test]
    fn test_cascading_split() {
        let tree = insert_all(empty(3, Variant::B), 1..=12);
        assert_eq!(tree.to_string(), "[3 6 9]\n[1 2] [4 5] [7 8] [10 11 12]");

        // 13 overflows the last leaf, whose median overflows the root.
        let tree = insert_all(tree, [13]);
        assert_eq!(tree.validate(), Ok(()));
        assert_eq!(tree.height(), 3);
        assert_eq!(tree.to_string(), "[9]\n[3 6] [12]\n[1 2] [4 5] [7 8] [10 11] [13]");
        assert_eq!(tree.in_order(), (1..=13).map(Value::Number).collect::<Vec<_>>());
    }

    #[test]
    fn test_duplicate_is_rejected_without_work() {
        let tree = insert_all(empty(4, Variant::BPlus), [3, 1, 2]);
        let done = insert(&tree, Value::Number(2)).expect("numeric value").finish();

        assert!(!done.result);
        assert_eq!(done.events(), vec![StepEvent::Rejected]);
        assert_eq!(done.into_tree(), tree);
    }

    #[test]
    fn test_lexical_values() {
        let mut tree = Tree::new(3, Variant::BPlus, ValueDomain::Lexical).expect("valid order");
        for word in ["pear", "apple", "fig", "kiwi"] {
            tree = insert(&tree, Value::from(word))
                .expect("text value")
                .finish()
                .into_tree();
        }
        assert_eq!(tree.to_string(), "[kiwi]\n[apple fig] [kiwi pear]");
    }
}
