//! Variant-aware lookup.
//!
//! B trees stop at the first node holding the value, internal or not. B+
//! internal nodes only route; a match counts only in a leaf.

use crate::ops::{Advance, StepEvent, emit};
use crate::tree::{NodeId, Tree};
use crate::types::{Value, Variant};

enum Stage {
    Start,
    /// Count the read and show the node.
    Enter(NodeId),
    /// Match or pick the child to descend into.
    Inspect(NodeId),
    Done(bool),
}

pub(crate) struct Search {
    tree: Tree,
    value: Value,
    stage: Stage,
}

impl Search {
    pub(crate) const fn new(tree: Tree, value: Value) -> Self {
        Self {
            tree,
            value,
            stage: Stage::Start,
        }
    }

    pub(crate) fn advance(&mut self) -> Advance {
        loop {
            match self.stage {
                Stage::Start => {
                    let Some(root) = self.tree.root() else {
                        self.stage = Stage::Done(false);
                        return emit(&self.tree, StepEvent::NotFound, None);
                    };
                    self.stage = Stage::Enter(root);
                }
                Stage::Enter(id) => {
                    self.tree.record_read();
                    self.stage = Stage::Inspect(id);
                    return emit(&self.tree, StepEvent::Visited, Some(id));
                }
                Stage::Inspect(id) => {
                    let node = self.tree.node(id);
                    let counts = node.is_leaf() || self.tree.variant() == Variant::B;
                    if counts && node.find(&self.value).is_ok() {
                        self.stage = Stage::Done(true);
                        return emit(&self.tree, StepEvent::Found, Some(id));
                    }
                    if node.is_leaf() {
                        self.stage = Stage::Done(false);
                        return emit(&self.tree, StepEvent::NotFound, None);
                    }

                    let index = match self.tree.variant() {
                        Variant::B => node.lower_bound(&self.value),
                        Variant::BPlus => node.route(&self.value),
                    };
                    self.stage = Stage::Enter(node.children()[index]);
                }
                Stage::Done(found) => return Advance::Done(found),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ops::{StepEvent, insert, search};
    use crate::tree::Tree;
    use crate::types::{Value, ValueDomain, Variant};

    fn build(variant: Variant, values: &[i64]) -> Tree {
        let mut tree = Tree::new(3, variant, ValueDomain::Numeric).expect("valid order");
        for &v in values {
            tree = insert(&tree, Value::Number(v))
                .expect("numeric value")
                .finish()
                .into_tree();
        }
        tree
    }

    #[test]
    fn test_empty_tree_single_step() {
        let tree = build(Variant::B, &[]);
        let done = search(&tree, Value::Number(1)).expect("numeric value").finish();

        assert!(!done.result);
        assert_eq!(done.events(), vec![StepEvent::NotFound]);
        assert_eq!(done.final_snapshot().reads(), 0);
    }

    #[test]
    fn test_b_stops_at_internal_match() {
        // Root [3] over [1 2] and [4].
        let tree = build(Variant::B, &[1, 2, 3, 4]);
        let done = search(&tree, Value::Number(3)).expect("numeric value").finish();

        assert!(done.result);
        assert_eq!(done.events(), vec![StepEvent::Visited, StepEvent::Found]);
        let found = done.final_snapshot().observed().expect("found node observed");
        assert!(!found.is_leaf());
        assert_eq!(done.final_snapshot().reads() - tree.reads(), 1);
    }

    #[test]
    fn test_bplus_routes_past_internal_copy() {
        // Root [3] over [1 2] and [3 4]; 3 only counts in the leaf.
        let tree = build(Variant::BPlus, &[1, 2, 3, 4]);
        let done = search(&tree, Value::Number(3)).expect("numeric value").finish();

        assert!(done.result);
        assert_eq!(
            done.events(),
            vec![StepEvent::Visited, StepEvent::Visited, StepEvent::Found]
        );
        let found = done.final_snapshot().observed().expect("found node observed");
        assert!(found.is_leaf());
        assert_eq!(found.keys(), &[Value::Number(3), Value::Number(4)]);
    }

    #[test]
    fn test_miss_ends_with_unobserved_snapshot() {
        let tree = build(Variant::BPlus, &[1, 2, 3, 4]);
        let done = search(&tree, Value::Number(7)).expect("numeric value").finish();

        assert!(!done.result);
        assert_eq!(done.events().last(), Some(&StepEvent::NotFound));
        assert_eq!(done.final_snapshot().observed_count(), 0);
        assert_eq!(done.final_snapshot().reads() - tree.reads(), 2);
    }

    #[test]
    fn test_search_never_changes_source_tree() {
        let tree = build(Variant::B, &[5, 1, 9]);
        let before = tree.clone();
        let _ = search(&tree, Value::Number(9)).expect("numeric value").finish();
        assert_eq!(tree, before);
    }
}
