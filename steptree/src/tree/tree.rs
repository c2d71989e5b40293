//! The tree container: node arena, configuration, presence set and counters.
//!
//! Nodes live in an arena owned by the tree. Children and the B+ next-leaf
//! link are [`NodeId`] indices into that arena, so cloning a tree produces a
//! fully independent copy with no shared or cyclic ownership.

#![allow(clippy::cast_possible_truncation)]

use std::collections::HashSet;

use crate::tree::error::TreeError;
use crate::tree::node::{Node, NodeId};
use crate::types::{Value, ValueDomain, Variant};

/// An order-M B-tree or B+-tree of values.
///
/// Trees are mutated only by the engines in [`crate::ops`], each of which
/// works on a private clone and hands back snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    /// Node arena. Released slots are `None` until reused.
    nodes: Vec<Option<Node>>,
    /// Released slots available for reuse.
    free: Vec<NodeId>,
    root: Option<NodeId>,
    order: usize,
    variant: Variant,
    domain: ValueDomain,
    /// Every value currently stored. Used to short-circuit duplicate inserts
    /// and absent removals without touching the structure.
    values: HashSet<Value>,
    /// Nodes visited, cumulative.
    reads: u64,
    /// Structural fields written, cumulative.
    writes: u64,
}

impl Tree {
    /// Smallest order a tree may be created with.
    pub const MIN_ORDER: usize = 3;

    /// Create an empty tree.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidConfiguration`] if `order` is below
    /// [`Tree::MIN_ORDER`].
    pub fn new(order: usize, variant: Variant, domain: ValueDomain) -> Result<Self, TreeError> {
        if order < Self::MIN_ORDER {
            return Err(TreeError::InvalidConfiguration { order });
        }

        tracing::debug!("created empty {variant} tree of order {order} over {domain} values");

        Ok(Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            order,
            variant,
            domain,
            values: HashSet::new(),
            reads: 0,
            writes: 0,
        })
    }

    #[must_use]
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[must_use]
    pub const fn order(&self) -> usize {
        self.order
    }

    #[must_use]
    pub const fn variant(&self) -> Variant {
        self.variant
    }

    #[must_use]
    pub const fn domain(&self) -> ValueDomain {
        self.domain
    }

    /// Number of values stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Presence-set lookup. Does not touch the read counter.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.values.contains(value)
    }

    /// The presence set, in no particular order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    #[must_use]
    pub const fn reads(&self) -> u64 {
        self.reads
    }

    #[must_use]
    pub const fn writes(&self) -> u64 {
        self.writes
    }

    /// Minimum key count for a non-root node.
    #[must_use]
    pub const fn min_keys(&self, leaf: bool) -> usize {
        self.variant.min_keys(self.order, leaf)
    }

    /// Borrow a live node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not name a live node of this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("node {id} is not live in this tree"))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("node {id} is not live in this tree"))
    }

    /// Number of live nodes in the arena.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// Number of levels; 0 for an empty tree.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(id) = current {
            height += 1;
            current = self.node(id).children.first().copied();
        }
        height
    }

    /// The leftmost leaf, where the B+ leaf chain starts.
    #[must_use]
    pub fn leftmost_leaf(&self) -> Option<NodeId> {
        let mut current = self.root?;
        while let Some(&first) = self.node(current).children.first() {
            current = first;
        }
        Some(current)
    }

    /// All stored values in ascending order, read from the structure rather
    /// than the presence set.
    ///
    /// For B trees this is an in-order walk; for B+ trees only leaf keys
    /// count.
    #[must_use]
    pub fn in_order(&self) -> Vec<Value> {
        let mut out = Vec::with_capacity(self.values.len());
        if let Some(root) = self.root {
            self.collect_in_order(root, &mut out);
        }
        out
    }

    fn collect_in_order(&self, id: NodeId, out: &mut Vec<Value>) {
        let node = self.node(id);
        if node.leaf {
            out.extend(node.keys.iter().cloned());
            return;
        }
        for (i, &child) in node.children.iter().enumerate() {
            self.collect_in_order(child, out);
            if self.variant == Variant::B {
                if let Some(key) = node.keys.get(i) {
                    out.push(key.clone());
                }
            }
        }
    }

    /// Reject values outside this tree's domain.
    pub(crate) fn check_value(&self, value: &Value) -> Result<(), TreeError> {
        if self.domain.admits(value) {
            Ok(())
        } else {
            Err(TreeError::InvalidValue {
                input: value.to_string(),
                domain: self.domain,
            })
        }
    }

    pub(crate) fn allocate(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = Some(node);
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(node));
        id
    }

    /// Remove a node from the arena, returning it.
    pub(crate) fn release(&mut self, id: NodeId) -> Node {
        let node = self
            .nodes
            .get_mut(id.index())
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("node {id} released twice"));
        self.free.push(id);
        node
    }

    pub(crate) const fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    pub(crate) const fn record_read(&mut self) {
        self.reads += 1;
    }

    pub(crate) const fn record_writes(&mut self, count: u64) {
        self.writes += count;
    }

    pub(crate) fn presence_insert(&mut self, value: Value) {
        self.values.insert(value);
    }

    pub(crate) fn presence_remove(&mut self, value: &Value) {
        self.values.remove(value);
    }

    pub(crate) fn set_observed(&mut self, id: NodeId) {
        self.node_mut(id).observed = true;
    }

    pub(crate) fn clear_observed(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            node.observed = false;
        }
    }

    pub(crate) fn live_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| NodeId(i as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(order: usize, variant: Variant) -> Tree {
        Tree::new(order, variant, ValueDomain::Numeric).expect("valid order")
    }

    #[test]
    fn test_new_rejects_small_order() {
        for order in 0..3 {
            let result = Tree::new(order, Variant::B, ValueDomain::Numeric);
            assert_eq!(result, Err(TreeError::InvalidConfiguration { order }));
        }
        assert!(Tree::new(3, Variant::BPlus, ValueDomain::Lexical).is_ok());
    }

    #[test]
    fn test_new_tree_is_empty() {
        let tree = numeric(4, Variant::BPlus);
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.reads(), 0);
        assert_eq!(tree.writes(), 0);
        assert!(tree.in_order().is_empty());
        assert_eq!(tree.leftmost_leaf(), None);
    }

    #[test]
    fn test_arena_reuses_released_slots() {
        let mut tree = numeric(3, Variant::B);
        let a = tree.allocate(Node::leaf());
        let b = tree.allocate(Node::leaf());
        assert_ne!(a, b);
        assert_eq!(tree.node_count(), 2);

        tree.release(a);
        assert_eq!(tree.node_count(), 1);

        let c = tree.allocate(Node::internal());
        assert_eq!(c, a);
        assert!(!tree.node(c).is_leaf());
    }

    #[test]
    #[should_panic(expected = "is not live")]
    fn test_released_node_is_not_readable() {
        let mut tree = numeric(3, Variant::B);
        let a = tree.allocate(Node::leaf());
        tree.release(a);
        let _ = tree.node(a);
    }

    #[test]
    fn test_in_order_b_interleaves_internal_keys() {
        let mut tree = numeric(3, Variant::B);
        let mut left = Node::leaf();
        left.keys = vec![Value::Number(1)];
        let mut right = Node::leaf();
        right.keys = vec![Value::Number(3)];
        let l = tree.allocate(left);
        let r = tree.allocate(right);
        let root = tree.allocate(Node::with_children(l, Value::Number(2), r));
        tree.set_root(Some(root));

        assert_eq!(
            tree.in_order(),
            vec![Value::Number(1), Value::Number(2), Value::Number(3)]
        );
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.leftmost_leaf(), Some(l));
    }

    #[test]
    fn test_check_value_enforces_domain() {
        let tree = numeric(3, Variant::B);
        assert!(tree.check_value(&Value::Number(1)).is_ok());
        assert_eq!(
            tree.check_value(&Value::from("x")),
            Err(TreeError::InvalidValue {
                input: "x".to_string(),
                domain: ValueDomain::Numeric,
            })
        );
    }
}
