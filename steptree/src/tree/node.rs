//! Tree node type and its structural edits.
//!
//! Nodes never enforce tree invariants. They only offer safe edits that the
//! engines combine into splits, merges and rotations.

use std::fmt;

use crate::types::Value;

/// Index of a node inside its tree's arena.
///
/// Ids are only meaningful for the tree (or snapshot) that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A B-tree or B+-tree node.
///
/// Stores N keys and, for internal nodes, N+1 children.
/// `children[i]` holds keys below `keys[i]`; `children[i + 1]` holds keys
/// above it (at or above it for B+ routing keys).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Keys in ascending order.
    pub(crate) keys: Vec<Value>,
    /// Child ids. Empty for leaves.
    pub(crate) children: Vec<NodeId>,
    pub(crate) leaf: bool,
    /// Next leaf in key order. Only B+ leaves set this.
    pub(crate) next: Option<NodeId>,
    /// Highlight marker for snapshots. Carries no meaning for the algorithms.
    pub(crate) observed: bool,
}

impl Node {
    /// Create an empty leaf.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::new() is not const-stable
    pub fn leaf() -> Self {
        Self {
            keys: Vec::new(),
            children: Vec::new(),
            leaf: true,
            next: None,
            observed: false,
        }
    }

    /// Create an empty internal node.
    #[must_use]
    pub fn internal() -> Self {
        Self {
            leaf: false,
            ..Self::leaf()
        }
    }

    /// Create an internal node with one separator and two children.
    #[must_use]
    pub fn with_children(left: NodeId, key: Value, right: NodeId) -> Self {
        Self {
            keys: vec![key],
            children: vec![left, right],
            ..Self::internal()
        }
    }

    #[must_use]
    pub fn keys(&self) -> &[Value] {
        &self.keys
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.leaf
    }

    #[must_use]
    pub const fn next(&self) -> Option<NodeId> {
        self.next
    }

    #[must_use]
    pub const fn is_observed(&self) -> bool {
        self.observed
    }

    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::len() is not const-stable
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::is_empty() is not const-stable
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Locate a key: `Ok(i)` if `keys[i] == value`, else `Err(i)` with the
    /// insertion point.
    pub fn find(&self, value: &Value) -> Result<usize, usize> {
        self.keys.binary_search(value)
    }

    /// Index of the first key not less than `value`.
    ///
    /// In a B node this is both the position of a matching key and the
    /// child to descend into when there is no match.
    #[must_use]
    pub fn lower_bound(&self, value: &Value) -> usize {
        self.keys.partition_point(|k| k < value)
    }

    /// Child index for B+ routing: the child before the first key strictly
    /// greater than `value`, or the last child.
    #[must_use]
    pub fn route(&self, value: &Value) -> usize {
        self.keys.partition_point(|k| k <= value)
    }

    pub fn insert_key(&mut self, index: usize, key: Value) {
        self.keys.insert(index, key);
    }

    pub fn remove_key(&mut self, index: usize) -> Value {
        self.keys.remove(index)
    }

    /// Replace the key at `index`, returning the old one.
    pub fn replace_key(&mut self, index: usize, key: Value) -> Value {
        std::mem::replace(&mut self.keys[index], key)
    }

    pub fn insert_child(&mut self, index: usize, child: NodeId) {
        self.children.insert(index, child);
    }

    pub fn remove_child(&mut self, index: usize) -> NodeId {
        self.children.remove(index)
    }

    /// Append keys and children taken from another node.
    pub fn append(&mut self, keys: Vec<Value>, children: Vec<NodeId>) {
        self.keys.extend(keys);
        self.children.extend(children);
    }

    /// Split around the median, returning the promoted key and the right half.
    ///
    /// The median (`keys[len / 2]`) leaves both halves: it exists only in
    /// the parent afterwards. This is the B split for every node and the B+
    /// split for internal nodes.
    #[must_use]
    pub fn split_median(&mut self) -> (Value, Self) {
        let mid = self.keys.len() / 2;

        let right_keys: Vec<Value> = self.keys.drain(mid + 1..).collect();
        let right_children: Vec<NodeId> = if self.leaf {
            Vec::new()
        } else {
            self.children.drain(mid + 1..).collect()
        };

        // Remove median key from left node
        let median = self.keys.remove(mid);

        let right = Self {
            keys: right_keys,
            children: right_children,
            leaf: self.leaf,
            next: None,
            observed: false,
        };

        (median, right)
    }

    /// Split a B+ leaf holding `order + 1` keys.
    ///
    /// The left half keeps `ceil((order + 1) / 2)` keys. The separator is a
    /// copy of the right half's first key, which stays in the right leaf. The
    /// caller links the halves.
    #[must_use]
    pub fn split_leaf_copy_up(&mut self, order: usize) -> (Value, Self) {
        let mid = (order + 1).div_ceil(2).min(self.keys.len());

        let right_keys: Vec<Value> = self.keys.drain(mid..).collect();
        let separator = right_keys[0].clone();

        let right = Self {
            keys: right_keys,
            next: self.next,
            ..Self::leaf()
        };

        (separator, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Number).collect()
    }

    fn leaf_with(values: &[i64]) -> Node {
        let mut node = Node::leaf();
        node.keys = numbers(values);
        node
    }

    #[test]
    fn test_find_and_bounds() {
        let node = leaf_with(&[10, 20, 30]);

        assert_eq!(node.find(&Value::Number(20)), Ok(1));
        assert_eq!(node.find(&Value::Number(25)), Err(2));

        assert_eq!(node.lower_bound(&Value::Number(5)), 0);
        assert_eq!(node.lower_bound(&Value::Number(20)), 1);
        assert_eq!(node.lower_bound(&Value::Number(35)), 3);
    }

    #[test]
    fn test_route_sends_equal_keys_right() {
        let node = leaf_with(&[10, 20, 30]);

        assert_eq!(node.route(&Value::Number(5)), 0);
        assert_eq!(node.route(&Value::Number(10)), 1);
        assert_eq!(node.route(&Value::Number(15)), 1);
        assert_eq!(node.route(&Value::Number(30)), 3);
    }

    #[test]
    fn test_split_median_leaf() {
        let mut node = leaf_with(&[1, 2, 3, 4]);
        let (median, right) = node.split_median();

        assert_eq!(median, Value::Number(3));
        assert_eq!(node.keys, numbers(&[1, 2]));
        assert_eq!(right.keys, numbers(&[4]));
        assert!(right.leaf);
        assert!(right.children.is_empty());
    }

    #[test]
    fn test_split_median_internal() {
        let mut node = Node::internal();
        node.keys = numbers(&[10, 20, 30, 40, 50]);
        node.children = (0..6).map(NodeId).collect();

        let (median, right) = node.split_median();

        assert_eq!(median, Value::Number(30));
        assert_eq!(node.keys, numbers(&[10, 20]));
        assert_eq!(node.children, vec![NodeId(0), NodeId(1), NodeId(2)]);
        assert_eq!(right.keys, numbers(&[40, 50]));
        assert_eq!(right.children, vec![NodeId(3), NodeId(4), NodeId(5)]);
    }

    #[test]
    fn test_split_leaf_copy_up() {
        let mut node = leaf_with(&[1, 2, 3, 4]);
        node.next = Some(NodeId(9));

        let (separator, right) = node.split_leaf_copy_up(3);

        assert_eq!(separator, Value::Number(3));
        assert_eq!(node.keys, numbers(&[1, 2]));
        assert_eq!(right.keys, numbers(&[3, 4]));
        // Right half inherits the old successor; caller relinks the left half.
        assert_eq!(right.next, Some(NodeId(9)));
    }

    #[test]
    fn test_split_leaf_copy_up_order_four() {
        let mut node = leaf_with(&[1, 2, 3, 4, 5]);
        let (separator, right) = node.split_leaf_copy_up(4);

        assert_eq!(separator, Value::Number(4));
        assert_eq!(node.keys, numbers(&[1, 2, 3]));
        assert_eq!(right.keys, numbers(&[4, 5]));
    }

    #[test]
    fn test_structural_edits() {
        let mut node = Node::with_children(NodeId(1), Value::Number(10), NodeId(2));
        node.insert_key(1, Value::Number(20));
        node.insert_child(2, NodeId(3));

        assert_eq!(node.keys, numbers(&[10, 20]));
        assert_eq!(node.children, vec![NodeId(1), NodeId(2), NodeId(3)]);

        let old = node.replace_key(0, Value::Number(5));
        assert_eq!(old, Value::Number(10));
        assert_eq!(node.remove_key(1), Value::Number(20));
        assert_eq!(node.remove_child(2), NodeId(3));
        assert_eq!(node.len(), 1);
        assert!(!node.is_leaf());
    }
}
