//! Immutable snapshots of a tree at one point of an operation.
//!
//! A snapshot is a deep copy of the working tree with at most one node
//! marked as observed. Once built it is never mutated; the next step of an
//! operation clones again.

use std::fmt;

use crate::tree::node::{Node, NodeId};
use crate::tree::tree::Tree;
use crate::types::{Value, ValueDomain, Variant};

/// Copy `tree` and mark `observed` (if any) in the copy.
///
/// Does not touch the read or write counters.
#[must_use]
pub fn snapshot(tree: &Tree, observed: Option<NodeId>) -> Snapshot {
    let mut copy = tree.clone();
    copy.clear_observed();
    if let Some(id) = observed {
        copy.set_observed(id);
    }
    Snapshot { tree: copy }
}

/// One frozen step of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    tree: Tree,
}

impl Snapshot {
    #[must_use]
    pub fn root(&self) -> Option<NodeView<'_>> {
        self.tree.root().map(|id| self.view(id))
    }

    /// The highlighted node, if this step observes one.
    #[must_use]
    pub fn observed(&self) -> Option<NodeView<'_>> {
        self.tree
            .live_ids()
            .find(|&id| self.tree.node(id).is_observed())
            .map(|id| self.view(id))
    }

    /// Number of nodes carrying the observed marker. At most one.
    #[must_use]
    pub fn observed_count(&self) -> usize {
        self.tree
            .live_ids()
            .filter(|&id| self.tree.node(id).is_observed())
            .count()
    }

    #[must_use]
    pub const fn order(&self) -> usize {
        self.tree.order()
    }

    #[must_use]
    pub const fn variant(&self) -> Variant {
        self.tree.variant()
    }

    #[must_use]
    pub const fn domain(&self) -> ValueDomain {
        self.tree.domain()
    }

    /// Size of the presence set at this step.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.tree.contains(value)
    }

    #[must_use]
    pub const fn reads(&self) -> u64 {
        self.tree.reads()
    }

    #[must_use]
    pub const fn writes(&self) -> u64 {
        self.tree.writes()
    }

    /// Leaves in key order, following next-leaf links for B+ trees.
    ///
    /// For B trees, which have no links, only the leftmost leaf is yielded.
    #[must_use]
    pub fn leaf_chain(&self) -> LeafChain<'_> {
        LeafChain {
            snapshot: self,
            current: self.tree.leftmost_leaf(),
        }
    }

    /// Borrow the underlying tree, observed marker included.
    #[must_use]
    pub const fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Accept this snapshot as a working tree, dropping the observed marker.
    #[must_use]
    pub fn into_tree(self) -> Tree {
        let mut tree = self.tree;
        tree.clear_observed();
        tree
    }

    const fn view(&self, id: NodeId) -> NodeView<'_> {
        NodeView {
            tree: &self.tree,
            id,
        }
    }
}

/// A read-only view of one node inside a snapshot.
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl<'a> NodeView<'a> {
    fn node(&self) -> &'a Node {
        self.tree.node(self.id)
    }

    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn keys(&self) -> &'a [Value] {
        self.node().keys()
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.node().is_leaf()
    }

    #[must_use]
    pub fn is_observed(&self) -> bool {
        self.node().is_observed()
    }

    pub fn children(&self) -> impl Iterator<Item = NodeView<'a>> + use<'a> {
        let tree = self.tree;
        self.node()
            .children()
            .iter()
            .map(move |&id| NodeView { tree, id })
    }

    /// The next leaf in key order (B+ leaves only).
    #[must_use]
    pub fn next_leaf(&self) -> Option<NodeView<'a>> {
        let tree = self.tree;
        self.node().next().map(|id| NodeView { tree, id })
    }
}

impl fmt::Debug for NodeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeView")
            .field("id", &self.id)
            .field("keys", &self.keys())
            .field("leaf", &self.is_leaf())
            .field("observed", &self.is_observed())
            .finish()
    }
}

/// Iterator over leaves following the B+ chain.
pub struct LeafChain<'a> {
    snapshot: &'a Snapshot,
    current: Option<NodeId>,
}

impl<'a> Iterator for LeafChain<'a> {
    type Item = NodeView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let view = self.snapshot.view(id);
        self.current = view.node().next();
        Some(view)
    }
}

/// Render one line per level; nodes as `[k1 k2]`, the observed node starred.
fn render(tree: &Tree, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Some(root) = tree.root() else {
        return write!(f, "(empty {} tree)", tree.variant());
    };

    let mut level = vec![root];
    let mut first_line = true;
    while !level.is_empty() {
        if !first_line {
            writeln!(f)?;
        }
        first_line = false;

        let mut next_level = Vec::new();
        for (i, &id) in level.iter().enumerate() {
            let node = tree.node(id);
            if i > 0 {
                f.write_str(" ")?;
            }
            if node.is_observed() {
                f.write_str("*")?;
            }
            f.write_str("[")?;
            for (j, key) in node.keys().iter().enumerate() {
                if j > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{key}")?;
            }
            f.write_str("]")?;
            next_level.extend_from_slice(node.children());
        }
        level = next_level;
    }
    Ok(())
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(&self.tree, f)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_bplus() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new(3, Variant::BPlus, ValueDomain::Numeric).expect("valid order");
        let mut left = Node::leaf();
        left.keys = vec![Value::Number(1), Value::Number(2)];
        let mut right = Node::leaf();
        right.keys = vec![Value::Number(3), Value::Number(4)];
        let l = tree.allocate(left);
        let r = tree.allocate(right);
        tree.node_mut(l).next = Some(r);
        let root = tree.allocate(Node::with_children(l, Value::Number(3), r));
        tree.set_root(Some(root));
        for v in 1..=4 {
            tree.presence_insert(Value::Number(v));
        }
        (tree, root, l, r)
    }

    #[test]
    fn test_snapshot_marks_single_node() {
        let (tree, _, _, r) = small_bplus();
        let snap = snapshot(&tree, Some(r));

        assert_eq!(snap.observed_count(), 1);
        let observed = snap.observed().expect("one node observed");
        assert_eq!(observed.id(), r);
        assert_eq!(observed.keys(), &[Value::Number(3), Value::Number(4)]);

        // Source tree is untouched.
        assert!(!tree.node(r).is_observed());
    }

    #[test]
    fn test_snapshot_without_observed_node() {
        let (tree, _, _, _) = small_bplus();
        let snap = snapshot(&tree, None);
        assert_eq!(snap.observed_count(), 0);
        assert!(snap.observed().is_none());
    }

    #[test]
    fn test_snapshot_does_not_touch_counters() {
        let (mut tree, root, _, _) = small_bplus();
        tree.record_read();
        tree.record_writes(2);
        let snap = snapshot(&tree, Some(root));
        assert_eq!(snap.reads(), 1);
        assert_eq!(snap.writes(), 2);
        assert_eq!(tree.reads(), 1);
    }

    #[test]
    fn test_snapshot_is_independent_of_later_edits() {
        let (mut tree, _, l, _) = small_bplus();
        let snap = snapshot(&tree, Some(l));

        tree.node_mut(l).keys.clear();

        let first_leaf = snap.leaf_chain().next().expect("has a leaf");
        assert_eq!(first_leaf.keys().len(), 2);
    }

    #[test]
    fn test_views_expose_structure() {
        let (tree, _, _, _) = small_bplus();
        let snap = snapshot(&tree, None);

        let root = snap.root().expect("non-empty");
        assert!(!root.is_leaf());
        assert_eq!(root.keys(), &[Value::Number(3)]);

        let children: Vec<_> = root.children().collect();
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(NodeView::is_leaf));
        assert_eq!(
            children[0].next_leaf().map(|v| v.id()),
            Some(children[1].id())
        );

        let chained: Vec<Value> = snap
            .leaf_chain()
            .flat_map(|leaf| leaf.keys().to_vec())
            .collect();
        assert_eq!(chained, (1..=4).map(Value::Number).collect::<Vec<_>>());
        assert_eq!(snap.len(), 4);
        assert_eq!(snap.variant(), Variant::BPlus);
        assert_eq!(snap.order(), 3);
    }

    #[test]
    fn test_into_tree_clears_marker() {
        let (tree, root, _, _) = small_bplus();
        let accepted = snapshot(&tree, Some(root)).into_tree();
        assert_eq!(accepted, tree);
    }

    #[test]
    fn test_display() {
        let (tree, _, _, r) = small_bplus();
        assert_eq!(tree.to_string(), "[3]\n[1 2] [3 4]");
        assert_eq!(snapshot(&tree, Some(r)).to_string(), "[3]\n[1 2] *[3 4]");

        let empty = Tree::new(3, Variant::B, ValueDomain::Numeric).expect("valid order");
        assert_eq!(empty.to_string(), "(empty b tree)");
    }
}
