//! Structural primitives shared by the insert and remove engines.
//!
//! Every function here performs one complete edit on a working tree and
//! records its writes. None of them emit steps; the engines decide when a
//! primitive is worth a snapshot.

use crate::tree::{Node, NodeId, Tree};
use crate::types::{Value, Variant};

/// Whether `id` uses the B+ leaf rules (copy-up split, linked, no separator
/// pulled down on merge).
fn is_bplus_leaf(tree: &Tree, id: NodeId) -> bool {
    tree.variant() == Variant::BPlus && tree.node(id).is_leaf()
}

/// Split an overfull node, returning the separator and the new right half.
///
/// The right half is allocated but not yet attached to a parent.
pub(crate) fn split(tree: &mut Tree, id: NodeId) -> (Value, NodeId) {
    let order = tree.order();
    let copy_up = is_bplus_leaf(tree, id);

    let (separator, right) = if copy_up {
        tree.node_mut(id).split_leaf_copy_up(order)
    } else {
        tree.node_mut(id).split_median()
    };
    let right = tree.allocate(right);
    if copy_up {
        tree.node_mut(id).next = Some(right);
    }
    tree.record_writes(2);

    tracing::debug!("split {id} around {separator}, right half {right}");
    (separator, right)
}

/// Insert `separator` and `right` into `parent` just after `left`.
pub(crate) fn attach(tree: &mut Tree, parent: NodeId, left: NodeId, separator: Value, right: NodeId) {
    let node = tree.node_mut(parent);
    let pos = node
        .children
        .iter()
        .position(|&c| c == left)
        .unwrap_or_else(|| panic!("{left} is not a child of {parent}"));
    node.insert_key(pos, separator);
    node.insert_child(pos + 1, right);
    tree.record_writes(1);
}

/// Make a new root over `left` and `right`. The tree grows one level.
pub(crate) fn grow_root(tree: &mut Tree, left: NodeId, separator: Value, right: NodeId) -> NodeId {
    let root = tree.allocate(Node::with_children(left, separator, right));
    tree.set_root(Some(root));
    tree.record_writes(1);

    tracing::debug!("new root {root}, height now {}", tree.height());
    root
}

/// Child `index` of `parent` takes one key from its left sibling.
///
/// B+ leaves shift the boundary key across and copy it up as the new
/// separator; every other node rotates through the parent separator.
pub(crate) fn take_from_left(tree: &mut Tree, parent: NodeId, index: usize) {
    let child = tree.node(parent).children[index];
    let left = tree.node(parent).children[index - 1];

    if is_bplus_leaf(tree, child) {
        let Some(moved) = tree.node_mut(left).keys.pop() else {
            panic!("left sibling {left} has no key to lend");
        };
        tree.node_mut(parent).replace_key(index - 1, moved.clone());
        tree.node_mut(child).insert_key(0, moved);
    } else {
        let Some(up) = tree.node_mut(left).keys.pop() else {
            panic!("left sibling {left} has no key to lend");
        };
        let down = tree.node_mut(parent).replace_key(index - 1, up);
        tree.node_mut(child).insert_key(0, down);
        if let Some(grandchild) = tree.node_mut(left).children.pop() {
            tree.node_mut(child).insert_child(0, grandchild);
        }
    }
    tree.record_writes(3);

    tracing::debug!("{child} borrowed from left sibling {left}");
}

/// Child `index` of `parent` takes one key from its right sibling.
pub(crate) fn take_from_right(tree: &mut Tree, parent: NodeId, index: usize) {
    let child = tree.node(parent).children[index];
    let right = tree.node(parent).children[index + 1];

    if is_bplus_leaf(tree, child) {
        let moved = tree.node_mut(right).remove_key(0);
        tree.node_mut(child).keys.push(moved);
        let boundary = tree.node(right).keys[0].clone();
        tree.node_mut(parent).replace_key(index, boundary);
    } else {
        let up = tree.node_mut(right).remove_key(0);
        let down = tree.node_mut(parent).replace_key(index, up);
        tree.node_mut(child).keys.push(down);
        if !tree.node(right).is_leaf() {
            let grandchild = tree.node_mut(right).remove_child(0);
            tree.node_mut(child).children.push(grandchild);
        }
    }
    tree.record_writes(3);

    tracing::debug!("{child} borrowed from right sibling {right}");
}

/// Merge child `index + 1` of `parent` into child `index`, returning the
/// surviving left node.
///
/// B nodes and B+ routing nodes pull the separator down between the two key
/// runs; B+ leaves drop it and relink the leaf chain.
pub(crate) fn merge(tree: &mut Tree, parent: NodeId, index: usize) -> NodeId {
    let left = tree.node(parent).children[index];
    let right = tree.node(parent).children[index + 1];
    let leaf_chain = is_bplus_leaf(tree, left);

    let separator = tree.node_mut(parent).remove_key(index);
    tree.node_mut(parent).remove_child(index + 1);
    let absorbed = tree.release(right);

    let survivor = tree.node_mut(left);
    if leaf_chain {
        survivor.next = absorbed.next;
    } else {
        survivor.keys.push(separator);
    }
    survivor.append(absorbed.keys, absorbed.children);

    tree.record_writes(if leaf_chain { 2 } else { 3 });

    tracing::debug!(
        "merged {right} into {left}, now {} keys",
        tree.node(left).len()
    );
    left
}

/// Rebalance children `index` and `index + 1` of `parent` between
/// themselves.
///
/// Used instead of [`merge`] when the merged node would exceed the order.
/// Both halves end at or above the minimum and the parent separator is
/// updated to the new boundary.
pub(crate) fn redistribute(tree: &mut Tree, parent: NodeId, index: usize) {
    let left = tree.node(parent).children[index];
    let right = tree.node(parent).children[index + 1];

    if is_bplus_leaf(tree, left) {
        let mut keys = std::mem::take(&mut tree.node_mut(left).keys);
        keys.append(&mut tree.node_mut(right).keys);

        let right_keys = keys.split_off(keys.len().div_ceil(2));
        let boundary = right_keys[0].clone();
        tree.node_mut(left).keys = keys;
        tree.node_mut(right).keys = right_keys;
        tree.node_mut(parent).replace_key(index, boundary);
    } else {
        let separator = tree.node(parent).keys[index].clone();
        let mut keys = std::mem::take(&mut tree.node_mut(left).keys);
        keys.push(separator);
        keys.append(&mut tree.node_mut(right).keys);
        let mut children = std::mem::take(&mut tree.node_mut(left).children);
        children.append(&mut tree.node_mut(right).children);

        let mid = keys.len() / 2;
        let right_keys = keys.split_off(mid + 1);
        let Some(boundary) = keys.pop() else {
            panic!("redistribution of {left} and {right} has no keys");
        };
        let right_children = if children.is_empty() {
            Vec::new()
        } else {
            children.split_off(mid + 1)
        };

        let l = tree.node_mut(left);
        l.keys = keys;
        l.children = children;
        let r = tree.node_mut(right);
        r.keys = right_keys;
        r.children = right_children;
        tree.node_mut(parent).replace_key(index, boundary);
    }
    tree.record_writes(3);

    tracing::debug!(
        "redistributed {left} and {right}: {} / {} keys",
        tree.node(left).len(),
        tree.node(right).len()
    );
}

/// Replace a keyless root with its only child, or empty the tree if the root
/// is a keyless leaf. Returns the new root.
pub(crate) fn collapse_root(tree: &mut Tree) -> Option<NodeId> {
    let root = tree.root()?;
    let node = tree.node(root);
    let new_root = if node.is_leaf() {
        None
    } else {
        node.children.first().copied()
    };
    tree.release(root);
    tree.set_root(new_root);
    tree.record_writes(1);

    tracing::debug!("root {root} collapsed, height now {}", tree.height());
    new_root
}
