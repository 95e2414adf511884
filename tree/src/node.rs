// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use std::fmt::{Debug, Formatter};
use std::sync::OnceLock;

use enum_as_inner::EnumAsInner;

use crate::hash::{Chunk, hash_pair};

/// A shared node, which is just a triomphe Arc of a node.
///
/// Nodes are never mutated after construction, so any number of tree versions
/// may point at the same subtree.
pub type SharedNode = triomphe::Arc<Node>;

/// A node of a persistent binary merkle tree.
#[derive(Debug, EnumAsInner)]
pub enum Node {
    /// A 32 byte chunk. Also used for opaque subtrees known only by their root.
    Leaf(Chunk),
    /// An internal node with exactly two children.
    Branch(BranchNode),
}

/// An internal node. Its root is computed on first access and then cached.
pub struct BranchNode {
    left: SharedNode,
    right: SharedNode,
    root: OnceLock<Chunk>,
}

impl BranchNode {
    /// Creates a branch whose root has not been computed yet.
    #[must_use]
    pub const fn new(left: SharedNode, right: SharedNode) -> Self {
        BranchNode {
            left,
            right,
            root: OnceLock::new(),
        }
    }

    /// Creates a branch with an already known root. Only used for the zero
    /// subtrees, whose roots come from the zero hash table.
    pub(crate) fn with_root(left: SharedNode, right: SharedNode, root: Chunk) -> Self {
        let cached = OnceLock::new();
        let _ = cached.set(root);
        BranchNode {
            left,
            right,
            root: cached,
        }
    }

    /// The left child.
    #[must_use]
    pub const fn left(&self) -> &SharedNode {
        &self.left
    }

    /// The right child.
    #[must_use]
    pub const fn right(&self) -> &SharedNode {
        &self.right
    }

    /// The merkle root of this branch.
    ///
    /// Concurrent callers may race to compute it; every computation yields the
    /// same value and only the first one is stored.
    #[must_use]
    pub fn root(&self) -> Chunk {
        *self
            .root
            .get_or_init(|| hash_pair(&self.left.root(), &self.right.root()))
    }

    /// True once the root has been computed and cached.
    #[must_use]
    pub fn is_hashed(&self) -> bool {
        self.root.get().is_some()
    }
}

impl Debug for BranchNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Branch")?;
        match self.root.get() {
            Some(root) => write!(f, " root={root:?}")?,
            None => write!(f, " root=<unhashed>")?,
        }
        write!(f, "]")
    }
}

impl Node {
    /// A new shared leaf.
    #[must_use]
    pub fn leaf(chunk: Chunk) -> SharedNode {
        SharedNode::new(Node::Leaf(chunk))
    }

    /// A new shared branch.
    #[must_use]
    pub fn branch(left: SharedNode, right: SharedNode) -> SharedNode {
        SharedNode::new(Node::Branch(BranchNode::new(left, right)))
    }

    /// The merkle root of the subtree rooted at this node.
    #[must_use]
    pub fn root(&self) -> Chunk {
        match self {
            Node::Leaf(chunk) => *chunk,
            Node::Branch(branch) => branch.root(),
        }
    }

    /// Returns true if this node is a leaf holding the zero chunk.
    #[must_use]
    pub fn is_zero_leaf(&self) -> bool {
        matches!(self, Node::Leaf(chunk) if chunk.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_root_is_memoized() {
        let left = Node::leaf(Chunk::from_u64(1));
        let right = Node::leaf(Chunk::from_u64(2));
        let branch = Node::branch(left.clone(), right.clone());

        let inner = branch.as_branch().expect("branch");
        assert!(!inner.is_hashed());

        let root = branch.root();
        assert!(inner.is_hashed());
        assert_eq!(root, hash_pair(&left.root(), &right.root()));
        assert_eq!(branch.root(), root);
    }

    #[test]
    fn leaf_root_is_its_chunk() {
        let chunk = Chunk::from_u64(42);
        assert_eq!(Node::leaf(chunk).root(), chunk);
        assert!(Node::leaf(Chunk::ZERO).is_zero_leaf());
        assert!(!Node::leaf(chunk).is_zero_leaf());
    }
}
