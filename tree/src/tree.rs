// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! Navigation and copy-on-write edits of persistent trees.
//!
//! Every edit returns a new root. Only the nodes on the path from the root to
//! the edited position are allocated; every other subtree is shared with the
//! tree that was edited, which stays valid and unchanged.

use metrics::counter;

use crate::gindex::GeneralizedIndex;
use crate::hash::Chunk;
use crate::logger::trace;
use crate::node::{Node, SharedNode};
use crate::registry;
use crate::zero::zero_node;

/// Errors from navigating or building a tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TreeError {
    /// The path of a generalized index runs into a leaf before reaching its target.
    #[error("gindex {gindex} descends through a leaf at depth {depth}")]
    LeafInPath {
        /// The index being navigated to.
        gindex: GeneralizedIndex,
        /// The depth of the leaf that blocked the path.
        depth: usize,
    },
    /// Expansion is only allowed for zero placeholder leaves.
    #[error("gindex {gindex} cannot expand the non-zero leaf at depth {depth}")]
    ExpandNonZeroLeaf {
        /// The index being navigated to.
        gindex: GeneralizedIndex,
        /// The depth of the leaf that blocked the path.
        depth: usize,
    },
    /// A range read hit a leaf above the requested depth.
    #[error("expected a branch {remaining} levels above the requested depth")]
    LeafAboveDepth {
        /// Number of levels still to descend when the leaf was found.
        remaining: usize,
    },
    /// More nodes than fit at the requested depth.
    #[error("{count} nodes do not fit in a subtree of depth {depth}")]
    TooManyNodes {
        /// Number of nodes supplied.
        count: u64,
        /// Depth of the subtree.
        depth: usize,
    },
    /// A range of indices lies outside the subtree.
    #[error("range of {count} nodes from {start} is outside a subtree of depth {depth}")]
    RangeOutOfBounds {
        /// First index of the range.
        start: u64,
        /// Length of the range.
        count: u64,
        /// Depth of the subtree.
        depth: usize,
    },
    /// More chunks than the limit passed to `merkleize`.
    #[error("{count} chunks exceed the limit of {limit}")]
    ChunkLimitExceeded {
        /// Number of chunks supplied.
        count: u64,
        /// The limit.
        limit: u64,
    },
}

/// True if `count` leaves fit at `depth`.
pub(crate) const fn fits(count: u64, depth: usize) -> bool {
    depth >= 64 || count <= 1u64 << depth
}

/// Returns the node at `gindex`.
///
/// # Errors
///
/// Returns [`TreeError::LeafInPath`] if a leaf is found above the target.
pub fn get_node(root: &SharedNode, gindex: &GeneralizedIndex) -> Result<SharedNode, TreeError> {
    let mut current = root.clone();
    for (depth, right) in gindex.path().enumerate() {
        let next = match &*current {
            Node::Branch(branch) if right => branch.right().clone(),
            Node::Branch(branch) => branch.left().clone(),
            Node::Leaf(_) => {
                return Err(TreeError::LeafInPath {
                    gindex: gindex.clone(),
                    depth,
                });
            }
        };
        current = next;
    }
    Ok(current)
}

/// Returns a tree with the node at `gindex` replaced by `node`.
///
/// Only the ancestors of `gindex` are rebuilt. With `expand`, a zero leaf on
/// the path is treated as the zero subtree of whatever depth is needed, which
/// lets a default placeholder grow on demand.
///
/// # Errors
///
/// Returns [`TreeError::LeafInPath`] if a leaf blocks the path and `expand`
/// is false, or [`TreeError::ExpandNonZeroLeaf`] if the blocking leaf is not zero.
pub fn set_node(
    root: &SharedNode,
    gindex: &GeneralizedIndex,
    node: SharedNode,
    expand: bool,
) -> Result<SharedNode, TreeError> {
    let target_depth = gindex.depth();
    let mut siblings: Vec<(SharedNode, bool)> = Vec::with_capacity(target_depth);
    let mut current = root.clone();

    for (depth, right) in gindex.path().enumerate() {
        if let Node::Leaf(chunk) = &*current {
            if !expand {
                return Err(TreeError::LeafInPath {
                    gindex: gindex.clone(),
                    depth,
                });
            }
            if !chunk.is_zero() {
                return Err(TreeError::ExpandNonZeroLeaf {
                    gindex: gindex.clone(),
                    depth,
                });
            }
            trace!("expanding zero leaf at depth {depth} towards gindex {gindex}");
            counter!(registry::TREE_EXPAND).increment(1);
            current = zero_node(target_depth - depth);
        }

        let (next, sibling) = match &*current {
            Node::Branch(branch) if right => (branch.right().clone(), branch.left().clone()),
            Node::Branch(branch) => (branch.left().clone(), branch.right().clone()),
            Node::Leaf(_) => {
                return Err(TreeError::LeafInPath {
                    gindex: gindex.clone(),
                    depth,
                });
            }
        };
        siblings.push((sibling, right));
        current = next;
    }

    Ok(siblings
        .into_iter()
        .rev()
        .fold(node, |acc, (sibling, right)| {
            if right {
                Node::branch(sibling, acc)
            } else {
                Node::branch(acc, sibling)
            }
        }))
}

/// Returns `count` consecutive nodes at `depth`, starting at the `start`-th.
///
/// # Errors
///
/// Returns [`TreeError::RangeOutOfBounds`] if the range does not fit at that
/// depth or [`TreeError::LeafAboveDepth`] if a leaf is found above it.
pub fn get_nodes_at_depth(
    root: &SharedNode,
    depth: usize,
    start: u64,
    count: u64,
) -> Result<Vec<SharedNode>, TreeError> {
    let out_of_bounds = TreeError::RangeOutOfBounds {
        start,
        count,
        depth,
    };
    if count == 0 {
        return Ok(Vec::new());
    }
    let end = start.checked_add(count).ok_or(out_of_bounds.clone())?;
    if depth > 64 || !fits(end, depth) {
        return Err(out_of_bounds);
    }

    let mut out = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
    collect_range(root, depth, start, end, &mut out)?;
    Ok(out)
}

fn collect_range(
    node: &SharedNode,
    depth: usize,
    start: u64,
    end: u64,
    out: &mut Vec<SharedNode>,
) -> Result<(), TreeError> {
    if depth == 0 {
        out.push(node.clone());
        return Ok(());
    }
    let Node::Branch(branch) = &**node else {
        return Err(TreeError::LeafAboveDepth { remaining: depth });
    };
    let half = 1u64 << (depth - 1);
    if start < half {
        collect_range(branch.left(), depth - 1, start, end.min(half), out)?;
    }
    if end > half {
        collect_range(
            branch.right(),
            depth - 1,
            start.saturating_sub(half),
            end - half,
            out,
        )?;
    }
    Ok(())
}

/// Builds a subtree of the given depth whose leftmost positions hold `nodes`,
/// padding the rest with shared zero subtrees.
///
/// # Errors
///
/// Returns [`TreeError::TooManyNodes`] if `nodes` does not fit at `depth`.
pub fn subtree_from_nodes(nodes: Vec<SharedNode>, depth: usize) -> Result<SharedNode, TreeError> {
    let count = nodes.len() as u64;
    if !fits(count, depth) {
        return Err(TreeError::TooManyNodes { count, depth });
    }
    if nodes.is_empty() {
        return Ok(zero_node(depth));
    }

    let mut layer = nodes;
    for level in 0..depth {
        if layer.len() % 2 == 1 {
            layer.push(zero_node(level));
        }
        let mut next = Vec::with_capacity(layer.len() / 2);
        let mut pairs = layer.into_iter();
        while let (Some(left), Some(right)) = (pairs.next(), pairs.next()) {
            next.push(Node::branch(left, right));
        }
        layer = next;
    }
    layer.pop().ok_or(TreeError::TooManyNodes { count, depth })
}

/// Builds a subtree of leaves from packed chunks. See [`subtree_from_nodes`].
///
/// # Errors
///
/// Returns [`TreeError::TooManyNodes`] if the chunks do not fit at `depth`.
pub fn subtree_from_chunks<I>(chunks: I, depth: usize) -> Result<SharedNode, TreeError>
where
    I: IntoIterator<Item = Chunk>,
{
    subtree_from_nodes(chunks.into_iter().map(Node::leaf).collect(), depth)
}

/// Builds a subtree of the given depth holding `count` copies of `node`
/// followed by zero padding.
///
/// Identical full subtrees are shared, so this takes `O(depth)` nodes no
/// matter how large `count` is.
///
/// # Errors
///
/// Returns [`TreeError::TooManyNodes`] if `count` does not fit at `depth`.
pub fn repeat_subtree(node: &SharedNode, count: u64, depth: usize) -> Result<SharedNode, TreeError> {
    if !fits(count, depth) {
        return Err(TreeError::TooManyNodes { count, depth });
    }
    let mut full = Vec::with_capacity(depth + 1);
    let mut current = node.clone();
    for _ in 0..depth {
        full.push(current.clone());
        current = Node::branch(current.clone(), current);
    }
    full.push(current);
    Ok(partial_repeat(&full, count, depth))
}

#[expect(
    clippy::indexing_slicing,
    reason = "`full` holds one entry per level up to `depth`"
)]
fn partial_repeat(full: &[SharedNode], count: u64, depth: usize) -> SharedNode {
    if count == 0 {
        return zero_node(depth);
    }
    if depth == 0 || (depth < 64 && count == 1u64 << depth) {
        return full[depth].clone();
    }
    let below = depth - 1;
    if !fits(count, below) {
        let half = 1u64 << below;
        Node::branch(
            full[below].clone(),
            partial_repeat(full, count - half, below),
        )
    } else {
        Node::branch(partial_repeat(full, count, below), zero_node(below))
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used, clippy::indexing_slicing)]

    use super::*;
    use crate::hash::hash_pair;
    use crate::zero::zero_hash;
    use test_case::test_case;

    fn g(value: u64) -> GeneralizedIndex {
        GeneralizedIndex::new(value).unwrap()
    }

    fn leaves(count: u64) -> Vec<SharedNode> {
        (1..=count).map(|i| Node::leaf(Chunk::from_u64(i))).collect()
    }

    #[test]
    fn get_descends_by_bits() {
        let tree = subtree_from_nodes(leaves(4), 2).unwrap();
        for (i, gindex) in (4..8).enumerate() {
            let node = get_node(&tree, &g(gindex)).unwrap();
            assert_eq!(node.root(), Chunk::from_u64(i as u64 + 1));
        }
        assert_eq!(get_node(&tree, &g(1)).unwrap().root(), tree.root());
        assert_eq!(
            get_node(&tree, &g(8)).map(|_| ()),
            Err(TreeError::LeafInPath {
                gindex: g(8),
                depth: 2
            })
        );
    }

    #[test]
    fn set_shares_untouched_subtrees() {
        let tree = subtree_from_nodes(leaves(4), 2).unwrap();
        let before = tree.root();
        let updated = set_node(&tree, &g(6), Node::leaf(Chunk::from_u64(99)), false).unwrap();

        // the original is untouched
        assert_eq!(tree.root(), before);
        assert_eq!(get_node(&tree, &g(6)).unwrap().root(), Chunk::from_u64(3));

        assert_eq!(get_node(&updated, &g(6)).unwrap().root(), Chunk::from_u64(99));
        assert!(triomphe::Arc::ptr_eq(
            &get_node(&tree, &g(2)).unwrap(),
            &get_node(&updated, &g(2)).unwrap()
        ));
        assert!(triomphe::Arc::ptr_eq(
            &get_node(&tree, &g(7)).unwrap(),
            &get_node(&updated, &g(7)).unwrap()
        ));

        let expected = hash_pair(
            &hash_pair(&Chunk::from_u64(1), &Chunk::from_u64(2)),
            &hash_pair(&Chunk::from_u64(99), &Chunk::from_u64(4)),
        );
        assert_eq!(updated.root(), expected);
    }

    #[test]
    fn set_root_replaces_everything() {
        let tree = subtree_from_nodes(leaves(2), 1).unwrap();
        let replacement = Node::leaf(Chunk::from_u64(7));
        let updated = set_node(&tree, &g(1), replacement.clone(), false).unwrap();
        assert!(triomphe::Arc::ptr_eq(&updated, &replacement));
    }

    #[test]
    fn expand_zero_placeholder() {
        let placeholder = Node::leaf(Chunk::ZERO);
        let target = g(0b1011);

        assert_eq!(
            set_node(&placeholder, &target, Node::leaf(Chunk::from_u64(5)), false)
                .map(|_| ()),
            Err(TreeError::LeafInPath {
                gindex: target.clone(),
                depth: 0
            })
        );

        let expanded =
            set_node(&placeholder, &target, Node::leaf(Chunk::from_u64(5)), true).unwrap();
        let mut chunks = vec![Chunk::ZERO; 8];
        chunks[3] = Chunk::from_u64(5);
        assert_eq!(
            expanded.root(),
            subtree_from_chunks(chunks, 3).unwrap().root()
        );
    }

    #[test]
    fn expand_refuses_non_zero_leaf() {
        let leaf = Node::leaf(Chunk::from_u64(1));
        assert_eq!(
            set_node(&leaf, &g(2), Node::leaf(Chunk::ZERO), true).map(|_| ()),
            Err(TreeError::ExpandNonZeroLeaf {
                gindex: g(2),
                depth: 0
            })
        );
    }

    #[test_case(0, 8; "all")]
    #[test_case(3, 2; "middle")]
    #[test_case(7, 1; "last")]
    #[test_case(2, 0; "empty")]
    fn nodes_at_depth(start: u64, count: u64) {
        let tree = subtree_from_nodes(leaves(8), 3).unwrap();
        let nodes = get_nodes_at_depth(&tree, 3, start, count).unwrap();
        let got: Vec<_> = nodes.iter().map(|n| n.root().to_u64()).collect();
        let expected: Vec<_> = (start + 1..=start + count).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn nodes_at_depth_out_of_bounds() {
        let tree = subtree_from_nodes(leaves(8), 3).unwrap();
        assert!(matches!(
            get_nodes_at_depth(&tree, 3, 6, 3),
            Err(TreeError::RangeOutOfBounds { .. })
        ));
    }

    #[test]
    fn too_many_nodes() {
        assert_eq!(
            subtree_from_nodes(leaves(5), 2).map(|_| ()),
            Err(TreeError::TooManyNodes { count: 5, depth: 2 })
        );
    }

    #[test]
    fn empty_subtree_is_zero() {
        assert_eq!(subtree_from_nodes(Vec::new(), 5).unwrap().root(), zero_hash(5));
    }

    #[test_case(0, 3; "none")]
    #[test_case(1, 3; "one")]
    #[test_case(5, 3; "partial")]
    #[test_case(8, 3; "full")]
    #[test_case(3, 0; "depth zero")]
    fn repeat_matches_explicit(count: u64, depth: usize) {
        let count = if depth == 0 { count.min(1) } else { count };
        let node = Node::branch(Node::leaf(Chunk::from_u64(3)), Node::leaf(Chunk::ZERO));
        let explicit = subtree_from_nodes(vec![node.clone(); count as usize], depth).unwrap();
        let repeated = repeat_subtree(&node, count, depth).unwrap();
        assert_eq!(repeated.root(), explicit.root());
    }

    #[test]
    fn repeat_huge_is_cheap() {
        let node = Node::leaf(Chunk::from_u64(1));
        let tree = repeat_subtree(&node, (1 << 40) + 3, 41).unwrap();
        let last = get_node(&tree, &GeneralizedIndex::from_depth_index(41, (1 << 40) + 2).unwrap())
            .unwrap();
        assert_eq!(last.root(), Chunk::from_u64(1));
        let after = get_node(&tree, &GeneralizedIndex::from_depth_index(41, (1 << 40) + 3).unwrap())
            .unwrap();
        assert_eq!(after.root(), Chunk::ZERO);
    }
}
