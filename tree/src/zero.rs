// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! Roots and nodes of all-zero subtrees.
//!
//! Padding is never materialized: a subtree of depth `d` that holds nothing but
//! zero chunks is represented by `zero_node(d)`, whose root is `zero_hash(d)`.
//! Both tables are built once, on first access, and are read-only afterwards.

use std::sync::LazyLock;

use crate::hash::{Chunk, hash_pair};
use crate::logger::trace;
use crate::node::{BranchNode, Node, SharedNode};

/// Depth up to which zero hashes and zero nodes are precomputed.
///
/// A single type level never spans more than 2^64 chunks, so no tree built
/// from a type descriptor needs a deeper entry.
pub const MAX_ZERO_DEPTH: usize = 64;

static ZERO_HASHES: LazyLock<Vec<Chunk>> = LazyLock::new(|| {
    trace!("building zero hash table to depth {MAX_ZERO_DEPTH}");
    let mut hashes = Vec::with_capacity(MAX_ZERO_DEPTH + 1);
    let mut current = Chunk::ZERO;
    for _ in 0..=MAX_ZERO_DEPTH {
        hashes.push(current);
        current = hash_pair(&current, &current);
    }
    hashes
});

static ZERO_NODES: LazyLock<Vec<SharedNode>> = LazyLock::new(|| {
    let mut nodes = Vec::with_capacity(MAX_ZERO_DEPTH + 1);
    let mut current = Node::leaf(Chunk::ZERO);
    for depth in 0..=MAX_ZERO_DEPTH {
        nodes.push(current.clone());
        current = SharedNode::new(Node::Branch(BranchNode::with_root(
            current.clone(),
            current,
            zero_hash(depth + 1),
        )));
    }
    nodes
});

/// The root of a subtree of the given depth whose leaves are all zero.
#[must_use]
pub fn zero_hash(depth: usize) -> Chunk {
    match ZERO_HASHES.get(depth) {
        Some(hash) => *hash,
        None => {
            let mut current = ZERO_HASHES.last().copied().unwrap_or(Chunk::ZERO);
            for _ in MAX_ZERO_DEPTH..depth {
                current = hash_pair(&current, &current);
            }
            current
        }
    }
}

/// A shared subtree of the given depth whose leaves are all zero.
///
/// Every level shares its two children, so this costs nothing beyond the table.
#[must_use]
pub fn zero_node(depth: usize) -> SharedNode {
    match ZERO_NODES.get(depth) {
        Some(node) => node.clone(),
        None => {
            let mut current = ZERO_NODES
                .last()
                .cloned()
                .unwrap_or_else(|| Node::leaf(Chunk::ZERO));
            for _ in MAX_ZERO_DEPTH..depth {
                current = Node::branch(current.clone(), current);
            }
            current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use test_case::test_case;

    #[test_case(0, hex!("0000000000000000000000000000000000000000000000000000000000000000"); "depth 0")]
    #[test_case(1, hex!("f5a5fd42d16a20302798ef6ed309979b43003d2320d9f0e8ea9831a92759fb4b"); "depth 1")]
    #[test_case(2, hex!("db56114e00fdd4c1f85c892bf35ac9a89289aaecb1ebd0a96cde606a748b5d71"); "depth 2")]
    #[test_case(3, hex!("c78009fdf07fc56a11f122370658a353aaa542ed63e44c4bc15ff4cd105ab33c"); "depth 3")]
    fn known_zero_hashes(depth: usize, expected: [u8; 32]) {
        assert_eq!(zero_hash(depth), Chunk::new(expected));
    }

    #[test]
    fn zero_nodes_match_zero_hashes() {
        for depth in [0, 1, 5, 31, MAX_ZERO_DEPTH] {
            assert_eq!(zero_node(depth).root(), zero_hash(depth), "depth {depth}");
        }
    }

    #[test]
    fn beyond_the_table() {
        let deeper = zero_hash(MAX_ZERO_DEPTH + 2);
        let step = hash_pair(&zero_hash(MAX_ZERO_DEPTH), &zero_hash(MAX_ZERO_DEPTH));
        assert_eq!(deeper, hash_pair(&step, &step));
        assert_eq!(zero_node(MAX_ZERO_DEPTH + 2).root(), deeper);
    }

    #[test]
    fn zero_node_children_are_shared() {
        let node = zero_node(10);
        let branch = node.as_branch().expect("branch");
        assert!(triomphe::Arc::ptr_eq(branch.left(), branch.right()));
        assert!(triomphe::Arc::ptr_eq(branch.left(), &zero_node(9)));
    }
}
