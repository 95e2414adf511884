// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! Merkleization of chunk sequences, without building a tree.

use crate::hash::{BYTES_PER_CHUNK, Chunk, Root, hash_pair};
use crate::tree::TreeError;
use crate::zero::zero_hash;

/// The smallest `d` with `2^d >= n`. Zero and one both give zero.
#[must_use]
pub const fn ceil_log2(n: u64) -> usize {
    if n <= 1 {
        0
    } else {
        (u64::BITS - (n - 1).leading_zeros()) as usize
    }
}

/// The root of a complete binary tree holding `chunks` at its leftmost leaves.
///
/// Without a limit the tree has `next_pow_of_two(len)` leaves; with one it has
/// `next_pow_of_two(limit)`. Padding uses the zero hash table, so the cost is
/// linear in the number of chunks plus the depth.
///
/// # Errors
///
/// Returns [`TreeError::ChunkLimitExceeded`] if there are more chunks than `limit`.
pub fn merkleize(chunks: &[Chunk], limit: Option<u64>) -> Result<Root, TreeError> {
    let count = chunks.len() as u64;
    let depth = match limit {
        Some(limit) if count > limit => {
            return Err(TreeError::ChunkLimitExceeded { count, limit });
        }
        Some(limit) => ceil_log2(limit),
        None => ceil_log2(count),
    };
    if chunks.is_empty() {
        return Ok(zero_hash(depth));
    }

    let mut layer: Vec<Chunk> = chunks.to_vec();
    for level in 0..depth {
        if layer.len() % 2 == 1 {
            layer.push(zero_hash(level));
        }
        layer = layer
            .chunks_exact(2)
            .map(|pair| match pair {
                [left, right] => hash_pair(left, right),
                _ => Chunk::ZERO,
            })
            .collect();
    }
    Ok(layer.first().copied().unwrap_or(Chunk::ZERO))
}

/// Mixes a length into a root: `hash(root || le_bytes(length) padded to 32)`.
#[must_use]
pub fn mix_in_length(root: &Root, length: u64) -> Root {
    hash_pair(root, &Chunk::from_u64(length))
}

/// Number of chunks needed to hold `bytes` bytes.
#[must_use]
pub const fn chunk_count_for_bytes(bytes: u64) -> u64 {
    bytes.div_ceil(BYTES_PER_CHUNK as u64)
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]

    use super::*;
    use crate::tree::subtree_from_chunks;
    use test_case::test_case;

    #[test_case(0, 0)]
    #[test_case(1, 0)]
    #[test_case(2, 1)]
    #[test_case(3, 2)]
    #[test_case(4, 2)]
    #[test_case(5, 3)]
    #[test_case(1 << 40, 40)]
    #[test_case((1 << 40) + 1, 41)]
    #[test_case(u64::MAX, 64)]
    fn ceil_log2_values(n: u64, expected: usize) {
        assert_eq!(ceil_log2(n), expected);
    }

    #[test]
    fn empty_is_zero_chunk() {
        assert_eq!(merkleize(&[], None).unwrap(), Chunk::ZERO);
        assert_eq!(merkleize(&[], Some(0)).unwrap(), Chunk::ZERO);
        assert_eq!(merkleize(&[], Some(8)).unwrap(), zero_hash(3));
    }

    #[test]
    fn single_chunk_is_itself() {
        let chunk = Chunk::from_u64(9);
        assert_eq!(merkleize(&[chunk], None).unwrap(), chunk);
        assert_eq!(merkleize(&[chunk], Some(1)).unwrap(), chunk);
    }

    #[test]
    fn pairs_hash_together() {
        let (a, b, c) = (Chunk::from_u64(1), Chunk::from_u64(2), Chunk::from_u64(3));
        assert_eq!(merkleize(&[a, b], None).unwrap(), hash_pair(&a, &b));
        assert_eq!(
            merkleize(&[a, b, c], None).unwrap(),
            hash_pair(&hash_pair(&a, &b), &hash_pair(&c, &Chunk::ZERO))
        );
    }

    #[test]
    fn limit_extends_depth() {
        let chunks: Vec<_> = (1..=3).map(Chunk::from_u64).collect();
        let small = merkleize(&chunks, None).unwrap();
        let large = merkleize(&chunks, Some(16)).unwrap();
        assert_ne!(small, large);
        assert_eq!(large, subtree_from_chunks(chunks.iter().copied(), 4).unwrap().root());
    }

    #[test]
    fn huge_limit_is_cheap() {
        let chunks = [Chunk::from_u64(1)];
        let root = merkleize(&chunks, Some(1 << 40)).unwrap();
        let mut expected = chunks[0];
        for depth in 0..40 {
            expected = hash_pair(&expected, &zero_hash(depth));
        }
        assert_eq!(root, expected);
    }

    #[test]
    fn over_limit_is_rejected() {
        let chunks = [Chunk::ZERO; 3];
        assert_eq!(
            merkleize(&chunks, Some(2)),
            Err(TreeError::ChunkLimitExceeded { count: 3, limit: 2 })
        );
    }

    #[test]
    fn length_mixing() {
        let root = Chunk::from_u64(5);
        assert_ne!(mix_in_length(&root, 0), mix_in_length(&root, 1));
        assert_eq!(mix_in_length(&root, 7), hash_pair(&root, &Chunk::from_u64(7)));
    }
}
