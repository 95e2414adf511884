// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

#![warn(missing_debug_implementations, rust_2018_idioms, missing_docs)]
#![deny(unsafe_code)]

//! # sszkit-tree implements the hashing core of sszkit
//!
//! It knows nothing about SSZ types. It provides:
//!
//! - [`Chunk`]s and [`hash_pair`], the only hash step of the merkle scheme,
//! - [`merkleize`] and [`mix_in_length`] over flat chunk sequences, padded
//!   with the shared [`zero_hash`] table,
//! - persistent binary trees of [`Node`]s with memoized roots, navigated and
//!   edited copy-on-write by [`GeneralizedIndex`],
//! - single and multi merkle proofs over those indices.

mod gindex;
mod hash;
mod merkleize;
mod node;
mod proof;
mod tree;
mod zero;

/// Logger module for handling logging functionality
pub mod logger;

/// Metric names used by this crate
pub mod registry;

// re-export these so callers don't need to know where they are
pub use gindex::{GeneralizedIndex, GeneralizedIndexError, alphasort};
pub use hash::{BYTES_PER_CHUNK, Chunk, InvalidChunkLength, Root, hash_pair};
pub use merkleize::{ceil_log2, chunk_count_for_bytes, merkleize, mix_in_length};
pub use node::{BranchNode, Node, SharedNode};
pub use proof::{
    Multiproof, ProofError, SingleProof, calculate_merkle_root, calculate_multi_merkle_root,
    create_multiproof, create_single_proof, get_branch_indices, get_helper_indices,
    get_path_indices, verify_merkle_proof, verify_multiproof,
};
pub use tree::{
    TreeError, get_node, get_nodes_at_depth, repeat_subtree, set_node, subtree_from_chunks,
    subtree_from_nodes,
};
pub use zero::{MAX_ZERO_DEPTH, zero_hash, zero_node};

#[cfg(any(test, feature = "test_utils"))]
pub use test_utils::SeededRng;

#[cfg(any(test, feature = "test_utils"))]
mod test_utils {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng, TryRngCore};

    /// A seeded random number generator for testing purposes.
    ///
    /// The seed is printed when it is chosen at random, so a failing run can
    /// be replayed by exporting `SSZKIT_TEST_SEED`.
    #[derive(Debug, Clone)]
    #[must_use]
    pub struct SeededRng(Rc<RefCell<StdRng>>);

    impl SeededRng {
        const ENV: &str = "SSZKIT_TEST_SEED";

        /// Creates a new `SeededRng` with the given seed.
        pub fn new(seed: u64) -> Self {
            Self(Rc::new(RefCell::new(StdRng::seed_from_u64(seed))))
        }

        /// Creates a new `SeededRng` from an `Option<u64>`, falling back to
        /// [`SeededRng::from_env_or_random`].
        pub fn from_option(seed: Option<u64>) -> Self {
            seed.map_or_else(Self::from_env_or_random, Self::new)
        }

        /// Creates a new `SeededRng` from the seed in `SSZKIT_TEST_SEED`, if set.
        ///
        /// # Panics
        ///
        /// Panics if the variable is set but is not a valid `u64`.
        #[track_caller]
        #[must_use]
        pub fn from_env() -> Option<Self> {
            let s = std::env::var_os(Self::ENV)?
                .into_string()
                .unwrap_or_else(|_| panic!("{} must be a valid UTF-8 string", Self::ENV));
            Some(Self::new(s.parse().unwrap_or_else(|_| {
                panic!("{} must be a valid u64", Self::ENV)
            })))
        }

        /// Creates a new `SeededRng` with a random seed generated by the OS.
        pub fn from_random() -> Self {
            let seed = rand::rngs::OsRng.unwrap_err().next_u64();
            eprintln!(
                "Seed {seed}: to rerun with this data, export {}={seed}",
                Self::ENV
            );
            Self::new(seed)
        }

        /// Creates a new `SeededRng` from the environment if set, otherwise at random.
        #[track_caller]
        pub fn from_env_or_random() -> Self {
            Self::from_env().unwrap_or_else(Self::from_random)
        }

        /// Generates a `u64` through a shared reference.
        #[must_use]
        pub fn next_u64(&self) -> u64 {
            self.0.borrow_mut().next_u64()
        }

        /// Fills `dst` with random bytes through a shared reference.
        pub fn fill_bytes(&self, dst: &mut [u8]) {
            self.0.borrow_mut().fill_bytes(dst);
        }

        /// [`rand::Rng::random`] through a shared reference.
        #[must_use]
        pub fn random<T>(&self) -> T
        where
            rand::distr::StandardUniform: rand::distr::Distribution<T>,
        {
            rand::Rng::random(&mut &*self)
        }

        /// [`rand::Rng::random_range`] through a shared reference.
        #[track_caller]
        pub fn random_range<T, R>(&self, range: R) -> T
        where
            T: rand::distr::uniform::SampleUniform,
            R: rand::distr::uniform::SampleRange<T>,
        {
            rand::Rng::random_range(&mut &*self, range)
        }
    }

    impl RngCore for &SeededRng {
        fn next_u32(&mut self) -> u32 {
            self.0.borrow_mut().next_u32()
        }

        fn next_u64(&mut self) -> u64 {
            SeededRng::next_u64(self)
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            SeededRng::fill_bytes(self, dst);
        }
    }
}
