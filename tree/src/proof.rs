// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! Merkle proofs over generalized indices.
//!
//! A single proof carries the siblings of every node on the path from a leaf
//! to the root. A multiproof covers several leaves at once and carries only
//! the helper nodes that cannot be recomputed from the leaves themselves.
//! Helpers are always ordered by descending generalized index.

use std::collections::{BTreeSet, HashMap, HashSet};

use metrics::counter;

use crate::gindex::GeneralizedIndex;
use crate::hash::{Chunk, Root, hash_pair};
use crate::logger::debug;
use crate::node::{Node, SharedNode};
use crate::registry;
use crate::tree::{TreeError, get_node};

/// Reasons a proof is rejected.
///
/// Any of these means "rejected". None of them describe a partial match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ProofError {
    /// A single proof must hold exactly one witness per level of its leaf.
    #[error("proof for a leaf at depth {expected} has {actual} witnesses")]
    LengthMismatch {
        /// Depth of the proven leaf.
        expected: usize,
        /// Number of witnesses supplied.
        actual: usize,
    },
    /// Every proven gindex needs exactly one leaf chunk.
    #[error("{leaves} leaves supplied for {indices} indices")]
    LeafCountMismatch {
        /// Number of leaf chunks.
        leaves: usize,
        /// Number of gindices.
        indices: usize,
    },
    /// The number of helper chunks does not match the helper indices.
    #[error("expected {expected} helper chunks, got {actual}")]
    WitnessCountMismatch {
        /// Number of helper indices for the proven leaves.
        expected: usize,
        /// Number of witnesses supplied.
        actual: usize,
    },
    /// Two chunks were supplied or computed for the same node and they differ.
    #[error("conflicting chunks for gindex {gindex}")]
    ConflictingLeaf {
        /// The node with conflicting chunks.
        gindex: GeneralizedIndex,
    },
    /// The supplied chunks are not enough to reach the root.
    #[error("proof does not resolve to a root")]
    Unresolved,
    /// The proof resolves, but to a different root.
    #[error("proof resolves to {computed}, expected {expected}")]
    RootMismatch {
        /// The root the proof is checked against.
        expected: Root,
        /// The root the proof resolves to.
        computed: Root,
    },
}

/// The nodes on the path from `gindex` up to, but excluding, the root.
#[must_use]
pub fn get_path_indices(gindex: &GeneralizedIndex) -> Vec<GeneralizedIndex> {
    std::iter::successors(Some(gindex.clone()), GeneralizedIndex::parent)
        .take_while(|g| !g.is_root())
        .collect()
}

/// The siblings of the nodes on the path from `gindex` to the root, leaf first.
/// This is exactly the order of a single proof's witnesses.
#[must_use]
pub fn get_branch_indices(gindex: &GeneralizedIndex) -> Vec<GeneralizedIndex> {
    get_path_indices(gindex)
        .iter()
        .filter_map(GeneralizedIndex::sibling)
        .collect()
}

/// The helper nodes needed to prove all of `indices` together, in descending
/// numeric order.
///
/// Siblings that lie on the path of another proven index are left out, since
/// the verifier recomputes them. For a single index this is
/// [`get_branch_indices`].
#[must_use]
pub fn get_helper_indices(indices: &[GeneralizedIndex]) -> Vec<GeneralizedIndex> {
    let mut helpers = BTreeSet::new();
    let mut paths = BTreeSet::new();
    for gindex in indices {
        helpers.extend(get_branch_indices(gindex));
        paths.extend(get_path_indices(gindex));
    }
    let mut out: Vec<_> = helpers.difference(&paths).cloned().collect();
    out.reverse();
    out
}

/// Recomputes the root from a leaf and its witnesses.
///
/// # Errors
///
/// Returns [`ProofError::LengthMismatch`] if there is not one witness per level.
pub fn calculate_merkle_root(
    leaf: &Chunk,
    witnesses: &[Chunk],
    gindex: &GeneralizedIndex,
) -> Result<Root, ProofError> {
    let depth = gindex.depth();
    if witnesses.len() != depth {
        return Err(ProofError::LengthMismatch {
            expected: depth,
            actual: witnesses.len(),
        });
    }
    Ok(witnesses
        .iter()
        .enumerate()
        .fold(*leaf, |acc, (level, sibling)| {
            if gindex.bit(level) {
                hash_pair(sibling, &acc)
            } else {
                hash_pair(&acc, sibling)
            }
        }))
}

/// Checks a single-leaf proof against `root`.
///
/// # Errors
///
/// Returns the reason the proof was rejected.
pub fn verify_merkle_proof(
    leaf: &Chunk,
    witnesses: &[Chunk],
    gindex: &GeneralizedIndex,
    root: &Root,
) -> Result<(), ProofError> {
    let result = calculate_merkle_root(leaf, witnesses, gindex)
        .and_then(|computed| check_root(root, computed));
    record(&result);
    result
}

/// Recomputes the root from a multiproof.
///
/// Starting from the supplied leaves and helpers, any node whose sibling is
/// known and whose parent is not gets its parent computed, deepest nodes
/// first, until nothing more can be derived.
///
/// # Errors
///
/// Returns [`ProofError::Unresolved`] if the root cannot be reached, or a
/// count or consistency error if the proof is malformed.
pub fn calculate_multi_merkle_root(
    leaves: &[Chunk],
    witnesses: &[Chunk],
    indices: &[GeneralizedIndex],
) -> Result<Root, ProofError> {
    let mut known = known_nodes(leaves, witnesses, indices)?;

    let mut keys: Vec<GeneralizedIndex> = known.keys().cloned().collect();
    keys.sort_unstable_by(|a, b| b.cmp(a));

    let mut pos = 0;
    while let Some(gindex) = keys.get(pos).cloned() {
        pos += 1;
        let (Some(sibling), Some(parent)) = (gindex.sibling(), gindex.parent()) else {
            continue;
        };
        let (Some(own), Some(other)) = (known.get(&gindex), known.get(&sibling)) else {
            continue;
        };
        let computed = if gindex.is_left() {
            hash_pair(own, other)
        } else {
            hash_pair(other, own)
        };
        match known.get(&parent) {
            Some(existing) if *existing != computed => {
                return Err(ProofError::ConflictingLeaf { gindex: parent });
            }
            Some(_) => {}
            None => {
                known.insert(parent.clone(), computed);
                keys.push(parent);
            }
        }
    }

    known
        .get(&GeneralizedIndex::root())
        .copied()
        .ok_or(ProofError::Unresolved)
}

/// Checks a multiproof against `root`.
///
/// # Errors
///
/// Returns the reason the proof was rejected.
pub fn verify_multiproof(
    leaves: &[Chunk],
    witnesses: &[Chunk],
    indices: &[GeneralizedIndex],
    root: &Root,
) -> Result<(), ProofError> {
    let result = calculate_multi_merkle_root(leaves, witnesses, indices)
        .and_then(|computed| check_root(root, computed));
    record(&result);
    result
}

fn known_nodes(
    leaves: &[Chunk],
    witnesses: &[Chunk],
    indices: &[GeneralizedIndex],
) -> Result<HashMap<GeneralizedIndex, Chunk>, ProofError> {
    if leaves.len() != indices.len() {
        return Err(ProofError::LeafCountMismatch {
            leaves: leaves.len(),
            indices: indices.len(),
        });
    }
    let helpers = get_helper_indices(indices);
    if witnesses.len() != helpers.len() {
        return Err(ProofError::WitnessCountMismatch {
            expected: helpers.len(),
            actual: witnesses.len(),
        });
    }

    let mut known = HashMap::with_capacity(leaves.len() + witnesses.len());
    for (gindex, chunk) in indices.iter().zip(leaves).chain(helpers.iter().zip(witnesses)) {
        if let Some(previous) = known.insert(gindex.clone(), *chunk) {
            if previous != *chunk {
                return Err(ProofError::ConflictingLeaf {
                    gindex: gindex.clone(),
                });
            }
        }
    }
    Ok(known)
}

fn check_root(expected: &Root, computed: Root) -> Result<(), ProofError> {
    if computed == *expected {
        Ok(())
    } else {
        Err(ProofError::RootMismatch {
            expected: *expected,
            computed,
        })
    }
}

fn record(result: &Result<(), ProofError>) {
    match result {
        Ok(()) => {
            counter!(registry::PROOF_VERIFY, "success" => "true").increment(1);
        }
        Err(err) => {
            debug!("rejected proof: {err}");
            counter!(registry::PROOF_VERIFY, "success" => "false").increment(1);
        }
    }
}

/// A proof of a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleProof {
    /// The proven node.
    pub gindex: GeneralizedIndex,
    /// Its root.
    pub leaf: Chunk,
    /// Sibling roots from the leaf up, one per level.
    pub witnesses: Vec<Chunk>,
}

impl SingleProof {
    /// The root this proof resolves to.
    ///
    /// # Errors
    ///
    /// Returns [`ProofError::LengthMismatch`] if the witness count is wrong.
    pub fn calculate_root(&self) -> Result<Root, ProofError> {
        calculate_merkle_root(&self.leaf, &self.witnesses, &self.gindex)
    }

    /// Checks the proof against `root`.
    ///
    /// # Errors
    ///
    /// Returns the reason the proof was rejected.
    pub fn verify(&self, root: &Root) -> Result<(), ProofError> {
        verify_merkle_proof(&self.leaf, &self.witnesses, &self.gindex, root)
    }
}

/// A proof of several nodes sharing one set of helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multiproof {
    /// The proven nodes.
    pub gindices: Vec<GeneralizedIndex>,
    /// Their roots, in the same order.
    pub leaves: Vec<Chunk>,
    /// Helper roots, ordered as [`get_helper_indices`] orders them.
    pub witnesses: Vec<Chunk>,
}

impl Multiproof {
    /// The gindices the witnesses belong to.
    #[must_use]
    pub fn helper_indices(&self) -> Vec<GeneralizedIndex> {
        get_helper_indices(&self.gindices)
    }

    /// The root this proof resolves to.
    ///
    /// # Errors
    ///
    /// Returns the reason the proof cannot be resolved.
    pub fn calculate_root(&self) -> Result<Root, ProofError> {
        calculate_multi_merkle_root(&self.leaves, &self.witnesses, &self.gindices)
    }

    /// Checks the proof against `root`.
    ///
    /// # Errors
    ///
    /// Returns the reason the proof was rejected.
    pub fn verify(&self, root: &Root) -> Result<(), ProofError> {
        verify_multiproof(&self.leaves, &self.witnesses, &self.gindices, root)
    }

    /// Rebuilds the part of the tree the proof covers.
    ///
    /// Helper nodes become opaque leaves holding their roots. The result has
    /// the proven root, and [`get_node`] works for every proven gindex that
    /// is not itself below another proven gindex.
    ///
    /// # Errors
    ///
    /// Returns the reason the proof cannot be resolved.
    pub fn to_partial_tree(&self) -> Result<SharedNode, ProofError> {
        self.calculate_root()?;
        let known = known_nodes(&self.leaves, &self.witnesses, &self.gindices)?;

        let mut interior = HashSet::new();
        for gindex in known.keys() {
            let mut current = gindex.parent();
            while let Some(ancestor) = current {
                if !interior.insert(ancestor.clone()) {
                    break;
                }
                current = ancestor.parent();
            }
        }
        build_partial(&GeneralizedIndex::root(), &known, &interior)
    }
}

fn build_partial(
    gindex: &GeneralizedIndex,
    known: &HashMap<GeneralizedIndex, Chunk>,
    interior: &HashSet<GeneralizedIndex>,
) -> Result<SharedNode, ProofError> {
    if interior.contains(gindex) {
        let left = build_partial(&gindex.left_child(), known, interior)?;
        let right = build_partial(&gindex.right_child(), known, interior)?;
        return Ok(Node::branch(left, right));
    }
    known
        .get(gindex)
        .map(|chunk| Node::leaf(*chunk))
        .ok_or(ProofError::Unresolved)
}

/// Builds a single proof for the node at `gindex`.
///
/// # Errors
///
/// Returns a [`TreeError`] if `gindex` or one of its siblings is not in the tree.
pub fn create_single_proof(
    root: &SharedNode,
    gindex: &GeneralizedIndex,
) -> Result<SingleProof, TreeError> {
    let leaf = get_node(root, gindex)?.root();
    let witnesses = get_branch_indices(gindex)
        .iter()
        .map(|sibling| get_node(root, sibling).map(|node| node.root()))
        .collect::<Result<_, _>>()?;
    Ok(SingleProof {
        gindex: gindex.clone(),
        leaf,
        witnesses,
    })
}

/// Builds a multiproof for the nodes at `gindices`.
///
/// # Errors
///
/// Returns a [`TreeError`] if any proven or helper node is not in the tree.
pub fn create_multiproof(
    root: &SharedNode,
    gindices: &[GeneralizedIndex],
) -> Result<Multiproof, TreeError> {
    let leaves = gindices
        .iter()
        .map(|gindex| get_node(root, gindex).map(|node| node.root()))
        .collect::<Result<_, _>>()?;
    let witnesses = get_helper_indices(gindices)
        .iter()
        .map(|helper| get_node(root, helper).map(|node| node.root()))
        .collect::<Result<_, _>>()?;
    Ok(Multiproof {
        gindices: gindices.to_vec(),
        leaves,
        witnesses,
    })
}
