// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! Tree layer metric definitions.

use metrics::describe_counter;

/// Number of placeholder leaves expanded into zero subtrees by `set_node`.
pub const TREE_EXPAND: &str = "ssz.tree.expand";
/// Number of proof verifications, labelled with `success`.
pub const PROOF_VERIFY: &str = "ssz.proof.verify";

/// Registers all tree metric descriptions.
pub fn register() {
    describe_counter!(
        TREE_EXPAND,
        "Number of placeholder leaves expanded into zero subtrees"
    );
    describe_counter!(PROOF_VERIFY, "Number of merkle proof verifications");
}
