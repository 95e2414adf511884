// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! sszkit metric definitions.

use metrics::describe_counter;

pub use sszkit_tree::registry::{PROOF_VERIFY, TREE_EXPAND};

/// Number of decode attempts, labelled with `success`.
pub const DESERIALIZE: &str = "ssz.deserialize";

/// Registers all sszkit metric descriptions, including those of sszkit-tree.
pub fn register() {
    describe_counter!(DESERIALIZE, "Number of SSZ decode attempts");
    sszkit_tree::registry::register();
}
