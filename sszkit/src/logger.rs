// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

// The `logger` feature is forwarded to sszkit-tree, which owns the switch
// between the `log` facade and the no-op macros.

pub use sszkit_tree::logger::{debug, error, info, trace, trace_enabled, warn};
