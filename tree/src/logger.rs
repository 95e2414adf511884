// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

// Logging is a compile-time choice: a library cannot rely on the caller's
// level filter being cheap, so without the `logger` feature every macro is a
// no-op that still type-checks its arguments.

#[cfg(feature = "logger")]
pub use log::{debug, error, info, trace, warn};

/// Returns true if the trace log level is enabled
#[cfg(feature = "logger")]
#[must_use]
pub fn trace_enabled() -> bool {
    log::log_enabled!(log::Level::Trace)
}

#[cfg(not(feature = "logger"))]
pub use noop_logger::{debug, error, info, trace, trace_enabled, warn};

#[cfg(not(feature = "logger"))]
mod noop_logger {
    #[macro_export]
    /// A noop logger, when the logger feature is disabled
    macro_rules! sszkit_noop_log {
        ($($arg:tt)+) => {
            if $crate::logger::trace_enabled() {
                // never taken, keeps the arguments "used"
                let _ = format!($($arg)+);
            }
        };
    }

    pub use crate::sszkit_noop_log as debug;
    pub use crate::sszkit_noop_log as error;
    pub use crate::sszkit_noop_log as info;
    pub use crate::sszkit_noop_log as trace;
    pub use crate::sszkit_noop_log as warn;

    /// `trace_enabled` for a noop logger is always false
    #[inline]
    #[must_use]
    pub const fn trace_enabled() -> bool {
        false
    }
}
