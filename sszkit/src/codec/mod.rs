// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! The SSZ byte layout.
//!
//! An encoding is a fixed region followed by a variable region. Fixed-size
//! fields and elements sit in the fixed region in order; each variable-size
//! one is replaced there by a 4 byte little-endian offset, relative to the
//! start of the enclosing value, to where its encoding starts in the
//! variable region. Offsets never decrease and the first one points right
//! after the fixed region.
//!
//! Bits are packed little-endian within each byte. A bitlist carries one
//! extra set bit right after its last bit, so its length can be recovered.

mod de;
mod ser;

pub use de::{DecodeError, DecodeErrorKind};
pub(crate) use ser::pack_bits;
