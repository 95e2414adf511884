// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use std::fmt::{self, Debug, Display, LowerHex};

use sha2::{Digest, Sha256};

/// The number of bytes in a [`Chunk`].
pub const BYTES_PER_CHUNK: usize = 32;

/// A 32 byte unit of merkle tree data.
///
/// Leaves hold packed, zero padded value bytes; every other position of a tree
/// holds the hash of its two children. Both are represented by this type.
#[derive(PartialEq, Eq, Clone, Copy, Default, Hash, PartialOrd, Ord)]
pub struct Chunk([u8; BYTES_PER_CHUNK]);

/// A chunk that is the merkle root of some subtree.
pub type Root = Chunk;

/// Returned when converting a slice that is not exactly 32 bytes into a [`Chunk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("a chunk is {BYTES_PER_CHUNK} bytes, found {0}")]
pub struct InvalidChunkLength(pub usize);

impl Chunk {
    /// The all-zero chunk, the leaf of every zero subtree.
    pub const ZERO: Chunk = Chunk([0; BYTES_PER_CHUNK]);

    /// Wraps 32 bytes.
    #[must_use]
    pub const fn new(bytes: [u8; BYTES_PER_CHUNK]) -> Self {
        Chunk(bytes)
    }

    /// Copies up to 32 bytes into a chunk, zero padding the remainder.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidChunkLength`] if `bytes` is longer than a chunk.
    pub fn from_partial(bytes: &[u8]) -> Result<Self, InvalidChunkLength> {
        let mut chunk = [0; BYTES_PER_CHUNK];
        chunk
            .get_mut(..bytes.len())
            .ok_or(InvalidChunkLength(bytes.len()))?
            .copy_from_slice(bytes);
        Ok(Chunk(chunk))
    }

    /// The little-endian encoding of `value` in the low 8 bytes.
    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        let mut chunk = [0; BYTES_PER_CHUNK];
        for (dst, src) in chunk.iter_mut().zip(value.to_le_bytes()) {
            *dst = src;
        }
        Chunk(chunk)
    }

    /// Reads the low 8 bytes as a little-endian integer.
    #[must_use]
    pub fn to_u64(&self) -> u64 {
        let mut low = [0; 8];
        for (dst, src) in low.iter_mut().zip(self.0) {
            *dst = src;
        }
        u64::from_le_bytes(low)
    }

    /// The underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; BYTES_PER_CHUNK] {
        &self.0
    }

    /// Mutable access to the underlying bytes.
    pub const fn as_bytes_mut(&mut self) -> &mut [u8; BYTES_PER_CHUNK] {
        &mut self.0
    }

    /// True if every byte is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl AsRef<[u8]> for Chunk {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; BYTES_PER_CHUNK]> for Chunk {
    fn from(value: [u8; BYTES_PER_CHUNK]) -> Self {
        Chunk(value)
    }
}

impl From<Chunk> for [u8; BYTES_PER_CHUNK] {
    fn from(value: Chunk) -> Self {
        value.0
    }
}

impl TryFrom<&[u8]> for Chunk {
    type Error = InvalidChunkLength;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        <[u8; BYTES_PER_CHUNK]>::try_from(value)
            .map(Chunk)
            .map_err(|_| InvalidChunkLength(value.len()))
    }
}

impl Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl LowerHex for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str("0x")?;
        }
        f.write_str(&hex::encode(self.0))
    }
}

/// Hashes the 64 byte concatenation of two chunks.
#[must_use]
pub fn hash_pair(left: &Chunk, right: &Chunk) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(left.0);
    hasher.update(right.0);
    Chunk(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used, clippy::indexing_slicing)]

    use super::*;
    use hex_literal::hex;
    use test_case::test_case;

    #[test]
    fn zero_pair_hash() {
        // sha256 of 64 zero bytes
        assert_eq!(
            hash_pair(&Chunk::ZERO, &Chunk::ZERO),
            Chunk::new(hex!(
                "f5a5fd42d16a20302798ef6ed309979b43003d2320d9f0e8ea9831a92759fb4b"
            ))
        );
    }

    #[test_case(&[], Chunk::ZERO; "empty")]
    #[test_case(&[1, 2], Chunk::new({ let mut c = [0; 32]; c[0] = 1; c[1] = 2; c }); "padded")]
    fn partial(bytes: &[u8], expected: Chunk) {
        assert_eq!(Chunk::from_partial(bytes).unwrap(), expected);
    }

    #[test]
    fn partial_too_long() {
        assert_eq!(Chunk::from_partial(&[0; 33]), Err(InvalidChunkLength(33)));
        assert_eq!(Chunk::try_from(&[0u8; 31][..]), Err(InvalidChunkLength(31)));
    }

    #[test]
    fn u64_round_trip() {
        let chunk = Chunk::from_u64(0x0102_0304_0506_0708);
        assert_eq!(chunk.as_bytes()[..8], [8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(chunk.to_u64(), 0x0102_0304_0506_0708);
    }
}
