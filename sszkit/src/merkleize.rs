// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! Type-directed hash tree roots.
//!
//! Basic values are packed into chunks; composite values contribute one
//! subtree root per element or field. Lists and bitlists are merkleized at
//! their limit and then have their length mixed in.

use sszkit_tree::{BYTES_PER_CHUNK, Chunk, Root, TreeError, merkleize, mix_in_length};

use crate::codec::pack_bits;
use crate::types::{ContainerType, SszType};
use crate::validate::{InvalidValue, InvalidValueKind, WithinPath};
use crate::value::Value;

/// Splits bytes into chunks, zero padding the last one.
pub(crate) fn chunkify(bytes: &[u8]) -> Vec<Chunk> {
    bytes
        .chunks(BYTES_PER_CHUNK)
        .map(|part| {
            let mut chunk = Chunk::ZERO;
            for (dst, src) in chunk.as_bytes_mut().iter_mut().zip(part) {
                *dst = *src;
            }
            chunk
        })
        .collect()
}

/// Packs a sequence of basic values into chunks: their encodings are
/// concatenated and only the final chunk is zero padded.
///
/// # Errors
///
/// Returns an [`InvalidValue`] if an element is of the wrong kind or
/// `element` is not basic.
pub fn pack(element: &SszType, values: &[Value]) -> Result<Vec<Chunk>, InvalidValue> {
    let Some(size) = element.packed_size() else {
        return Err(InvalidValue::new(InvalidValueKind::WrongKind {
            expected: "basic element type",
            found: "composite element type",
        }));
    };
    let mut bytes = Vec::with_capacity(values.len().saturating_mul(size));
    for (i, value) in values.iter().enumerate() {
        element.encode_into(value, &mut bytes).within_index(i)?;
    }
    Ok(chunkify(&bytes))
}

pub(crate) fn limited(chunks: &[Chunk], limit: u64) -> Result<Root, InvalidValue> {
    merkleize(chunks, Some(limit)).map_err(|err| match err {
        TreeError::ChunkLimitExceeded { count, limit } => {
            InvalidValue::new(InvalidValueKind::TooLong {
                limit,
                actual: count,
            })
        }
        _ => InvalidValue::new(InvalidValueKind::TooLong {
            limit,
            actual: chunks.len() as u64,
        }),
    })
}

impl SszType {
    /// The hash tree root of `value`.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidValue`] if `value` does not conform to this type.
    pub fn hash_tree_root(&self, value: &Value) -> Result<Root, InvalidValue> {
        self.assert_valid_value(value)?;
        self.root_of(value)
    }

    fn root_of(&self, value: &Value) -> Result<Root, InvalidValue> {
        match (self, value) {
            (SszType::Uint(_) | SszType::Boolean, value) => {
                let chunks = pack(self, std::slice::from_ref(value))?;
                Ok(chunks.first().copied().unwrap_or(Chunk::ZERO))
            }
            (SszType::BitVector { .. }, Value::Bits(bits)) => {
                limited(&chunkify(&pack_bits(bits)), self.chunk_count())
            }
            (SszType::BitList { .. }, Value::Bits(bits)) => {
                let root = limited(&chunkify(&pack_bits(bits)), self.chunk_count())?;
                Ok(mix_in_length(&root, bits.len() as u64))
            }
            (SszType::ByteVector { .. }, Value::Bytes(bytes)) => {
                limited(&chunkify(bytes), self.chunk_count())
            }
            (SszType::ByteList { .. }, Value::Bytes(bytes)) => {
                let root = limited(&chunkify(bytes), self.chunk_count())?;
                Ok(mix_in_length(&root, bytes.len() as u64))
            }
            (SszType::Vector { element, .. }, Value::List(items)) => {
                let chunks = element_chunks(element, items)?;
                limited(&chunks, self.chunk_count())
            }
            (SszType::List { element, .. }, Value::List(items)) => {
                let chunks = element_chunks(element, items)?;
                let root = limited(&chunks, self.chunk_count())?;
                Ok(mix_in_length(&root, items.len() as u64))
            }
            (SszType::Container(container), Value::Container(_)) => {
                let roots = field_roots(container, value, container.fields().len())?;
                limited(&roots, roots.len() as u64)
            }
            (ty, value) => Err(InvalidValue::wrong_kind(ty, value)),
        }
    }
}

fn element_chunks(element: &SszType, items: &[Value]) -> Result<Vec<Chunk>, InvalidValue> {
    if element.is_basic() {
        pack(element, items)
    } else {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| element.root_of(item).within_index(i))
            .collect()
    }
}

fn field_roots(
    container: &ContainerType,
    value: &Value,
    count: usize,
) -> Result<Vec<Root>, InvalidValue> {
    let Value::Container(map) = value else {
        return Err(InvalidValue::wrong_kind(
            &SszType::Container(container.clone()),
            value,
        ));
    };
    container
        .fields()
        .iter()
        .take(count)
        .map(|f| {
            let item = map
                .get(&f.name)
                .ok_or(InvalidValue::new(InvalidValueKind::MissingField))
                .within_field(&f.name)?;
            f.ty.root_of(item).within_field(&f.name)
        })
        .collect()
}

impl ContainerType {
    /// The root of `value` with the last field left out.
    ///
    /// This separates a payload from a trailing signature over it; the last
    /// field may be absent from `value`.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidValue`] if a hashed field does not conform.
    pub fn signing_root(&self, value: &Value) -> Result<Root, InvalidValue> {
        let count = self.fields().len().saturating_sub(1);
        if let Value::Container(map) = value {
            for f in self.fields().iter().take(count) {
                if let Some(item) = map.get(&f.name) {
                    f.ty.assert_valid_value(item).within_field(&f.name)?;
                }
            }
        }
        let roots = field_roots(self, value, count)?;
        limited(&roots, count as u64)
    }
}
