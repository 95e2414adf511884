// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use ethereum_types::U256;
use metrics::counter;

use crate::logger::debug;
use crate::registry;
use crate::types::{BYTES_PER_OFFSET, SszType, UintRepr, UintType};
use crate::validate::{FieldPath, PathSegment, WithinPath};
use crate::value::Value;

/// A malformed encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed encoding at {path} (byte {offset}): {kind}")]
pub struct DecodeError {
    /// The field or element whose encoding is malformed.
    pub path: FieldPath,
    /// Absolute byte offset of the malformed region within the input.
    pub offset: usize,
    /// What is wrong with it.
    pub kind: DecodeErrorKind,
}

/// What is wrong with a [`DecodeError`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// A fixed-size region has the wrong length.
    #[error("expected {expected} bytes, found {found}")]
    WrongSize {
        /// The length of the type.
        expected: usize,
        /// The length of the region.
        found: usize,
    },
    /// A region is shorter or longer than any valid encoding of its type.
    #[error("{found} bytes is outside the valid range {min}..={max}")]
    SizeOutOfBounds {
        /// Smallest valid length.
        min: usize,
        /// Largest valid length.
        max: usize,
        /// The length of the region.
        found: usize,
    },
    /// The fixed region does not fit in the input.
    #[error("fixed region needs {needed} bytes, found {found}")]
    Truncated {
        /// Length of the fixed region.
        needed: usize,
        /// Bytes available.
        found: usize,
    },
    /// An offset points past the end of its enclosing value.
    #[error("offset {offset} is past the end of the {len} byte value")]
    OffsetOutOfBounds {
        /// The offset read.
        offset: usize,
        /// Length of the enclosing value.
        len: usize,
    },
    /// Offsets must not decrease.
    #[error("offset {offset} is smaller than the previous offset {previous}")]
    OffsetsNotMonotonic {
        /// The previous offset.
        previous: usize,
        /// The offset read.
        offset: usize,
    },
    /// The first offset must point right after the fixed region.
    #[error("first offset is {found}, expected {expected}")]
    FirstOffsetMismatch {
        /// End of the fixed region.
        expected: usize,
        /// The offset read.
        found: usize,
    },
    /// A region of fixed-size elements is not a whole number of elements.
    #[error("{len} bytes is not a multiple of the element size {element_size}")]
    NotMultiple {
        /// Length of the region.
        len: usize,
        /// Size of one element.
        element_size: usize,
    },
    /// A list holds more elements than its limit.
    #[error("{count} elements exceed the limit of {limit}")]
    TooManyElements {
        /// The declared limit.
        limit: u64,
        /// Number of elements encoded.
        count: u64,
    },
    /// A vector holds the wrong number of elements.
    #[error("expected {expected} elements, found {found}")]
    WrongLength {
        /// The declared length.
        expected: u64,
        /// Number of elements encoded.
        found: u64,
    },
    /// Booleans are encoded as `0x00` or `0x01`.
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),
    /// A bitlist must end with a byte holding its length marker.
    #[error("bitlist has no length marker")]
    MissingSentinel,
    /// Bits past the length of a bitvector must be zero.
    #[error("bits beyond the length of {length} are set")]
    NonZeroPadding {
        /// The declared length.
        length: u64,
    },
    /// An integer does not fit its representation.
    #[error("{byte_length} byte integer does not fit a u64")]
    UintOverflow {
        /// Width of the type.
        byte_length: usize,
    },
    /// `u64::MAX` written literally in a wide machine integer, where it is
    /// only valid as the all-`0xff` pattern.
    #[error("{byte_length} byte integer holds u64::MAX without the all-0xff form")]
    NonCanonicalUint {
        /// Width of the type.
        byte_length: usize,
    },
}

impl DecodeError {
    const fn new(offset: usize, kind: DecodeErrorKind) -> Self {
        DecodeError {
            path: FieldPath::root(),
            offset,
            kind,
        }
    }
}

impl WithinPath for DecodeError {
    fn within(mut self, segment: PathSegment) -> Self {
        self.path.prepend(segment);
        self
    }
}

trait AddOffset {
    fn add_offset(self, offset: usize) -> Self;
}

impl AddOffset for DecodeError {
    fn add_offset(mut self, offset: usize) -> Self {
        self.offset = self.offset.saturating_add(offset);
        self
    }
}

impl<T, E: AddOffset> AddOffset for Result<T, E> {
    fn add_offset(self, offset: usize) -> Self {
        self.map_err(|e| e.add_offset(offset))
    }
}

fn fail<T>(offset: usize, kind: DecodeErrorKind) -> Result<T, DecodeError> {
    Err(DecodeError::new(offset, kind))
}

impl SszType {
    /// Decodes `data`, which must hold exactly one value of this type.
    ///
    /// Nothing is returned unless the whole input is valid.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] locating the first malformed region.
    pub fn deserialize(&self, data: &[u8]) -> Result<Value, DecodeError> {
        let result = self.decode(data);
        match &result {
            Ok(_) => counter!(registry::DESERIALIZE, "success" => "true").increment(1),
            Err(err) => {
                debug!("rejected {} byte encoding: {err}", data.len());
                counter!(registry::DESERIALIZE, "success" => "false").increment(1);
            }
        }
        result
    }

    pub(crate) fn decode(&self, data: &[u8]) -> Result<Value, DecodeError> {
        match self {
            SszType::Uint(uint) => {
                expect_size(uint.byte_length, data)?;
                decode_uint(uint, data)
            }
            SszType::Boolean => {
                expect_size(1, data)?;
                match data {
                    [0] => Ok(Value::Bool(false)),
                    [1] => Ok(Value::Bool(true)),
                    [other, ..] => fail(0, DecodeErrorKind::InvalidBool(*other)),
                    [] => fail(0, DecodeErrorKind::WrongSize { expected: 1, found: 0 }),
                }
            }
            SszType::BitVector { length } => {
                expect_size(self.fixed_part_size(), data)?;
                decode_bitvector(*length, data)
            }
            SszType::BitList { limit } => decode_bitlist(*limit, data),
            SszType::ByteVector { .. } => {
                expect_size(self.fixed_part_size(), data)?;
                Ok(Value::Bytes(data.to_vec()))
            }
            SszType::ByteList { limit } => {
                check_count(data.len() as u64, *limit)?;
                Ok(Value::Bytes(data.to_vec()))
            }
            SszType::Vector { element, length } => {
                self.check_bounds(data)?;
                let items = if element.is_variable_size() {
                    let found = leading_offset(data)?.map_or(0, |first| first / BYTES_PER_OFFSET);
                    if found as u64 != *length {
                        return fail(
                            0,
                            DecodeErrorKind::WrongLength {
                                expected: *length,
                                found: found as u64,
                            },
                        );
                    }
                    decode_variable_elements(element, found, data)?
                } else {
                    decode_fixed_elements(element, data)?
                };
                Ok(Value::List(items))
            }
            SszType::List { element, limit } => {
                let items = if element.is_variable_size() {
                    let count = match leading_offset(data)? {
                        None => 0,
                        Some(first) if first > data.len() => {
                            return fail(
                                0,
                                DecodeErrorKind::OffsetOutOfBounds {
                                    offset: first,
                                    len: data.len(),
                                },
                            );
                        }
                        Some(first) if first == 0 || first % BYTES_PER_OFFSET != 0 => {
                            return fail(
                                0,
                                DecodeErrorKind::NotMultiple {
                                    len: first,
                                    element_size: BYTES_PER_OFFSET,
                                },
                            );
                        }
                        Some(first) => first / BYTES_PER_OFFSET,
                    };
                    check_count(count as u64, *limit)?;
                    decode_variable_elements(element, count, data)?
                } else {
                    let items = decode_fixed_elements(element, data)?;
                    check_count(items.len() as u64, *limit)?;
                    items
                };
                Ok(Value::List(items))
            }
            SszType::Container(container) => {
                self.check_bounds(data)?;
                let types: Vec<&SszType> = container.fields().iter().map(|f| &f.ty).collect();
                let names = container.fields();
                let values = decode_with_offsets(&types, data, |i| {
                    PathSegment::Field(names.get(i).map(|f| f.name.clone()).unwrap_or_default())
                })?;
                Ok(Value::Container(
                    names.iter().map(|f| f.name.clone()).zip(values).collect(),
                ))
            }
        }
    }

    fn check_bounds(&self, data: &[u8]) -> Result<(), DecodeError> {
        let (min, max) = (self.min_size(), self.max_size());
        if (min..=max).contains(&data.len()) {
            Ok(())
        } else {
            fail(
                0,
                DecodeErrorKind::SizeOutOfBounds {
                    min,
                    max,
                    found: data.len(),
                },
            )
        }
    }
}

fn expect_size(expected: usize, data: &[u8]) -> Result<(), DecodeError> {
    if data.len() == expected {
        Ok(())
    } else {
        fail(
            0,
            DecodeErrorKind::WrongSize {
                expected,
                found: data.len(),
            },
        )
    }
}

fn check_count(count: u64, limit: u64) -> Result<(), DecodeError> {
    if count <= limit {
        Ok(())
    } else {
        fail(0, DecodeErrorKind::TooManyElements { limit, count })
    }
}

fn decode_uint(uint: &UintType, data: &[u8]) -> Result<Value, DecodeError> {
    match uint.repr {
        UintRepr::BigInt => {
            let (low, high) = data.split_at(data.len().min(32));
            if high.iter().any(|b| *b != 0) {
                return fail(
                    32,
                    DecodeErrorKind::UintOverflow {
                        byte_length: uint.byte_length,
                    },
                );
            }
            Ok(Value::BigUint(U256::from_little_endian(low)))
        }
        UintRepr::Number => {
            if uint.has_infinity_sentinel() && data.iter().all(|b| *b == 0xff) {
                return Ok(Value::Uint(u64::MAX));
            }
            let (low, high) = data.split_at(data.len().min(8));
            if high.iter().any(|b| *b != 0) {
                return fail(
                    8,
                    DecodeErrorKind::UintOverflow {
                        byte_length: uint.byte_length,
                    },
                );
            }
            let mut le = [0u8; 8];
            for (dst, src) in le.iter_mut().zip(low) {
                *dst = *src;
            }
            let n = u64::from_le_bytes(le);
            if n == u64::MAX && uint.is_machine_bounded() {
                return fail(
                    0,
                    DecodeErrorKind::NonCanonicalUint {
                        byte_length: uint.byte_length,
                    },
                );
            }
            Ok(Value::Uint(n))
        }
    }
}

fn unpack_bits(data: &[u8], length: usize) -> Vec<bool> {
    data.iter()
        .flat_map(|byte| (0..8).map(move |i| byte & (1 << i) != 0))
        .take(length)
        .collect()
}

fn decode_bitvector(length: u64, data: &[u8]) -> Result<Value, DecodeError> {
    let used = length % 8;
    if let Some(last) = data.last() {
        if used != 0 && last >> used != 0 {
            return fail(
                data.len() - 1,
                DecodeErrorKind::NonZeroPadding { length },
            );
        }
    }
    Ok(Value::Bits(unpack_bits(
        data,
        usize::try_from(length).unwrap_or(usize::MAX),
    )))
}

fn decode_bitlist(limit: u64, data: &[u8]) -> Result<Value, DecodeError> {
    let Some((&last, _)) = data.split_last() else {
        return fail(0, DecodeErrorKind::MissingSentinel);
    };
    if last == 0 {
        return fail(data.len() - 1, DecodeErrorKind::MissingSentinel);
    }
    let marker = 7 - last.leading_zeros() as usize;
    let length = (data.len() - 1) * 8 + marker;
    check_count(length as u64, limit)?;
    Ok(Value::Bits(unpack_bits(data, length)))
}

fn decode_fixed_elements(element: &SszType, data: &[u8]) -> Result<Vec<Value>, DecodeError> {
    let size = element.fixed_part_size();
    if size == 0 {
        return if data.is_empty() {
            Ok(Vec::new())
        } else {
            fail(0, DecodeErrorKind::NotMultiple { len: data.len(), element_size: 0 })
        };
    }
    if data.len() % size != 0 {
        return fail(
            0,
            DecodeErrorKind::NotMultiple {
                len: data.len(),
                element_size: size,
            },
        );
    }
    data.chunks_exact(size)
        .enumerate()
        .map(|(i, chunk)| {
            element
                .decode(chunk)
                .add_offset(i * size)
                .within_index(i)
        })
        .collect()
}

fn decode_variable_elements(
    element: &SszType,
    count: usize,
    data: &[u8],
) -> Result<Vec<Value>, DecodeError> {
    let types = vec![element; count];
    decode_with_offsets(&types, data, |i| PathSegment::Index(i as u64))
}

/// The first offset of a sequence of variable-size elements, if there are any.
fn leading_offset(data: &[u8]) -> Result<Option<usize>, DecodeError> {
    if data.is_empty() {
        return Ok(None);
    }
    read_offset(data, 0).map(Some)
}

fn read_offset(data: &[u8], pos: usize) -> Result<usize, DecodeError> {
    let bytes: [u8; BYTES_PER_OFFSET] = data
        .get(pos..pos.saturating_add(BYTES_PER_OFFSET))
        .and_then(|slice| slice.try_into().ok())
        .ok_or(DecodeError::new(
            pos,
            DecodeErrorKind::Truncated {
                needed: pos.saturating_add(BYTES_PER_OFFSET),
                found: data.len(),
            },
        ))?;
    Ok(u32::from_le_bytes(bytes) as usize)
}

enum Slot<'a> {
    Fixed { start: usize, bytes: &'a [u8] },
    Variable { start: usize },
}

/// Decodes a heterogeneous sequence laid out as a fixed region (values and
/// offsets) followed by a variable region.
fn decode_with_offsets(
    types: &[&SszType],
    data: &[u8],
    segment: impl Fn(usize) -> PathSegment,
) -> Result<Vec<Value>, DecodeError> {
    let fixed_len = types
        .iter()
        .fold(0usize, |acc, ty| acc.saturating_add(ty.fixed_part_size()));
    if data.len() < fixed_len {
        return fail(
            0,
            DecodeErrorKind::Truncated {
                needed: fixed_len,
                found: data.len(),
            },
        );
    }

    let mut slots = Vec::with_capacity(types.len());
    let mut pos = 0;
    let mut previous: Option<usize> = None;
    for ty in types {
        if let Some(size) = ty.fixed_size() {
            let end = pos + size;
            let bytes = data.get(pos..end).unwrap_or_default();
            slots.push(Slot::Fixed { start: pos, bytes });
            pos = end;
            continue;
        }
        let offset = read_offset(data, pos)?;
        match previous {
            None if offset != fixed_len => {
                return fail(
                    pos,
                    DecodeErrorKind::FirstOffsetMismatch {
                        expected: fixed_len,
                        found: offset,
                    },
                );
            }
            Some(previous) if offset < previous => {
                return fail(
                    pos,
                    DecodeErrorKind::OffsetsNotMonotonic { previous, offset },
                );
            }
            _ => {}
        }
        if offset > data.len() {
            return fail(
                pos,
                DecodeErrorKind::OffsetOutOfBounds {
                    offset,
                    len: data.len(),
                },
            );
        }
        previous = Some(offset);
        slots.push(Slot::Variable { start: offset });
        pos += BYTES_PER_OFFSET;
    }
    if previous.is_none() && data.len() != fixed_len {
        return fail(
            0,
            DecodeErrorKind::WrongSize {
                expected: fixed_len,
                found: data.len(),
            },
        );
    }

    // each variable item ends where the next one starts, the last at the end
    let mut ends = vec![data.len(); slots.len()];
    let mut next_start = data.len();
    for (slot, end) in slots.iter().zip(ends.iter_mut()).rev() {
        if let Slot::Variable { start } = slot {
            *end = next_start;
            next_start = *start;
        }
    }

    types
        .iter()
        .zip(slots)
        .zip(ends)
        .enumerate()
        .map(|(i, ((ty, slot), end))| {
            let (start, bytes) = match slot {
                Slot::Fixed { start, bytes } => (start, bytes),
                Slot::Variable { start } => (start, data.get(start..end).unwrap_or_default()),
            };
            ty.decode(bytes).add_offset(start).within(segment(i))
        })
        .collect()
}
