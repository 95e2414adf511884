// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! Type descriptors.
//!
//! Every SSZ type is one of nine kinds. A descriptor is built once, validated
//! on construction and then shared read-only; all type-directed operations
//! (encoding, merkleization, validation, tree layout) dispatch on it by
//! pattern matching.

use std::sync::Arc;

use sszkit_tree::{BYTES_PER_CHUNK, ceil_log2};
use typed_builder::TypedBuilder;

/// Size in bytes of an offset in the fixed region of an encoding.
pub const BYTES_PER_OFFSET: usize = 4;

/// Bits packed into one chunk.
pub(crate) const BITS_PER_CHUNK: u64 = 8 * BYTES_PER_CHUNK as u64;

/// Byte widths accepted for unsigned integers.
pub const UINT_BYTE_LENGTHS: [usize; 6] = [1, 2, 4, 8, 16, 32];

/// How decoded unsigned integers are represented.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UintRepr {
    /// A machine integer ([`Value::Uint`](crate::Value::Uint)).
    ///
    /// For widths above six bytes an all-`0xff` encoding stands for
    /// "infinity" and decodes to `u64::MAX`, which in turn encodes as all
    /// `0xff` over the full width.
    #[default]
    Number,
    /// An arbitrary-precision integer ([`Value::BigUint`](crate::Value::BigUint)).
    BigInt,
}

/// An unsigned integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TypedBuilder)]
pub struct UintType {
    /// Width in bytes, one of [`UINT_BYTE_LENGTHS`].
    pub byte_length: usize,
    /// Representation of decoded values.
    #[builder(default)]
    pub repr: UintRepr,
}

impl UintType {
    /// A machine-integer type of the given width.
    #[must_use]
    pub const fn new(byte_length: usize) -> Self {
        UintType {
            byte_length,
            repr: UintRepr::Number,
        }
    }

    /// True if this width and representation carry the all-`0xff` infinity
    /// sentinel.
    #[must_use]
    pub const fn has_infinity_sentinel(&self) -> bool {
        matches!(self.repr, UintRepr::Number) && self.byte_length > 6
    }

    /// True if values of this type are bounded by `u64` rather than by the
    /// width alone.
    #[must_use]
    pub const fn is_machine_bounded(&self) -> bool {
        matches!(self.repr, UintRepr::Number) && self.byte_length > 8
    }
}

/// A named container field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    /// The field name, unique within its container.
    pub name: String,
    /// The field type.
    pub ty: SszType,
}

/// An ordered, non-empty set of named fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerType {
    fields: Arc<[Field]>,
}

impl ContainerType {
    /// Builds a container from `(name, type)` pairs in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::EmptyContainer`] for no fields and
    /// [`TypeError::DuplicateField`] if a name repeats.
    pub fn new<I, S>(fields: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = (S, SszType)>,
        S: Into<String>,
    {
        let fields: Vec<Field> = fields
            .into_iter()
            .map(|(name, ty)| Field {
                name: name.into(),
                ty,
            })
            .collect();
        if fields.is_empty() {
            return Err(TypeError::EmptyContainer);
        }
        for (i, field) in fields.iter().enumerate() {
            if fields
                .iter()
                .take(i)
                .any(|earlier| earlier.name == field.name)
            {
                return Err(TypeError::DuplicateField(field.name.clone()));
            }
        }
        Ok(ContainerType {
            fields: fields.into(),
        })
    }

    /// The fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The type of the field called `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&SszType> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.ty)
    }

    /// The position of the field called `name`.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// The same container without its last field, if any remain.
    ///
    /// Used to hash a payload separately from a trailing signature.
    #[must_use]
    pub fn without_last_field(&self) -> Option<ContainerType> {
        match self.fields.split_last() {
            Some((_, rest)) if !rest.is_empty() => Some(ContainerType {
                fields: rest.into(),
            }),
            _ => None,
        }
    }
}

/// An SSZ type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SszType {
    /// An unsigned integer.
    Uint(UintType),
    /// `true` or `false`, one byte.
    Boolean,
    /// A fixed number of bits.
    BitVector {
        /// Number of bits.
        length: u64,
    },
    /// Up to `limit` bits.
    BitList {
        /// Maximum number of bits.
        limit: u64,
    },
    /// A fixed number of bytes.
    ByteVector {
        /// Number of bytes.
        length: u64,
    },
    /// Up to `limit` bytes.
    ByteList {
        /// Maximum number of bytes.
        limit: u64,
    },
    /// A fixed number of elements of one type.
    Vector {
        /// The element type.
        element: Arc<SszType>,
        /// Number of elements.
        length: u64,
    },
    /// Up to `limit` elements of one type.
    List {
        /// The element type.
        element: Arc<SszType>,
        /// Maximum number of elements.
        limit: u64,
    },
    /// Named fields.
    Container(ContainerType),
}

/// Errors from building a type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TypeError {
    /// Unsigned integers come in a fixed set of widths.
    #[error("unsupported uint width of {0} bytes")]
    UnsupportedUintWidth(usize),
    /// Vectors must hold at least one item.
    #[error("{kind} length must be greater than zero")]
    ZeroLength {
        /// Which kind of vector.
        kind: &'static str,
    },
    /// Containers must hold at least one field.
    #[error("container has no fields")]
    EmptyContainer,
    /// Field names are unique within a container.
    #[error("duplicate field {0:?}")]
    DuplicateField(String),
    /// A type expression could not be parsed.
    #[error("invalid type expression at byte {position}: {reason}")]
    Parse {
        /// Byte position of the failure within the expression.
        position: usize,
        /// What was wrong.
        reason: String,
    },
}

static BOOLEAN: SszType = SszType::Boolean;
static BYTE: SszType = SszType::Uint(UintType::new(1));

impl SszType {
    /// An unsigned integer of the given width, as a machine integer.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::UnsupportedUintWidth`] for widths other than
    /// 1, 2, 4, 8, 16 or 32 bytes.
    pub fn uint(byte_length: usize) -> Result<Self, TypeError> {
        Self::from_uint(UintType::new(byte_length))
    }

    /// An unsigned integer type built with [`UintType::builder`].
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::UnsupportedUintWidth`] for unsupported widths.
    pub fn from_uint(uint: UintType) -> Result<Self, TypeError> {
        if UINT_BYTE_LENGTHS.contains(&uint.byte_length) {
            Ok(SszType::Uint(uint))
        } else {
            Err(TypeError::UnsupportedUintWidth(uint.byte_length))
        }
    }

    /// A vector of `length` bits.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::ZeroLength`] if `length` is zero.
    pub fn bitvector(length: u64) -> Result<Self, TypeError> {
        non_zero(length, "bitvector")?;
        Ok(SszType::BitVector { length })
    }

    /// A list of up to `limit` bits.
    #[must_use]
    pub const fn bitlist(limit: u64) -> Self {
        SszType::BitList { limit }
    }

    /// A vector of `length` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::ZeroLength`] if `length` is zero.
    pub fn bytevector(length: u64) -> Result<Self, TypeError> {
        non_zero(length, "bytevector")?;
        Ok(SszType::ByteVector { length })
    }

    /// A list of up to `limit` bytes.
    #[must_use]
    pub const fn bytelist(limit: u64) -> Self {
        SszType::ByteList { limit }
    }

    /// A vector of `length` elements.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::ZeroLength`] if `length` is zero.
    pub fn vector(element: SszType, length: u64) -> Result<Self, TypeError> {
        non_zero(length, "vector")?;
        Ok(SszType::Vector {
            element: Arc::new(element),
            length,
        })
    }

    /// A list of up to `limit` elements.
    #[must_use]
    pub fn list(element: SszType, limit: u64) -> Self {
        SszType::List {
            element: Arc::new(element),
            limit,
        }
    }

    /// A container of `(name, type)` pairs. See [`ContainerType::new`].
    ///
    /// # Errors
    ///
    /// Returns an error for an empty field list or a duplicate name.
    pub fn container<I, S>(fields: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = (S, SszType)>,
        S: Into<String>,
    {
        ContainerType::new(fields).map(SszType::Container)
    }

    /// True for the kinds that pack into chunks next to their siblings:
    /// unsigned integers and booleans.
    #[must_use]
    pub const fn is_basic(&self) -> bool {
        matches!(self, SszType::Uint(_) | SszType::Boolean)
    }

    /// True if encodings of this type differ in length.
    #[must_use]
    pub fn is_variable_size(&self) -> bool {
        match self {
            SszType::BitList { .. } | SszType::ByteList { .. } | SszType::List { .. } => true,
            SszType::Vector { element, .. } => element.is_variable_size(),
            SszType::Container(container) => {
                container.fields().iter().any(|f| f.ty.is_variable_size())
            }
            SszType::Uint(_)
            | SszType::Boolean
            | SszType::BitVector { .. }
            | SszType::ByteVector { .. } => false,
        }
    }

    /// True for lists, whose roots mix in their length.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(
            self,
            SszType::BitList { .. } | SszType::ByteList { .. } | SszType::List { .. }
        )
    }

    /// The encoded size of every value of a fixed-size type.
    #[must_use]
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            SszType::Uint(uint) => Some(uint.byte_length),
            SszType::Boolean => Some(1),
            SszType::BitVector { length } => Some(to_usize(length.div_ceil(8))),
            SszType::ByteVector { length } => Some(to_usize(*length)),
            SszType::Vector { element, length } => element
                .fixed_size()
                .map(|size| size.saturating_mul(to_usize(*length))),
            SszType::Container(container) => {
                container.fields().iter().try_fold(0usize, |acc, f| {
                    f.ty.fixed_size().map(|size| acc.saturating_add(size))
                })
            }
            SszType::BitList { .. } | SszType::ByteList { .. } | SszType::List { .. } => None,
        }
    }

    /// Bytes this type takes in the fixed region of an enclosing encoding:
    /// its own size, or an offset if it is variable-size.
    #[must_use]
    pub fn fixed_part_size(&self) -> usize {
        self.fixed_size().unwrap_or(BYTES_PER_OFFSET)
    }

    /// The smallest valid encoding length.
    #[must_use]
    pub fn min_size(&self) -> usize {
        if let Some(size) = self.fixed_size() {
            return size;
        }
        match self {
            SszType::BitList { .. } => 1,
            SszType::Vector { element, length } => to_usize(*length)
                .saturating_mul(BYTES_PER_OFFSET.saturating_add(element.min_size())),
            SszType::Container(container) => {
                container.fields().iter().fold(0usize, |acc, f| {
                    let size = match f.ty.fixed_size() {
                        Some(size) => size,
                        None => BYTES_PER_OFFSET.saturating_add(f.ty.min_size()),
                    };
                    acc.saturating_add(size)
                })
            }
            _ => 0,
        }
    }

    /// The largest valid encoding length, saturating at `usize::MAX`.
    #[must_use]
    pub fn max_size(&self) -> usize {
        if let Some(size) = self.fixed_size() {
            return size;
        }
        match self {
            SszType::BitList { limit } => to_usize(limit / 8).saturating_add(1),
            SszType::ByteList { limit } => to_usize(*limit),
            SszType::List {
                element,
                limit: count,
            }
            | SszType::Vector {
                element,
                length: count,
            } => {
                let per_element = match element.fixed_size() {
                    Some(size) => size,
                    None => BYTES_PER_OFFSET.saturating_add(element.max_size()),
                };
                to_usize(*count).saturating_mul(per_element)
            }
            SszType::Container(container) => {
                container.fields().iter().fold(0usize, |acc, f| {
                    let size = match f.ty.fixed_size() {
                        Some(size) => size,
                        None => BYTES_PER_OFFSET.saturating_add(f.ty.max_size()),
                    };
                    acc.saturating_add(size)
                })
            }
            _ => 0,
        }
    }

    /// Number of chunks under the root, before length mix-in.
    ///
    /// For lists this is the capacity at `limit`, not the current length.
    #[must_use]
    pub fn chunk_count(&self) -> u64 {
        match self {
            SszType::Uint(_) | SszType::Boolean => 1,
            SszType::BitVector { length: bits } | SszType::BitList { limit: bits } => {
                bits.div_ceil(BITS_PER_CHUNK)
            }
            SszType::ByteVector { length: bytes } | SszType::ByteList { limit: bytes } => {
                bytes.div_ceil(BYTES_PER_CHUNK as u64)
            }
            SszType::Vector {
                element,
                length: count,
            }
            | SszType::List {
                element,
                limit: count,
            } => match element.packed_size() {
                Some(size) => count
                    .saturating_mul(size as u64)
                    .div_ceil(BYTES_PER_CHUNK as u64),
                None => *count,
            },
            SszType::Container(container) => container.fields().len() as u64,
        }
    }

    /// Depth of the data subtree, `ceil(log2(chunk_count))`.
    #[must_use]
    pub fn depth(&self) -> usize {
        ceil_log2(self.chunk_count())
    }

    /// The element type of a vector or list. Bits are booleans and bytes are
    /// `uint8`.
    #[must_use]
    pub fn element_type(&self) -> Option<&SszType> {
        match self {
            SszType::Vector { element, .. } | SszType::List { element, .. } => Some(element),
            SszType::BitVector { .. } | SszType::BitList { .. } => Some(&BOOLEAN),
            SszType::ByteVector { .. } | SszType::ByteList { .. } => Some(&BYTE),
            SszType::Uint(_) | SszType::Boolean | SszType::Container(_) => None,
        }
    }

    /// The declared length of a vector, or the limit of a list.
    #[must_use]
    pub const fn length_or_limit(&self) -> Option<u64> {
        match self {
            SszType::BitVector { length }
            | SszType::ByteVector { length }
            | SszType::Vector { length, .. } => Some(*length),
            SszType::BitList { limit }
            | SszType::ByteList { limit }
            | SszType::List { limit, .. } => Some(*limit),
            SszType::Uint(_) | SszType::Boolean | SszType::Container(_) => None,
        }
    }

    /// The type of the field called `name`, for containers.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&SszType> {
        self.as_container().and_then(|c| c.field(name))
    }

    /// The position of the field called `name`, for containers.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.as_container().and_then(|c| c.field_index(name))
    }

    /// The container descriptor, if this is a container.
    #[must_use]
    pub const fn as_container(&self) -> Option<&ContainerType> {
        match self {
            SszType::Container(container) => Some(container),
            _ => None,
        }
    }

    /// Size of a basic element when packed next to its siblings.
    pub(crate) const fn packed_size(&self) -> Option<usize> {
        match self {
            SszType::Uint(uint) => Some(uint.byte_length),
            SszType::Boolean => Some(1),
            _ => None,
        }
    }
}

fn non_zero(length: u64, kind: &'static str) -> Result<(), TypeError> {
    if length == 0 {
        Err(TypeError::ZeroLength { kind })
    } else {
        Ok(())
    }
}

/// Lengths beyond the address space saturate; no such value can be held in
/// memory anyway.
pub(crate) fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}
