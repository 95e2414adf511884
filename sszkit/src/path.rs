// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! Semantic paths into typed trees.
//!
//! A path names a node of a value's tree by field names, element indices and
//! the length selector of lists. [`get_generalized_index`] walks the type to
//! turn it into the node's generalized index.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use sszkit_tree::{BYTES_PER_CHUNK, GeneralizedIndex};

use crate::types::{BITS_PER_CHUNK, SszType, UintType};

/// The textual form of [`PathItem::Length`].
pub const LENGTH_SELECTOR: &str = "__len__";

static LENGTH_TYPE: SszType = SszType::Uint(UintType::new(8));

/// One step of a semantic path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathItem {
    /// A container field.
    Field(String),
    /// A vector or list element, or a bit or byte.
    Index(u64),
    /// The length of a list.
    Length,
}

impl FromStr for PathItem {
    type Err = std::convert::Infallible;

    /// `__len__` selects the length, decimal numbers select an index and
    /// anything else names a field.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            LENGTH_SELECTOR => PathItem::Length,
            _ => s
                .parse()
                .map_or_else(|_| PathItem::Field(s.to_owned()), PathItem::Index),
        })
    }
}

impl From<&str> for PathItem {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(item) => item,
            Err(never) => match never {},
        }
    }
}

impl From<u64> for PathItem {
    fn from(index: u64) -> Self {
        PathItem::Index(index)
    }
}

impl Display for PathItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PathItem::Field(name) => f.write_str(name),
            PathItem::Index(index) => write!(f, "{index}"),
            PathItem::Length => f.write_str(LENGTH_SELECTOR),
        }
    }
}

/// Reasons a path does not lead anywhere.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PathError {
    /// The container has no such field.
    #[error("no field named {0:?}")]
    UnknownField(String),
    /// The index is past the length or limit.
    #[error("index {index} is out of range for {bound} items")]
    IndexOutOfRange {
        /// The requested index.
        index: u64,
        /// The length or limit.
        bound: u64,
    },
    /// Basic values have no children.
    #[error("cannot descend into basic type {0}")]
    BasicType(String),
    /// The step does not apply to this kind of type.
    #[error("{item} does not apply to {ty}")]
    Mismatch {
        /// The offending step.
        item: String,
        /// The type it was applied to.
        ty: String,
    },
    /// A list is already at its limit.
    #[error("list is full at {limit} items")]
    ListFull {
        /// The limit.
        limit: u64,
    },
}

/// Where an element or field sits within the data subtree of its parent.
pub(crate) struct Position {
    /// Index of the chunk (or subtree) within the data subtree.
    pub chunk: u64,
    /// The type at the end of this step.
    pub ty: SszType,
}

/// Resolves one step within `ty`, without looking at any value.
pub(crate) fn item_position(ty: &SszType, item: &PathItem) -> Result<Position, PathError> {
    let mismatch = || PathError::Mismatch {
        item: item.to_string(),
        ty: ty.to_string(),
    };
    if ty.is_basic() {
        return Err(PathError::BasicType(ty.to_string()));
    }
    match (ty, item) {
        (SszType::Container(container), PathItem::Field(name)) => {
            let index = container
                .field_index(name)
                .ok_or_else(|| PathError::UnknownField(name.clone()))?;
            let ty = container
                .field(name)
                .cloned()
                .ok_or_else(|| PathError::UnknownField(name.clone()))?;
            Ok(Position {
                chunk: index as u64,
                ty,
            })
        }
        (_, PathItem::Index(index)) => {
            let (Some(bound), Some(element)) = (ty.length_or_limit(), ty.element_type()) else {
                return Err(mismatch());
            };
            if *index >= bound {
                return Err(PathError::IndexOutOfRange {
                    index: *index,
                    bound,
                });
            }
            let chunk = match ty {
                SszType::BitVector { .. } | SszType::BitList { .. } => index / BITS_PER_CHUNK,
                _ => match element.packed_size() {
                    Some(size) => index.saturating_mul(size as u64) / BYTES_PER_CHUNK as u64,
                    None => *index,
                },
            };
            Ok(Position {
                chunk,
                ty: element.clone(),
            })
        }
        _ => Err(mismatch()),
    }
}

/// The generalized index of the data subtree's `chunk`-th node, relative to
/// the root of a value of type `ty`.
pub(crate) fn chunk_gindex(ty: &SszType, chunk: u64) -> Result<GeneralizedIndex, PathError> {
    let depth = ty.depth();
    let relative = GeneralizedIndex::from_depth_index(depth, chunk).map_err(|_| {
        PathError::IndexOutOfRange {
            index: chunk,
            bound: ty.chunk_count(),
        }
    })?;
    if ty.is_list() {
        Ok(GeneralizedIndex::root().left_child().join(&relative))
    } else {
        Ok(relative)
    }
}

/// The generalized index of the length leaf of a list.
#[must_use]
pub fn length_gindex() -> GeneralizedIndex {
    GeneralizedIndex::root().right_child()
}

/// Translates a semantic path into a generalized index within a value of
/// type `ty`.
///
/// Each step descends `depth` levels into the current type (one more, on the
/// left, for lists); the length selector takes the right child of a list.
/// An index into packed basic elements resolves to the chunk holding it.
///
/// # Errors
///
/// Returns a [`PathError`] if a step does not exist in the type.
pub fn get_generalized_index(
    ty: &SszType,
    path: &[PathItem],
) -> Result<GeneralizedIndex, PathError> {
    let mut gindex = GeneralizedIndex::root();
    let mut current = ty.clone();
    for item in path {
        if current.is_basic() {
            return Err(PathError::BasicType(current.to_string()));
        }
        if *item == PathItem::Length {
            if !current.is_list() {
                return Err(PathError::Mismatch {
                    item: item.to_string(),
                    ty: current.to_string(),
                });
            }
            gindex = gindex.join(&length_gindex());
            current = LENGTH_TYPE.clone();
            continue;
        }
        let position = item_position(&current, item)?;
        gindex = gindex.join(&chunk_gindex(&current, position.chunk)?);
        current = position.ty;
    }
    Ok(gindex)
}
