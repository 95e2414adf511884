// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

#![warn(missing_debug_implementations, rust_2018_idioms, missing_docs)]
#![deny(unsafe_code)]

//! # sszkit: SimpleSerialize for Rust
//!
//! sszkit implements SSZ, the deterministic encoding and merkleization scheme
//! used by Ethereum consensus, over runtime type descriptors.
//!
//! # Types and values
//!
//! An [`SszType`] describes one of nine kinds: unsigned integers, booleans,
//! bitvectors, bitlists, byte vectors, byte lists, vectors, lists and
//! containers. Types can be built with constructors or parsed from type
//! expressions such as `container{slot:uint64,roots:list[bytes[32],1024]}`.
//!
//! A [`Value`] is a plain, structural instance of a type. Values do not
//! carry their type, so every operation takes both:
//!
//! - [`serialize`] and [`deserialize`] convert to and from the byte layout,
//! - [`hash_tree_root`] and [`signing_root`] compute merkle roots,
//! - [`equals`], [`clone`], [`default_value`], [`create_value`] and
//!   [`assert_valid_value`] are type-directed helpers.
//!
//! # Trees and proofs
//!
//! A [`TreeValue`] holds a value as a persistent merkle tree (see
//! [`sszkit_tree`]). Clones are free, point updates rebuild only one path
//! and the root of every node is computed once. Nodes are addressed by
//! [`GeneralizedIndex`]; [`get_generalized_index`] translates a semantic path
//! (field names, element indices and [`PathItem::Length`]) into one, and
//! [`TreeValue::prove`] builds a [`Multiproof`] of any set of paths.
//!
//! # Errors
//!
//! Failures fall into three classes, told apart by [`SszError::class`]:
//! invalid values ([`InvalidValue`]), malformed encodings ([`DecodeError`])
//! and rejected proofs ([`ProofError`]). Invalid values and malformed
//! encodings carry the path of the offending field or element.
//!
//! # Logging and metrics
//!
//! With the `logger` feature, rejected decodes and proofs and the expansion
//! of placeholder subtrees are logged through the `log` facade. Counters are
//! emitted through `metrics`; see [`registry`].

mod codec;
mod expr;
mod json;
mod merkleize;
mod path;
mod types;
mod validate;
mod value;
mod view;

/// Logger module for handling logging functionality
pub mod logger;

/// Metric names used by this crate
pub mod registry;

pub use codec::{DecodeError, DecodeErrorKind};
pub use json::JsonError;
pub use merkleize::pack;
pub use path::{LENGTH_SELECTOR, PathError, PathItem, get_generalized_index, length_gindex};
pub use types::{
    BYTES_PER_OFFSET, ContainerType, Field, SszType, TypeError, UINT_BYTE_LENGTHS, UintRepr,
    UintType,
};
pub use validate::{FieldPath, InvalidValue, InvalidValueKind, PathSegment};
pub use value::Value;
pub use view::{Element, TreeValue};

// re-export the hashing core so callers don't need a second dependency
pub use sszkit_tree::{
    Chunk, GeneralizedIndex, GeneralizedIndexError, InvalidChunkLength, Multiproof, ProofError,
    Root, SingleProof, TreeError, alphasort, get_helper_indices, merkleize, mix_in_length,
    verify_merkle_proof, verify_multiproof,
};

/// The three classes of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// A value does not conform to its type.
    InvalidValue,
    /// Bytes are not a valid encoding.
    MalformedEncoding,
    /// A proof does not resolve to the claimed root.
    ProofRejected,
    /// Misuse of the API: bad types, paths or tree shapes.
    Usage,
}

/// Any sszkit error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SszError {
    /// See [`InvalidValue`].
    #[error(transparent)]
    InvalidValue(#[from] InvalidValue),
    /// See [`DecodeError`].
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// See [`ProofError`].
    #[error(transparent)]
    Proof(#[from] ProofError),
    /// See [`TreeError`].
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// See [`PathError`].
    #[error(transparent)]
    Path(#[from] PathError),
    /// See [`TypeError`].
    #[error(transparent)]
    Type(#[from] TypeError),
    /// See [`JsonError`].
    #[error(transparent)]
    Json(#[from] JsonError),
}

impl SszError {
    /// Which class of failure this is.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            SszError::InvalidValue(_) | SszError::Json(JsonError::Value(_)) => {
                ErrorClass::InvalidValue
            }
            SszError::Decode(_) => ErrorClass::MalformedEncoding,
            SszError::Proof(_) => ErrorClass::ProofRejected,
            _ => ErrorClass::Usage,
        }
    }
}

/// Encodes `value` as `ty`. See [`SszType::serialize`].
///
/// # Errors
///
/// Returns an [`InvalidValue`] if `value` does not conform to `ty`.
pub fn serialize(value: &Value, ty: &SszType) -> Result<Vec<u8>, InvalidValue> {
    ty.serialize(value)
}

/// Decodes `data` as `ty`. See [`SszType::deserialize`].
///
/// # Errors
///
/// Returns a [`DecodeError`] if `data` is malformed.
pub fn deserialize(data: &[u8], ty: &SszType) -> Result<Value, DecodeError> {
    ty.deserialize(data)
}

/// The hash tree root of `value` as `ty`.
///
/// # Errors
///
/// Returns an [`InvalidValue`] if `value` does not conform to `ty`.
pub fn hash_tree_root(value: &Value, ty: &SszType) -> Result<Root, InvalidValue> {
    ty.hash_tree_root(value)
}

/// The root of `value` without the last field of the container `ty`.
///
/// # Errors
///
/// Returns an [`InvalidValue`] if `ty` is not a container or a hashed field
/// does not conform.
pub fn signing_root(value: &Value, ty: &SszType) -> Result<Root, InvalidValue> {
    match ty.as_container() {
        Some(container) => container.signing_root(value),
        None => Err(InvalidValue::new(InvalidValueKind::WrongKind {
            expected: "container type",
            found: "non-container type",
        })),
    }
}

/// Type-directed equality. See [`SszType::equals`].
#[must_use]
pub fn equals(a: &Value, b: &Value, ty: &SszType) -> bool {
    ty.equals(a, b)
}

/// A deep copy of `value` holding only what `ty` declares.
#[must_use]
pub fn clone(value: &Value, ty: &SszType) -> Value {
    ty.clone_value(value)
}

/// The default value of `ty`.
#[must_use]
pub fn default_value(ty: &SszType) -> Value {
    ty.default_value()
}

/// Completes a partial value with defaults. See [`SszType::create_value`].
///
/// # Errors
///
/// Returns an [`InvalidValue`] if a supplied part does not conform.
pub fn create_value(ty: &SszType, partial: Option<&Value>) -> Result<Value, InvalidValue> {
    ty.create_value(partial)
}

/// Checks that `value` conforms to `ty`, reporting the path of the first
/// violation.
///
/// # Errors
///
/// Returns the first [`InvalidValue`] found.
pub fn assert_valid_value(value: &Value, ty: &SszType) -> Result<(), InvalidValue> {
    ty.assert_valid_value(value)
}
