// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! Tree-backed values.
//!
//! A [`TreeValue`] is a type plus the root of its persistent merkle tree. The
//! tree has the shape merkleization gives the value:
//!
//! - basic values are a single leaf holding their padded encoding,
//! - bit and byte types, and vectors of basic elements, are a subtree of
//!   `depth()` over packed chunks,
//! - vectors of composite elements and containers are a subtree over the
//!   element or field trees,
//! - every list kind is a branch of that data subtree and a length leaf.
//!
//! Cloning is O(1) and every setter returns a new value that shares all
//! untouched subtrees with the old one, so earlier versions stay valid. The
//! root is memoized per node, so re-hashing after an edit only touches the
//! edited path.

use std::fmt::{self, Debug, Formatter};

use sszkit_tree::{
    BYTES_PER_CHUNK, Chunk, GeneralizedIndex, Multiproof, Node, Root, SharedNode, SingleProof,
    create_multiproof, create_single_proof, get_node, get_nodes_at_depth, repeat_subtree,
    set_node, subtree_from_chunks, subtree_from_nodes, zero_node,
};

use crate::SszError;
use crate::codec::{DecodeError, pack_bits};
use crate::merkleize::{chunkify, pack};
use crate::path::{
    PathError, PathItem, chunk_gindex, get_generalized_index, item_position, length_gindex,
};
use crate::types::{BITS_PER_CHUNK, SszType, to_usize};
use crate::validate::{InvalidValue, InvalidValueKind, WithinPath};
use crate::value::Value;

/// A value of an SSZ type, backed by a persistent merkle tree.
#[derive(Clone)]
pub struct TreeValue {
    ty: SszType,
    node: SharedNode,
}

/// A child read out of a [`TreeValue`], or written into one.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A basic child (an integer, boolean, bit or byte) as a plain value.
    Basic(Value),
    /// A composite child, sharing the parent's subtree.
    Composite(TreeValue),
}

impl Element {
    /// The child as a plain value.
    ///
    /// # Errors
    ///
    /// Returns an error if a composite child's tree is not fully present.
    pub fn into_value(self) -> Result<Value, SszError> {
        match self {
            Element::Basic(value) => Ok(value),
            Element::Composite(tree) => tree.to_value(),
        }
    }

    /// The subtree for a child of type `ty`.
    fn into_node(self, ty: &SszType) -> Result<SharedNode, SszError> {
        match self {
            Element::Composite(tree) if tree.ty == *ty => Ok(tree.node),
            Element::Composite(tree) => Err(InvalidValue::new(InvalidValueKind::WrongKind {
                expected: "tree of the element type",
                found: if tree.ty.is_basic() {
                    "tree of a basic type"
                } else {
                    "tree of another type"
                },
            })
            .into()),
            Element::Basic(value) => Ok(TreeValue::from_value(ty.clone(), &value)?.node),
        }
    }
}

impl From<Value> for Element {
    fn from(value: Value) -> Self {
        Element::Basic(value)
    }
}

impl From<TreeValue> for Element {
    fn from(tree: TreeValue) -> Self {
        Element::Composite(tree)
    }
}

impl Debug for TreeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeValue")
            .field("ty", &self.ty.to_string())
            .field("root", &self.node.root())
            .finish()
    }
}

/// Two tree values are equal if they have the same type and root.
impl PartialEq for TreeValue {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.hash_tree_root() == other.hash_tree_root()
    }
}

impl Eq for TreeValue {}

/// Where a basic child sits within its chunk.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Bit(usize),
    Bytes { offset: usize, size: usize },
}

impl Slot {
    /// The slot of `item` within `parent`, or `None` if the child is
    /// composite and owns whole nodes.
    fn of(parent: &SszType, item: &PathItem, element: &SszType) -> Option<Slot> {
        let size = element.packed_size()?;
        match (parent, item) {
            (SszType::BitVector { .. } | SszType::BitList { .. }, PathItem::Index(index)) => {
                Some(Slot::Bit(to_usize(index % BITS_PER_CHUNK)))
            }
            (_, PathItem::Index(index)) => {
                let per_chunk = (BYTES_PER_CHUNK / size) as u64;
                Some(Slot::Bytes {
                    offset: to_usize(index % per_chunk).saturating_mul(size),
                    size,
                })
            }
            _ => Some(Slot::Bytes { offset: 0, size }),
        }
    }

    fn read(self, element: &SszType, chunk: &Chunk) -> Result<Value, DecodeError> {
        match self {
            Slot::Bit(bit) => {
                let byte = chunk.as_bytes().get(bit / 8).copied().unwrap_or_default();
                Ok(Value::Bool(byte >> (bit % 8) & 1 == 1))
            }
            Slot::Bytes { offset, size } => {
                let end = offset.saturating_add(size);
                element.decode(chunk.as_bytes().get(offset..end).unwrap_or_default())
            }
        }
    }

    fn write(
        self,
        element: &SszType,
        mut chunk: Chunk,
        value: &Value,
    ) -> Result<Chunk, InvalidValue> {
        match self {
            Slot::Bit(bit) => {
                let Value::Bool(set) = value else {
                    return Err(InvalidValue::wrong_kind(&SszType::Boolean, value));
                };
                if let Some(byte) = chunk.as_bytes_mut().get_mut(bit / 8) {
                    let mask = 1 << (bit % 8);
                    if *set {
                        *byte |= mask;
                    } else {
                        *byte &= !mask;
                    }
                }
            }
            Slot::Bytes { offset, size } => {
                element.assert_valid_value(value)?;
                let mut encoded = Vec::with_capacity(size);
                element.encode_into(value, &mut encoded)?;
                let end = offset.saturating_add(size);
                if let Some(dst) = chunk.as_bytes_mut().get_mut(offset..end) {
                    for (dst, src) in dst.iter_mut().zip(encoded) {
                        *dst = src;
                    }
                }
            }
        }
        Ok(chunk)
    }
}

/// Chunks holding the first `count` items of a packed type, or `None` if the
/// items are composite.
fn packed_chunks(ty: &SszType, count: u64) -> Option<u64> {
    match ty {
        SszType::BitVector { .. } | SszType::BitList { .. } => Some(count.div_ceil(BITS_PER_CHUNK)),
        _ => ty.element_type()?.packed_size().map(|size| {
            count
                .saturating_mul(size as u64)
                .div_ceil(BYTES_PER_CHUNK as u64)
        }),
    }
}

fn with_length(data: SharedNode, length: usize) -> SharedNode {
    Node::branch(data, Node::leaf(Chunk::from_u64(length as u64)))
}

fn list_parts(node: &SharedNode) -> Result<(SharedNode, u64), SszError> {
    let data = get_node(node, &GeneralizedIndex::root().left_child())?;
    let length = get_node(node, &length_gindex())?.root().to_u64();
    Ok((data, length))
}

fn read_bytes(data: &SharedNode, depth: usize, length: u64) -> Result<Vec<u8>, SszError> {
    let chunks = get_nodes_at_depth(data, depth, 0, length.div_ceil(BYTES_PER_CHUNK as u64))?;
    let mut bytes: Vec<u8> = chunks
        .iter()
        .flat_map(|chunk| chunk.root().as_bytes().to_vec())
        .collect();
    bytes.truncate(to_usize(length));
    Ok(bytes)
}

fn read_bits(data: &SharedNode, depth: usize, length: u64) -> Result<Vec<bool>, SszError> {
    let bytes = read_bytes(data, depth, length.div_ceil(8))?;
    Ok((0..to_usize(length))
        .map(|i| bytes.get(i / 8).is_some_and(|byte| byte >> (i % 8) & 1 == 1))
        .collect())
}

fn read_items(
    element: &SszType,
    data: &SharedNode,
    depth: usize,
    count: u64,
) -> Result<Vec<Value>, SszError> {
    match element.packed_size() {
        Some(size) => {
            let bytes = read_bytes(data, depth, count.saturating_mul(size as u64))?;
            Ok(bytes
                .chunks(size)
                .enumerate()
                .map(|(i, part)| element.decode(part).within_index(i))
                .collect::<Result<_, _>>()?)
        }
        None => get_nodes_at_depth(data, depth, 0, count)?
            .iter()
            .map(|node| read(element, node))
            .collect(),
    }
}

fn read(ty: &SszType, node: &SharedNode) -> Result<Value, SszError> {
    let depth = ty.depth();
    match ty {
        SszType::Uint(_) | SszType::Boolean => {
            let size = ty.fixed_part_size();
            Ok(ty.decode(node.root().as_bytes().get(..size).unwrap_or_default())?)
        }
        SszType::BitVector { length } => Ok(Value::Bits(read_bits(node, depth, *length)?)),
        SszType::BitList { .. } => {
            let (data, length) = list_parts(node)?;
            Ok(Value::Bits(read_bits(&data, depth, length)?))
        }
        SszType::ByteVector { length } => Ok(Value::Bytes(read_bytes(node, depth, *length)?)),
        SszType::ByteList { .. } => {
            let (data, length) = list_parts(node)?;
            Ok(Value::Bytes(read_bytes(&data, depth, length)?))
        }
        SszType::Vector { element, length } => {
            Ok(Value::List(read_items(element, node, depth, *length)?))
        }
        SszType::List { element, .. } => {
            let (data, length) = list_parts(node)?;
            Ok(Value::List(read_items(element, &data, depth, length)?))
        }
        SszType::Container(container) => {
            let nodes = get_nodes_at_depth(node, depth, 0, container.fields().len() as u64)?;
            container
                .fields()
                .iter()
                .zip(&nodes)
                .map(|(field, node)| Ok((field.name.clone(), read(&field.ty, node)?)))
                .collect::<Result<_, SszError>>()
                .map(Value::Container)
        }
    }
}

/// Builds the tree of an already validated value.
fn build(ty: &SszType, value: &Value) -> Result<SharedNode, SszError> {
    let depth = ty.depth();
    match (ty, value) {
        (SszType::Uint(_) | SszType::Boolean, value) => {
            let chunks = pack(ty, std::slice::from_ref(value))?;
            Ok(Node::leaf(chunks.first().copied().unwrap_or(Chunk::ZERO)))
        }
        (SszType::BitVector { .. }, Value::Bits(bits)) => {
            Ok(subtree_from_chunks(chunkify(&pack_bits(bits)), depth)?)
        }
        (SszType::BitList { .. }, Value::Bits(bits)) => Ok(with_length(
            subtree_from_chunks(chunkify(&pack_bits(bits)), depth)?,
            bits.len(),
        )),
        (SszType::ByteVector { .. }, Value::Bytes(bytes)) => {
            Ok(subtree_from_chunks(chunkify(bytes), depth)?)
        }
        (SszType::ByteList { .. }, Value::Bytes(bytes)) => Ok(with_length(
            subtree_from_chunks(chunkify(bytes), depth)?,
            bytes.len(),
        )),
        (SszType::Vector { element, .. } | SszType::List { element, .. }, Value::List(items)) => {
            let data = if element.is_basic() {
                subtree_from_chunks(pack(element, items)?, depth)?
            } else {
                let nodes = items
                    .iter()
                    .map(|item| build(element, item))
                    .collect::<Result<Vec<_>, _>>()?;
                subtree_from_nodes(nodes, depth)?
            };
            Ok(if ty.is_list() {
                with_length(data, items.len())
            } else {
                data
            })
        }
        (SszType::Container(container), Value::Container(map)) => {
            let nodes = container
                .fields()
                .iter()
                .map(|field| match map.get(&field.name) {
                    Some(item) => build(&field.ty, item),
                    None => Err(InvalidValue::new(InvalidValueKind::MissingField)
                        .within_field(&field.name)
                        .into()),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(subtree_from_nodes(nodes, depth)?)
        }
        (ty, value) => Err(InvalidValue::wrong_kind(ty, value).into()),
    }
}

fn default_node(ty: &SszType) -> Result<SharedNode, SszError> {
    let depth = ty.depth();
    match ty {
        SszType::Uint(_)
        | SszType::Boolean
        | SszType::BitVector { .. }
        | SszType::ByteVector { .. } => Ok(zero_node(depth)),
        SszType::BitList { .. } | SszType::ByteList { .. } | SszType::List { .. } => {
            Ok(with_length(zero_node(depth), 0))
        }
        SszType::Vector { element, length } => {
            if element.is_basic() {
                Ok(zero_node(depth))
            } else {
                Ok(repeat_subtree(&default_node(element)?, *length, depth)?)
            }
        }
        SszType::Container(container) => {
            let nodes = container
                .fields()
                .iter()
                .map(|field| default_node(&field.ty))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(subtree_from_nodes(nodes, depth)?)
        }
    }
}

fn collect_leaves(
    ty: &SszType,
    node: &SharedNode,
    prefix: &GeneralizedIndex,
    out: &mut Vec<GeneralizedIndex>,
) -> Result<(), SszError> {
    if ty.is_basic() {
        out.push(prefix.clone());
        return Ok(());
    }
    if let SszType::Container(container) = ty {
        for (i, field) in container.fields().iter().enumerate() {
            let relative = chunk_gindex(ty, i as u64)?;
            let child = get_node(node, &relative)?;
            collect_leaves(&field.ty, &child, &prefix.join(&relative), out)?;
        }
        return Ok(());
    }

    let count = if ty.is_list() {
        list_parts(node)?.1
    } else {
        ty.length_or_limit().unwrap_or_default()
    };
    match (packed_chunks(ty, count), ty.element_type()) {
        (Some(chunks), _) => {
            for chunk in 0..chunks {
                out.push(prefix.join(&chunk_gindex(ty, chunk)?));
            }
        }
        (None, Some(element)) => {
            for i in 0..count {
                let relative = chunk_gindex(ty, i)?;
                let child = get_node(node, &relative)?;
                collect_leaves(element, &child, &prefix.join(&relative), out)?;
            }
        }
        (None, None) => {}
    }
    if ty.is_list() {
        out.push(prefix.join(&length_gindex()));
    }
    Ok(())
}

impl TreeValue {
    /// The default value of `ty`.
    ///
    /// Zero subtrees and repeated default elements are shared, so this costs
    /// `O(depth)` nodes per type level whatever the lengths involved.
    ///
    /// # Errors
    ///
    /// Returns an error only for types too deep to lay out.
    pub fn default_for(ty: SszType) -> Result<Self, SszError> {
        let node = default_node(&ty)?;
        Ok(TreeValue { ty, node })
    }

    /// Builds the tree of a plain value.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidValue`] if `value` does not conform to `ty`.
    pub fn from_value(ty: SszType, value: &Value) -> Result<Self, SszError> {
        ty.assert_valid_value(value)?;
        let node = build(&ty, value)?;
        Ok(TreeValue { ty, node })
    }

    /// Wraps an existing tree, for instance one rebuilt from a proof.
    ///
    /// The tree is not checked; reads fail if it does not have the shape of `ty`.
    #[must_use]
    pub const fn from_node(ty: SszType, node: SharedNode) -> Self {
        TreeValue { ty, node }
    }

    /// Decodes an encoding straight into a tree.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if `data` is malformed.
    pub fn deserialize(ty: SszType, data: &[u8]) -> Result<Self, SszError> {
        let value = ty.deserialize(data)?;
        let node = build(&ty, &value)?;
        Ok(TreeValue { ty, node })
    }

    /// The type of this value.
    #[must_use]
    pub const fn ty(&self) -> &SszType {
        &self.ty
    }

    /// The root node of the tree.
    #[must_use]
    pub const fn node(&self) -> &SharedNode {
        &self.node
    }

    /// The hash tree root, memoized in the tree.
    #[must_use]
    pub fn hash_tree_root(&self) -> Root {
        self.node.root()
    }

    /// The plain value held by the tree.
    ///
    /// # Errors
    ///
    /// Returns an error if parts of the tree are missing (as in a partial
    /// tree) or hold chunks that are not valid for the type.
    pub fn to_value(&self) -> Result<Value, SszError> {
        read(&self.ty, &self.node)
    }

    /// The encoding of the value.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be read back into a value.
    pub fn serialize(&self) -> Result<Vec<u8>, SszError> {
        Ok(self.ty.serialize(&self.to_value()?)?)
    }

    /// The number of elements of a vector or list, or fields of a container.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::BasicType`] for basic values.
    pub fn len(&self) -> Result<u64, SszError> {
        if self.ty.is_basic() {
            return Err(PathError::BasicType(self.ty.to_string()).into());
        }
        if self.ty.is_list() {
            return Ok(list_parts(&self.node)?.1);
        }
        match (&self.ty, self.ty.length_or_limit()) {
            (SszType::Container(container), _) => Ok(container.fields().len() as u64),
            (_, length) => Ok(length.unwrap_or_default()),
        }
    }

    /// True for an empty list.
    ///
    /// # Errors
    ///
    /// See [`TreeValue::len`].
    pub fn is_empty(&self) -> Result<bool, SszError> {
        Ok(self.len()? == 0)
    }

    /// Reads the field called `name`.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if this is not a container with that field.
    pub fn get_field(&self, name: &str) -> Result<Element, SszError> {
        self.child(&PathItem::Field(name.to_owned()))
    }

    /// Reads the element (or bit, or byte) at `index`.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if the index is past the length.
    pub fn get_index(&self, index: u64) -> Result<Element, SszError> {
        self.child(&PathItem::Index(index))
    }

    /// Returns a copy with the field called `name` replaced.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] for an unknown field, or an [`InvalidValue`]
    /// if the new child does not conform to the field type.
    pub fn set_field(&self, name: &str, element: impl Into<Element>) -> Result<Self, SszError> {
        self.with_child(&PathItem::Field(name.to_owned()), element.into())
    }

    /// Returns a copy with the element at `index` replaced.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if the index is past the length, or an
    /// [`InvalidValue`] if the new child does not conform.
    pub fn set_index(&self, index: u64, element: impl Into<Element>) -> Result<Self, SszError> {
        self.with_child(&PathItem::Index(index), element.into())
    }

    /// Returns a copy of a list with `element` appended.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::ListFull`] at the limit, or a mismatch error if
    /// this is not a list.
    pub fn push(&self, element: impl Into<Element>) -> Result<Self, SszError> {
        let limit = match self.ty.length_or_limit() {
            Some(limit) if self.ty.is_list() => limit,
            _ => {
                return Err(PathError::Mismatch {
                    item: "push".into(),
                    ty: self.ty.to_string(),
                }
                .into());
            }
        };
        let length = self.len()?;
        if length >= limit {
            return Err(PathError::ListFull { limit }.into());
        }
        let grown = self.write_child(&PathItem::Index(length), element.into(), true)?;
        let node = set_node(
            &grown.node,
            &length_gindex(),
            Node::leaf(Chunk::from_u64(length.saturating_add(1))),
            false,
        )?;
        Ok(TreeValue { node, ..grown })
    }

    /// Every chunk-level leaf of the value: basic values, packed chunks in
    /// use and list length leaves, descending into composite children.
    ///
    /// # Errors
    ///
    /// Returns an error if parts of the tree are missing.
    pub fn leaf_gindices(&self) -> Result<Vec<GeneralizedIndex>, SszError> {
        let mut out = Vec::new();
        collect_leaves(&self.ty, &self.node, &GeneralizedIndex::root(), &mut out)?;
        Ok(out)
    }

    /// A multiproof of the nodes named by `paths`.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] for a path that does not exist in the type.
    pub fn prove<P: AsRef<[PathItem]>>(&self, paths: &[P]) -> Result<Multiproof, SszError> {
        let gindices = paths
            .iter()
            .map(|path| get_generalized_index(&self.ty, path.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(create_multiproof(&self.node, &gindices)?)
    }

    /// A single proof of the node named by `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if the path does not exist in the type.
    pub fn prove_single(&self, path: &[PathItem]) -> Result<SingleProof, SszError> {
        let gindex = get_generalized_index(&self.ty, path)?;
        Ok(create_single_proof(&self.node, &gindex)?)
    }

    fn check_length(&self, item: &PathItem) -> Result<(), SszError> {
        if let (true, PathItem::Index(index)) = (self.ty.is_list(), item) {
            let length = self.len()?;
            if *index >= length {
                return Err(PathError::IndexOutOfRange {
                    index: *index,
                    bound: length,
                }
                .into());
            }
        }
        Ok(())
    }

    fn child(&self, item: &PathItem) -> Result<Element, SszError> {
        let position = item_position(&self.ty, item)?;
        self.check_length(item)?;
        let node = get_node(&self.node, &chunk_gindex(&self.ty, position.chunk)?)?;
        match Slot::of(&self.ty, item, &position.ty) {
            Some(slot) => Ok(Element::Basic(slot.read(&position.ty, &node.root())?)),
            None => Ok(Element::Composite(TreeValue {
                ty: position.ty,
                node,
            })),
        }
    }

    fn with_child(&self, item: &PathItem, element: Element) -> Result<Self, SszError> {
        item_position(&self.ty, item)?;
        self.check_length(item)?;
        self.write_child(item, element, false)
    }

    fn write_child(
        &self,
        item: &PathItem,
        element: Element,
        expand: bool,
    ) -> Result<Self, SszError> {
        let position = item_position(&self.ty, item)?;
        let gindex = chunk_gindex(&self.ty, position.chunk)?;
        let node = match Slot::of(&self.ty, item, &position.ty) {
            Some(slot) => {
                let current = match get_node(&self.node, &gindex) {
                    Ok(node) => node.root(),
                    Err(_) if expand => Chunk::ZERO,
                    Err(err) => return Err(err.into()),
                };
                let value = element.into_value()?;
                Node::leaf(slot.write(&position.ty, current, &value)?)
            }
            None => element.into_node(&position.ty)?,
        };
        Ok(TreeValue {
            ty: self.ty.clone(),
            node: set_node(&self.node, &gindex, node, expand)?,
        })
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]

    use super::*;
    use sszkit_tree::get_helper_indices;

    fn uint(bytes: usize) -> SszType {
        SszType::uint(bytes).unwrap()
    }

    fn checkpoint() -> SszType {
        SszType::container([("epoch", uint(8)), ("root", SszType::bytevector(32).unwrap())])
            .unwrap()
    }

    fn state() -> SszType {
        SszType::container([
            ("slot", uint(8)),
            ("finalized", checkpoint()),
            ("balances", SszType::list(uint(8), 1 << 40)),
            ("history", SszType::list(checkpoint(), 1 << 20)),
            ("bits", SszType::bitlist(2048)),
            ("flag", SszType::Boolean),
        ])
        .unwrap()
    }

    fn sample() -> Value {
        Value::container([
            ("slot", Value::Uint(17)),
            (
                "finalized",
                Value::container([("epoch", Value::Uint(3)), ("root", Value::Bytes(vec![9; 32]))]),
            ),
            ("balances", Value::List((0..9).map(Value::Uint).collect())),
            (
                "history",
                Value::List(vec![
                    Value::container([("epoch", Value::Uint(1)), ("root", Value::Bytes(vec![1; 32]))]),
                    Value::container([("epoch", Value::Uint(2)), ("root", Value::Bytes(vec![2; 32]))]),
                ]),
            ),
            ("bits", Value::Bits(vec![true, false, true, true])),
            ("flag", Value::Bool(true)),
        ])
    }

    #[test]
    fn roots_match_plain_values() {
        let ty = state();
        let value = sample();
        let tree = TreeValue::from_value(ty.clone(), &value).unwrap();
        assert_eq!(tree.hash_tree_root(), ty.hash_tree_root(&value).unwrap());
        assert_eq!(tree.to_value().unwrap(), value);
        assert_eq!(tree.serialize().unwrap(), ty.serialize(&value).unwrap());

        let decoded = TreeValue::deserialize(ty.clone(), &tree.serialize().unwrap()).unwrap();
        assert_eq!(decoded, tree);
    }

    #[test]
    fn defaults_match_plain_defaults() {
        for ty in [
            state(),
            SszType::vector(checkpoint(), 1000).unwrap(),
            SszType::vector(uint(2), 33).unwrap(),
            SszType::bitvector(300).unwrap(),
        ] {
            let tree = TreeValue::default_for(ty.clone()).unwrap();
            let plain = ty.default_value();
            assert_eq!(tree.hash_tree_root(), ty.hash_tree_root(&plain).unwrap());
            assert_eq!(tree.to_value().unwrap(), plain);
        }
    }

    #[test]
    fn huge_default_vector_is_cheap() {
        let ty = SszType::vector(checkpoint(), 1 << 40).unwrap();
        let tree = TreeValue::default_for(ty).unwrap();
        let Element::Composite(last) = tree.get_index((1 << 40) - 1).unwrap() else {
            panic!("expected a composite element")
        };
        let default = checkpoint().default_value();
        assert_eq!(
            last.hash_tree_root(),
            checkpoint().hash_tree_root(&default).unwrap()
        );
    }

    #[test]
    fn accessors_read_children() {
        let tree = TreeValue::from_value(state(), &sample()).unwrap();
        assert_eq!(tree.get_field("slot").unwrap(), Element::Basic(Value::Uint(17)));
        assert_eq!(tree.get_field("flag").unwrap(), Element::Basic(Value::Bool(true)));

        let Element::Composite(balances) = tree.get_field("balances").unwrap() else {
            panic!("expected a list")
        };
        assert_eq!(balances.len().unwrap(), 9);
        assert_eq!(balances.get_index(5).unwrap(), Element::Basic(Value::Uint(5)));
        assert!(matches!(
            balances.get_index(9),
            Err(SszError::Path(PathError::IndexOutOfRange { index: 9, bound: 9 }))
        ));

        let Element::Composite(bits) = tree.get_field("bits").unwrap() else {
            panic!("expected a bitlist")
        };
        assert_eq!(bits.get_index(1).unwrap(), Element::Basic(Value::Bool(false)));
        assert_eq!(bits.get_index(3).unwrap(), Element::Basic(Value::Bool(true)));

        assert!(matches!(
            tree.get_field("missing"),
            Err(SszError::Path(PathError::UnknownField(_)))
        ));
    }

    #[test]
    fn setters_share_untouched_subtrees() {
        let ty = state();
        let original = TreeValue::from_value(ty.clone(), &sample()).unwrap();
        let updated = original.set_field("slot", Value::Uint(18)).unwrap();

        let mut expected = sample();
        if let Value::Container(map) = &mut expected {
            map.insert("slot".into(), Value::Uint(18));
        }
        assert_eq!(updated.hash_tree_root(), ty.hash_tree_root(&expected).unwrap());
        assert_eq!(original.to_value().unwrap(), sample());

        let Element::Composite(before) = original.get_field("history").unwrap() else {
            panic!("expected a list")
        };
        let Element::Composite(after) = updated.get_field("history").unwrap() else {
            panic!("expected a list")
        };
        assert!(SharedNode::ptr_eq(before.node(), after.node()));
    }

    #[test]
    fn packed_updates_and_push() {
        let ty = SszType::list(uint(2), 100);
        let mut tree = TreeValue::default_for(ty.clone()).unwrap();
        for i in 0..20 {
            tree = tree.push(Value::Uint(i)).unwrap();
        }
        tree = tree.set_index(17, Value::Uint(1000)).unwrap();
        let mut expected: Vec<_> = (0..20).map(Value::Uint).collect();
        if let Some(slot) = expected.get_mut(17) {
            *slot = Value::Uint(1000);
        }
        let expected = Value::List(expected);
        assert_eq!(tree.to_value().unwrap(), expected);
        assert_eq!(tree.hash_tree_root(), ty.hash_tree_root(&expected).unwrap());

        assert!(matches!(
            tree.set_index(20, Value::Uint(1)),
            Err(SszError::Path(PathError::IndexOutOfRange { .. }))
        ));
        assert!(matches!(
            tree.set_index(0, Value::Uint(1 << 20)),
            Err(SszError::InvalidValue(_))
        ));
    }

    #[test]
    fn push_respects_limit() {
        let ty = SszType::list(checkpoint(), 2);
        let item = TreeValue::from_value(
            checkpoint(),
            &Value::container([("epoch", Value::Uint(4)), ("root", Value::Bytes(vec![4; 32]))]),
        )
        .unwrap();
        let tree = TreeValue::default_for(ty)
            .unwrap()
            .push(item.clone())
            .unwrap()
            .push(item.clone())
            .unwrap();
        assert_eq!(tree.len().unwrap(), 2);
        assert!(matches!(
            tree.push(item),
            Err(SszError::Path(PathError::ListFull { limit: 2 }))
        ));
        assert!(matches!(
            TreeValue::default_for(checkpoint()).unwrap().push(Value::Uint(1)),
            Err(SszError::Path(PathError::Mismatch { .. }))
        ));
    }

    #[test]
    fn composite_setter_checks_type() {
        let tree = TreeValue::from_value(state(), &sample()).unwrap();
        let wrong = TreeValue::default_for(SszType::bytelist(4)).unwrap();
        assert!(matches!(
            tree.set_field("finalized", wrong),
            Err(SszError::InvalidValue(_))
        ));
    }

    #[test]
    fn leaves_prove_the_root() {
        let tree = TreeValue::from_value(state(), &sample()).unwrap();
        let leaves = tree.leaf_gindices().unwrap();
        // slot, checkpoint, 3 balance chunks and length, 2 checkpoints and
        // length, 1 bit chunk and length, flag
        assert_eq!(leaves.len(), 1 + 2 + 4 + 5 + 2 + 1);
        assert!(!get_helper_indices(&leaves).is_empty());

        let proof = create_multiproof(tree.node(), &leaves).unwrap();
        proof.verify(&tree.hash_tree_root()).unwrap();
    }

    #[test]
    fn prove_paths() {
        let tree = TreeValue::from_value(state(), &sample()).unwrap();
        let root = tree.hash_tree_root();
        let paths = vec![
            vec![PathItem::from("slot")],
            vec![PathItem::from("history"), PathItem::Index(1), PathItem::from("epoch")],
            vec![PathItem::from("balances"), PathItem::Length],
        ];
        let proof = tree.prove(&paths).unwrap();
        proof.verify(&root).unwrap();
        assert_eq!(proof.leaves.first(), Some(&Chunk::from_u64(17)));
        assert_eq!(proof.leaves.get(2), Some(&Chunk::from_u64(9)));

        let single = tree
            .prove_single(&[PathItem::from("finalized"), PathItem::from("root")])
            .unwrap();
        assert_eq!(single.leaf, Chunk::new([9; 32]));
        single.verify(&root).unwrap();
    }
}
