// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! Generalized indices.
//!
//! A generalized index names a node of a binary tree by its position in a
//! breadth-first numbering: the root is `1`, the children of `g` are `2g` and
//! `2g + 1`. Read in binary, the bits after the leading `1` are the path from
//! the root, `0` for left and `1` for right.
//!
//! Nesting types multiplies depths, so indices routinely exceed 64 bits. The
//! value is kept as little-endian `u64` limbs with no trailing zero limb.

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use smallvec::{SmallVec, smallvec};

type Limbs = SmallVec<[u64; 2]>;

const LIMB_BITS: usize = 64;

/// An arbitrary-precision generalized index, always `>= 1`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GeneralizedIndex(Limbs);

/// Errors from building or parsing a [`GeneralizedIndex`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneralizedIndexError {
    /// Zero is not a generalized index.
    #[error("0 is not a generalized index")]
    Zero,
    /// The index within a tree level does not fit that level.
    #[error("index {index} does not fit in a tree of depth {depth}")]
    IndexOutOfDepth {
        /// The depth of the level.
        depth: usize,
        /// The index within the level.
        index: u64,
    },
    /// The string is not a decimal number.
    #[error("invalid generalized index {0:?}")]
    Parse(String),
}

impl GeneralizedIndex {
    /// The root of a tree.
    #[must_use]
    pub fn root() -> Self {
        GeneralizedIndex(smallvec![1])
    }

    /// Wraps a non-zero `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`GeneralizedIndexError::Zero`] if `value` is zero.
    pub fn new(value: u64) -> Result<Self, GeneralizedIndexError> {
        if value == 0 {
            Err(GeneralizedIndexError::Zero)
        } else {
            Ok(GeneralizedIndex(smallvec![value]))
        }
    }

    /// The index of the `index`-th node (counting from the left) at `depth`,
    /// that is `2^depth + index`.
    ///
    /// # Errors
    ///
    /// Returns [`GeneralizedIndexError::IndexOutOfDepth`] if `index >= 2^depth`.
    pub fn from_depth_index(depth: usize, index: u64) -> Result<Self, GeneralizedIndexError> {
        if depth < LIMB_BITS && index >> depth != 0 {
            return Err(GeneralizedIndexError::IndexOutOfDepth { depth, index });
        }
        let mut limbs = shl(&Self::root().0, depth);
        if let Some(low) = limbs.first_mut() {
            *low |= index;
        }
        Ok(GeneralizedIndex(limbs))
    }

    /// Number of significant bits.
    #[must_use]
    pub fn bit_length(&self) -> usize {
        match self.0.last() {
            Some(high) => {
                (self.0.len() - 1) * LIMB_BITS + (LIMB_BITS - high.leading_zeros() as usize)
            }
            None => 0,
        }
    }

    /// Distance from the root; the root has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.bit_length().saturating_sub(1)
    }

    /// True for the root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.as_slice() == [1]
    }

    /// Returns bit `i` of the value (bit 0 is the least significant).
    #[must_use]
    pub fn bit(&self, i: usize) -> bool {
        self.0
            .get(i / LIMB_BITS)
            .is_some_and(|&limb| (limb >> (i % LIMB_BITS)) & 1 == 1)
    }

    /// True if this is the left child of its parent (or the root).
    #[must_use]
    pub fn is_left(&self) -> bool {
        !self.bit(0)
    }

    /// `2g`
    #[must_use]
    pub fn left_child(&self) -> Self {
        GeneralizedIndex(shl(&self.0, 1))
    }

    /// `2g + 1`
    #[must_use]
    pub fn right_child(&self) -> Self {
        let mut limbs = shl(&self.0, 1);
        if let Some(low) = limbs.first_mut() {
            *low |= 1;
        }
        GeneralizedIndex(limbs)
    }

    /// The child on the given side.
    #[must_use]
    pub fn child(&self, right: bool) -> Self {
        if right {
            self.right_child()
        } else {
            self.left_child()
        }
    }

    /// `g / 2`, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(GeneralizedIndex(shr(&self.0, 1)))
    }

    /// `g xor 1`, or `None` for the root.
    #[must_use]
    pub fn sibling(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let mut limbs = self.0.clone();
        if let Some(low) = limbs.first_mut() {
            *low ^= 1;
        }
        Some(GeneralizedIndex(limbs))
    }

    /// The path from the root to this node, one `bool` per level, `true` meaning
    /// "go right".
    pub fn path(&self) -> impl DoubleEndedIterator<Item = bool> + ExactSizeIterator + '_ {
        (0..self.depth()).rev().map(move |i| self.bit(i))
    }

    /// The index of this node within its level, `g - 2^depth`, if it fits in 64 bits.
    #[must_use]
    pub fn index_in_level(&self) -> Option<u64> {
        let depth = self.depth();
        let below = self.bits_below(depth);
        match below.as_slice() {
            [] => Some(0),
            [value] => Some(*value),
            _ => None,
        }
    }

    /// The value as a `u64`, if it fits.
    #[must_use]
    pub fn to_u64(&self) -> Option<u64> {
        match self.0.as_slice() {
            [value] => Some(*value),
            _ => None,
        }
    }

    /// Appends the path of `relative` (a generalized index within the subtree
    /// rooted here) to this index.
    #[must_use]
    pub fn join(&self, relative: &GeneralizedIndex) -> Self {
        let depth = relative.depth();
        let mut limbs = shl(&self.0, depth);
        for (dst, src) in limbs.iter_mut().zip(relative.bits_below(depth)) {
            *dst |= src;
        }
        GeneralizedIndex(limbs)
    }

    /// Composes a sequence of relative generalized indices, each addressed
    /// inside the subtree named by the ones before it, into one absolute index.
    pub fn concat<'a, I>(indices: I) -> Self
    where
        I: IntoIterator<Item = &'a GeneralizedIndex>,
    {
        indices
            .into_iter()
            .fold(Self::root(), |acc, relative| acc.join(relative))
    }

    /// True if `self` lies on the path from the root to `other` (a node is its
    /// own ancestor).
    #[must_use]
    pub fn is_ancestor_of(&self, other: &GeneralizedIndex) -> bool {
        let (own, theirs) = (self.depth(), other.depth());
        theirs >= own && GeneralizedIndex(shr(&other.0, theirs - own)) == *self
    }

    /// Compares two indices in bit-alphabetic order: by their binary strings,
    /// with a prefix sorting first. This is the left-to-right, pre-order
    /// position of the nodes in the tree.
    #[must_use]
    pub fn alpha_cmp(&self, other: &GeneralizedIndex) -> Ordering {
        let mut ours = (0..self.bit_length()).rev().map(|i| self.bit(i));
        let mut theirs = (0..other.bit_length()).rev().map(|i| other.bit(i));
        loop {
            match (ours.next(), theirs.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(a), Some(b)) if a != b => return a.cmp(&b),
                _ => {}
            }
        }
    }

    /// The low `bits` bits of the value.
    fn bits_below(&self, bits: usize) -> Limbs {
        let mut limbs: Limbs = self
            .0
            .iter()
            .take(bits.div_ceil(LIMB_BITS))
            .copied()
            .collect();
        if bits % LIMB_BITS != 0 {
            if let Some(high) = limbs.get_mut(bits / LIMB_BITS) {
                *high &= (1u64 << (bits % LIMB_BITS)) - 1;
            }
        }
        normalize(&mut limbs);
        limbs
    }
}

/// Sorts generalized indices in bit-alphabetic (left-to-right) order, so that
/// independent implementations agree on the order of multiproof entries.
pub fn alphasort(indices: &mut [GeneralizedIndex]) {
    indices.sort_by(GeneralizedIndex::alpha_cmp);
}

fn normalize(limbs: &mut Limbs) {
    while limbs.last() == Some(&0) {
        limbs.pop();
    }
}

fn shl(limbs: &Limbs, shift: usize) -> Limbs {
    let (whole, bits) = (shift / LIMB_BITS, shift % LIMB_BITS);
    let mut out: Limbs = smallvec![0; whole];
    if bits == 0 {
        out.extend(limbs.iter().copied());
    } else {
        let mut carry = 0;
        for limb in limbs.iter().copied() {
            out.push((limb << bits) | carry);
            carry = limb >> (LIMB_BITS - bits);
        }
        if carry != 0 {
            out.push(carry);
        }
    }
    normalize(&mut out);
    out
}

fn shr(limbs: &Limbs, shift: usize) -> Limbs {
    let (whole, bits) = (shift / LIMB_BITS, shift % LIMB_BITS);
    let kept = limbs.get(whole..).unwrap_or_default();
    let mut out: Limbs = SmallVec::with_capacity(kept.len());
    for (i, limb) in kept.iter().copied().enumerate() {
        let high = match kept.get(i + 1) {
            Some(&next) if bits != 0 => next << (LIMB_BITS - bits),
            _ => 0,
        };
        out.push((limb >> bits) | high);
    }
    normalize(&mut out);
    out
}

/// Divides in place by a small divisor, returning the remainder.
fn div_rem_small(limbs: &mut Limbs, divisor: u64) -> u64 {
    let mut rem = 0u64;
    for limb in limbs.iter_mut().rev() {
        let current = (u128::from(rem) << LIMB_BITS) | u128::from(*limb);
        *limb = (current / u128::from(divisor)) as u64;
        rem = (current % u128::from(divisor)) as u64;
    }
    normalize(limbs);
    rem
}

/// Multiplies in place by a small factor and adds a small addend.
fn mul_add_small(limbs: &mut Limbs, factor: u64, addend: u64) {
    let mut carry = u128::from(addend);
    for limb in limbs.iter_mut() {
        let current = u128::from(*limb) * u128::from(factor) + carry;
        *limb = current as u64;
        carry = current >> LIMB_BITS;
    }
    if carry != 0 {
        limbs.push(carry as u64);
    }
}

impl Ord for GeneralizedIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.iter().rev().cmp(other.0.iter().rev()))
    }
}

impl PartialOrd for GeneralizedIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<u64> for GeneralizedIndex {
    type Error = GeneralizedIndexError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Decimal digits per `u64` step when printing.
const DECIMAL_STEP: u64 = 10_000_000_000_000_000_000;

impl Display for GeneralizedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut limbs = self.0.clone();
        let mut parts = Vec::new();
        while !limbs.is_empty() {
            parts.push(div_rem_small(&mut limbs, DECIMAL_STEP));
        }
        let mut parts = parts.iter().rev();
        match parts.next() {
            Some(first) => write!(f, "{first}")?,
            None => write!(f, "0")?,
        }
        for part in parts {
            write!(f, "{part:019}")?;
        }
        Ok(())
    }
}

impl Debug for GeneralizedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GeneralizedIndex({self})")
    }
}

impl FromStr for GeneralizedIndex {
    type Err = GeneralizedIndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(GeneralizedIndexError::Parse(s.to_owned()));
        }
        let mut limbs: Limbs = SmallVec::new();
        for c in s.chars() {
            let digit = c
                .to_digit(10)
                .ok_or_else(|| GeneralizedIndexError::Parse(s.to_owned()))?;
            mul_add_small(&mut limbs, 10, u64::from(digit));
        }
        normalize(&mut limbs);
        if limbs.is_empty() {
            return Err(GeneralizedIndexError::Zero);
        }
        Ok(GeneralizedIndex(limbs))
    }
}
