// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use std::fmt::{self, Display, Formatter};

use ethereum_types::U256;

use crate::types::{SszType, UintType};
use crate::value::Value;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A container field.
    Field(String),
    /// A vector or list element.
    Index(u64),
}

/// Location of a failure inside a nested value, outermost step first.
///
/// Displayed as `a.b[3].c`, or `<root>` when the failure is at the top.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    // innermost first, since errors are wrapped while unwinding
    reversed: Vec<PathSegment>,
}

impl FieldPath {
    /// The path to the top-level value.
    #[must_use]
    pub const fn root() -> Self {
        FieldPath {
            reversed: Vec::new(),
        }
    }

    /// The steps of the path, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.reversed.iter().rev()
    }

    /// True for the path to the top-level value.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.reversed.is_empty()
    }

    pub(crate) fn prepend(&mut self, segment: PathSegment) {
        self.reversed.push(segment);
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.segments().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Errors that can be located inside a nested value.
pub(crate) trait WithinPath: Sized {
    fn within(self, segment: PathSegment) -> Self;

    fn within_field(self, name: &str) -> Self {
        self.within(PathSegment::Field(name.to_owned()))
    }

    fn within_index(self, index: usize) -> Self {
        self.within(PathSegment::Index(index as u64))
    }
}

impl<T, E: WithinPath> WithinPath for Result<T, E> {
    fn within(self, segment: PathSegment) -> Self {
        self.map_err(|e| e.within(segment))
    }
}

/// A value that does not conform to its type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value at {path}: {kind}")]
pub struct InvalidValue {
    /// Where the offending value sits.
    pub path: FieldPath,
    /// What is wrong with it.
    pub kind: InvalidValueKind,
}

/// What is wrong with an [`InvalidValue`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum InvalidValueKind {
    /// The value is of the wrong kind for its type.
    #[error("expected {expected}, found {found}")]
    WrongKind {
        /// The kind the type needs.
        expected: &'static str,
        /// The kind that was supplied.
        found: &'static str,
    },
    /// An integer is too large for its width.
    #[error("{value} does not fit in {byte_length} bytes")]
    OutOfRange {
        /// The integer, in decimal.
        value: String,
        /// The width of the type.
        byte_length: usize,
    },
    /// A value above `u64::MAX` for a machine-integer uint. Use the big
    /// integer representation for the full width.
    #[error("{value} exceeds the machine-integer range of u64")]
    ExceedsMachineInteger {
        /// The integer, in decimal.
        value: String,
    },
    /// A vector has the wrong number of items.
    #[error("expected length {expected}, found {actual}")]
    WrongLength {
        /// The declared length.
        expected: u64,
        /// The supplied length.
        actual: u64,
    },
    /// A list has more items than its limit.
    #[error("length {actual} exceeds the limit of {limit}")]
    TooLong {
        /// The declared limit.
        limit: u64,
        /// The supplied length.
        actual: u64,
    },
    /// A container value lacks a declared field.
    #[error("missing field")]
    MissingField,
    /// The size of a variable-size type depends on its value.
    #[error("a value is required to size a variable-size type")]
    ValueRequired,
    /// The encoding would need an offset beyond `u32::MAX`.
    #[error("encoding of {size} bytes does not fit 4 byte offsets")]
    TooLarge {
        /// Size of the encoding so far.
        size: usize,
    },
}

impl InvalidValue {
    /// An error at the top-level value.
    #[must_use]
    pub const fn new(kind: InvalidValueKind) -> Self {
        InvalidValue {
            path: FieldPath::root(),
            kind,
        }
    }

    pub(crate) fn wrong_kind(ty: &SszType, value: &Value) -> Self {
        Self::new(InvalidValueKind::WrongKind {
            expected: expected_kind(ty),
            found: value.kind_name(),
        })
    }
}

impl WithinPath for InvalidValue {
    fn within(mut self, segment: PathSegment) -> Self {
        self.path.prepend(segment);
        self
    }
}

/// The value kind a type expects, for error messages.
pub(crate) const fn expected_kind(ty: &SszType) -> &'static str {
    match ty {
        SszType::Uint(_) => "uint",
        SszType::Boolean => "bool",
        SszType::BitVector { .. } | SszType::BitList { .. } => "bits",
        SszType::ByteVector { .. } | SszType::ByteList { .. } => "bytes",
        SszType::Vector { .. } | SszType::List { .. } => "list",
        SszType::Container(_) => "container",
    }
}

impl SszType {
    /// Checks that `value` conforms to this type.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, located by its field path.
    pub fn assert_valid_value(&self, value: &Value) -> Result<(), InvalidValue> {
        match (self, value) {
            (SszType::Uint(uint), Value::Uint(n)) => {
                check_uint_range(uint, U256::from(*n), || n.to_string())
            }
            (SszType::Uint(uint), Value::BigUint(n)) => {
                check_uint_range(uint, *n, || n.to_string())
            }
            (SszType::Boolean, Value::Bool(_)) => Ok(()),
            (SszType::BitVector { length }, Value::Bits(bits)) => {
                check_exact(*length, bits.len())
            }
            (SszType::BitList { limit }, Value::Bits(bits)) => check_limit(*limit, bits.len()),
            (SszType::ByteVector { length }, Value::Bytes(bytes)) => {
                check_exact(*length, bytes.len())
            }
            (SszType::ByteList { limit }, Value::Bytes(bytes)) => {
                check_limit(*limit, bytes.len())
            }
            (SszType::Vector { element, length }, Value::List(items)) => {
                check_exact(*length, items.len())?;
                check_items(element, items)
            }
            (SszType::List { element, limit }, Value::List(items)) => {
                check_limit(*limit, items.len())?;
                check_items(element, items)
            }
            (SszType::Container(container), Value::Container(map)) => {
                for field in container.fields() {
                    let Some(item) = map.get(&field.name) else {
                        return Err(InvalidValue::new(InvalidValueKind::MissingField))
                            .within_field(&field.name);
                    };
                    field.ty.assert_valid_value(item).within_field(&field.name)?;
                }
                Ok(())
            }
            (ty, value) => Err(InvalidValue::wrong_kind(ty, value)),
        }
    }
}

fn check_items(element: &SszType, items: &[Value]) -> Result<(), InvalidValue> {
    items
        .iter()
        .enumerate()
        .try_for_each(|(i, item)| element.assert_valid_value(item).within_index(i))
}

fn check_uint_range(
    uint: &UintType,
    value: U256,
    render: impl FnOnce() -> String,
) -> Result<(), InvalidValue> {
    let byte_length = uint.byte_length;
    if value.bits() > byte_length.saturating_mul(8) {
        return Err(InvalidValue::new(InvalidValueKind::OutOfRange {
            value: render(),
            byte_length,
        }));
    }
    // wide machine integers stop at u64::MAX, which encodes as all 0xff
    if uint.is_machine_bounded() && value.bits() > 64 {
        return Err(InvalidValue::new(InvalidValueKind::ExceedsMachineInteger {
            value: render(),
        }));
    }
    Ok(())
}

fn check_exact(expected: u64, actual: usize) -> Result<(), InvalidValue> {
    let actual = actual as u64;
    if actual == expected {
        Ok(())
    } else {
        Err(InvalidValue::new(InvalidValueKind::WrongLength {
            expected,
            actual,
        }))
    }
}

fn check_limit(limit: u64, actual: usize) -> Result<(), InvalidValue> {
    let actual = actual as u64;
    if actual <= limit {
        Ok(())
    } else {
        Err(InvalidValue::new(InvalidValueKind::TooLong { limit, actual }))
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]

    use std::collections::BTreeMap;

    use super::*;
    use crate::types::UintRepr;
    use test_case::test_case;

    fn uint(bytes: usize) -> SszType {
        SszType::uint(bytes).unwrap()
    }

    fn big(bytes: usize) -> SszType {
        let uint = UintType::builder().byte_length(bytes).repr(UintRepr::BigInt).build();
        SszType::from_uint(uint).unwrap()
    }

    #[test_case(uint(1), Value::Uint(255), true; "uint8 max")]
    #[test_case(uint(1), Value::Uint(256), false; "uint8 overflow")]
    #[test_case(uint(8), Value::Uint(u64::MAX), true; "uint64 max")]
    #[test_case(uint(8), Value::BigUint(U256::from(u64::MAX) + U256::one()), false; "uint64 big overflow")]
    #[test_case(big(32), Value::BigUint(U256::MAX), true; "uint256 big int max")]
    #[test_case(uint(32), Value::BigUint(U256::MAX), false; "uint256 machine max")]
    #[test_case(uint(16), Value::BigUint(U256::from(u64::MAX)), true; "uint128 machine u64 max")]
    #[test_case(uint(16), Value::BigUint(U256::from(1u128 << 100)), false; "uint128 machine past u64")]
    #[test_case(SszType::Boolean, Value::Uint(1), false; "bool from uint")]
    #[test_case(SszType::bitvector(3).unwrap(), Value::Bits(vec![true; 3]), true; "bitvector")]
    #[test_case(SszType::bitvector(3).unwrap(), Value::Bits(vec![true; 4]), false; "bitvector long")]
    #[test_case(SszType::bytelist(2), Value::Bytes(vec![0; 3]), false; "bytelist over limit")]
    fn validity(ty: SszType, value: Value, valid: bool) {
        assert_eq!(ty.assert_valid_value(&value).is_ok(), valid);
    }

    #[test]
    fn errors_carry_nested_paths() {
        let inner = SszType::container([("v", uint(2))]).unwrap();
        let ty = SszType::container([("items", SszType::list(inner, 4))]).unwrap();

        let mut bad = BTreeMap::new();
        bad.insert("v".to_owned(), Value::Uint(1 << 20));
        let value = Value::Container(BTreeMap::from([(
            "items".to_owned(),
            Value::List(vec![Value::Container(bad)]),
        )]));
        let err = ty.assert_valid_value(&value).unwrap_err();
        assert_eq!(err.path.to_string(), "items[0].v");
        assert!(matches!(err.kind, InvalidValueKind::OutOfRange { .. }));
        assert_eq!(
            err.to_string(),
            "invalid value at items[0].v: 1048576 does not fit in 2 bytes"
        );

        let missing = Value::Container(BTreeMap::from([(
            "items".to_owned(),
            Value::List(vec![Value::Container(BTreeMap::new())]),
        )]));
        let err = ty.assert_valid_value(&missing).unwrap_err();
        assert_eq!(err.path.to_string(), "items[0].v");
        assert_eq!(err.kind, InvalidValueKind::MissingField);
    }

    #[test]
    fn root_path_display() {
        let err = uint(1).assert_valid_value(&Value::Bool(true)).unwrap_err();
        assert!(err.path.is_root());
        assert_eq!(err.to_string(), "invalid value at <root>: expected uint, found bool");
    }
}
