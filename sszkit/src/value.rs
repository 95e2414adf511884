// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use std::collections::BTreeMap;

use enum_as_inner::EnumAsInner;
use ethereum_types::U256;

use crate::types::{SszType, UintRepr, UintType, to_usize};
use crate::validate::{InvalidValue, InvalidValueKind, WithinPath};

/// A plain, structural value of some SSZ type.
///
/// A value does not know its type; every operation takes the type alongside.
/// Container values are keyed by field name and any key the type does not
/// declare is ignored.
#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// An unsigned integer that fits a machine word.
    Uint(u64),
    /// An unsigned integer of up to 256 bits.
    BigUint(U256),
    /// The bits of a bitvector or bitlist.
    Bits(Vec<bool>),
    /// The bytes of a bytevector or bytelist.
    Bytes(Vec<u8>),
    /// The elements of a vector or list.
    List(Vec<Value>),
    /// Container fields by name.
    Container(BTreeMap<String, Value>),
}

impl Value {
    /// The name of this value's kind, for error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Uint(_) => "uint",
            Value::BigUint(_) => "big uint",
            Value::Bits(_) => "bits",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Container(_) => "container",
        }
    }

    /// The integer as a [`U256`], for either integer kind.
    #[must_use]
    pub fn as_u256(&self) -> Option<U256> {
        match self {
            Value::Uint(n) => Some(U256::from(*n)),
            Value::BigUint(n) => Some(*n),
            _ => None,
        }
    }

    /// Builds a container value from `(name, value)` pairs.
    pub fn container<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Value::Container(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Uint(value)
    }
}

impl From<U256> for Value {
    fn from(value: U256) -> Self {
        Value::BigUint(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

/// The zero of an integer type in its chosen representation.
pub(crate) fn zero_uint(uint: &UintType) -> Value {
    match uint.repr {
        UintRepr::Number => Value::Uint(0),
        UintRepr::BigInt => Value::BigUint(U256::zero()),
    }
}

impl SszType {
    /// The default value: zeros, `false`, empty lists, full-length vectors of
    /// defaults and containers of default fields.
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self {
            SszType::Uint(uint) => zero_uint(uint),
            SszType::Boolean => Value::Bool(false),
            SszType::BitVector { length } => Value::Bits(vec![false; to_usize(*length)]),
            SszType::ByteVector { length } => Value::Bytes(vec![0; to_usize(*length)]),
            SszType::BitList { .. } => Value::Bits(Vec::new()),
            SszType::ByteList { .. } => Value::Bytes(Vec::new()),
            SszType::List { .. } => Value::List(Vec::new()),
            SszType::Vector { element, length } => {
                Value::List(vec![element.default_value(); to_usize(*length)])
            }
            SszType::Container(container) => Value::Container(
                container
                    .fields()
                    .iter()
                    .map(|f| (f.name.clone(), f.ty.default_value()))
                    .collect(),
            ),
        }
    }

    /// Type-directed equality.
    ///
    /// Integers compare by value whatever their representation, and only the
    /// declared fields of containers are compared.
    #[must_use]
    pub fn equals(&self, a: &Value, b: &Value) -> bool {
        match (self, a, b) {
            (SszType::Uint(_), a, b) => match (a.as_u256(), b.as_u256()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            (SszType::Vector { element, .. } | SszType::List { element, .. }, Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| element.equals(a, b))
            }
            (SszType::Container(container), Value::Container(a), Value::Container(b)) => {
                container.fields().iter().all(|f| {
                    match (a.get(&f.name), b.get(&f.name)) {
                        (Some(a), Some(b)) => f.ty.equals(a, b),
                        (None, None) => true,
                        _ => false,
                    }
                })
            }
            (SszType::Container(_) | SszType::Vector { .. } | SszType::List { .. }, _, _) => false,
            (_, a, b) => a == b,
        }
    }

    /// A deep copy holding only what the type declares.
    #[must_use]
    pub fn clone_value(&self, value: &Value) -> Value {
        match (self, value) {
            (SszType::Vector { element, .. } | SszType::List { element, .. }, Value::List(items)) => {
                Value::List(items.iter().map(|item| element.clone_value(item)).collect())
            }
            (SszType::Container(container), Value::Container(map)) => Value::Container(
                container
                    .fields()
                    .iter()
                    .filter_map(|f| {
                        map.get(&f.name)
                            .map(|item| (f.name.clone(), f.ty.clone_value(item)))
                    })
                    .collect(),
            ),
            (_, value) => value.clone(),
        }
    }

    /// Completes a partially specified value with defaults.
    ///
    /// Missing container fields take their default, vectors given fewer
    /// elements (or bits, or bytes) than their length are padded with
    /// defaults, and `None` yields [`SszType::default_value`]. The result is
    /// validated.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidValue`] if a supplied part does not conform.
    pub fn create_value(&self, partial: Option<&Value>) -> Result<Value, InvalidValue> {
        let Some(partial) = partial else {
            return Ok(self.default_value());
        };
        let value = match (self, partial) {
            (SszType::BitVector { length }, Value::Bits(bits)) => {
                Value::Bits(padded(bits, *length, false)?)
            }
            (SszType::ByteVector { length }, Value::Bytes(bytes)) => {
                Value::Bytes(padded(bytes, *length, 0)?)
            }
            (SszType::Vector { element, length }, Value::List(items)) => {
                let mut created = create_items(element, items)?;
                let supplied = created.len() as u64;
                if supplied > *length {
                    return Err(InvalidValue::new(InvalidValueKind::WrongLength {
                        expected: *length,
                        actual: supplied,
                    }));
                }
                created.resize(to_usize(*length), element.default_value());
                Value::List(created)
            }
            (SszType::List { element, .. }, Value::List(items)) => {
                Value::List(create_items(element, items)?)
            }
            (SszType::Container(container), Value::Container(map)) => Value::Container(
                container
                    .fields()
                    .iter()
                    .map(|f| {
                        f.ty.create_value(map.get(&f.name))
                            .within_field(&f.name)
                            .map(|item| (f.name.clone(), item))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            (_, value) => value.clone(),
        };
        self.assert_valid_value(&value)?;
        Ok(value)
    }
}

fn create_items(element: &SszType, items: &[Value]) -> Result<Vec<Value>, InvalidValue> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| element.create_value(Some(item)).within_index(i))
        .collect()
}

fn padded<T: Clone>(items: &[T], length: u64, fill: T) -> Result<Vec<T>, InvalidValue> {
    let supplied = items.len() as u64;
    if supplied > length {
        return Err(InvalidValue::new(InvalidValueKind::WrongLength {
            expected: length,
            actual: supplied,
        }));
    }
    let mut out = items.to_vec();
    out.resize(to_usize(length), fill);
    Ok(out)
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]

    use super::*;

    fn uint(bytes: usize) -> SszType {
        SszType::uint(bytes).unwrap()
    }

    fn pair() -> SszType {
        SszType::container([("a", uint(8)), ("b", SszType::bytevector(2).unwrap())]).unwrap()
    }

    #[test]
    fn defaults() {
        assert_eq!(uint(4).default_value(), Value::Uint(0));
        let big = SszType::from_uint(
            UintType::builder()
                .byte_length(32)
                .repr(UintRepr::BigInt)
                .build(),
        )
        .unwrap();
        assert_eq!(big.default_value(), Value::BigUint(U256::zero()));
        assert_eq!(
            SszType::vector(pair(), 2).unwrap().default_value(),
            Value::List(vec![
                Value::container([("a", Value::Uint(0)), ("b", Value::Bytes(vec![0, 0]))]);
                2
            ])
        );
        assert_eq!(SszType::bitlist(8).default_value(), Value::Bits(vec![]));
    }

    #[test]
    fn equality_is_type_directed() {
        let a = Value::container([
            ("a", Value::Uint(7)),
            ("b", Value::Bytes(vec![1, 2])),
            ("extra", Value::Bool(true)),
        ]);
        let b = Value::container([
            ("a", Value::BigUint(U256::from(7))),
            ("b", Value::Bytes(vec![1, 2])),
        ]);
        assert_ne!(a, b);
        assert!(pair().equals(&a, &b));

        let c = Value::container([("a", Value::Uint(8)), ("b", Value::Bytes(vec![1, 2]))]);
        assert!(!pair().equals(&a, &c));
    }

    #[test]
    fn clone_drops_undeclared_fields() {
        let value = Value::container([
            ("a", Value::Uint(1)),
            ("b", Value::Bytes(vec![0, 0])),
            ("extra", Value::Bool(true)),
        ]);
        let cloned = pair().clone_value(&value);
        assert!(cloned.as_container().unwrap().get("extra").is_none());
        assert!(pair().equals(&value, &cloned));
    }

    #[test]
    fn create_fills_defaults() {
        let ty = SszType::container([
            ("inner", pair()),
            ("items", SszType::vector(uint(2), 3).unwrap()),
        ])
        .unwrap();
        let partial = Value::container([
            ("inner", Value::container([("a", Value::Uint(5))])),
            ("items", Value::List(vec![Value::Uint(9)])),
        ]);
        let created = ty.create_value(Some(&partial)).unwrap();
        let expected = Value::container([
            (
                "inner",
                Value::container([("a", Value::Uint(5)), ("b", Value::Bytes(vec![0, 0]))]),
            ),
            (
                "items",
                Value::List(vec![Value::Uint(9), Value::Uint(0), Value::Uint(0)]),
            ),
        ]);
        assert_eq!(created, expected);
        assert_eq!(ty.create_value(None).unwrap(), ty.default_value());
    }

    #[test]
    fn create_reports_bad_parts() {
        let partial = Value::container([("a", Value::Bool(true))]);
        let err = pair().create_value(Some(&partial)).unwrap_err();
        assert_eq!(err.path.to_string(), "a");

        let long = Value::container([("b", Value::Bytes(vec![0; 3]))]);
        let err = pair().create_value(Some(&long)).unwrap_err();
        assert_eq!(
            err.kind,
            InvalidValueKind::WrongLength {
                expected: 2,
                actual: 3
            }
        );
    }
}
