// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! Type-directed JSON conversion.
//!
//! Integers of up to four bytes are JSON numbers; wider ones are decimal
//! strings, since they do not survive a round trip through a double. Numbers
//! are accepted for any width on input. Bit and byte types are the `0x` hex
//! of their encoding, vectors and lists are arrays and containers are
//! objects keyed by field name.

use ethereum_types::U256;
use serde_json::{Map, Number, Value as Json};

use crate::types::{SszType, UintRepr};
use crate::validate::{FieldPath, InvalidValue, PathSegment, WithinPath};
use crate::value::Value;

/// Widest integer written as a JSON number.
const MAX_NUMBER_BYTES: usize = 4;

/// Errors converting between JSON and values.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum JsonError {
    /// The input is not JSON.
    #[error("invalid json: {0}")]
    Syntax(#[from] serde_json::Error),
    /// The JSON does not have the shape of the type.
    #[error("unexpected json at {path}: {reason}")]
    Invalid {
        /// Where the unexpected JSON sits.
        path: FieldPath,
        /// What was expected.
        reason: String,
    },
    /// The converted value does not conform to the type.
    #[error(transparent)]
    Value(#[from] InvalidValue),
}

impl JsonError {
    fn invalid(reason: impl Into<String>) -> Self {
        JsonError::Invalid {
            path: FieldPath::root(),
            reason: reason.into(),
        }
    }
}

impl WithinPath for JsonError {
    fn within(self, segment: PathSegment) -> Self {
        match self {
            JsonError::Invalid { mut path, reason } => {
                path.prepend(segment);
                JsonError::Invalid { path, reason }
            }
            JsonError::Value(err) => JsonError::Value(err.within(segment)),
            other @ JsonError::Syntax(_) => other,
        }
    }
}

impl SszType {
    /// The JSON form of `value`.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError::Value`] if `value` does not conform to this type.
    pub fn to_json(&self, value: &Value) -> Result<Json, JsonError> {
        self.assert_valid_value(value)?;
        self.write_json(value)
    }

    /// Reads a value from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns a [`JsonError`] locating the first mismatch.
    pub fn from_json(&self, json: &Json) -> Result<Value, JsonError> {
        let value = self.read_json(json)?;
        self.assert_valid_value(&value)?;
        Ok(value)
    }

    /// Parses JSON text and reads a value from it.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError::Syntax`] for malformed text, or see
    /// [`SszType::from_json`].
    pub fn from_json_str(&self, text: &str) -> Result<Value, JsonError> {
        self.from_json(&serde_json::from_str(text)?)
    }

    fn write_json(&self, value: &Value) -> Result<Json, JsonError> {
        match (self, value) {
            (SszType::Uint(uint), value) => {
                let n = value.as_u256().ok_or_else(|| InvalidValue::wrong_kind(self, value))?;
                if uint.byte_length <= MAX_NUMBER_BYTES {
                    Ok(Json::Number(Number::from(n.low_u64())))
                } else {
                    Ok(Json::String(n.to_string()))
                }
            }
            (SszType::Boolean, Value::Bool(b)) => Ok(Json::Bool(*b)),
            (
                SszType::BitVector { .. }
                | SszType::BitList { .. }
                | SszType::ByteVector { .. }
                | SszType::ByteList { .. },
                value,
            ) => {
                let mut encoded = Vec::new();
                self.encode_into(value, &mut encoded)?;
                Ok(Json::String(format!("0x{}", hex::encode(encoded))))
            }
            (SszType::Vector { element, .. } | SszType::List { element, .. }, Value::List(items)) => {
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| element.write_json(item).within_index(i))
                    .collect::<Result<_, _>>()
                    .map(Json::Array)
            }
            (SszType::Container(container), Value::Container(map)) => {
                let mut object = Map::new();
                for field in container.fields() {
                    if let Some(item) = map.get(&field.name) {
                        let json = field.ty.write_json(item).within_field(&field.name)?;
                        object.insert(field.name.clone(), json);
                    }
                }
                Ok(Json::Object(object))
            }
            (ty, value) => Err(InvalidValue::wrong_kind(ty, value).into()),
        }
    }

    fn read_json(&self, json: &Json) -> Result<Value, JsonError> {
        match (self, json) {
            (SszType::Uint(uint), json) => {
                let n = match json {
                    Json::Number(n) => n
                        .as_u64()
                        .map(U256::from)
                        .ok_or_else(|| JsonError::invalid(format!("{n} is not an unsigned integer")))?,
                    Json::String(s) => U256::from_dec_str(s)
                        .map_err(|_| JsonError::invalid(format!("{s:?} is not a decimal integer")))?,
                    _ => return Err(JsonError::invalid("expected a number or decimal string")),
                };
                match (uint.repr, u64::try_from(n)) {
                    (UintRepr::Number, Ok(small)) => Ok(Value::Uint(small)),
                    _ => Ok(Value::BigUint(n)),
                }
            }
            (SszType::Boolean, Json::Bool(b)) => Ok(Value::Bool(*b)),
            (SszType::Boolean, _) => Err(JsonError::invalid("expected a boolean")),
            (
                SszType::BitVector { .. }
                | SszType::BitList { .. }
                | SszType::ByteVector { .. }
                | SszType::ByteList { .. },
                Json::String(s),
            ) => {
                let digits = s
                    .strip_prefix("0x")
                    .ok_or_else(|| JsonError::invalid("expected 0x prefixed hex"))?;
                let bytes = hex::decode(digits).map_err(|err| JsonError::invalid(err.to_string()))?;
                self.decode(&bytes)
                    .map_err(|err| JsonError::invalid(err.to_string()))
            }
            (
                SszType::BitVector { .. }
                | SszType::BitList { .. }
                | SszType::ByteVector { .. }
                | SszType::ByteList { .. },
                _,
            ) => Err(JsonError::invalid("expected 0x prefixed hex")),
            (SszType::Vector { element, .. } | SszType::List { element, .. }, Json::Array(items)) => {
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| element.read_json(item).within_index(i))
                    .collect::<Result<_, _>>()
                    .map(Value::List)
            }
            (SszType::Vector { .. } | SszType::List { .. }, _) => {
                Err(JsonError::invalid("expected an array"))
            }
            (SszType::Container(container), Json::Object(object)) => container
                .fields()
                .iter()
                .map(|field| {
                    let item = object
                        .get(&field.name)
                        .ok_or_else(|| JsonError::invalid("missing field"))
                        .within_field(&field.name)?;
                    let value = field.ty.read_json(item).within_field(&field.name)?;
                    Ok((field.name.clone(), value))
                })
                .collect::<Result<_, JsonError>>()
                .map(Value::Container),
            (SszType::Container(_), _) => Err(JsonError::invalid("expected an object")),
        }
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]

    use super::*;
    use crate::types::UintType;
    use serde_json::json;

    fn uint(bytes: usize) -> SszType {
        SszType::uint(bytes).unwrap()
    }

    fn big(bytes: usize) -> SszType {
        let uint = UintType::builder().byte_length(bytes).repr(UintRepr::BigInt).build();
        SszType::from_uint(uint).unwrap()
    }

    fn ty() -> SszType {
        SszType::container([
            ("small", uint(4)),
            ("wide", uint(8)),
            ("huge", big(32)),
            ("flag", SszType::Boolean),
            ("bits", SszType::bitlist(16)),
            ("root", SszType::bytevector(4).unwrap()),
            ("items", SszType::list(uint(2), 4)),
        ])
        .unwrap()
    }

    fn value() -> Value {
        Value::container([
            ("small", Value::Uint(7)),
            ("wide", Value::Uint(u64::MAX - 1)),
            ("huge", Value::BigUint(U256::MAX)),
            ("flag", Value::Bool(true)),
            ("bits", Value::Bits(vec![true, true, false])),
            ("root", Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef])),
            ("items", Value::List(vec![Value::Uint(1), Value::Uint(2)])),
        ])
    }

    #[test]
    fn writes_canonical_json() {
        let json = ty().to_json(&value()).unwrap();
        assert_eq!(
            json,
            json!({
                "small": 7,
                "wide": "18446744073709551614",
                "huge": U256::MAX.to_string(),
                "flag": true,
                "bits": "0x0b",
                "root": "0xdeadbeef",
                "items": [1, 2],
            })
        );
        assert!(ty().equals(&ty().from_json(&json).unwrap(), &value()));
    }

    #[test]
    fn accepts_numbers_for_wide_uints() {
        let value = uint(16).from_json(&json!(5)).unwrap();
        assert_eq!(value, Value::Uint(5));
        let past_u64 = json!("18446744073709551616");
        let wide = big(16).from_json(&past_u64).unwrap();
        assert_eq!(wide, Value::BigUint(U256::from(u64::MAX) + U256::one()));
        assert!(matches!(
            uint(16).from_json(&past_u64),
            Err(JsonError::Value(_))
        ));
    }

    #[test]
    fn locates_mismatches() {
        let err = ty()
            .from_json_str(r#"{"small": 1, "wide": "x"}"#)
            .unwrap_err();
        let JsonError::Invalid { path, .. } = err else {
            panic!("expected a shape error, got {err:?}")
        };
        assert_eq!(path.to_string(), "wide");

        let err = SszType::list(uint(1), 4)
            .from_json(&json!([1, 2, 300]))
            .unwrap_err();
        let JsonError::Value(invalid) = err else {
            panic!("expected an invalid value, got {err:?}")
        };
        assert_eq!(invalid.path.to_string(), "[2]");

        assert!(matches!(
            SszType::bitlist(8).from_json(&json!("0x00")),
            Err(JsonError::Invalid { .. })
        ));
        assert!(matches!(
            ty().from_json_str("{"),
            Err(JsonError::Syntax(_))
        ));
    }
}
