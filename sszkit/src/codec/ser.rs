// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use crate::types::{BYTES_PER_OFFSET, SszType, UintRepr, UintType};
use crate::validate::{InvalidValue, InvalidValueKind, PathSegment, WithinPath};
use crate::value::Value;

impl SszType {
    /// Encodes `value`.
    ///
    /// The value is validated in full before anything is written.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidValue`] if `value` does not conform to this type.
    pub fn serialize(&self, value: &Value) -> Result<Vec<u8>, InvalidValue> {
        self.assert_valid_value(value)?;
        let mut out = Vec::with_capacity(self.serialized_size(value)?);
        self.encode_into(value, &mut out)?;
        Ok(out)
    }

    /// The encoded length of a value of this type.
    ///
    /// Fixed-size types ignore `value`; variable-size types need it.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidValueKind::ValueRequired`] for a variable-size type
    /// without a value, or an error if the value is of the wrong kind.
    pub fn size(&self, value: Option<&Value>) -> Result<usize, InvalidValue> {
        match (self.fixed_size(), value) {
            (Some(size), _) => Ok(size),
            (None, Some(value)) => self.serialized_size(value),
            (None, None) => Err(InvalidValue::new(InvalidValueKind::ValueRequired)),
        }
    }

    /// The encoded length of `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is of the wrong kind.
    pub fn serialized_size(&self, value: &Value) -> Result<usize, InvalidValue> {
        if let Some(size) = self.fixed_size() {
            return Ok(size);
        }
        match (self, value) {
            (SszType::BitList { .. }, Value::Bits(bits)) => Ok(bits.len() / 8 + 1),
            (SszType::ByteList { .. }, Value::Bytes(bytes)) => Ok(bytes.len()),
            (SszType::Vector { element, .. } | SszType::List { element, .. }, Value::List(items)) => {
                items.iter().enumerate().try_fold(0usize, |acc, (i, item)| {
                    let size = element_size(element, item).within_index(i)?;
                    Ok(acc.saturating_add(size))
                })
            }
            (SszType::Container(container), Value::Container(map)) => {
                container.fields().iter().try_fold(0usize, |acc, f| {
                    let size = match map.get(&f.name) {
                        Some(item) => element_size(&f.ty, item).within_field(&f.name)?,
                        None => {
                            return Err(InvalidValue::new(InvalidValueKind::MissingField))
                                .within_field(&f.name);
                        }
                    };
                    Ok(acc.saturating_add(size))
                })
            }
            (ty, value) => Err(InvalidValue::wrong_kind(ty, value)),
        }
    }

    /// Appends the encoding of `value` to `out`.
    pub(crate) fn encode_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), InvalidValue> {
        match (self, value) {
            (SszType::Uint(uint), Value::Uint(n)) => {
                encode_u64(uint, *n, out);
                Ok(())
            }
            (SszType::Uint(uint), Value::BigUint(n)) => {
                // machine integers encode by value, whichever variant holds them
                match (uint.repr, u64::try_from(*n)) {
                    (UintRepr::Number, Ok(small)) => encode_u64(uint, small, out),
                    _ => out.extend((0..uint.byte_length).map(|i| if i < 32 { n.byte(i) } else { 0 })),
                }
                Ok(())
            }
            (SszType::Boolean, Value::Bool(b)) => {
                out.push(u8::from(*b));
                Ok(())
            }
            (SszType::BitVector { .. }, Value::Bits(bits)) => {
                out.extend(pack_bits(bits));
                Ok(())
            }
            (SszType::BitList { .. }, Value::Bits(bits)) => {
                out.extend(pack_bits_with_sentinel(bits));
                Ok(())
            }
            (SszType::ByteVector { .. } | SszType::ByteList { .. }, Value::Bytes(bytes)) => {
                out.extend_from_slice(bytes);
                Ok(())
            }
            (SszType::Vector { element, .. } | SszType::List { element, .. }, Value::List(items)) => {
                if element.is_variable_size() {
                    let items: Vec<_> = items.iter().map(|item| (&**element, item)).collect();
                    encode_with_offsets(&items, |i| PathSegment::Index(i as u64), out)
                } else {
                    items.iter().enumerate().try_for_each(|(i, item)| {
                        element.encode_into(item, out).within_index(i)
                    })
                }
            }
            (SszType::Container(container), Value::Container(map)) => {
                let mut items = Vec::with_capacity(container.fields().len());
                for field in container.fields() {
                    let Some(item) = map.get(&field.name) else {
                        return Err(InvalidValue::new(InvalidValueKind::MissingField))
                            .within_field(&field.name);
                    };
                    items.push((&field.ty, item));
                }
                let names = container.fields();
                encode_with_offsets(
                    &items,
                    |i| {
                        PathSegment::Field(names.get(i).map(|f| f.name.clone()).unwrap_or_default())
                    },
                    out,
                )
            }
            (ty, value) => Err(InvalidValue::wrong_kind(ty, value)),
        }
    }
}

fn element_size(ty: &SszType, value: &Value) -> Result<usize, InvalidValue> {
    match ty.fixed_size() {
        Some(size) => Ok(size),
        None => Ok(BYTES_PER_OFFSET.saturating_add(ty.serialized_size(value)?)),
    }
}

fn encode_u64(uint: &UintType, n: u64, out: &mut Vec<u8>) {
    if uint.has_infinity_sentinel() && n == u64::MAX {
        out.extend(std::iter::repeat_n(0xff, uint.byte_length));
        return;
    }
    let le = n.to_le_bytes();
    out.extend((0..uint.byte_length).map(|i| le.get(i).copied().unwrap_or(0)));
}

/// Bits packed little-endian within each byte, `ceil(len / 8)` bytes.
pub(crate) fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; bits.len().div_ceil(8)];
    set_bits(&mut bytes, bits);
    bytes
}

/// Packed bits followed by a single set bit marking the length.
fn pack_bits_with_sentinel(bits: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; bits.len() / 8 + 1];
    set_bits(&mut bytes, bits);
    if let Some(last) = bytes.last_mut() {
        *last |= 1 << (bits.len() % 8);
    }
    bytes
}

fn set_bits(bytes: &mut [u8], bits: &[bool]) {
    for (byte, group) in bytes.iter_mut().zip(bits.chunks(8)) {
        for (i, bit) in group.iter().enumerate() {
            if *bit {
                *byte |= 1 << i;
            }
        }
    }
}

/// Encodes a heterogeneous sequence: fixed-size items in place, variable-size
/// items as 4 byte offsets into a trailing variable region.
fn encode_with_offsets(
    items: &[(&SszType, &Value)],
    segment: impl Fn(usize) -> PathSegment,
    out: &mut Vec<u8>,
) -> Result<(), InvalidValue> {
    let fixed_len = items
        .iter()
        .fold(0usize, |acc, (ty, _)| acc.saturating_add(ty.fixed_part_size()));
    let mut variable = Vec::new();
    for (i, (ty, value)) in items.iter().enumerate() {
        if ty.is_variable_size() {
            let offset = fixed_len.saturating_add(variable.len());
            let encoded = u32::try_from(offset)
                .map_err(|_| InvalidValue::new(InvalidValueKind::TooLarge { size: offset }))?;
            out.extend_from_slice(&encoded.to_le_bytes());
            ty.encode_into(value, &mut variable).within(segment(i))?;
        } else {
            ty.encode_into(value, out).within(segment(i))?;
        }
    }
    out.append(&mut variable);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]

    use super::*;
    use ethereum_types::U256;
    use hex_literal::hex;
    use test_case::test_case;

    fn uint(bytes: usize) -> SszType {
        SszType::uint(bytes).unwrap()
    }

    fn big(bytes: usize) -> SszType {
        let uint = UintType::builder().byte_length(bytes).repr(UintRepr::BigInt).build();
        SszType::from_uint(uint).unwrap()
    }

    #[test_case(uint(1), Value::Uint(0xab), &hex!("ab"); "uint8")]
    #[test_case(uint(2), Value::Uint(0x0102), &hex!("0201"); "uint16")]
    #[test_case(uint(8), Value::Uint(1), &hex!("0100000000000000"); "uint64")]
    #[test_case(uint(16), Value::Uint(u64::MAX), &[0xff; 16]; "uint128 infinity")]
    #[test_case(uint(16), Value::BigUint(U256::from(u64::MAX)), &[0xff; 16]; "uint128 big infinity")]
    #[test_case(big(16), Value::BigUint(U256::from(u64::MAX)), &hex!("ffffffffffffffff0000000000000000"); "uint128 big int")]
    #[test_case(big(16), Value::Uint(u64::MAX), &hex!("ffffffffffffffff0000000000000000"); "uint128 big int from u64")]
    #[test_case(SszType::Boolean, Value::Bool(true), &hex!("01"); "bool")]
    #[test_case(SszType::bitvector(10).unwrap(), Value::Bits(vec![true, false, true, false, false, false, false, false, false, true]), &hex!("0502"); "bitvector")]
    #[test_case(SszType::bitlist(16), Value::Bits(vec![true, true, false]), &hex!("0b"); "bitlist")]
    #[test_case(SszType::bitlist(16), Value::Bits(vec![false; 8]), &hex!("0001"); "bitlist full byte")]
    #[test_case(SszType::bitlist(16), Value::Bits(vec![]), &hex!("01"); "bitlist empty")]
    #[test_case(SszType::bytelist(4), Value::Bytes(vec![1, 2]), &hex!("0102"); "bytelist")]
    fn encodings(ty: SszType, value: Value, expected: &[u8]) {
        assert_eq!(ty.serialize(&value).unwrap(), expected);
        assert_eq!(ty.size(Some(&value)).unwrap(), expected.len());
    }

    #[test]
    fn offsets_point_into_variable_region() {
        let ty = SszType::container([
            ("a", uint(2)),
            ("b", SszType::bytelist(8)),
            ("c", SszType::list(uint(1), 8)),
        ])
        .unwrap();
        let value = Value::container([
            ("a", Value::Uint(0x0304)),
            ("b", Value::Bytes(vec![0xaa, 0xbb])),
            ("c", Value::List(vec![Value::Uint(7)])),
        ]);
        assert_eq!(
            ty.serialize(&value).unwrap(),
            hex!("0403" "0a000000" "0c000000" "aabb" "07")
        );
    }

    #[test]
    fn list_of_variable_elements() {
        let ty = SszType::list(SszType::bytelist(4), 4);
        let value = Value::List(vec![Value::Bytes(vec![1]), Value::Bytes(vec![]), Value::Bytes(vec![2, 3])]);
        assert_eq!(
            ty.serialize(&value).unwrap(),
            hex!("0c000000" "0d000000" "0d000000" "01" "0203")
        );
    }

    #[test]
    fn machine_uints_encode_by_value() {
        let ty = uint(32);
        let small = Value::Uint(u64::MAX);
        let wide = Value::BigUint(U256::from(u64::MAX));
        assert!(ty.equals(&small, &wide));
        assert_eq!(ty.serialize(&small).unwrap(), ty.serialize(&wide).unwrap());
        assert_eq!(
            ty.hash_tree_root(&small).unwrap(),
            ty.hash_tree_root(&wide).unwrap()
        );

        let err = uint(16).serialize(&Value::BigUint(U256::from(1u128 << 100))).unwrap_err();
        assert!(matches!(
            err.kind,
            InvalidValueKind::ExceedsMachineInteger { .. }
        ));
        assert!(big(16).serialize(&Value::BigUint(U256::from(1u128 << 100))).is_ok());
    }

    #[test]
    fn invalid_values_are_rejected_first() {
        let err = uint(1).serialize(&Value::Uint(300)).unwrap_err();
        assert!(matches!(err.kind, InvalidValueKind::OutOfRange { .. }));
        assert_eq!(
            SszType::bytelist(1).size(None).unwrap_err().kind,
            InvalidValueKind::ValueRequired
        );
        assert_eq!(uint(4).size(None).unwrap(), 4);
    }
}
