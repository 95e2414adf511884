// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

#![expect(clippy::unwrap_used)]

use ethereum_types::U256;
use sszkit::{SszType, UINT_BYTE_LENGTHS, UintRepr, UintType, Value};
use sszkit_tree::SeededRng;

/// A random type, nesting composite kinds up to `depth` levels.
pub fn random_type(rng: &SeededRng, depth: usize) -> SszType {
    let kinds = if depth == 0 { 6 } else { 9 };
    match rng.random_range(0..kinds) {
        0 => {
            let widths = UINT_BYTE_LENGTHS.len();
            let byte_length = UINT_BYTE_LENGTHS
                .get(rng.random_range(0..widths))
                .copied()
                .unwrap();
            let repr = if rng.random() {
                UintRepr::BigInt
            } else {
                UintRepr::Number
            };
            SszType::from_uint(UintType::builder().byte_length(byte_length).repr(repr).build())
                .unwrap()
        }
        1 => SszType::Boolean,
        2 => SszType::bitvector(rng.random_range(1..=300)).unwrap(),
        3 => SszType::bitlist(rng.random_range(0..=300)),
        4 => SszType::bytevector(rng.random_range(1..=70)).unwrap(),
        5 => SszType::bytelist(rng.random_range(0..=70)),
        6 => SszType::vector(random_type(rng, depth - 1), rng.random_range(1..=5)).unwrap(),
        7 => SszType::list(random_type(rng, depth - 1), rng.random_range(0..=6)),
        _ => {
            let count = rng.random_range(1..=4);
            SszType::container(
                (0..count).map(|i| (format!("f{i}"), random_type(rng, depth - 1))),
            )
            .unwrap()
        }
    }
}

fn random_uint(rng: &SeededRng, uint: UintType) -> Value {
    match uint.repr {
        UintRepr::Number if uint.byte_length >= 8 => {
            let n: u64 = rng.random();
            if rng.random() {
                Value::Uint(n)
            } else {
                Value::BigUint(U256::from(n))
            }
        }
        UintRepr::Number => {
            let bits = uint.byte_length * 8;
            Value::Uint(rng.random::<u64>() & ((1 << bits) - 1))
        }
        UintRepr::BigInt => {
            let mut bytes = vec![0u8; uint.byte_length];
            rng.fill_bytes(&mut bytes);
            Value::BigUint(U256::from_little_endian(&bytes))
        }
    }
}

/// A random value of `ty`. Lists get a random length up to their limit.
pub fn random_value(rng: &SeededRng, ty: &SszType) -> Value {
    match ty {
        SszType::Uint(uint) => random_uint(rng, *uint),
        SszType::Boolean => Value::Bool(rng.random()),
        SszType::BitVector { length } => Value::Bits((0..*length).map(|_| rng.random()).collect()),
        SszType::BitList { limit } => {
            let length = rng.random_range(0..=*limit);
            Value::Bits((0..length).map(|_| rng.random()).collect())
        }
        SszType::ByteVector { length } => {
            Value::Bytes((0..*length).map(|_| rng.random()).collect())
        }
        SszType::ByteList { limit } => {
            let length = rng.random_range(0..=*limit);
            Value::Bytes((0..length).map(|_| rng.random()).collect())
        }
        SszType::Vector { element, length } => {
            Value::List((0..*length).map(|_| random_value(rng, element)).collect())
        }
        SszType::List { element, limit } => {
            let length = rng.random_range(0..=*limit);
            Value::List((0..length).map(|_| random_value(rng, element)).collect())
        }
        SszType::Container(container) => Value::Container(
            container
                .fields()
                .iter()
                .map(|field| (field.name.clone(), random_value(rng, &field.ty)))
                .collect(),
        ),
    }
}
