// Copyright (C) 2025, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! Textual type expressions.
//!
//! ```text
//! type  := uint | "bool"
//!        | "bitvector[" N "]" | "bitlist[" N "]"
//!        | "bytes[" N "]"     | "bytelist[" N "]"
//!        | "vector[" type "," N "]" | "list[" type "," N "]"
//!        | "container{" name ":" type ("," name ":" type)* "}"
//! uint  := ("uint8" | "uint16" | "uint32" | "uint64" | "uint128" | "uint256") ["!"]
//! ```
//!
//! A trailing `!` on a uint selects [`UintRepr::BigInt`]. Whitespace between
//! tokens is ignored. [`Display`] writes the same grammar without whitespace,
//! so printing and parsing round-trip.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::types::{SszType, TypeError, UintRepr, UintType};

impl Display for SszType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SszType::Uint(uint) => {
                write!(f, "uint{}", uint.byte_length.saturating_mul(8))?;
                if uint.repr == UintRepr::BigInt {
                    f.write_str("!")?;
                }
                Ok(())
            }
            SszType::Boolean => f.write_str("bool"),
            SszType::BitVector { length } => write!(f, "bitvector[{length}]"),
            SszType::BitList { limit } => write!(f, "bitlist[{limit}]"),
            SszType::ByteVector { length } => write!(f, "bytes[{length}]"),
            SszType::ByteList { limit } => write!(f, "bytelist[{limit}]"),
            SszType::Vector { element, length } => write!(f, "vector[{element},{length}]"),
            SszType::List { element, limit } => write!(f, "list[{element},{limit}]"),
            SszType::Container(container) => {
                f.write_str("container{")?;
                for (i, field) in container.fields().iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}:{}", field.name, field.ty)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl FromStr for SszType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser { input: s, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_whitespace();
        if parser.pos < s.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(ty)
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn rest(&self) -> &str {
        self.input.get(self.pos..).unwrap_or_default()
    }

    fn error(&self, reason: impl Into<String>) -> TypeError {
        TypeError::Parse {
            position: self.pos,
            reason: reason.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let skipped = rest.len() - rest.trim_start().len();
        self.pos += skipped;
    }

    fn eat(&mut self, token: char) -> bool {
        self.skip_whitespace();
        if self.rest().starts_with(token) {
            self.pos += token.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: char) -> Result<(), TypeError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{token}'")))
        }
    }

    fn ident(&mut self) -> Result<&str, TypeError> {
        self.skip_whitespace();
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error("expected a name"));
        }
        self.pos += len;
        Ok(self.input.get(start..self.pos).unwrap_or_default())
    }

    fn number(&mut self) -> Result<u64, TypeError> {
        self.skip_whitespace();
        let len = self
            .rest()
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error("expected a number"));
        }
        let value = self
            .rest()
            .get(..len)
            .unwrap_or_default()
            .parse()
            .map_err(|_| self.error("number does not fit in 64 bits"))?;
        self.pos += len;
        Ok(value)
    }

    fn bracketed_number(&mut self) -> Result<u64, TypeError> {
        self.expect('[')?;
        let n = self.number()?;
        self.expect(']')?;
        Ok(n)
    }

    fn element_and_count(&mut self) -> Result<(SszType, u64), TypeError> {
        self.expect('[')?;
        let element = self.parse_type()?;
        self.expect(',')?;
        let n = self.number()?;
        self.expect(']')?;
        Ok((element, n))
    }

    /// Runs a constructor, reporting its failure at `start`.
    fn at(&self, start: usize, built: Result<SszType, TypeError>) -> Result<SszType, TypeError> {
        built.map_err(|err| TypeError::Parse {
            position: start,
            reason: err.to_string(),
        })
    }

    fn parse_type(&mut self) -> Result<SszType, TypeError> {
        self.skip_whitespace();
        let start = self.pos;
        let name = self.ident()?.to_owned();
        match name.as_str() {
            "bool" => Ok(SszType::Boolean),
            "bitvector" => {
                let n = self.bracketed_number()?;
                self.at(start, SszType::bitvector(n))
            }
            "bitlist" => Ok(SszType::bitlist(self.bracketed_number()?)),
            "bytes" => {
                let n = self.bracketed_number()?;
                self.at(start, SszType::bytevector(n))
            }
            "bytelist" => Ok(SszType::bytelist(self.bracketed_number()?)),
            "vector" => {
                let (element, n) = self.element_and_count()?;
                self.at(start, SszType::vector(element, n))
            }
            "list" => {
                let (element, n) = self.element_and_count()?;
                Ok(SszType::list(element, n))
            }
            "container" => {
                self.expect('{')?;
                let mut fields = Vec::new();
                loop {
                    let field = self.ident()?.to_owned();
                    self.expect(':')?;
                    fields.push((field, self.parse_type()?));
                    if !self.eat(',') {
                        break;
                    }
                }
                self.expect('}')?;
                self.at(start, SszType::container(fields))
            }
            _ => {
                let bits = name
                    .strip_prefix("uint")
                    .and_then(|bits| bits.parse::<usize>().ok())
                    .filter(|bits| bits % 8 == 0)
                    .ok_or_else(|| TypeError::Parse {
                        position: start,
                        reason: format!("unknown type {name:?}"),
                    })?;
                let repr = if self.rest().starts_with('!') {
                    self.pos += 1;
                    UintRepr::BigInt
                } else {
                    UintRepr::Number
                };
                let uint = UintType::builder().byte_length(bits / 8).repr(repr).build();
                self.at(start, SszType::from_uint(uint))
            }
        }
    }
}
