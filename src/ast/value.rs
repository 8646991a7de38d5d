//! Semantic values of literals
//!
//! Maps a literal to the 256-bit word it denotes on the evaluation
//! stack: numbers parse as decimal or `0x` hexadecimal, booleans map to
//! 0/1, and strings map to their bytes left-aligned in a 32-byte word.

use lazy_static::lazy_static;
use num_bigint::BigUint;

use super::{Literal, LiteralKind};
use crate::common::YulString;

/// Number of bytes in an evaluation-stack word
pub const WORD_SIZE: usize = 32;

lazy_static! {
    static ref WORD_MAX: BigUint = (BigUint::from(1u8) << (WORD_SIZE * 8)) - 1u8;
}

/// Largest value representable in a 256-bit word
pub fn word_max() -> &'static BigUint {
    &WORD_MAX
}

/// Parses the text of a number literal. Returns `None` if the text is
/// not a valid decimal or `0x`-prefixed hexadecimal number.
pub fn value_of_number_literal(value: YulString) -> Option<BigUint> {
    let text = value.as_str();
    if let Some(hex) = text.strip_prefix("0x") {
        BigUint::parse_bytes(hex.as_bytes(), 16)
    } else {
        BigUint::parse_bytes(text.as_bytes(), 10)
    }
}

/// The 256-bit word a literal denotes, or `None` if the literal is
/// malformed (unparseable number, out-of-range value, overlong string).
pub fn value_of_literal(literal: &Literal) -> Option<BigUint> {
    match literal.kind {
        LiteralKind::Number => {
            value_of_number_literal(literal.value).filter(|v| v <= word_max())
        }
        LiteralKind::Boolean => {
            if literal.value.as_str() == "true" {
                Some(BigUint::from(1u8))
            } else if literal.value.as_str() == "false" {
                Some(BigUint::from(0u8))
            } else {
                None
            }
        }
        LiteralKind::String => {
            let bytes = literal.value.as_str().as_bytes();
            if bytes.len() > WORD_SIZE {
                return None;
            }
            let mut word = [0u8; WORD_SIZE];
            word[..bytes.len()].copy_from_slice(bytes);
            Some(BigUint::from_bytes_be(&word))
        }
    }
}
