//! Base62 encoding of 64-bit identifiers.
//!
//! The alphabet is digits, then uppercase, then lowercase letters, so the
//! encoded form of small numbers reads like a plain number (`"10"` is 62).

use crate::error::DecodeError;

/// The 62 symbols, in digit order.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const BASE: u64 = ALPHABET.len() as u64;

/// Longest encoding of a `u64` (`u64::MAX` is `"LygHa16AHYF"`).
const MAX_ENCODED_LEN: usize = 11;

/// Encodes `value` as a base62 string, most significant digit first.
///
/// Zero encodes to `"0"`; no other value has a leading zero.
pub fn encode(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::with_capacity(MAX_ENCODED_LEN);
    while value > 0 {
        digits.push(ALPHABET[(value % BASE) as usize]);
        value /= BASE;
    }
    digits.reverse();

    // Every byte comes from the ASCII alphabet.
    digits.into_iter().map(char::from).collect()
}

/// Decodes a base62 string produced by [`encode`].
///
/// No length limit is applied; values beyond `u64::MAX` are reported as
/// [`DecodeError::Overflow`].
pub fn decode(input: &str) -> Result<u64, DecodeError> {
    input
        .chars()
        .enumerate()
        .try_fold(0_u64, |acc, (position, character)| {
            let index = index_of(character)
                .ok_or(DecodeError::InvalidCharacter { character, position })?;
            acc.checked_mul(BASE)
                .and_then(|shifted| shifted.checked_add(index))
                .ok_or(DecodeError::Overflow)
        })
}

/// Returns `true` if `character` belongs to the base62 alphabet.
pub fn is_base62(character: char) -> bool {
    character.is_ascii_alphanumeric()
}

fn index_of(character: char) -> Option<u64> {
    let index = match character {
        '0'..='9' => character as u8 - b'0',
        'A'..='Z' => character as u8 - b'A' + 10,
        'a'..='z' => character as u8 - b'a' + 36,
        _ => return None,
    };
    Some(u64::from(index))
}
