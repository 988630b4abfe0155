//! Allocation-free number decoders operating directly on byte ranges of a read buffer.
//!
//! The kernel writes socket tables with upper-case hex digits and `softnet_stat` with
//! lower-case ones, so [`decode_hex`] takes the expected [`HexCase`] and rejects the other.

use super::NumberError;

/// Letter case used by a hex-encoded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexCase {
    Upper,
    Lower,
}

impl HexCase {
    #[inline]
    fn digit_value(self, digit: u8) -> Result<u64, NumberError> {
        let value = match (self, digit) {
            (_, b'0'..=b'9') => digit - b'0',
            (HexCase::Upper, b'A'..=b'F') => digit - b'A' + 10,
            (HexCase::Lower, b'a'..=b'f') => digit - b'a' + 10,
            _ => return Err(NumberError::InvalidDigit(digit)),
        };
        Ok(u64::from(value))
    }
}

/// Decodes up to 8 hex digits (an even number of them) into an unsigned value.
///
/// # Errors
///
/// Returns [`NumberError::Empty`] for an empty slice, [`NumberError::InvalidLength`] for an odd
/// length or more than 8 digits, and [`NumberError::InvalidDigit`] for anything outside the
/// alphabet of `case`.
///
/// # Examples
///
/// ```
/// use netbuf_monitor::identifier::decode::{decode_hex, HexCase};
///
/// assert_eq!(decode_hex(b"4E50", HexCase::Upper), Ok(20048));
/// assert!(decode_hex(b"4e50", HexCase::Upper).is_err());
/// ```
pub fn decode_hex(src: &[u8], case: HexCase) -> Result<u64, NumberError> {
    if src.is_empty() {
        return Err(NumberError::Empty);
    }
    if src.len() > 8 || src.len() % 2 != 0 {
        return Err(NumberError::InvalidLength(src.len()));
    }

    let mut decoded = 0u64;
    for &digit in src {
        decoded = (decoded << 4) | case.digit_value(digit)?;
    }
    Ok(decoded)
}

/// Decodes a run of ASCII decimal digits.
///
/// # Errors
///
/// Returns [`NumberError::Empty`] for an empty slice, [`NumberError::InvalidDigit`] for any
/// non-digit byte and [`NumberError::Overflow`] if the value exceeds `u64::MAX`.
pub fn decode_ascii(src: &[u8]) -> Result<u64, NumberError> {
    if src.is_empty() {
        return Err(NumberError::Empty);
    }

    let mut decoded = 0u64;
    for &digit in src {
        if !digit.is_ascii_digit() {
            return Err(NumberError::InvalidDigit(digit));
        }
        decoded = decoded
            .checked_mul(10)
            .and_then(|d| d.checked_add(u64::from(digit - b'0')))
            .ok_or(NumberError::Overflow)?;
    }
    Ok(decoded)
}
