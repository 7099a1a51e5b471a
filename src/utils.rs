//! Byte-order helpers for XGT frame fields.
//!
//! The XGT dedicated protocol transmits every 16-bit field low byte first,
//! while decoded values are handled as ordinary integers. All multi-byte
//! fields in this crate are converted through [`split_big_endian`] and
//! [`join_as_big_endian_value`] so that the byte order rule is stated once.
//!
//! # Example
//!
//! ```
//! use xgt_fenet::utils::{get_u16_le, join_as_big_endian_value, put_u16_le, split_big_endian};
//!
//! assert_eq!(split_big_endian(0x1234), (0x12, 0x34));
//! assert_eq!(join_as_big_endian_value(0x12, 0x34), 0x1234);
//!
//! let mut buf = Vec::new();
//! put_u16_le(&mut buf, 0x0054);
//! assert_eq!(buf, [0x54, 0x00]);
//! assert_eq!(get_u16_le(&buf, 0), Some(0x0054));
//! ```

/// Splits a 16-bit value into its `(high, low)` bytes.
///
/// # Example
///
/// ```
/// use xgt_fenet::utils::split_big_endian;
///
/// assert_eq!(split_big_endian(0xABCD), (0xAB, 0xCD));
/// ```
#[inline]
pub fn split_big_endian(value: u16) -> (u8, u8) {
    ((value >> 8) as u8, (value & 0xFF) as u8)
}

/// Rebuilds a 16-bit value from its high and low bytes.
///
/// # Example
///
/// ```
/// use xgt_fenet::utils::join_as_big_endian_value;
///
/// // Wire bytes [0x34, 0x12] of a little-endian field
/// assert_eq!(join_as_big_endian_value(0x12, 0x34), 0x1234);
/// ```
#[inline]
pub fn join_as_big_endian_value(high: u8, low: u8) -> u16 {
    ((high as u16) << 8) | low as u16
}

/// Appends a 16-bit field to `buf` in wire order (low byte first).
#[inline]
pub fn put_u16_le(buf: &mut Vec<u8>, value: u16) {
    let (high, low) = split_big_endian(value);
    buf.push(low);
    buf.push(high);
}

/// Reads a 16-bit wire-order field starting at `offset`.
///
/// Returns `None` if fewer than two bytes remain.
#[inline]
pub fn get_u16_le(bytes: &[u8], offset: usize) -> Option<u16> {
    let low = *bytes.get(offset)?;
    let high = *bytes.get(offset.checked_add(1)?)?;
    Some(join_as_big_endian_value(high, low))
}

/// Formats a frame as space-separated upper-case hex bytes.
///
/// # Example
///
/// ```
/// use xgt_fenet::utils::format_frame;
///
/// assert_eq!(format_frame(&[0x4C, 0x53, 0x00]), "4C 53 00");
/// assert_eq!(format_frame(&[]), "");
/// ```
pub fn format_frame(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_big_endian() {
        assert_eq!(split_big_endian(0x0000), (0x00, 0x00));
        assert_eq!(split_big_endian(0x00FF), (0x00, 0xFF));
        assert_eq!(split_big_endian(0xFF00), (0xFF, 0x00));
        assert_eq!(split_big_endian(0x1234), (0x12, 0x34));
    }

    #[test]
    fn test_join_as_big_endian_value() {
        assert_eq!(join_as_big_endian_value(0x00, 0x00), 0x0000);
        assert_eq!(join_as_big_endian_value(0xFF, 0xFF), 0xFFFF);
        assert_eq!(join_as_big_endian_value(0x80, 0x01), 0x8001);
    }

    #[test]
    fn test_split_join_identity_all_values() {
        for value in 0..=u16::MAX {
            let (high, low) = split_big_endian(value);
            assert_eq!(join_as_big_endian_value(high, low), value);
        }
    }

    #[test]
    fn test_put_u16_le() {
        let mut buf = vec![0xAA];
        put_u16_le(&mut buf, 0x1234);
        assert_eq!(buf, vec![0xAA, 0x34, 0x12]);
    }

    #[test]
    fn test_get_u16_le() {
        let bytes = [0x34, 0x12, 0x55];
        assert_eq!(get_u16_le(&bytes, 0), Some(0x1234));
        assert_eq!(get_u16_le(&bytes, 1), Some(0x5512));
        assert_eq!(get_u16_le(&bytes, 2), None);
        assert_eq!(get_u16_le(&bytes, usize::MAX), None);
    }

    #[test]
    fn test_format_frame() {
        assert_eq!(format_frame(&[0x00, 0x0F, 0xAB]), "00 0F AB");
    }
}
