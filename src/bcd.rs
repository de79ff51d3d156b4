//! Packed binary-coded-decimal helpers.
//!
//! The DS3231 stores every calendar field as two decimal digits packed into a
//! byte: the high nibble holds the tens and the low nibble the ones.

/// Decodes a packed BCD byte into its binary value.
///
/// Nibbles above 9 are not rejected; `0x6A` decodes to `70`, and `0xFF` to
/// `165`, exactly as the arithmetic falls out.
pub fn decode(bcd: u8) -> u8 {
    (bcd >> 4).wrapping_mul(10).wrapping_add(bcd & 0x0F)
}

/// Encodes a binary value (0-99) as packed BCD.
///
/// Values above 99 spill the tens digit into bits above the nibble and are
/// truncated to eight bits.
pub fn encode(value: u8) -> u8 {
    let value = u32::from(value);
    (((value / 10) << 4) | (value % 10)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_decimal_range() {
        for value in 0..=99 {
            assert_eq!(decode(encode(value)), value);
        }
    }

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode(0), 0x00);
        assert_eq!(encode(9), 0x09);
        assert_eq!(encode(10), 0x10);
        assert_eq!(encode(59), 0x59);
        assert_eq!(encode(99), 0x99);
    }

    #[test]
    fn test_decode_known_values() {
        assert_eq!(decode(0x00), 0);
        assert_eq!(decode(0x23), 23);
        assert_eq!(decode(0x59), 59);
        assert_eq!(decode(0x99), 99);
    }

    #[test]
    fn test_decode_accepts_invalid_nibbles() {
        // 6 * 10 + 10
        assert_eq!(decode(0x6A), 70);
        // 15 * 10 + 15
        assert_eq!(decode(0xFF), 165);
        assert_eq!(decode(0x0F), 15);
    }

    #[test]
    fn test_encode_out_of_range_truncates() {
        // (10 << 4) | 0
        assert_eq!(encode(100), 0xA0);
        // (19 << 4) | 9 = 0x139, truncated
        assert_eq!(encode(199), 0x39);
    }
}
