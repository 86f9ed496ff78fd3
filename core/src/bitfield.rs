//! Conversion between unsigned integers and MSB-first bit fields.
//!
//! A field of `nbits` bits occupies the leading `nbits` bits of
//! `bytes_for(nbits)` bytes. The unused low bits of the last byte are zero.

pub const MAX_WIDTH: usize = 64;

/// Number of bytes needed to hold `nbits` bits.
#[inline]
pub const fn bytes_for(nbits: usize) -> usize {
    nbits.div_ceil(8)
}

/// Mask selecting the top `nbits` bits of a byte. `nbits` is 0..=8.
#[inline]
pub(crate) const fn high_mask(nbits: u8) -> u8 {
    (0xff00u16 >> nbits) as u8
}

fn check_width(nbits: usize) {
    assert!(
        (1..=MAX_WIDTH).contains(&nbits),
        "bit field width must be 1..={MAX_WIDTH}, got {nbits}"
    );
}

fn check_len(len: usize, nbits: usize) {
    let nbytes = bytes_for(nbits);
    assert!(len >= nbytes, "{nbits}-bit field needs {nbytes} bytes, buffer has {len}");
}

/// Encodes the low `nbits` bits of `value` into `dst`.
///
/// Panics if `nbits` is outside 1..=64 or `dst` is shorter than
/// `bytes_for(nbits)`.
pub fn put_bit_field(dst: &mut [u8], value: u64, nbits: usize) {
    check_width(nbits);
    check_len(dst.len(), nbits);
    let nbytes = bytes_for(nbits);
    let bytes = (value << (MAX_WIDTH - nbits)).to_be_bytes();
    dst[..nbytes].copy_from_slice(&bytes[..nbytes]);
}

/// Decodes an `nbits`-bit field from the start of `src`.
///
/// Panics under the same conditions as [`put_bit_field`].
pub fn bit_field(src: &[u8], nbits: usize) -> u64 {
    check_width(nbits);
    check_len(src.len(), nbits);
    let nbytes = bytes_for(nbits);
    let mut bytes = [0u8; 8];
    bytes[..nbytes].copy_from_slice(&src[..nbytes]);
    u64::from_be_bytes(bytes) >> (MAX_WIDTH - nbits)
}

pub fn pack(value: u64, nbits: usize) -> Vec<u8> {
    check_width(nbits);
    let mut out = vec![0; bytes_for(nbits)];
    put_bit_field(&mut out, value, nbits);
    out
}

pub fn unpack(src: &[u8], nbits: usize) -> u64 {
    bit_field(src, nbits)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASES: &[(u64, usize, &[u8])] = &[
        (0b1, 1, &[0b1000_0000]),
        (0b01, 2, &[0b0100_0000]),
        (0b101, 3, &[0b1010_0000]),
        (0b0110, 4, &[0b0110_0000]),
        (0b10111, 5, &[0b1011_1000]),
        (0b101101, 6, &[0b1011_0100]),
        (0b1011001, 7, &[0b1011_0010]),
        (0b10110011, 8, &[0b1011_0011]),
        (0b101010011, 9, &[0b1010_1001, 0b1000_0000]),
        (0b1010_1001_1100_0110, 16, &[0b1010_1001, 0b1100_0110]),
        (0xc1b2a3d4, 32, &[0xc1, 0xb2, 0xa3, 0xd4]),
        (0xc1b2a3d4_e590f687, 64, &[0xc1, 0xb2, 0xa3, 0xd4, 0xe5, 0x90, 0xf6, 0x87]),
    ];

    #[test]
    fn put_bit_field_layout() {
        for &(value, nbits, expected) in CASES {
            let mut buf = vec![0; bytes_for(nbits)];
            put_bit_field(&mut buf, value, nbits);
            assert_eq!(buf, expected, "{nbits}-bit field {value:#x}");
        }
    }

    #[test]
    fn bit_field_layout() {
        for &(value, nbits, bytes) in CASES {
            assert_eq!(bit_field(bytes, nbits), value, "{nbits}-bit field");
        }
    }

    #[test]
    fn high_bits_of_value_are_ignored() {
        assert_eq!(pack(0xffff_ff05, 4), vec![0b0101_0000]);
        assert_eq!(pack(u64::MAX, 12), vec![0xff, 0xf0]);
    }

    #[test]
    fn trailing_source_bits_are_discarded() {
        assert_eq!(bit_field(&[0b1011_0111], 3), 0b101);
        assert_eq!(bit_field(&[0xff, 0xff, 0xff], 9), 0x1ff);
    }

    #[test]
    fn round_trip_every_width() {
        for nbits in 1..=MAX_WIDTH {
            let max = u64::MAX >> (MAX_WIDTH - nbits);
            for value in [0, 1, max, max / 3, max ^ (max >> 1)] {
                assert_eq!(unpack(&pack(value, nbits), nbits), value, "width {nbits}");
            }
        }
    }

    #[test]
    fn extra_destination_bytes_are_untouched() {
        let mut buf = [0xaa; 4];
        put_bit_field(&mut buf, 0b1, 1);
        assert_eq!(buf, [0x80, 0xaa, 0xaa, 0xaa]);
    }

    #[test]
    fn high_mask_widths() {
        assert_eq!(high_mask(0), 0);
        assert_eq!(high_mask(1), 0b1000_0000);
        assert_eq!(high_mask(3), 0b1110_0000);
        assert_eq!(high_mask(8), 0xff);
    }

    #[test]
    #[should_panic(expected = "needs 2 bytes")]
    fn short_buffer_panics() {
        let mut buf = [0u8; 1];
        put_bit_field(&mut buf, 0x1ff, 9);
    }

    #[test]
    #[should_panic(expected = "width must be")]
    fn zero_width_panics() {
        bit_field(&[0], 0);
    }

    #[test]
    #[should_panic(expected = "width must be")]
    fn oversized_width_panics() {
        pack(0, 65);
    }
}
