//! Bitfield packing: unsigned integers of 1..=64 bits at arbitrary bit offsets.
//!
//! Bits are packed **most-significant-bit first**, both within a byte and across the
//! field: the field's MSB lands at the lowest bit offset it occupies, and bit offset 0 is
//! the MSB of `buffer[0]`.
//!
//! [`encode_bitfield`] follows the sequential contract used by generated code: fields are
//! written in increasing offset order, and a field that fits in one byte starting on a
//! byte boundary assigns that byte instead of OR-ing into it. Bytes a field covers
//! entirely are assigned; its leading and trailing fragments are OR'd, so bits after a
//! multi-byte field are left alone. Values are not masked; callers clamp to
//! [`max_value_of_field`] first. [`overwrite_bitfield`] is the read-modify-write variant
//! for buffers with live contents.
//!
//! Neither function checks bounds beyond slice indexing: the buffer must hold
//! `ceil((offset + numbits) / 8)` bytes.

/// Largest value a field of `numbits` bits can hold (`2^numbits - 1`).
pub fn max_value_of_field(numbits: u32) -> u64 {
    if numbits >= 64 {
        u64::MAX
    } else {
        (1u64 << numbits) - 1
    }
}

/// Write `value` into `numbits` bits of `buffer` starting at bit `offset`.
///
/// Bits already written earlier in a partially filled byte are preserved, as are the bits
/// after a multi-byte field's trailing fragment. A field that fits in one byte and starts
/// at a byte boundary replaces that byte.
pub fn encode_bitfield(buffer: &mut [u8], offset: usize, numbits: u32, value: u64) {
    if numbits == 0 {
        return;
    }
    let mut index = offset / 8;
    let bit = (offset % 8) as u32;

    if bit + numbits <= 8 {
        let left_shift = 8 - (bit + numbits);
        let byte = (value << left_shift) as u8;
        if bit == 0 {
            buffer[index] = byte;
        } else {
            buffer[index] |= byte;
        }
        return;
    }

    let mut remaining = numbits;
    if bit != 0 {
        let leading = 8 - bit;
        remaining -= leading;
        buffer[index] |= (value >> remaining) as u8;
        index += 1;
    }
    while remaining >= 8 {
        remaining -= 8;
        buffer[index] = (value >> remaining) as u8;
        index += 1;
    }
    if remaining > 0 {
        buffer[index] |= (value << (8 - remaining)) as u8;
    }
}

/// Read a `numbits`-bit unsigned value from `buffer` starting at bit `offset`.
pub fn decode_bitfield(buffer: &[u8], offset: usize, numbits: u32) -> u64 {
    if numbits == 0 {
        return 0;
    }
    let mut index = offset / 8;
    let bit = (offset % 8) as u32;

    if bit + numbits <= 8 {
        let right_shift = 8 - (bit + numbits);
        let raw = (buffer[index] >> right_shift) as u64;
        // A field at the top of the byte has nothing above it to clear.
        return if bit == 0 { raw } else { raw & max_value_of_field(numbits) };
    }

    let mut remaining = numbits;
    let mut value = 0u64;
    if bit != 0 {
        let leading = 8 - bit;
        value = buffer[index] as u64 & max_value_of_field(leading);
        remaining -= leading;
        index += 1;
    }
    while remaining >= 8 {
        value = (value << 8) | buffer[index] as u64;
        remaining -= 8;
        index += 1;
    }
    if remaining > 0 {
        value = (value << remaining) | (buffer[index] >> (8 - remaining)) as u64;
    }
    value
}

/// Write `value` into `[offset, offset + numbits)` without touching any other bit.
///
/// Unlike [`encode_bitfield`] the value is masked to `numbits` and the target bits are
/// cleared first, so it is safe on buffers that already hold data.
pub fn overwrite_bitfield(buffer: &mut [u8], offset: usize, numbits: u32, value: u64) {
    let mut value = value & max_value_of_field(numbits);
    let mut remaining = numbits;
    let mut pos = offset;
    while remaining > 0 {
        let index = pos / 8;
        let bit = (pos % 8) as u32;
        let take = remaining.min(8 - bit);
        remaining -= take;
        let chunk = (value >> remaining) as u8 & max_value_of_field(take) as u8;
        let shift = 8 - bit - take;
        let mask = (max_value_of_field(take) as u8) << shift;
        buffer[index] = (buffer[index] & !mask) | (chunk << shift);
        value &= max_value_of_field(remaining);
        pos += take as usize;
    }
}

/// Sequential writer: packs fields one after another into a caller-owned buffer.
#[derive(Debug)]
pub struct BitPacker<'a> {
    buffer: &'a mut [u8],
    bit_offset: usize,
}

impl<'a> BitPacker<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        BitPacker { buffer, bit_offset: 0 }
    }

    /// Start packing at an arbitrary cumulative bit offset.
    pub fn at(buffer: &'a mut [u8], bit_offset: usize) -> Self {
        BitPacker { buffer, bit_offset }
    }

    pub fn pack(&mut self, numbits: u32, value: u64) {
        encode_bitfield(self.buffer, self.bit_offset, numbits, value);
        self.bit_offset += numbits as usize;
    }

    /// Pack `value` after clamping it to the field's range.
    pub fn pack_clamped(&mut self, numbits: u32, value: u64) {
        self.pack(numbits, value.min(max_value_of_field(numbits)));
    }

    /// Skip to the next byte boundary (spare bits are left as written).
    pub fn align(&mut self) {
        self.bit_offset = (self.bit_offset + 7) / 8 * 8;
    }

    pub fn bit_offset(&self) -> usize {
        self.bit_offset
    }

    /// Index of the byte holding the next bit to be written.
    pub fn byte_position(&self) -> usize {
        self.bit_offset / 8
    }

    pub fn is_aligned(&self) -> bool {
        self.bit_offset % 8 == 0
    }

    /// Number of bytes touched so far.
    pub fn bytes_used(&self) -> usize {
        (self.bit_offset + 7) / 8
    }
}

/// Sequential reader matching [`BitPacker`].
#[derive(Debug, Clone)]
pub struct BitUnpacker<'a> {
    buffer: &'a [u8],
    bit_offset: usize,
}

impl<'a> BitUnpacker<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        BitUnpacker { buffer, bit_offset: 0 }
    }

    pub fn at(buffer: &'a [u8], bit_offset: usize) -> Self {
        BitUnpacker { buffer, bit_offset }
    }

    pub fn unpack(&mut self, numbits: u32) -> u64 {
        let v = decode_bitfield(self.buffer, self.bit_offset, numbits);
        self.bit_offset += numbits as usize;
        v
    }

    pub fn align(&mut self) {
        self.bit_offset = (self.bit_offset + 7) / 8 * 8;
    }

    pub fn bit_offset(&self) -> usize {
        self.bit_offset
    }

    pub fn byte_position(&self) -> usize {
        self.bit_offset / 8
    }

    pub fn is_aligned(&self) -> bool {
        self.bit_offset % 8 == 0
    }

    /// Bits left before the end of the buffer.
    pub fn remaining_bits(&self) -> usize {
        (self.buffer.len() * 8).saturating_sub(self.bit_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_value_edges() {
        assert_eq!(max_value_of_field(0), 0);
        assert_eq!(max_value_of_field(1), 1);
        assert_eq!(max_value_of_field(12), 4095);
        assert_eq!(max_value_of_field(63), u64::MAX >> 1);
        assert_eq!(max_value_of_field(64), u64::MAX);
    }

    #[test]
    fn single_byte_msb_first() {
        let mut buf = [0u8; 1];
        encode_bitfield(&mut buf, 0, 3, 0b101);
        assert_eq!(buf[0], 0b1010_0000);
        encode_bitfield(&mut buf, 3, 5, 0b00011);
        assert_eq!(buf[0], 0b1010_0011);
        assert_eq!(decode_bitfield(&buf, 0, 3), 0b101);
        assert_eq!(decode_bitfield(&buf, 3, 5), 0b00011);
    }

    #[test]
    fn first_write_in_byte_assigns() {
        let mut buf = [0xFFu8; 1];
        encode_bitfield(&mut buf, 0, 2, 0b01);
        assert_eq!(buf[0], 0b0100_0000);
    }

    #[test]
    fn spans_three_bytes() {
        let mut buf = [0u8; 3];
        encode_bitfield(&mut buf, 5, 14, 0x2ABC);
        // bits 5..19: 10 1010 1011 1100
        assert_eq!(buf, [0b0000_0101, 0b0101_0111, 0b1000_0000]);
        assert_eq!(decode_bitfield(&buf, 5, 14), 0x2ABC);
    }

    #[test]
    fn full_width_u64() {
        let mut buf = [0u8; 9];
        encode_bitfield(&mut buf, 4, 64, 0xDEAD_BEEF_0123_4567);
        assert_eq!(decode_bitfield(&buf, 4, 64), 0xDEAD_BEEF_0123_4567);
        let mut aligned = [0u8; 8];
        encode_bitfield(&mut aligned, 0, 64, u64::MAX);
        assert_eq!(aligned, [0xFF; 8]);
        assert_eq!(decode_bitfield(&aligned, 0, 64), u64::MAX);
    }

    #[test]
    fn trailing_fragment_keeps_following_bits() {
        let mut buf = [0x00, 0x0F];
        encode_bitfield(&mut buf, 0, 12, 0xABC);
        assert_eq!(buf, [0xAB, 0xCF]);

        let mut buf = [0xFF, 0x00, 0x0F];
        encode_bitfield(&mut buf, 8, 12, 0);
        assert_eq!(buf, [0xFF, 0x00, 0x0F]);
    }

    #[test]
    fn zero_width_is_noop() {
        let mut buf = [0x5Au8; 2];
        encode_bitfield(&mut buf, 3, 0, 0xFF);
        overwrite_bitfield(&mut buf, 3, 0, 0xFF);
        assert_eq!(buf, [0x5A, 0x5A]);
        assert_eq!(decode_bitfield(&buf, 3, 0), 0);
    }

    #[test]
    fn overwrite_preserves_neighbours() {
        let mut buf = [0xFFu8; 3];
        overwrite_bitfield(&mut buf, 6, 9, 0);
        assert_eq!(buf, [0b1111_1100, 0b0000_0001, 0xFF]);
        overwrite_bitfield(&mut buf, 6, 9, 0x1FF);
        assert_eq!(buf, [0xFF; 3]);
    }

    #[test]
    fn packer_tracks_offset() {
        let mut buf = [0u8; 4];
        let mut p = BitPacker::new(&mut buf);
        p.pack(1, 1);
        p.pack(4, 0b1001);
        p.pack_clamped(3, 99);
        assert!(p.is_aligned());
        p.pack(12, 0xABC);
        assert_eq!(p.bit_offset(), 20);
        assert_eq!(p.bytes_used(), 3);
        p.align();
        assert_eq!(p.byte_position(), 3);
        assert_eq!(buf[0], 0b1100_1111);

        let mut u = BitUnpacker::new(&buf);
        assert_eq!(u.unpack(1), 1);
        assert_eq!(u.unpack(4), 0b1001);
        assert_eq!(u.unpack(3), 7);
        assert_eq!(u.unpack(12), 0xABC);
        assert_eq!(u.remaining_bits(), 12);
    }
}
