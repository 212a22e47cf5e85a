//! Packet checksums: bitwise CRC-32 and Fletcher-16.
//!
//! The CRC is the reflected polynomial `0xEDB88320` computed one bit at a time, seeded
//! with `0` and without a final XOR. It travels as 4 little-endian bytes. Fletcher-16
//! starts both sums at `0xFF` and travels as 2 big-endian bytes (`sum2` first).

use byteorder::{BigEndian, ByteOrder, LittleEndian};

const CRC32_POLYNOMIAL: u32 = 0xEDB8_8320;

/// Bytes summed between Fletcher reductions; keeps 8-bit sums inside 16 bits.
const FLETCHER_CHUNK: usize = 20;

/// CRC-32 of `data` seeded with zero.
pub fn crc32(data: &[u8]) -> u32 {
    crc32_update(0, data)
}

/// Continue a CRC-32 from `crc` over `data`.
///
/// The standard (zlib) CRC-32 is `!crc32_update(!0, data)`.
pub fn crc32_update(mut crc: u32, data: &[u8]) -> u32 {
    for &byte in data {
        let mut term = (crc ^ byte as u32) & 0xFF;
        for _ in 0..8 {
            term = if term & 1 != 0 { (term >> 1) ^ CRC32_POLYNOMIAL } else { term >> 1 };
        }
        crc = (crc >> 8) ^ term;
    }
    crc
}

/// Fletcher-16 of `data` with both sums seeded at `0xFF`; `(sum2 << 8) | sum1`.
pub fn fletcher16(data: &[u8]) -> u16 {
    let mut sum1: u32 = 0xFF;
    let mut sum2: u32 = 0xFF;
    for chunk in data.chunks(FLETCHER_CHUNK) {
        for &byte in chunk {
            sum1 += byte as u32;
            sum2 += sum1;
        }
        sum1 = (sum1 & 0xFF) + (sum1 >> 8);
        sum2 = (sum2 & 0xFF) + (sum2 >> 8);
    }
    sum1 = (sum1 & 0xFF) + (sum1 >> 8);
    sum2 = (sum2 & 0xFF) + (sum2 >> 8);
    ((sum2 << 8) | sum1) as u16
}

/// Checksum appended to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    Crc32,
    Fletcher16,
}

impl ChecksumKind {
    /// Size of the checksum field in bytes.
    pub fn field_len(self) -> usize {
        match self {
            ChecksumKind::Crc32 => 4,
            ChecksumKind::Fletcher16 => 2,
        }
    }

    pub fn compute(self, data: &[u8]) -> u32 {
        match self {
            ChecksumKind::Crc32 => crc32(data),
            ChecksumKind::Fletcher16 => fletcher16(data) as u32,
        }
    }

    /// Append the checksum of everything already in `out`.
    pub fn append(self, out: &mut Vec<u8>) {
        let value = self.compute(out);
        let mut field = [0u8; 4];
        match self {
            ChecksumKind::Crc32 => LittleEndian::write_u32(&mut field, value),
            ChecksumKind::Fletcher16 => BigEndian::write_u16(&mut field, value as u16),
        }
        out.extend_from_slice(&field[..self.field_len()]);
    }

    /// Read a checksum field in its wire byte order.
    pub fn read(self, field: &[u8]) -> u32 {
        match self {
            ChecksumKind::Crc32 => LittleEndian::read_u32(field),
            ChecksumKind::Fletcher16 => BigEndian::read_u16(field) as u32,
        }
    }

    /// True when the trailing checksum of `frame` matches the bytes before it.
    pub fn verify(self, frame: &[u8]) -> bool {
        if frame.len() < self.field_len() {
            return false;
        }
        let (covered, field) = frame.split_at(frame.len() - self.field_len());
        self.compute(covered) == self.read(field)
    }
}
