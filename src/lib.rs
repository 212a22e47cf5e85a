//! # protocodec: bit-exact codec core for protocol code generators
//!
//! The numeric and bitwise algorithms a protocol code generator relies on, usable both at
//! generation time and at runtime:
//!
//! - **Bitfields** ([`bitfield`]): unsigned values of 1..=64 bits at any bit offset,
//!   packed most-significant-bit first.
//! - **Compact floats** ([`float`]): binary32 to 16- and 24-bit floats with a
//!   configurable significand width, round-half-up, saturating overflow and denormals.
//! - **Length algebra** ([`length`]): closed-form `min` / `max` / `non_default` encoded
//!   lengths of structures whose sizes depend on symbols such as array counts.
//! - **Checksums** ([`checksum`]): bitwise CRC-32 and Fletcher-16.
//! - **Framing** ([`frame`]): `[sync0][sync1][type][length][body][checksum]` frames and a
//!   byte-at-a-time detector for live streams.
//!
//! Supporting modules: [`scaled`] (scaled integers), [`codec`] (byte-order aware field
//! I/O and [`CodecError`]), [`expr`] (numeric expression evaluator) and [`cgen`] (C
//! statements for bitfields).
//!
//! ## Example
//!
//! ```
//! use protocodec::bitfield::{decode_bitfield, encode_bitfield};
//! use protocodec::float::FloatFormat;
//!
//! let mut buf = [0u8; 2];
//! encode_bitfield(&mut buf, 6, 3, 5);
//! encode_bitfield(&mut buf, 9, 5, 9);
//! assert_eq!(decode_bitfield(&buf, 6, 3), 5);
//! assert_eq!(decode_bitfield(&buf, 9, 5), 9);
//!
//! let half = FloatFormat::float16(10).unwrap();
//! assert_eq!(half.encode(1.0), 0x3C00);
//! assert_eq!(half.decode(0x3C00), 1.0);
//! ```
//!
//! See `tests/integration.rs` for framing and length examples.

pub mod bitfield;
pub mod cgen;
pub mod checksum;
pub mod codec;
pub mod expr;
pub mod float;
pub mod frame;
pub mod length;
pub mod scaled;

pub use bitfield::{decode_bitfield, encode_bitfield, max_value_of_field, BitPacker, BitUnpacker};
pub use checksum::{crc32, fletcher16, ChecksumKind};
pub use codec::{CodecError, Endianness, FieldCodec};
pub use expr::ExprError;
pub use float::{FloatFormat, FloatWidth};
pub use frame::{FrameDetector, FrameLayout, FrameParts, FrameReceiver, FrameStatus, LengthWidth, ScanState};
pub use length::{EncodedLength, LengthExpression, TermFlags};
