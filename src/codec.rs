//! Byte-level field I/O built on the bit-exact primitives.
//!
//! [`FieldCodec`] writes and reads compact floats, scaled integers and N-byte integers in
//! a configured byte order, appending to a `Vec<u8>` and reading from a `Cursor`. It is the
//! runtime counterpart of what generated encode/decode functions do field by field.

use crate::bitfield::max_value_of_field;
use crate::float::{self, FloatFormat};
use crate::scaled;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Endianness {
    Big,
    Little,
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid significand width {sigbits} for a {width}-bit float")]
    InvalidSignificand { width: u32, sigbits: u32 },
    #[error("Float format is {got} bits wide, expected {expected}")]
    FormatWidthMismatch { expected: u32, got: u32 },
    #[error("Invalid field width: {0} bytes (expected 1..=8)")]
    InvalidByteCount(usize),
    #[error("Invalid float on the wire: {0}")]
    InvalidFloat(f64),
    #[error("Invalid frame layout: {0}")]
    InvalidLayout(String),
    #[error("Frame too large: {len} bytes (max {max})")]
    FrameTooLarge { len: usize, max: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct FieldCodec {
    pub endianness: Endianness,
}

impl FieldCodec {
    pub fn new(endianness: Endianness) -> Self {
        FieldCodec { endianness }
    }

    /// Write a 16-bit compact float; `format` must be a 16-bit format.
    pub fn write_float16(&self, w: &mut Vec<u8>, value: f32, format: FloatFormat) -> Result<(), CodecError> {
        self.check_width(format, float::FloatWidth::Bits16)?;
        self.write_uint(w, format.encode(value) as u64, 2)
    }

    pub fn read_float16(&self, r: &mut Cursor<&[u8]>, format: FloatFormat) -> Result<f32, CodecError> {
        self.check_width(format, float::FloatWidth::Bits16)?;
        let raw = self.read_uint(r, 2)?;
        Ok(format.decode(raw as u32))
    }

    /// Write a 24-bit compact float (3 bytes); `format` must be a 24-bit format.
    pub fn write_float24(&self, w: &mut Vec<u8>, value: f32, format: FloatFormat) -> Result<(), CodecError> {
        self.check_width(format, float::FloatWidth::Bits24)?;
        let raw = format.encode(value);
        match self.endianness {
            Endianness::Big => w.write_u24::<BigEndian>(raw)?,
            Endianness::Little => w.write_u24::<LittleEndian>(raw)?,
        }
        Ok(())
    }

    pub fn read_float24(&self, r: &mut Cursor<&[u8]>, format: FloatFormat) -> Result<f32, CodecError> {
        self.check_width(format, float::FloatWidth::Bits24)?;
        let raw = match self.endianness {
            Endianness::Big => r.read_u24::<BigEndian>()?,
            Endianness::Little => r.read_u24::<LittleEndian>()?,
        };
        Ok(format.decode(raw))
    }

    pub fn write_f32(&self, w: &mut Vec<u8>, v: f32) -> Result<(), CodecError> {
        match self.endianness {
            Endianness::Big => w.write_f32::<BigEndian>(v)?,
            Endianness::Little => w.write_f32::<LittleEndian>(v)?,
        }
        Ok(())
    }

    pub fn write_f64(&self, w: &mut Vec<u8>, v: f64) -> Result<(), CodecError> {
        match self.endianness {
            Endianness::Big => w.write_f64::<BigEndian>(v)?,
            Endianness::Little => w.write_f64::<LittleEndian>(v)?,
        }
        Ok(())
    }

    /// Read a binary32, rejecting infinities, NaNs and denormals.
    pub fn read_checked_f32(&self, r: &mut Cursor<&[u8]>) -> Result<f32, CodecError> {
        let v = match self.endianness {
            Endianness::Big => r.read_f32::<BigEndian>()?,
            Endianness::Little => r.read_f32::<LittleEndian>()?,
        };
        if !float::is_float32_valid(v) {
            return Err(CodecError::InvalidFloat(v as f64));
        }
        Ok(v)
    }

    /// Read a binary64, rejecting infinities, NaNs and denormals.
    pub fn read_checked_f64(&self, r: &mut Cursor<&[u8]>) -> Result<f64, CodecError> {
        let v = match self.endianness {
            Endianness::Big => r.read_f64::<BigEndian>()?,
            Endianness::Little => r.read_f64::<LittleEndian>()?,
        };
        if !float::is_float64_valid(v) {
            return Err(CodecError::InvalidFloat(v));
        }
        Ok(v)
    }

    /// Scale `value` into an unsigned `bytes`-wide field (see [`scaled::scale_to_unsigned`]).
    pub fn write_scaled_unsigned(
        &self,
        w: &mut Vec<u8>,
        value: f64,
        min: f64,
        scaler: f64,
        bytes: usize,
    ) -> Result<(), CodecError> {
        self.check_bytes(bytes)?;
        let raw = scaled::scale_to_unsigned(value, min, scaler, bytes as u32 * 8);
        self.write_uint(w, raw, bytes)
    }

    pub fn read_scaled_unsigned(
        &self,
        r: &mut Cursor<&[u8]>,
        min: f64,
        scaler: f64,
        bytes: usize,
    ) -> Result<f64, CodecError> {
        let raw = self.read_uint(r, bytes)?;
        Ok(scaled::unsigned_to_scaled(raw, min, scaler))
    }

    /// Scale `value` into a signed `bytes`-wide field (see [`scaled::scale_to_signed`]).
    pub fn write_scaled_signed(&self, w: &mut Vec<u8>, value: f64, scaler: f64, bytes: usize) -> Result<(), CodecError> {
        self.check_bytes(bytes)?;
        let raw = scaled::scale_to_signed(value, scaler, bytes as u32 * 8);
        self.write_int(w, raw, bytes)
    }

    pub fn read_scaled_signed(&self, r: &mut Cursor<&[u8]>, scaler: f64, bytes: usize) -> Result<f64, CodecError> {
        let raw = self.read_int(r, bytes)?;
        Ok(scaled::signed_to_scaled(raw, scaler))
    }

    /// Write the low `bytes` bytes of `v`.
    pub fn write_uint(&self, w: &mut Vec<u8>, v: u64, bytes: usize) -> Result<(), CodecError> {
        self.check_bytes(bytes)?;
        let v = v & max_value_of_field(bytes as u32 * 8);
        match self.endianness {
            Endianness::Big => w.write_uint::<BigEndian>(v, bytes)?,
            Endianness::Little => w.write_uint::<LittleEndian>(v, bytes)?,
        }
        Ok(())
    }

    pub fn read_uint(&self, r: &mut Cursor<&[u8]>, bytes: usize) -> Result<u64, CodecError> {
        self.check_bytes(bytes)?;
        Ok(match self.endianness {
            Endianness::Big => r.read_uint::<BigEndian>(bytes)?,
            Endianness::Little => r.read_uint::<LittleEndian>(bytes)?,
        })
    }

    pub fn write_int(&self, w: &mut Vec<u8>, v: i64, bytes: usize) -> Result<(), CodecError> {
        self.check_bytes(bytes)?;
        match self.endianness {
            Endianness::Big => w.write_int::<BigEndian>(v, bytes)?,
            Endianness::Little => w.write_int::<LittleEndian>(v, bytes)?,
        }
        Ok(())
    }

    pub fn read_int(&self, r: &mut Cursor<&[u8]>, bytes: usize) -> Result<i64, CodecError> {
        self.check_bytes(bytes)?;
        Ok(match self.endianness {
            Endianness::Big => r.read_int::<BigEndian>(bytes)?,
            Endianness::Little => r.read_int::<LittleEndian>(bytes)?,
        })
    }

    fn check_bytes(&self, bytes: usize) -> Result<(), CodecError> {
        if (1..=8).contains(&bytes) {
            Ok(())
        } else {
            Err(CodecError::InvalidByteCount(bytes))
        }
    }

    fn check_width(&self, format: FloatFormat, width: float::FloatWidth) -> Result<(), CodecError> {
        if format.width() == width {
            Ok(())
        } else {
            Err(CodecError::FormatWidthMismatch {
                expected: width.bits(),
                got: format.width().bits(),
            })
        }
    }
}
