//! Reduced-precision floating point: IEEE-754 binary32 to and from 16- and 24-bit
//! formats with a configurable significand width.
//!
//! A compact value of width `W` is laid out as `{sign:1, exponent:E, significand:sigbits}`
//! with `E = W - 1 - sigbits` and bias `2^(E-1) - 1`. Like binary32, normal values carry an
//! implied leading one and an all-zero exponent marks a denormal.
//!
//! Conversion never fails. Significand rounding is half-up and saturates instead of
//! carrying into the exponent; magnitudes above the largest finite value clamp to it (the
//! all-ones exponent is never produced); magnitudes too small for the format become
//! denormals or zero.

use crate::codec::CodecError;

/// Width of a compact float in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    Bits16,
    Bits24,
}

impl FloatWidth {
    pub fn bits(self) -> u32 {
        match self {
            FloatWidth::Bits16 => 16,
            FloatWidth::Bits24 => 24,
        }
    }

    /// Inclusive range of significand widths accepted for this width.
    pub fn sigbits_range(self) -> (u32, u32) {
        match self {
            FloatWidth::Bits16 => (4, 12),
            FloatWidth::Bits24 => (4, 20),
        }
    }
}

/// A validated compact float layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatFormat {
    width: FloatWidth,
    sigbits: u32,
}

impl FloatFormat {
    pub fn new(width: FloatWidth, sigbits: u32) -> Result<Self, CodecError> {
        let (lo, hi) = width.sigbits_range();
        if sigbits < lo || sigbits > hi {
            return Err(CodecError::InvalidSignificand {
                width: width.bits(),
                sigbits,
            });
        }
        Ok(FloatFormat { width, sigbits })
    }

    pub fn float16(sigbits: u32) -> Result<Self, CodecError> {
        Self::new(FloatWidth::Bits16, sigbits)
    }

    pub fn float24(sigbits: u32) -> Result<Self, CodecError> {
        Self::new(FloatWidth::Bits24, sigbits)
    }

    pub fn width(&self) -> FloatWidth {
        self.width
    }

    pub fn sigbits(&self) -> u32 {
        self.sigbits
    }

    pub fn exponent_bits(&self) -> u32 {
        self.width.bits() - 1 - self.sigbits
    }

    pub fn bias(&self) -> i32 {
        (1i32 << (self.exponent_bits() - 1)) - 1
    }

    /// Encoded pattern of the largest finite positive value.
    pub fn max_encoded(&self) -> u32 {
        let e = self.exponent_bits();
        (((1u32 << e) - 2) << self.sigbits) | ((1u32 << self.sigbits) - 1)
    }

    /// Largest finite magnitude, as a binary32.
    pub fn max_value(&self) -> f32 {
        self.decode(self.max_encoded())
    }

    pub fn encode(&self, value: f32) -> u32 {
        float32_to_compact(value, self.width.bits(), self.sigbits)
    }

    pub fn decode(&self, encoded: u32) -> f32 {
        compact_to_float32(encoded, self.width.bits(), self.sigbits)
    }
}

/// Convert to a 16-bit compact float with `sigbits` significand bits.
///
/// `sigbits` must be in 4..=12; out-of-range values are unchecked in release builds.
/// Use [`FloatFormat::float16`] to validate it.
pub fn float32_to_float16(value: f32, sigbits: u32) -> u16 {
    debug_assert!((4..=12).contains(&sigbits), "float16 sigbits out of range");
    float32_to_compact(value, 16, sigbits) as u16
}

/// Inverse of [`float32_to_float16`]; `sigbits` must be in 4..=12.
pub fn float16_to_float32(value: u16, sigbits: u32) -> f32 {
    debug_assert!((4..=12).contains(&sigbits), "float16 sigbits out of range");
    compact_to_float32(value as u32, 16, sigbits)
}

/// Convert to a 24-bit compact float (returned in the low 24 bits) with `sigbits`
/// significand bits.
///
/// `sigbits` must be in 4..=20; out-of-range values are unchecked in release builds.
/// Use [`FloatFormat::float24`] to validate it.
pub fn float32_to_float24(value: f32, sigbits: u32) -> u32 {
    debug_assert!((4..=20).contains(&sigbits), "float24 sigbits out of range");
    float32_to_compact(value, 24, sigbits)
}

/// Inverse of [`float32_to_float24`]; `sigbits` must be in 4..=20.
pub fn float24_to_float32(value: u32, sigbits: u32) -> f32 {
    debug_assert!((4..=20).contains(&sigbits), "float24 sigbits out of range");
    compact_to_float32(value & 0x00FF_FFFF, 24, sigbits)
}

/// False for infinities, NaNs and denormals.
pub fn is_float32_valid(value: f32) -> bool {
    let bits = value.to_bits();
    let exponent = (bits >> 23) & 0xFF;
    let significand = bits & 0x007F_FFFF;
    !(exponent == 0xFF || (exponent == 0 && significand != 0))
}

/// False for infinities, NaNs and denormals.
pub fn is_float64_valid(value: f64) -> bool {
    let bits = value.to_bits();
    let exponent = (bits >> 52) & 0x7FF;
    let significand = bits & 0x000F_FFFF_FFFF_FFFF;
    !(exponent == 0x7FF || (exponent == 0 && significand != 0))
}

fn float32_to_compact(value: f32, width: u32, sigbits: u32) -> u32 {
    let bits = value.to_bits();
    let sign = bits >> 31;
    let exponent = (bits >> 23) & 0xFF;
    let mut significand = bits & 0x007F_FFFF;
    let sign_field = sign << (width - 1);

    // Zero keeps its sign and nothing else, whatever the exponent width.
    if exponent == 0 && significand == 0 {
        return sign_field;
    }

    let max_significand = (1u32 << sigbits) - 1;
    let shift = 23 - sigbits;
    significand = (significand + (1 << (shift - 1))) >> shift;
    if significand >= max_significand {
        significand = max_significand;
    }

    let exponent_bits = width - 1 - sigbits;
    let bias = (1i32 << (exponent_bits - 1)) - 1;
    let signed_exponent = exponent as i32 - 127;

    let magnitude = if signed_exponent <= -bias {
        significand |= 1 << sigbits;
        let denormal_shift = (1 + (-bias - signed_exponent)) as u32;
        if denormal_shift >= 16 {
            0
        } else {
            (significand + (1 << (denormal_shift - 1))) >> denormal_shift
        }
    } else if signed_exponent > bias {
        (((1u32 << exponent_bits) - 2) << sigbits) | max_significand
    } else {
        (((signed_exponent + bias) as u32) << sigbits) | significand
    };

    magnitude | sign_field
}

fn compact_to_float32(value: u32, width: u32, sigbits: u32) -> f32 {
    let sign = (value >> (width - 1)) & 1;
    let magnitude = value & ((1u32 << (width - 1)) - 1);
    if magnitude == 0 {
        return if sign != 0 { -0.0 } else { 0.0 };
    }

    let exponent_bits = width - 1 - sigbits;
    let bias = (1i32 << (exponent_bits - 1)) - 1;
    let max_significand = (1u32 << sigbits) - 1;
    let exponent_field = (magnitude >> sigbits) & ((1u32 << exponent_bits) - 1);
    let mut significand = magnitude & max_significand;

    let unbiased = if exponent_field == 0 {
        // Denormal: shift until the leading one reaches the implied position.
        let mut e = 1 - bias;
        while significand & (1 << sigbits) == 0 {
            significand <<= 1;
            e -= 1;
        }
        significand &= max_significand;
        e
    } else {
        exponent_field as i32 - bias
    };

    let rebiased = unbiased + 127;
    if rebiased > 254 {
        return if sign != 0 { f32::NEG_INFINITY } else { f32::INFINITY };
    }
    if rebiased < 1 {
        return if sign != 0 { -0.0 } else { 0.0 };
    }

    let bits = (sign << 31) | ((rebiased as u32) << 23) | (significand << (23 - sigbits));
    f32::from_bits(bits)
}
