//! Scaled-integer encoding of floating point values.
//!
//! An unsigned field stores `round((value - min) * scaler)` clamped to the field's range;
//! a signed field stores `round(value * scaler)` clamped symmetrically to
//! `±(2^(bits-1) - 1)`. Decoding divides by the same scaler. Bit widths are 1..=64.

use crate::bitfield::max_value_of_field;

/// Scale into an unsigned `bits`-wide integer, rounding half up.
pub fn scale_to_unsigned(value: f64, min: f64, scaler: f64, bits: u32) -> u64 {
    let max = max_value_of_field(bits);
    let scaled = (value - min) * scaler;
    if scaled >= max as f64 {
        max
    } else if scaled <= 0.0 {
        0
    } else {
        (scaled + 0.5) as u64
    }
}

pub fn unsigned_to_scaled(raw: u64, min: f64, scaler: f64) -> f64 {
    raw as f64 / scaler + min
}

/// Scale into a signed `bits`-wide integer, rounding half away from zero.
pub fn scale_to_signed(value: f64, scaler: f64, bits: u32) -> i64 {
    let max = max_value_of_field(bits.saturating_sub(1)) as i64;
    let scaled = value * scaler;
    if scaled >= max as f64 {
        max
    } else if scaled <= -(max as f64) {
        -max
    } else if scaled >= 0.0 {
        (scaled + 0.5) as i64
    } else {
        (scaled - 0.5) as i64
    }
}

pub fn signed_to_scaled(raw: i64, scaler: f64) -> f64 {
    raw as f64 / scaler
}

/// Two's complement bit pattern of `value` truncated to `bits`.
pub fn to_twos_complement(value: i64, bits: u32) -> u64 {
    (value as u64) & max_value_of_field(bits)
}

/// Sign-extend a `bits`-wide two's complement pattern.
pub fn sign_extend(raw: u64, bits: u32) -> i64 {
    if bits == 0 {
        return 0;
    }
    if bits >= 64 {
        return raw as i64;
    }
    let shift = 64 - bits;
    ((raw << shift) as i64) >> shift
}
