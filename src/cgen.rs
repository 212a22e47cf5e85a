//! C statements for bitfields at offsets known at generation time.
//!
//! The emitted code performs exactly the steps of [`encode_bitfield`] and
//! [`decode_bitfield`], unrolled for one field, so generated C and this crate agree bit
//! for bit. Fields wider than 32 bits need a 64-bit argument or target in the C code.
//!
//! [`encode_bitfield`]: crate::bitfield::encode_bitfield
//! [`decode_bitfield`]: crate::bitfield::decode_bitfield

use crate::bitfield::max_value_of_field;

fn shifted(expr: &str, op: &str, amount: u32) -> String {
    if amount == 0 {
        expr.to_string()
    } else {
        format!("{} {} {}", expr, op, amount)
    }
}

/// Statements writing `argument` into `numbits` bits of `array` at bit `offset`.
///
/// One statement per line; empty for a zero-width field.
pub fn encode_bitfield_c(array: &str, offset: usize, numbits: u32, argument: &str) -> String {
    let mut lines = Vec::new();
    if numbits == 0 {
        return String::new();
    }
    let mut index = offset / 8;
    let bit = (offset % 8) as u32;

    if bit + numbits <= 8 {
        let op = if bit == 0 { "=" } else { "|=" };
        let value = shifted(argument, "<<", 8 - (bit + numbits));
        lines.push(format!("{}[{}] {} (uint8_t)({});", array, index, op, value));
        return lines.join("\n");
    }

    let mut remaining = numbits;
    if bit != 0 {
        remaining -= 8 - bit;
        lines.push(format!("{}[{}] |= (uint8_t)({});", array, index, shifted(argument, ">>", remaining)));
        index += 1;
    }
    while remaining >= 8 {
        remaining -= 8;
        lines.push(format!("{}[{}] = (uint8_t)({});", array, index, shifted(argument, ">>", remaining)));
        index += 1;
    }
    if remaining > 0 {
        lines.push(format!("{}[{}] |= (uint8_t)({});", array, index, shifted(argument, "<<", 8 - remaining)));
    }
    lines.join("\n")
}

/// Statements reading `numbits` bits of `array` at bit `offset` into `target`.
pub fn decode_bitfield_c(array: &str, offset: usize, numbits: u32, target: &str) -> String {
    let mut lines = Vec::new();
    if numbits == 0 {
        return String::new();
    }
    let mut index = offset / 8;
    let bit = (offset % 8) as u32;
    let byte = |i: usize| format!("{}[{}]", array, i);

    if bit + numbits <= 8 {
        let raw = shifted(&byte(index), ">>", 8 - (bit + numbits));
        if bit == 0 {
            lines.push(format!("{} = {};", target, raw));
        } else {
            lines.push(format!("{} = ({}) & 0x{:X};", target, raw, max_value_of_field(numbits)));
        }
        return lines.join("\n");
    }

    let mut remaining = numbits;
    let mut started = false;
    if bit != 0 {
        let leading = 8 - bit;
        lines.push(format!("{} = {} & 0x{:X};", target, byte(index), max_value_of_field(leading)));
        remaining -= leading;
        index += 1;
        started = true;
    }
    while remaining >= 8 {
        if started {
            lines.push(format!("{} = ({} << 8) | {};", target, target, byte(index)));
        } else {
            lines.push(format!("{} = {};", target, byte(index)));
            started = true;
        }
        remaining -= 8;
        index += 1;
    }
    if remaining > 0 {
        lines.push(format!(
            "{} = ({} << {}) | ({} >> {});",
            target,
            target,
            remaining,
            byte(index),
            8 - remaining
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte_fields() {
        assert_eq!(encode_bitfield_c("data", 0, 3, "x"), "data[0] = (uint8_t)(x << 5);");
        assert_eq!(encode_bitfield_c("data", 6, 2, "x"), "data[0] |= (uint8_t)(x);");
        assert_eq!(decode_bitfield_c("data", 0, 3, "x"), "x = data[0] >> 5;");
        assert_eq!(decode_bitfield_c("data", 3, 3, "x"), "x = (data[0] >> 2) & 0x7;");
        assert_eq!(decode_bitfield_c("data", 8, 8, "x"), "x = data[1];");
        assert_eq!(encode_bitfield_c("data", 4, 0, "x"), "");
    }

    #[test]
    fn straddling_field() {
        // 12 bits from offset 6: 2 leading bits, 8 full, 2 trailing.
        assert_eq!(
            encode_bitfield_c("buf", 6, 12, "v"),
            "buf[0] |= (uint8_t)(v >> 10);\nbuf[1] = (uint8_t)(v >> 2);\nbuf[2] |= (uint8_t)(v << 6);"
        );
        assert_eq!(
            decode_bitfield_c("buf", 6, 12, "v"),
            "v = buf[0] & 0x3;\nv = (v << 8) | buf[1];\nv = (v << 2) | (buf[2] >> 6);"
        );
    }

    #[test]
    fn aligned_multi_byte_field() {
        assert_eq!(
            encode_bitfield_c("p", 16, 16, "n"),
            "p[2] = (uint8_t)(n >> 8);\np[3] = (uint8_t)(n);"
        );
        assert_eq!(decode_bitfield_c("p", 16, 16, "n"), "n = p[2];\nn = (n << 8) | p[3];");
        assert_eq!(
            encode_bitfield_c("p", 8, 12, "n"),
            "p[1] = (uint8_t)(n >> 4);\np[2] |= (uint8_t)(n << 4);"
        );
    }
}
