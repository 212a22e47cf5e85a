//! Symbolic encoded-length algebra.
//!
//! Lengths of generated structures are closed-form sums of integer constants and
//! `coefficient*symbol` terms, where a symbol is text only known at generation time (an
//! array-count field, a sub-structure's length macro, ...). [`LengthExpression`] keeps
//! such a sum as a tagged term list; [`EncodedLength`] tracks the three sums a structure
//! needs (`min`, `max`, `non_default`) as its fields are visited in order.
//!
//! ## Folding
//!
//! [`LengthExpression::collapse`] evaluates the whole expression numerically when it has
//! no symbols (rounding to the nearest integer). Otherwise it sums the constant terms,
//! merges symbol terms whose symbol text is identical by adding coefficients, and emits
//! `c1*sym1+c2*sym2+...+constant` with zero coefficients and a zero constant dropped.
//!
//! Parenthesized text is opaque: `3*(N+1)` is the symbol `(N+1)` with coefficient 3 and
//! never merges with `3*N+3`. A term holding a top-level `-` or `/` (`2*N-1`, `N/2`) is
//! a symbol as a whole with coefficient 1. The result is less simplified, never wrong.
//!
//! ```
//! use protocodec::length::collapse;
//!
//! assert_eq!(collapse("4+3", false), "7");
//! assert_eq!(collapse("2*N+3*N", false), "5*N");
//! assert_eq!(collapse("0", true), "0");
//! ```

use crate::expr;
use std::fmt;

/// One summand: a constant (`symbol == None`) or `coefficient*symbol`.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub coefficient: f64,
    pub symbol: Option<String>,
}

impl Term {
    pub fn constant(value: f64) -> Self {
        Term { coefficient: value, symbol: None }
    }

    pub fn symbolic(coefficient: f64, symbol: impl Into<String>) -> Self {
        Term {
            coefficient,
            symbol: Some(symbol.into()),
        }
    }

    fn parse(text: &str) -> Option<Term> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Ok(value) = expr::evaluate(text) {
            return Some(Term::constant(value));
        }
        if is_product(text) {
            if let Some(star) = find_top_level(text, '*') {
                let left = text[..star].trim();
                let right = text[star + 1..].trim();
                if let Ok(c) = expr::evaluate(left) {
                    if c.fract() == 0.0 && !right.is_empty() {
                        return Some(Term::symbolic(c, right));
                    }
                }
            }
        }
        Some(Term::symbolic(1.0, text))
    }

    fn render(&self) -> String {
        match &self.symbol {
            None => format_number(self.coefficient),
            Some(s) if self.coefficient == 1.0 => s.clone(),
            Some(s) if has_top_level_sum(s) => format!("{}*({})", format_number(self.coefficient), s),
            Some(s) => format!("{}*{}", format_number(self.coefficient), s),
        }
    }
}

/// A sum of [`Term`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LengthExpression {
    terms: Vec<Term>,
}

impl LengthExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `source` on top-level `+` into terms.
    pub fn parse(source: &str) -> Self {
        let mut e = LengthExpression::new();
        e.add(source);
        e
    }

    /// Append the terms of `source`.
    pub fn add(&mut self, source: &str) {
        if let Ok(value) = expr::evaluate(source) {
            self.terms.push(Term::constant(value));
            return;
        }
        self.terms.extend(split_top_level(source, '+').into_iter().filter_map(Term::parse));
    }

    pub fn add_constant(&mut self, value: i64) {
        self.terms.push(Term::constant(value as f64));
    }

    pub fn add_expression(&mut self, other: &LengthExpression) {
        self.terms.extend(other.terms.iter().cloned());
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// True when no term carries a symbol.
    pub fn is_constant(&self) -> bool {
        self.terms.iter().all(|t| t.symbol.is_none())
    }

    /// Rounded value when the expression has no symbols.
    pub fn constant_value(&self) -> Option<i64> {
        if self.is_constant() {
            Some(self.terms.iter().map(|t| t.coefficient).sum::<f64>().round() as i64)
        } else {
            None
        }
    }

    /// Unsimplified text: the terms joined with `+`.
    pub fn raw(&self) -> String {
        self.terms.iter().map(Term::render).collect::<Vec<_>>().join("+")
    }

    /// Folded text. With `keep_zero` an expression worth exactly zero is `"0"` instead of
    /// the empty string.
    pub fn collapse(&self, keep_zero: bool) -> String {
        self.fold(keep_zero, 0)
    }

    /// Folded text of the expression minus one (an inclusive count as a zero-based index).
    pub fn subtract_one(&self) -> String {
        self.fold(true, 1)
    }

    /// The expression multiplied by an array count.
    ///
    /// A constant is multiplied out, or prefixed by a symbolic count (`count*value`). A
    /// single symbol term keeps its coefficient and gains the count. A sum becomes
    /// `count*(sum)`.
    pub fn multiplied(&self, count: &str) -> LengthExpression {
        let count = count.trim();
        if count.is_empty() || count == "1" || self.is_empty() {
            return self.clone();
        }
        let numeric = expr::evaluate(count).ok();
        if let Some(value) = self.constant_value() {
            let terms = match numeric {
                _ if value == 0 => Vec::new(),
                Some(k) => vec![Term::constant(value as f64 * k)],
                None => vec![Term::symbolic(value as f64, count)],
            };
            return LengthExpression { terms };
        }
        let folded = self.folded_terms();
        if let [single] = folded.as_slice() {
            if let Some(symbol) = &single.symbol {
                let term = match numeric {
                    Some(k) => Term::symbolic(single.coefficient * k, symbol.clone()),
                    None => Term::symbolic(single.coefficient, multiply(count, symbol)),
                };
                return LengthExpression { terms: vec![term] };
            }
        }
        LengthExpression::parse(&multiply(count, &self.collapse(false)))
    }

    fn folded_terms(&self) -> Vec<Term> {
        let mut constant = 0.0;
        let mut symbols: Vec<Term> = Vec::new();
        for term in &self.terms {
            match &term.symbol {
                None => constant += term.coefficient,
                Some(s) => match symbols.iter_mut().find(|t| t.symbol.as_deref() == Some(s.as_str())) {
                    Some(existing) => existing.coefficient += term.coefficient,
                    None => symbols.push(term.clone()),
                },
            }
        }
        symbols.retain(|t| t.coefficient != 0.0);
        if constant.round() != 0.0 {
            symbols.push(Term::constant(constant.round()));
        }
        symbols
    }

    fn fold(&self, keep_zero: bool, minus: i64) -> String {
        if let Some(value) = self.constant_value() {
            let value = value - minus;
            return if value == 0 && !keep_zero { String::new() } else { value.to_string() };
        }
        let mut terms = self.folded_terms();
        if minus != 0 {
            let constant = terms.last_mut().filter(|t| t.symbol.is_none());
            match constant {
                Some(last) => last.coefficient = last.coefficient.round() - minus as f64,
                None => terms.push(Term::constant(-minus as f64)),
            }
            terms.retain(|t| t.symbol.is_some() || t.coefficient.round() != 0.0);
        }
        let out = terms.iter().map(Term::render).collect::<Vec<_>>().join("+");
        if out.is_empty() && keep_zero {
            "0".to_string()
        } else {
            out
        }
    }
}

impl fmt::Display for LengthExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.collapse(true))
    }
}

/// Fold `source`; see [`LengthExpression::collapse`].
pub fn collapse(source: &str, keep_zero: bool) -> String {
    LengthExpression::parse(source).collapse(keep_zero)
}

/// Fold `source` minus one; see [`LengthExpression::subtract_one`].
pub fn subtract_one(source: &str) -> String {
    LengthExpression::parse(source).subtract_one()
}

/// Textual product `count*expr`.
///
/// An empty or `"1"` count leaves `expr` alone. `expr` is parenthesized only when it
/// contains `+`, `-` or `/`.
pub fn multiply(count: &str, expr: &str) -> String {
    let count = count.trim();
    let expr = expr.trim();
    if expr.is_empty() || count.is_empty() || count == "1" {
        return expr.to_string();
    }
    if expr.contains(&['+', '-', '/'][..]) {
        format!("{}*({})", count, expr)
    } else {
        format!("{}*{}", count, expr)
    }
}

/// Flags describing how a field contributes to its structure's length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermFlags {
    /// Null-terminated string: contributes a fixed 1 to `min` and `non_default`.
    pub string: bool,
    /// Variable-length array: excluded from `min`.
    pub variable: bool,
    /// Present only when another field says so: excluded from `min`.
    pub dependent: bool,
    /// Omitted from the encoding when it holds its default value: excluded from `non_default`.
    pub default: bool,
}

/// The three length sums of one structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedLength {
    pub min: LengthExpression,
    pub max: LengthExpression,
    pub non_default: LengthExpression,
}

impl EncodedLength {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one field's length into the sums.
    pub fn add_term(&mut self, length: &str, flags: TermFlags) {
        if length.trim().is_empty() {
            return;
        }
        if !flags.default {
            if flags.string {
                self.non_default.add_constant(1);
            } else {
                self.non_default.add(length);
            }
        }
        if !flags.variable && !flags.dependent {
            if flags.string {
                self.min.add_constant(1);
            } else {
                self.min.add(length);
            }
        }
        self.max.add(length);
    }

    /// Fold a sub-structure repeated `array` (times `array2d`) times into the sums.
    pub fn add_group(&mut self, right: &EncodedLength, array: &str, variable: bool, dependent: bool, array2d: &str) {
        let count = array_count(array, array2d);
        if !variable && !dependent {
            self.min.add_expression(&right.min.multiplied(&count));
        }
        self.max.add_expression(&right.max.multiplied(&count));
        self.non_default.add_expression(&right.non_default.multiplied(&count));
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn min_length(&self) -> String {
        self.min.collapse(true)
    }

    pub fn max_length(&self) -> String {
        self.max.collapse(true)
    }

    pub fn non_default_length(&self) -> String {
        self.non_default.collapse(true)
    }

    /// True when the structure never occupies any bytes.
    pub fn is_zero_length(&self) -> bool {
        self.max.constant_value() == Some(0)
    }

    /// True when the minimum and maximum differ.
    pub fn is_variable(&self) -> bool {
        self.min_length() != self.max_length()
    }
}

fn array_count(array: &str, array2d: &str) -> String {
    let (a, b) = (array.trim(), array2d.trim());
    match (a.is_empty(), b.is_empty()) {
        (true, true) => String::new(),
        (false, true) => a.to_string(),
        (true, false) => b.to_string(),
        (false, false) => match (expr::evaluate(a), expr::evaluate(b)) {
            (Ok(x), Ok(y)) => format_number(x * y),
            _ => format!("{}*{}", a, b),
        },
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Byte index of the first `needle` outside any parentheses.
fn find_top_level(text: &str, needle: char) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c == needle && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// True when `text` has a top-level `+`, `-`, `/` or `%`, a leading sign included.
fn has_top_level_sum(text: &str) -> bool {
    top_level_operator(text, true)
}

/// True when `text` is a plain product: no top-level `+`, `-`, `/` or `%` apart from a
/// leading sign.
fn is_product(text: &str) -> bool {
    !top_level_operator(text.trim(), false)
}

fn top_level_operator(text: &str, count_leading: bool) -> bool {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '+' | '-' if depth == 0 && i == 0 && !count_leading => {}
            '+' | '-' | '/' | '%' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_basics() {
        assert_eq!(collapse("4+3", false), "7");
        assert_eq!(collapse("2*N+3*N", false), "5*N");
        assert_eq!(collapse("0", true), "0");
        assert_eq!(collapse("0", false), "");
        assert_eq!(collapse("", true), "0");
        assert_eq!(collapse("7/2", false), "4");
    }

    #[test]
    fn collapse_mixed_terms() {
        assert_eq!(collapse("1+N+2+2*M+3*N", false), "4*N+2*M+3");
        assert_eq!(collapse("N+2-2", false), "N");
        assert_eq!(collapse("2*N+-2*N+1", false), "1");
        assert_eq!(collapse("2*N + 3", false), "2*N+3");
    }

    #[test]
    fn parentheses_are_opaque() {
        assert_eq!(collapse("3*(N+1)+3*N+3", false), "3*(N+1)+3*N+3");
        assert_eq!(collapse("(N+1)+(N+1)", false), "2*(N+1)");
        assert_eq!(collapse("2*(3+4)+1", false), "15");
    }

    #[test]
    fn subtract_one_adjusts_constant() {
        assert_eq!(subtract_one("4+3"), "6");
        assert_eq!(subtract_one("N+3"), "N+2");
        assert_eq!(subtract_one("N+1"), "N");
        assert_eq!(subtract_one("N"), "N+-1");
        assert_eq!(subtract_one("1"), "0");
    }

    #[test]
    fn multiply_parenthesizes_only_sums() {
        assert_eq!(multiply("", "2+N"), "2+N");
        assert_eq!(multiply("1", "2+N"), "2+N");
        assert_eq!(multiply("M", "2+N"), "M*(2+N)");
        assert_eq!(multiply("M", "N-1"), "M*(N-1)");
        assert_eq!(multiply("M", "N/2"), "M*(N/2)");
        assert_eq!(multiply("M", "2*N"), "M*2*N");
    }

    #[test]
    fn multiplied_by_counts() {
        let e = LengthExpression::parse("2*N+3");
        assert_eq!(e.multiplied("4").collapse(false), "4*(2*N+3)");
        assert_eq!(e.multiplied("M").collapse(false), "M*(2*N+3)");
        assert_eq!(LengthExpression::parse("6").multiplied("M").collapse(false), "6*M");
        assert_eq!(LengthExpression::parse("2*N").multiplied("M").collapse(false), "2*M*N");
        assert_eq!(LengthExpression::parse("0").multiplied("M").collapse(true), "0");
        assert_eq!(LengthExpression::parse("6").multiplied("4").collapse(false), "24");
        assert_eq!(LengthExpression::parse("2*N").multiplied("3").collapse(false), "6*N");
    }

    #[test]
    fn minus_and_divide_terms_are_whole_symbols() {
        assert_eq!(Term::parse("2*N-1"), Some(Term::symbolic(1.0, "2*N-1")));
        assert_eq!(Term::parse("4*N/2"), Some(Term::symbolic(1.0, "4*N/2")));
        assert_eq!(Term::parse("3-2*N"), Some(Term::symbolic(1.0, "3-2*N")));
        assert_eq!(Term::parse("-2*N"), Some(Term::symbolic(-2.0, "N")));
        assert_eq!(Term::symbolic(2.0, "N-1").render(), "2*(N-1)");
        assert_eq!(Term::symbolic(2.0, "(N-1)").render(), "2*(N-1)");
        assert_eq!(Term::symbolic(1.0, "N-1").render(), "N-1");
        assert_eq!(collapse("2*N-1+N-1", false), "2*N-1+N-1");
        assert_eq!(collapse("N-1+N-1", false), "2*(N-1)");
    }
}
