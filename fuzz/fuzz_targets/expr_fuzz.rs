//! Expression fuzz target: arbitrary text through the evaluator and length folding.
//! Neither may panic; a numeric result is always finite.
//! Build with: cargo fuzz run expr_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    if let Ok(v) = protocodec::expr::evaluate(s) {
        assert!(v.is_finite());
    }
    let _ = protocodec::length::collapse(s, true);
    let _ = protocodec::length::subtract_one(s);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run expr_fuzz");
}
