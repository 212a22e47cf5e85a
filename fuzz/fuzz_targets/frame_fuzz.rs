//! Frame detector fuzz target: arbitrary bytes through every layout.
//! Pushing bytes must never panic, and every reported frame must split cleanly.
//! Build with: cargo fuzz run frame_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    use protocodec::{ChecksumKind, FrameDetector, FrameLayout, LengthWidth};

    let Some((&selector, stream)) = data.split_first() else {
        return;
    };
    let mut layout = FrameLayout::new(0xA5, 0x5A);
    if selector & 1 != 0 {
        layout = layout.with_checksum(ChecksumKind::Fletcher16);
    }
    if selector & 2 != 0 {
        layout = layout.with_length_width(LengthWidth::U16);
    }
    if selector & 4 != 0 {
        layout = layout.with_max_frame_size(16 + (selector >> 3) as usize);
    }
    let Ok(detector) = FrameDetector::new(layout) else {
        return;
    };
    let mut rx = detector.receiver();
    detector.feed(&mut rx, stream, |_, frame| {
        assert!(layout.split(frame).is_some());
    });
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run frame_fuzz");
}
