//! Benchmarks: bitfield packing, compact float conversion, checksums and frame detection
//! over a synthetic stream of back-to-back frames with noise between them.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use protocodec::bitfield::{decode_bitfield, encode_bitfield};
use protocodec::checksum::{crc32, fletcher16};
use protocodec::float::FloatFormat;
use protocodec::length::collapse;
use protocodec::{ChecksumKind, FrameDetector, FrameLayout, FrameStatus};

/// Field widths of a typical telemetry record (sums to 128 bits).
const WIDTHS: [u32; 10] = [1, 3, 4, 12, 20, 7, 9, 32, 24, 16];

fn stream(layout: &FrameLayout, frames: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..frames {
        let body: Vec<u8> = (0..(i % 200) as u8).collect();
        if let Ok(frame) = layout.encode(i as u8, &body) {
            out.extend_from_slice(&frame);
        }
        out.extend_from_slice(&[0x00, 0xA5, 0x13]);
    }
    out
}

fn bench_bitfield(c: &mut Criterion) {
    c.bench_function("bitfield_pack_unpack_record", |b| {
        let mut buf = [0u8; 16];
        b.iter(|| {
            let mut offset = 0usize;
            for &w in &WIDTHS {
                encode_bitfield(&mut buf, offset, w, black_box(0x5555_5555) & ((1u64 << w) - 1));
                offset += w as usize;
            }
            let mut sum = 0u64;
            offset = 0;
            for &w in &WIDTHS {
                sum = sum.wrapping_add(decode_bitfield(&buf, offset, w));
                offset += w as usize;
            }
            black_box(sum)
        })
    });
}

fn bench_float(c: &mut Criterion) {
    let half = FloatFormat::float16(10).expect("float16");
    let f24 = FloatFormat::float24(16).expect("float24");
    let values: Vec<f32> = (0..1024).map(|i| (i as f32 - 512.0) * 0.37).collect();
    c.bench_function("float16_encode_decode_1k", |b| {
        b.iter(|| values.iter().map(|&v| half.decode(half.encode(black_box(v)))).sum::<f32>())
    });
    c.bench_function("float24_encode_decode_1k", |b| {
        b.iter(|| values.iter().map(|&v| f24.decode(f24.encode(black_box(v)))).sum::<f32>())
    });
}

fn bench_checksums(c: &mut Criterion) {
    let data: Vec<u8> = (0..4096u32).map(|i| (i * 7) as u8).collect();
    c.bench_function("crc32_4k", |b| b.iter(|| crc32(black_box(&data))));
    c.bench_function("fletcher16_4k", |b| b.iter(|| fletcher16(black_box(&data))));
}

fn bench_frame_detector(c: &mut Criterion) {
    for (name, kind) in [("frame_detect_crc32", ChecksumKind::Crc32), ("frame_detect_fletcher16", ChecksumKind::Fletcher16)] {
        let layout = FrameLayout::new(0xA5, 0x5A).with_checksum(kind);
        let detector = FrameDetector::new(layout).expect("detector");
        let bytes = stream(&layout, 1000);
        c.bench_function(name, |b| {
            b.iter(|| {
                let mut rx = detector.receiver();
                let mut valid = 0usize;
                detector.feed(&mut rx, black_box(&bytes), |status, _| {
                    if status == FrameStatus::Valid {
                        valid += 1;
                    }
                });
                valid
            })
        });
    }
}

fn bench_length(c: &mut Criterion) {
    let expr = "2*N+4+3*M+1+N+(K+1)+8*M+12";
    c.bench_function("length_collapse", |b| b.iter(|| collapse(black_box(expr), true)));
}

criterion_group!(benches, bench_bitfield, bench_float, bench_checksums, bench_frame_detector, bench_length);
criterion_main!(benches);
