//! Scan byte streams for frames and report each one.
//!
//! Usage:
//!   frame_scan [OPTIONS] [FILE ...]
//!   frame_scan [OPTIONS] < capture.bin
//!
//! Prints one line per completed frame (stream offset, packet type, body length and
//! whether the checksum matched), then a summary on stderr. Exits with status 1 if any
//! frame failed its checksum.
//!
//! Options:
//!   --sync HEX       Two sync bytes as four hex digits (default A55A)
//!   --fletcher       Fletcher-16 checksum instead of CRC-32
//!   --len16          Two-byte little-endian length field
//!   --max N          Maximum frame size in bytes
//!   --verbose, -v    Log discarded frames (RUST_LOG overrides)

use anyhow::{anyhow, bail, Context};
use protocodec::{ChecksumKind, FrameDetector, FrameLayout, FrameStatus, LengthWidth};
use std::fs::File;
use std::io::{self, BufReader};

#[derive(Default)]
struct Totals {
    valid: usize,
    invalid: usize,
}

fn take_flag(args: &mut Vec<String>, names: &[&str]) -> bool {
    if let Some(pos) = args.iter().position(|a| names.contains(&a.as_str())) {
        args.remove(pos);
        true
    } else {
        false
    }
}

fn take_value(args: &mut Vec<String>, name: &str) -> anyhow::Result<Option<String>> {
    match args.iter().position(|a| a == name) {
        Some(pos) if pos + 1 < args.len() => {
            let value = args.remove(pos + 1);
            args.remove(pos);
            Ok(Some(value))
        }
        Some(_) => bail!("{} needs a value", name),
        None => Ok(None),
    }
}

fn parse_sync(hex: &str) -> anyhow::Result<[u8; 2]> {
    if hex.len() != 4 {
        bail!("--sync expects four hex digits, got {:?}", hex);
    }
    let v = u16::from_str_radix(hex, 16).map_err(|e| anyhow!("--sync {:?}: {}", hex, e))?;
    Ok(v.to_be_bytes())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn report(name: &str, layout: &FrameLayout, totals: &mut Totals, offset: u64, status: FrameStatus, frame: &[u8]) {
    let Some(parts) = layout.split(frame) else {
        return;
    };
    let verdict = match status {
        FrameStatus::Valid => {
            totals.valid += 1;
            "valid"
        }
        _ => {
            totals.invalid += 1;
            "invalid"
        }
    };
    println!(
        "{}:{}: type=0x{:02X} len={} {}",
        name,
        offset,
        parts.packet_type,
        parts.body.len(),
        verdict
    );
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let verbose = take_flag(&mut args, &["--verbose", "-v"]);
    let fletcher = take_flag(&mut args, &["--fletcher"]);
    let len16 = take_flag(&mut args, &["--len16"]);
    let sync = match take_value(&mut args, "--sync")? {
        Some(hex) => parse_sync(&hex)?,
        None => [0xA5, 0x5A],
    };
    let max = take_value(&mut args, "--max")?
        .map(|v| v.parse::<usize>().with_context(|| format!("--max {:?}", v)))
        .transpose()?;
    init_logging(verbose);

    let mut layout = FrameLayout::new(sync[0], sync[1]);
    if len16 {
        layout = layout.with_length_width(LengthWidth::U16);
    }
    if fletcher {
        layout = layout.with_checksum(ChecksumKind::Fletcher16);
    }
    if let Some(max) = max {
        layout = layout.with_max_frame_size(max);
    }
    let detector = FrameDetector::new(layout)?;

    let mut totals = Totals::default();
    let mut scanned = 0u64;
    if args.is_empty() {
        let mut rx = detector.receiver();
        scanned += detector.scan(&mut rx, io::stdin().lock(), |offset, status, frame| {
            report("<stdin>", &layout, &mut totals, offset, status, frame)
        })?;
    } else {
        for path in &args {
            let file = File::open(path).with_context(|| format!("{}: open failed", path))?;
            let mut rx = detector.receiver();
            scanned += detector
                .scan(&mut rx, BufReader::new(file), |offset, status, frame| {
                    report(path, &layout, &mut totals, offset, status, frame)
                })
                .with_context(|| format!("{}: read failed", path))?;
        }
    }

    eprintln!(
        "frame_scan: {} byte(s), {} valid frame(s), {} invalid frame(s)",
        scanned, totals.valid, totals.invalid
    );
    if totals.invalid > 0 {
        std::process::exit(1);
    }
    Ok(())
}
