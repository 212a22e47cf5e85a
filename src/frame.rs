//! Packet framing on a byte stream.
//!
//! A frame is `[sync0][sync1][type][length][body][checksum]`: two sync bytes, a packet
//! type byte, a little-endian body length (1 or 2 bytes) and a trailing checksum covering
//! every byte from `sync0` through the end of the body.
//!
//! [`FrameDetector`] finds frame boundaries one byte at a time. All per-stream state lives
//! in a caller-owned [`FrameReceiver`], so one detector can serve any number of streams;
//! a single receiver must be driven by one reader at a time.

use crate::checksum::ChecksumKind;
use crate::codec::CodecError;
use byteorder::{ByteOrder, LittleEndian};
use std::io::{self, Read};
use tracing::{debug, trace};

/// Width of the little-endian body-length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthWidth {
    U8,
    U16,
}

impl LengthWidth {
    pub fn bytes(self) -> usize {
        match self {
            LengthWidth::U8 => 1,
            LengthWidth::U16 => 2,
        }
    }

    /// Largest body length the field can declare.
    pub fn max_body(self) -> usize {
        match self {
            LengthWidth::U8 => u8::MAX as usize,
            LengthWidth::U16 => u16::MAX as usize,
        }
    }
}

/// Wire layout of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub sync: [u8; 2],
    pub length_width: LengthWidth,
    pub checksum: ChecksumKind,
    /// Upper bound on a whole frame, header and checksum included.
    pub max_frame_size: usize,
}

impl FrameLayout {
    /// One-byte length, CRC-32, and a maximum size fitting the largest declarable body.
    pub fn new(sync0: u8, sync1: u8) -> Self {
        let mut layout = FrameLayout {
            sync: [sync0, sync1],
            length_width: LengthWidth::U8,
            checksum: ChecksumKind::Crc32,
            max_frame_size: 0,
        };
        layout.max_frame_size = layout.overhead() + layout.length_width.max_body();
        layout
    }

    /// Changing the checksum keeps room for the same largest body.
    pub fn with_checksum(mut self, checksum: ChecksumKind) -> Self {
        let body = self.max_frame_size.saturating_sub(self.overhead());
        self.checksum = checksum;
        self.max_frame_size = self.overhead() + body;
        self
    }

    /// Also resets the maximum frame size to fit the largest declarable body.
    pub fn with_length_width(mut self, length_width: LengthWidth) -> Self {
        self.length_width = length_width;
        self.max_frame_size = self.overhead() + length_width.max_body();
        self
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Sync, type and length bytes.
    pub fn header_len(&self) -> usize {
        3 + self.length_width.bytes()
    }

    /// Header plus checksum bytes.
    pub fn overhead(&self) -> usize {
        self.header_len() + self.checksum.field_len()
    }

    pub fn validate(&self) -> Result<(), CodecError> {
        if self.max_frame_size <= self.overhead() {
            return Err(CodecError::InvalidLayout(format!(
                "max frame size {} leaves no room for a body (overhead {})",
                self.max_frame_size,
                self.overhead()
            )));
        }
        Ok(())
    }

    /// Build a complete frame around `body`.
    pub fn encode(&self, packet_type: u8, body: &[u8]) -> Result<Vec<u8>, CodecError> {
        let len = self.overhead() + body.len();
        if body.len() > self.length_width.max_body() {
            return Err(CodecError::FrameTooLarge {
                len,
                max: self.overhead() + self.length_width.max_body(),
            });
        }
        if len > self.max_frame_size {
            return Err(CodecError::FrameTooLarge {
                len,
                max: self.max_frame_size,
            });
        }
        let mut out = Vec::with_capacity(len);
        out.extend_from_slice(&self.sync);
        out.push(packet_type);
        match self.length_width {
            LengthWidth::U8 => out.push(body.len() as u8),
            LengthWidth::U16 => {
                let mut field = [0u8; 2];
                LittleEndian::write_u16(&mut field, body.len() as u16);
                out.extend_from_slice(&field);
            }
        }
        out.extend_from_slice(body);
        self.checksum.append(&mut out);
        Ok(out)
    }

    /// Body length declared by a header; `None` until the header is complete.
    pub fn declared_len(&self, header: &[u8]) -> Option<usize> {
        if header.len() < self.header_len() {
            return None;
        }
        Some(match self.length_width {
            LengthWidth::U8 => header[3] as usize,
            LengthWidth::U16 => LittleEndian::read_u16(&header[3..5]) as usize,
        })
    }

    /// Split a complete frame into its fields. Does not verify the checksum.
    pub fn split<'a>(&self, frame: &'a [u8]) -> Option<FrameParts<'a>> {
        let body_len = self.declared_len(frame)?;
        let start = self.header_len();
        let end = start + body_len;
        if frame.len() != end + self.checksum.field_len() || frame[..2] != self.sync {
            return None;
        }
        Some(FrameParts {
            packet_type: frame[2],
            body: &frame[start..end],
            checksum: self.checksum.read(&frame[end..]),
        })
    }
}

/// Fields of a complete frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameParts<'a> {
    pub packet_type: u8,
    pub body: &'a [u8],
    pub checksum: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    SeekSync0,
    SeekSync1,
    Accumulating,
}

/// Outcome of pushing one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// No frame completed on this byte.
    Pending,
    Valid,
    /// Complete frame whose checksum did not match; discarded.
    Invalid,
}

/// Per-stream scan state.
#[derive(Debug, Clone)]
pub struct FrameReceiver {
    state: ScanState,
    buffer: Vec<u8>,
    count: usize,
    complete: bool,
}

impl Default for FrameReceiver {
    fn default() -> Self {
        FrameReceiver::new()
    }
}

impl FrameReceiver {
    pub fn new() -> Self {
        FrameReceiver {
            state: ScanState::SeekSync0,
            buffer: Vec::new(),
            count: 0,
            complete: false,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Bytes accumulated for the frame in progress.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The frame completed by the last pushed byte, valid or not.
    pub fn frame(&self) -> Option<&[u8]> {
        if self.complete {
            Some(&self.buffer)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.state = ScanState::SeekSync0;
        self.buffer.clear();
        self.count = 0;
        self.complete = false;
    }

    fn start(&mut self, byte: u8) {
        self.buffer.clear();
        self.buffer.push(byte);
        self.count = 1;
        self.state = ScanState::SeekSync1;
    }
}

/// Byte-at-a-time frame boundary detector for one [`FrameLayout`].
#[derive(Debug, Clone, Copy)]
pub struct FrameDetector {
    layout: FrameLayout,
}

impl FrameDetector {
    pub fn new(layout: FrameLayout) -> Result<Self, CodecError> {
        layout.validate()?;
        Ok(FrameDetector { layout })
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn receiver(&self) -> FrameReceiver {
        FrameReceiver {
            buffer: Vec::with_capacity(self.layout.max_frame_size),
            ..FrameReceiver::new()
        }
    }

    /// Advance `rx` by one byte.
    pub fn push(&self, rx: &mut FrameReceiver, byte: u8) -> FrameStatus {
        let [sync0, sync1] = self.layout.sync;
        rx.complete = false;
        match rx.state {
            ScanState::SeekSync0 => {
                rx.buffer.clear();
                rx.count = 0;
                if byte == sync0 {
                    rx.start(byte);
                }
                FrameStatus::Pending
            }
            ScanState::SeekSync1 => {
                if byte == sync1 {
                    rx.buffer.push(byte);
                    rx.count += 1;
                    rx.state = ScanState::Accumulating;
                } else if byte == sync0 {
                    rx.start(byte);
                } else {
                    rx.reset();
                }
                FrameStatus::Pending
            }
            ScanState::Accumulating => {
                rx.buffer.push(byte);
                rx.count += 1;
                if let Some(body_len) = self.layout.declared_len(&rx.buffer) {
                    let expected = body_len + self.layout.overhead();
                    if rx.count == expected {
                        return self.finish(rx);
                    }
                }
                if rx.count >= self.layout.max_frame_size {
                    trace!(count = rx.count, max = self.layout.max_frame_size, "frame overran max size, resyncing");
                    rx.reset();
                }
                FrameStatus::Pending
            }
        }
    }

    fn finish(&self, rx: &mut FrameReceiver) -> FrameStatus {
        rx.state = ScanState::SeekSync0;
        rx.complete = true;
        if self.layout.checksum.verify(&rx.buffer) {
            FrameStatus::Valid
        } else {
            debug!(len = rx.buffer.len(), packet_type = rx.buffer[2], "checksum mismatch, frame discarded");
            FrameStatus::Invalid
        }
    }

    /// Push every byte of `bytes`, calling `on_frame` with each completed frame.
    pub fn feed<F>(&self, rx: &mut FrameReceiver, bytes: &[u8], mut on_frame: F)
    where
        F: FnMut(FrameStatus, &[u8]),
    {
        for &byte in bytes {
            let status = self.push(rx, byte);
            if status != FrameStatus::Pending {
                on_frame(status, &rx.buffer);
            }
        }
    }

    /// Run the detector over everything `reader` yields.
    ///
    /// `on_frame` receives the stream offset of each completed frame's first byte. Returns
    /// the number of bytes consumed.
    pub fn scan<R, F>(&self, rx: &mut FrameReceiver, mut reader: R, mut on_frame: F) -> io::Result<u64>
    where
        R: Read,
        F: FnMut(u64, FrameStatus, &[u8]),
    {
        let mut chunk = [0u8; 4096];
        let mut consumed = 0u64;
        loop {
            let n = match reader.read(&mut chunk) {
                Ok(0) => return Ok(consumed),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            for &byte in &chunk[..n] {
                consumed += 1;
                let status = self.push(rx, byte);
                if status != FrameStatus::Pending {
                    on_frame(consumed - rx.buffer.len() as u64, status, &rx.buffer);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> FrameDetector {
        FrameDetector::new(FrameLayout::new(0xA5, 0x5A)).unwrap()
    }

    #[test]
    fn encode_layout() {
        let layout = FrameLayout::new(0xA5, 0x5A).with_checksum(ChecksumKind::Fletcher16);
        let frame = layout.encode(7, b"abc").unwrap();
        assert_eq!(&frame[..7], &[0xA5, 0x5A, 7, 3, b'a', b'b', b'c']);
        assert_eq!(frame.len(), 9);
        let parts = layout.split(&frame).unwrap();
        assert_eq!(parts.packet_type, 7);
        assert_eq!(parts.body, b"abc");
        assert_eq!(parts.checksum, crate::checksum::fletcher16(&frame[..7]) as u32);
    }

    #[test]
    fn sixteen_bit_length_is_little_endian() {
        let layout = FrameLayout::new(1, 2).with_length_width(LengthWidth::U16);
        let body = vec![0u8; 300];
        let frame = layout.encode(0, &body).unwrap();
        assert_eq!(&frame[3..5], &[0x2C, 0x01]);
        assert_eq!(frame.len(), 5 + 300 + 4);
    }

    #[test]
    fn oversized_body_rejected() {
        let layout = FrameLayout::new(1, 2);
        assert!(matches!(layout.encode(0, &[0u8; 256]), Err(CodecError::FrameTooLarge { .. })));
        let small = layout.with_max_frame_size(16);
        assert!(matches!(small.encode(0, &[0u8; 9]), Err(CodecError::FrameTooLarge { len: 17, max: 16 })));
        assert!(small.encode(0, &[0u8; 8]).is_ok());
    }

    #[test]
    fn layout_must_leave_room() {
        assert!(FrameDetector::new(FrameLayout::new(1, 2).with_max_frame_size(8)).is_err());
        assert!(FrameDetector::new(FrameLayout::new(1, 2).with_max_frame_size(9)).is_ok());
    }

    #[test]
    fn valid_frame_completes_on_last_byte() {
        let det = detector();
        let frame = det.layout().encode(3, b"hello").unwrap();
        let mut rx = det.receiver();
        for (i, &b) in frame.iter().enumerate() {
            let status = det.push(&mut rx, b);
            if i + 1 == frame.len() {
                assert_eq!(status, FrameStatus::Valid);
            } else {
                assert_eq!(status, FrameStatus::Pending);
            }
        }
        assert_eq!(rx.frame(), Some(frame.as_slice()));
        assert_eq!(rx.state(), ScanState::SeekSync0);
        det.push(&mut rx, 0);
        assert_eq!(rx.frame(), None);
    }

    #[test]
    fn sync0_repeat_reanchors() {
        let det = detector();
        let frame = det.layout().encode(1, b"x").unwrap();
        let mut rx = det.receiver();
        let mut stream = vec![0xA5, 0xA5, 0xA5];
        stream.extend_from_slice(&frame[1..]);
        let mut seen = Vec::new();
        det.feed(&mut rx, &stream, |status, bytes| seen.push((status, bytes.to_vec())));
        assert_eq!(seen, vec![(FrameStatus::Valid, frame)]);
    }

    #[test]
    fn empty_body_frame() {
        let det = detector();
        let frame = det.layout().encode(9, &[]).unwrap();
        assert_eq!(frame.len(), 8);
        let mut rx = det.receiver();
        let mut count = 0;
        det.feed(&mut rx, &frame, |status, _| {
            assert_eq!(status, FrameStatus::Valid);
            count += 1;
        });
        assert_eq!(count, 1);
    }
}
