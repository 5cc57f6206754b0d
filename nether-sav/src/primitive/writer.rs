//! Live output buffer with running byte counter

use super::Guid;
use crate::error::{Result, SavError};

/// Start of a measured span, taken from the running byte counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanStart(u64);

/// Append-only byte buffer used by every encoder.
///
/// `position()` counts every byte written since the session started, including
/// bytes already drained into chunks. Length prefixes are measured as the delta
/// of that counter around the encoded payload, so nothing is ever built in a
/// scratch buffer first.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
    drained: u64,
}

impl ByteWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty writer with preallocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            drained: 0,
        }
    }

    /// Total bytes written so far, drained or not
    pub fn position(&self) -> u64 {
        self.drained + self.buf.len() as u64
    }

    /// Bytes currently held in the live buffer
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// View of the live buffer
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Consume the writer and return the live buffer
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Remove the first `len` bytes of the live buffer.
    ///
    /// Offsets previously returned by [`reserve_i32`](Self::reserve_i32) shift
    /// down by `len`; callers tracking them must rebase.
    pub fn drain_front(&mut self, len: usize) -> Vec<u8> {
        let len = len.min(self.buf.len());
        let rest = self.buf.split_off(len);
        self.drained += len as u64;
        std::mem::replace(&mut self.buf, rest)
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// 64-bit values are two little-endian words, low word first
    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_guid(&mut self, guid: &Guid) {
        self.buf.extend_from_slice(guid);
    }

    /// Write an engine string, choosing the single-byte path for pure ASCII
    pub fn write_string(&mut self, value: &str) {
        if value.is_empty() {
            self.write_i32(0);
            return;
        }

        if value.is_ascii() {
            self.write_i32(value.len() as i32 + 1);
            self.buf.extend_from_slice(value.as_bytes());
            self.buf.push(0);
        } else {
            let units: Vec<u16> = value.encode_utf16().collect();
            self.write_i32(-(units.len() as i32) - 1);
            for unit in units {
                self.buf.extend_from_slice(&unit.to_le_bytes());
            }
            self.buf.extend_from_slice(&[0, 0]);
        }
    }

    /// Write a zero i32 placeholder and return its offset in the live buffer
    pub fn reserve_i32(&mut self) -> usize {
        let offset = self.buf.len();
        self.write_i32(0);
        offset
    }

    /// Overwrite a previously reserved i32 in the live buffer
    pub fn patch_i32(&mut self, offset: usize, value: i32) {
        self.buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Begin a measured span at the current position
    pub fn span_start(&self) -> SpanStart {
        SpanStart(self.position())
    }

    /// Bytes written since `start`
    pub fn span_len(&self, start: SpanStart) -> u64 {
        self.position() - start.0
    }

    /// Patch the reserved slot at `offset` with the length of the span since `start`
    pub fn patch_span(&mut self, offset: usize, start: SpanStart) -> Result<u32> {
        let len = u32::try_from(self.span_len(start))
            .ok()
            .filter(|len| *len <= i32::MAX as u32)
            .ok_or_else(|| SavError::CorruptData("length prefix exceeds i32 range".into()))?;
        self.patch_i32(offset, len as i32);
        Ok(len)
    }
}
