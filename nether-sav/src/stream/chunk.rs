//! Chunk container: splitting, backpatching, compression and framing
//!
//! Each chunk on disk is a 48-byte frame followed by a zlib stream:
//!
//! ```text
//! u32 tag, 0 | u32 max, 0 | u32 compressed, 0 | u32 uncompressed, 0 | u32 compressed, 0 | u32 uncompressed, 0
//! ```
//!
//! The assembler owns the live [`ByteWriter`]. Whenever the live buffer is cut
//! into a chunk, placeholders that fall inside the cut travel with the chunk.
//! A chunk is compressed as soon as none of its placeholders are pending; until
//! then it is held raw. The first chunk always waits for the total inflated
//! length, which is only known at [`finish`](ChunkAssembler::finish).

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};
use tracing::debug;

use crate::{
    PACKAGE_FILE_TAG,
    config::CodecConfig,
    error::{Result, SavError},
    primitive::{ByteWriter, SpanStart},
};

/// Size of the frame preceding every chunk payload
pub const CHUNK_HEADER_LEN: usize = 48;

/// Handle to a reserved 4-byte length field.
///
/// Not `Clone`: resolving consumes the handle, so a slot is written once.
#[derive(Debug, PartialEq, Eq)]
pub struct PlaceholderKey(u32);

#[derive(Debug, Clone, Copy)]
struct Slot {
    key: u32,
    /// Relative to the start of the owning buffer; negative when the slot began
    /// in an earlier chunk
    offset: i64,
}

#[derive(Debug)]
enum Chunk {
    Compressed { data: Vec<u8>, uncompressed_len: usize },
    Deferred { raw: Vec<u8>, pending: Vec<Slot> },
}

impl Chunk {
    fn uncompressed_len(&self) -> usize {
        match self {
            Chunk::Compressed {
                uncompressed_len, ..
            } => *uncompressed_len,
            Chunk::Deferred { raw, .. } => raw.len(),
        }
    }
}

/// Write `bytes` at `offset`, clipping whatever falls outside `buf`
fn patch_bytes(buf: &mut [u8], offset: i64, bytes: &[u8]) {
    for (i, byte) in bytes.iter().enumerate() {
        let at = offset + i as i64;
        if at >= 0 && (at as usize) < buf.len() {
            buf[at as usize] = *byte;
        }
    }
}

fn deflate(raw: &[u8], level: Compression) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), level);
    encoder
        .write_all(raw)
        .map_err(|e| SavError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| SavError::Compression(e.to_string()))
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| SavError::InvalidChunk(format!("{what} {value} does not fit a chunk header")))
}

/// Splits the encoded body into compressed chunks as it is produced
#[derive(Debug)]
pub struct ChunkAssembler {
    writer: ByteWriter,
    max_chunk_size: usize,
    compression: Compression,
    chunks: Vec<Chunk>,
    /// Unresolved placeholders that still have bytes in the live buffer
    open: Vec<Slot>,
    next_key: u32,
    inflated_len: Option<PlaceholderKey>,
}

impl ChunkAssembler {
    /// Start a body; the leading total-inflated-length field is reserved here
    pub fn new(config: &CodecConfig) -> Self {
        let mut assembler = Self {
            writer: ByteWriter::with_capacity(config.max_chunk_size + CHUNK_HEADER_LEN),
            max_chunk_size: config.max_chunk_size.max(1),
            compression: config.compression(),
            chunks: Vec::new(),
            open: Vec::new(),
            next_key: 0,
            inflated_len: None,
        };
        assembler.inflated_len = Some(assembler.reserve());
        assembler
    }

    pub fn writer(&mut self) -> &mut ByteWriter {
        &mut self.writer
    }

    /// Bytes waiting in the live buffer
    pub fn live_len(&self) -> usize {
        self.writer.len()
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Chunks cut so far
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Write a zero i32 at the current position and return its handle
    pub fn reserve(&mut self) -> PlaceholderKey {
        let offset = self.writer.reserve_i32() as i64;
        let key = self.next_key;
        self.next_key += 1;
        self.open.push(Slot { key, offset });
        PlaceholderKey(key)
    }

    /// Fill a placeholder, wherever its bytes currently live
    pub fn resolve(&mut self, key: PlaceholderKey, value: i32) -> Result<()> {
        let bytes = value.to_le_bytes();
        let mut found = false;

        if let Some(idx) = self.open.iter().position(|slot| slot.key == key.0) {
            let slot = self.open.remove(idx);
            patch_bytes(self.writer.as_mut_slice(), slot.offset, &bytes);
            found = true;
        }

        for idx in 0..self.chunks.len() {
            let ready = match &mut self.chunks[idx] {
                Chunk::Deferred { raw, pending } => {
                    let before = pending.len();
                    pending.retain(|slot| {
                        if slot.key == key.0 {
                            patch_bytes(raw, slot.offset, &bytes);
                            false
                        } else {
                            true
                        }
                    });
                    found |= pending.len() != before;
                    pending.is_empty()
                }
                Chunk::Compressed { .. } => false,
            };
            if ready {
                self.compress_chunk(idx)?;
            }
        }

        if !found {
            return Err(SavError::CorruptData(format!(
                "placeholder {} is not pending",
                key.0
            )));
        }
        Ok(())
    }

    /// Fill a placeholder with the byte length written since `start`
    pub fn resolve_span(&mut self, key: PlaceholderKey, start: SpanStart) -> Result<u32> {
        let len = self.writer.span_len(start);
        let value = i32::try_from(len)
            .map_err(|_| SavError::CorruptData(format!("section length {len} exceeds i32 range")))?;
        self.resolve(key, value)?;
        Ok(value as u32)
    }

    fn compress_chunk(&mut self, idx: usize) -> Result<()> {
        if let Chunk::Deferred { raw, .. } = &self.chunks[idx] {
            let uncompressed_len = raw.len();
            let data = deflate(raw, self.compression)?;
            debug!(
                chunk = idx,
                uncompressed = uncompressed_len,
                compressed = data.len(),
                "compressed deferred chunk"
            );
            self.chunks[idx] = Chunk::Compressed {
                uncompressed_len,
                data,
            };
        }
        Ok(())
    }

    /// Move the first `len` live bytes into a new chunk
    fn cut(&mut self, len: usize) -> Result<()> {
        let raw = self.writer.drain_front(len);
        let len = raw.len() as i64;

        let pending: Vec<Slot> = self
            .open
            .iter()
            .filter(|slot| slot.offset < len && slot.offset + 4 > 0)
            .copied()
            .collect();
        for slot in &mut self.open {
            slot.offset -= len;
        }
        self.open.retain(|slot| slot.offset + 4 > 0);

        let idx = self.chunks.len();
        if pending.is_empty() {
            let data = deflate(&raw, self.compression)?;
            debug!(
                chunk = idx,
                uncompressed = raw.len(),
                compressed = data.len(),
                "chunk compressed"
            );
            self.chunks.push(Chunk::Compressed {
                uncompressed_len: raw.len(),
                data,
            });
        } else {
            debug!(
                chunk = idx,
                uncompressed = raw.len(),
                pending = pending.len(),
                "chunk deferred until placeholders resolve"
            );
            self.chunks.push(Chunk::Deferred { raw, pending });
        }
        Ok(())
    }

    /// Cut chunks of exactly `max_chunk_size` while the live buffer holds that much
    pub fn cut_full_chunks(&mut self) -> Result<()> {
        while self.writer.len() >= self.max_chunk_size {
            self.cut(self.max_chunk_size)?;
        }
        Ok(())
    }

    /// Cut full chunks, then whatever remains as one short chunk
    pub fn flush(&mut self) -> Result<()> {
        self.cut_full_chunks()?;
        if !self.writer.is_empty() {
            self.cut(self.writer.len())?;
        }
        Ok(())
    }

    /// Flush, fill the inflated length, and frame every chunk after `header`
    pub fn finish(mut self, header: &[u8]) -> Result<Vec<u8>> {
        self.flush()?;

        let total: usize = self.chunks.iter().map(Chunk::uncompressed_len).sum();
        if let Some(key) = self.inflated_len.take() {
            let value = i32::try_from(total.saturating_sub(4)).map_err(|_| {
                SavError::CorruptData(format!("inflated length {total} exceeds i32 range"))
            })?;
            self.resolve(key, value)?;
        }

        let max = to_u32(self.max_chunk_size, "max chunk size")?;
        let mut out = Vec::with_capacity(header.len());
        out.extend_from_slice(header);

        for (idx, chunk) in self.chunks.iter().enumerate() {
            let (data, uncompressed_len) = match chunk {
                Chunk::Compressed {
                    data,
                    uncompressed_len,
                } => (data, *uncompressed_len),
                Chunk::Deferred { pending, .. } => {
                    return Err(SavError::CorruptData(format!(
                        "chunk {idx} still has {} unresolved placeholders",
                        pending.len()
                    )));
                }
            };
            let compressed = to_u32(data.len(), "compressed length")?;
            let uncompressed = to_u32(uncompressed_len, "uncompressed length")?;
            for word in [
                PACKAGE_FILE_TAG,
                0,
                max,
                0,
                compressed,
                0,
                uncompressed,
                0,
                compressed,
                0,
                uncompressed,
                0,
            ] {
                out.write_u32::<LittleEndian>(word)?;
            }
            out.extend_from_slice(data);
        }

        debug!(chunks = self.chunks.len(), inflated = total, "body framed");
        Ok(out)
    }
}

/// Inflates chunks lazily and presents their payloads as one byte stream
#[derive(Debug)]
pub struct ChunkReader<R> {
    inner: R,
    current: Vec<u8>,
    pos: usize,
    chunk_count: usize,
    inflated_total: u64,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            current: Vec::new(),
            pos: 0,
            chunk_count: 0,
            inflated_total: 0,
        }
    }

    /// Chunks inflated so far
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Uncompressed bytes produced so far
    pub fn inflated_total(&self) -> u64 {
        self.inflated_total
    }

    /// Load the next chunk; `false` on a clean end of stream at a frame boundary
    fn next_chunk(&mut self) -> Result<bool> {
        let mut tag = [0u8; 4];
        let mut filled = 0;
        while filled < tag.len() {
            match self.inner.read(&mut tag[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        if filled == 0 {
            return Ok(false);
        }
        if filled < tag.len() {
            return Err(SavError::InvalidChunk(format!(
                "truncated frame after chunk {}",
                self.chunk_count
            )));
        }

        let tag = u32::from_le_bytes(tag);
        if tag != PACKAGE_FILE_TAG {
            return Err(SavError::InvalidChunk(format!(
                "chunk {} has package tag {tag:#010x}",
                self.chunk_count
            )));
        }

        let mut words = [0u32; 11];
        for word in &mut words {
            *word = self.inner.read_u32::<LittleEndian>().map_err(|_| {
                SavError::InvalidChunk(format!("truncated frame of chunk {}", self.chunk_count))
            })?;
        }
        let [_, _max, _, compressed, _, uncompressed, _, compressed_dup, _, uncompressed_dup, _] =
            words;
        if compressed != compressed_dup || uncompressed != uncompressed_dup {
            return Err(SavError::InvalidChunk(format!(
                "chunk {} size pairs disagree: ({compressed}, {uncompressed}) vs ({compressed_dup}, {uncompressed_dup})",
                self.chunk_count
            )));
        }

        let mut payload = Vec::new();
        (&mut self.inner)
            .take(u64::from(compressed))
            .read_to_end(&mut payload)?;
        if payload.len() != compressed as usize {
            return Err(SavError::InvalidChunk(format!(
                "chunk {} truncated: expected {compressed} bytes, got {}",
                self.chunk_count,
                payload.len()
            )));
        }

        let mut inflated = Vec::new();
        ZlibDecoder::new(payload.as_slice())
            .read_to_end(&mut inflated)
            .map_err(|e| SavError::Compression(format!("chunk {}: {e}", self.chunk_count)))?;
        if inflated.len() != uncompressed as usize {
            return Err(SavError::InvalidChunk(format!(
                "chunk {} inflated to {} bytes, header says {uncompressed}",
                self.chunk_count,
                inflated.len()
            )));
        }

        self.chunk_count += 1;
        self.inflated_total += inflated.len() as u64;
        self.current = inflated;
        self.pos = 0;
        Ok(true)
    }
}

impl<R: Read> Read for ChunkReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pos == self.current.len() {
            match self.next_chunk() {
                Ok(true) => {}
                Ok(false) => return Ok(0),
                Err(SavError::Io(e)) => return Err(e),
                Err(err) => return Err(io::Error::new(io::ErrorKind::InvalidData, err)),
            }
        }
        let n = buf.len().min(self.current.len() - self.pos);
        buf[..n].copy_from_slice(&self.current[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Recover a chunk error that was tunnelled through `io::Error`
pub(crate) fn unwrap_chunk_error(err: SavError) -> SavError {
    match err {
        SavError::Io(e) if e.kind() == io::ErrorKind::InvalidData => {
            if e.get_ref().is_some_and(|inner| inner.is::<SavError>()) {
                if let Some(inner) = e.into_inner() {
                    if let Ok(inner) = inner.downcast::<SavError>() {
                        return *inner;
                    }
                }
                SavError::CorruptData("chunk error lost while unwrapping".into())
            } else {
                SavError::Io(e)
            }
        }
        other => other,
    }
}
