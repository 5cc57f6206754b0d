//! Position-tracking reader over any byte source

use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::{Guid, MAX_STRING_LEN};
use crate::error::{Result, SavError};

/// Reader that counts every consumed byte.
///
/// The position is what declared lengths are validated against on decode.
#[derive(Debug)]
pub struct ByteReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> ByteReader<R> {
    /// Create a new reader starting at position 0
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Consume the reader and return the inner source
    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let value = self.inner.read_u8()?;
        self.position += 1;
        Ok(value)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        let value = self.inner.read_i8()?;
        self.position += 1;
        Ok(value)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let value = self.inner.read_i32::<LittleEndian>()?;
        self.position += 4;
        Ok(value)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let value = self.inner.read_u32::<LittleEndian>()?;
        self.position += 4;
        Ok(value)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let value = self.inner.read_i64::<LittleEndian>()?;
        self.position += 8;
        Ok(value)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let value = self.inner.read_u64::<LittleEndian>()?;
        self.position += 8;
        Ok(value)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let value = self.inner.read_f32::<LittleEndian>()?;
        self.position += 4;
        Ok(value)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let value = self.inner.read_f64::<LittleEndian>()?;
        self.position += 8;
        Ok(value)
    }

    /// Read a non-negative i32 count
    pub fn read_count(&mut self, what: &str) -> Result<usize> {
        let count = self.read_i32()?;
        usize::try_from(count)
            .map_err(|_| SavError::CorruptData(format!("negative {what} count {count}")))
    }

    /// Read exactly `len` bytes without trusting `len` for preallocation
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {len} bytes, got {}", buf.len()),
            )
            .into());
        }
        self.position += len as u64;
        Ok(buf)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        self.position += N as u64;
        Ok(buf)
    }

    pub fn read_guid(&mut self) -> Result<Guid> {
        self.read_array::<16>()
    }

    /// Read an engine string (see module docs for the layout)
    pub fn read_string(&mut self) -> Result<String> {
        let len = i64::from(self.read_i32()?);
        if len == 0 {
            return Ok(String::new());
        }
        if len.abs() > MAX_STRING_LEN {
            return Err(SavError::CorruptData(format!(
                "string length {len} out of range"
            )));
        }

        if len > 0 {
            let bytes = self.read_bytes(len as usize)?;
            let (terminator, text) = bytes
                .split_last()
                .ok_or_else(|| SavError::CorruptData("empty string payload".into()))?;
            if *terminator != 0 {
                return Err(SavError::CorruptData("string missing NUL terminator".into()));
            }
            if !text.is_ascii() {
                return Err(SavError::CorruptData(
                    "single-byte string holds non-ASCII bytes".into(),
                ));
            }
            Ok(text.iter().map(|&b| char::from(b)).collect())
        } else {
            let units_len = (-len) as usize;
            let bytes = self.read_bytes(units_len * 2)?;
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            let (terminator, text) = units
                .split_last()
                .ok_or_else(|| SavError::CorruptData("empty string payload".into()))?;
            if *terminator != 0 {
                return Err(SavError::CorruptData(
                    "UTF-16 string missing NUL terminator".into(),
                ));
            }
            Ok(String::from_utf16_lossy(text))
        }
    }
}
