//! Leaf value codec
//!
//! Every multi-byte value is little-endian. Strings use the engine's
//! length-prefixed layout:
//!
//! ```text
//! empty      : i32 0
//! 7-bit ASCII: i32 (chars + 1) | bytes | 0x00 (other bytes are rejected)
//! otherwise  : i32 -(units + 1) | UTF-16LE units | 0x0000
//! ```
//!
//! The writer keeps a running count of every byte it has ever produced
//! (`position`), which is what all length prefixes are measured against.

mod reader;
mod writer;

pub use reader::ByteReader;
pub use writer::{ByteWriter, SpanStart};

/// 16-byte engine GUID, kept as raw bytes
pub type Guid = [u8; 16];

/// Largest string length prefix accepted on decode (in characters)
pub const MAX_STRING_LEN: i64 = 16 * 1024 * 1024;

#[cfg(test)]
mod tests;
