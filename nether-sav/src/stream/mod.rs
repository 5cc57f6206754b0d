//! Chunked container streaming
//!
//! Layout of a save file:
//!
//! ```text
//! header | chunk* (48-byte frame + zlib payload)
//! ```
//!
//! Inflated and concatenated, the chunks hold the total inflated length
//! followed by the level sections. From save version 29 every level carries
//! two length-prefixed sections (records, then entities); earlier versions
//! have one flat level.

mod chunk;
mod decode;
mod encode;
mod header;
mod progress;
mod provider;

pub use chunk::{CHUNK_HEADER_LEN, ChunkAssembler, ChunkReader, PlaceholderKey};
pub use decode::{decode_save, decode_save_with};
pub use encode::{EncodeState, LevelPlan, SaveEncoder};
pub use header::{read_header, write_header};
pub use progress::{NoProgress, Progress, ProgressPhase, TracingProgress};
pub use provider::{ChannelProvider, ProviderRequest, SaveDataProvider};
