//! Streaming codec for chunked, zlib-compressed save game containers
//!
//! A save file is an uncompressed [`SaveHeader`] followed by a sequence of
//! independently compressed chunks. Inflated and concatenated, the chunks form
//! one body: per level, the object/actor records, then one entity per record
//! carrying tagged properties and an optional class-specific trailer.
//!
//! Encoding pulls objects from a [`SaveDataProvider`] in batches and streams
//! them into chunks as they fill, backpatching section lengths that are only
//! known later. Decoding is the inverse and builds an [`ObjectIndex`].
//!
//! # Example
//!
//! ```ignore
//! let game = nether_sav::decode_save(std::fs::File::open("factory.sav")?)?;
//! let bytes = game
//!     .encode(nether_sav::CodecConfig::default(), &mut nether_sav::NoProgress)
//!     .await?;
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod game;
pub mod index;
pub mod object;
pub mod primitive;
pub mod property;
pub mod stream;
pub mod types;

pub use config::CodecConfig;
pub use context::{CodecContext, Registries};
pub use error::{Result, SavError};
pub use game::{IndexProvider, SaveGame};
pub use index::{IndexedObject, ObjectIndex};
pub use object::{TrailerRegistry, TrailerShape};
pub use primitive::{ByteReader, ByteWriter, Guid};
pub use property::{StructRegistry, StructShape};
pub use stream::{
    ChannelProvider, EncodeState, LevelPlan, NoProgress, Progress, ProgressPhase, ProviderRequest,
    SaveDataProvider, SaveEncoder, TracingProgress, decode_save, decode_save_with,
};
pub use types::*;

/// Package tag opening every chunk container header
pub const PACKAGE_FILE_TAG: u32 = 0x9E2A_83C1;

/// Default uncompressed size of one chunk
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 131_072;

/// Default number of pathNames requested per provider batch
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// First save version with per-level sections
pub const LEVEL_STREAMING_SAVE_VERSION: i32 = 29;

pub const HEADER_TYPE_EDITOR_OBJECT_VERSION: i32 = 7;
pub const HEADER_TYPE_MOD_METADATA: i32 = 8;
pub const HEADER_TYPE_SAVE_IDENTIFIER: i32 = 10;

/// First build whose `None` text history carries a culture-invariant string
pub const TEXT_CULTURE_INVARIANT_BUILD: i32 = 140_822;

/// Terminates every property list
pub const NONE_PROPERTY: &str = "None";

/// Byte array whose elements are stored as `(0, 0, value, 255)` quadruples
pub const FOG_OF_WAR_PROPERTY: &str = "mFogOfWarRawData";

/// Map property whose struct keys are bare vectors
pub const FOLIAGE_TRANSFORM_PROPERTY: &str = "Destroyed_Foliage_Transform";

/// Struct type whose map struct values are three slot indices
pub const BALANCER_STRUCT_TYPE: &str = "LBBalancerData";

/// Owner class whose struct sets hold bare vectors (from save version 29)
pub const FOLIAGE_REMOVAL_CLASS: &str = "/Script/FactoryGame.FGFoliageRemoval";
