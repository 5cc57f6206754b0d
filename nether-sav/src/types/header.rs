//! Save file header

use serde::{Deserialize, Serialize};

use crate::{
    HEADER_TYPE_EDITOR_OBJECT_VERSION, HEADER_TYPE_MOD_METADATA, HEADER_TYPE_SAVE_IDENTIFIER,
    LEVEL_STREAMING_SAVE_VERSION,
};

/// Uncompressed header at the start of every save file.
///
/// Drives every downstream layout decision: `save_version` selects the level
/// layout, `build_version` gates text payloads, and `save_header_type` gates
/// the trailing header fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveHeader {
    pub save_header_type: i32,
    pub save_version: i32,
    pub build_version: i32,
    pub map_name: String,
    pub map_options: String,
    pub session_name: String,
    pub play_duration_seconds: i32,
    /// Engine ticks (100ns since 0001-01-01)
    pub save_date_time: i64,
    pub session_visibility: u8,
    /// Present when `save_header_type >= 7`
    #[serde(default)]
    pub editor_object_version: i32,
    /// Present when `save_header_type >= 8`
    #[serde(default)]
    pub mod_metadata: String,
    /// Present when `save_header_type >= 8`
    #[serde(default)]
    pub is_modded_save: i32,
    /// Present when `save_header_type >= 10`
    #[serde(default)]
    pub save_identifier: String,
}

impl Default for SaveHeader {
    fn default() -> Self {
        Self {
            save_header_type: 10,
            save_version: 30,
            build_version: 155_000,
            map_name: "Persistent_Level".to_string(),
            map_options: String::new(),
            session_name: "Untitled".to_string(),
            play_duration_seconds: 0,
            save_date_time: 0,
            session_visibility: 0,
            editor_object_version: 0,
            mod_metadata: String::new(),
            is_modded_save: 0,
            save_identifier: String::new(),
        }
    }
}

impl SaveHeader {
    /// Whether the body uses per-level sections
    pub fn has_levels(&self) -> bool {
        self.save_version >= LEVEL_STREAMING_SAVE_VERSION
    }

    pub fn has_editor_object_version(&self) -> bool {
        self.save_header_type >= HEADER_TYPE_EDITOR_OBJECT_VERSION
    }

    pub fn has_mod_metadata(&self) -> bool {
        self.save_header_type >= HEADER_TYPE_MOD_METADATA
    }

    pub fn has_save_identifier(&self) -> bool {
        self.save_header_type >= HEADER_TYPE_SAVE_IDENTIFIER
    }
}
