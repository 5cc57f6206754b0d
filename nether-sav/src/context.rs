//! Per-session codec context
//!
//! Carries the header fields that gate the layout plus the shape registries.
//! It is passed by reference through every encode/decode call instead of
//! living in shared state.

use std::io::Read;

use crate::{
    error::Result,
    object::TrailerRegistry,
    primitive::{ByteReader, ByteWriter},
    property::StructRegistry,
    types::{ObjectReference, SaveHeader},
};

/// Struct and trailer shape tables used by one session
#[derive(Debug, Clone, Default)]
pub struct Registries {
    pub structs: StructRegistry,
    pub trailers: TrailerRegistry,
}

/// Read-only state shared by every codec call in one session
#[derive(Debug, Clone, Copy)]
pub struct CodecContext<'a> {
    pub header: &'a SaveHeader,
    pub registries: &'a Registries,
}

impl<'a> CodecContext<'a> {
    pub fn new(header: &'a SaveHeader, registries: &'a Registries) -> Self {
        Self { header, registries }
    }

    pub fn map_name(&self) -> &str {
        &self.header.map_name
    }

    pub fn save_version(&self) -> i32 {
        self.header.save_version
    }

    pub fn build_version(&self) -> i32 {
        self.header.build_version
    }

    pub fn structs(&self) -> &'a StructRegistry {
        &self.registries.structs
    }

    pub fn trailers(&self) -> &'a TrailerRegistry {
        &self.registries.trailers
    }

    /// Write a reference as level name then pathName; a missing level is the map name
    pub fn write_reference(&self, w: &mut ByteWriter, reference: &ObjectReference) {
        w.write_string(reference.level_name.as_deref().unwrap_or(self.map_name()));
        w.write_string(&reference.path_name);
    }

    /// Read a reference, folding the map name back to `None`
    pub fn read_reference<R: Read>(&self, r: &mut ByteReader<R>) -> Result<ObjectReference> {
        let level_name = r.read_string()?;
        let path_name = r.read_string()?;
        Ok(ObjectReference {
            level_name: (level_name != self.map_name()).then_some(level_name),
            path_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_map_name_folding() {
        let header = SaveHeader::default();
        let registries = Registries::default();
        let ctx = CodecContext::new(&header, &registries);

        let mut w = ByteWriter::new();
        ctx.write_reference(&mut w, &ObjectReference::new("Persistent_Level:PersistentLevel.A"));
        ctx.write_reference(&mut w, &ObjectReference::in_level("Level_2", "Level_2:B"));
        ctx.write_reference(&mut w, &ObjectReference::null());

        let mut r = ByteReader::new(w.as_slice());
        let a = ctx.read_reference(&mut r).unwrap();
        assert_eq!(a.level_name, None);
        assert_eq!(a.path_name, "Persistent_Level:PersistentLevel.A");
        let b = ctx.read_reference(&mut r).unwrap();
        assert_eq!(b.level_name.as_deref(), Some("Level_2"));
        let null = ctx.read_reference(&mut r).unwrap();
        assert_eq!(null, ObjectReference::null());
        assert!(null.is_null());
    }
}
