//! Save decoding
//!
//! Reads the header, then inflates the body chunk by chunk while parsing, so
//! the compressed file is never held in memory as a whole.

use std::io::{self, Read};

use tracing::{debug, info, warn};

use super::{
    chunk::{ChunkReader, unwrap_chunk_error},
    header::read_header,
};
use crate::{
    context::{CodecContext, Registries},
    error::{Result, SavError},
    game::SaveGame,
    index::ObjectIndex,
    object::{read_entity, read_record},
    primitive::ByteReader,
    types::{ObjectRecord, ObjectReference, SaveLevel},
};

/// Decode a save with the built-in struct and trailer registries
pub fn decode_save<R: Read>(reader: R) -> Result<SaveGame> {
    decode_save_with(reader, Registries::default())
}

/// Decode a save using custom registries
pub fn decode_save_with<R: Read>(reader: R, registries: Registries) -> Result<SaveGame> {
    decode(reader, registries)
        .map_err(unwrap_chunk_error)
        .map_err(|err| match err {
            SavError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                SavError::CorruptData(format!("save ends early: {e}"))
            }
            other => other,
        })
}

fn decode<R: Read>(reader: R, registries: Registries) -> Result<SaveGame> {
    let mut header_reader = ByteReader::new(reader);
    let header = read_header(&mut header_reader)?;
    debug!(
        header_type = header.save_header_type,
        save_version = header.save_version,
        build_version = header.build_version,
        "header read"
    );

    let mut r = ByteReader::new(ChunkReader::new(header_reader.into_inner()));
    let mut index = ObjectIndex::new();
    let mut levels = Vec::new();

    let ctx = CodecContext::new(&header, &registries);
    let declared_len = r.read_i32()?;
    if header.has_levels() {
        let named = r.read_count("level")?;
        for idx in 0..=named {
            let name = if idx < named {
                Some(r.read_string()?)
            } else {
                None
            };
            levels.push(read_level(&mut r, &ctx, name, &mut index)?);
        }
    } else {
        levels.push(read_legacy_level(&mut r, &ctx, &mut index)?);
    }

    let body_len = r.position();
    let mut chunks = r.into_inner();
    let trailing = io::copy(&mut chunks, &mut io::sink())?;
    if trailing > 0 {
        warn!(trailing, "ignoring bytes after the last level");
    }
    if i64::from(declared_len) != chunks.inflated_total() as i64 - 4 {
        warn!(
            declared = declared_len,
            actual = chunks.inflated_total().saturating_sub(4),
            "inflated length field disagrees with chunk sizes"
        );
    }

    info!(
        levels = levels.len(),
        objects = index.len(),
        chunks = chunks.chunk_count(),
        body = body_len,
        "save decoded"
    );
    Ok(SaveGame {
        header,
        levels,
        index,
        chunk_count: chunks.chunk_count(),
        registries,
    })
}

fn read_records<R: Read>(
    r: &mut ByteReader<R>,
    ctx: &CodecContext<'_>,
) -> Result<Vec<ObjectRecord>> {
    let count = r.read_count("object")?;
    let mut records = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        records.push(read_record(r, ctx)?);
    }
    Ok(records)
}

fn read_collectables<R: Read>(
    r: &mut ByteReader<R>,
    ctx: &CodecContext<'_>,
) -> Result<Vec<ObjectReference>> {
    let count = r.read_count("collectable")?;
    let mut collectables = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        collectables.push(ctx.read_reference(r)?);
    }
    Ok(collectables)
}

/// Read one entity per record, in record order, into the index
fn read_entities<R: Read>(
    r: &mut ByteReader<R>,
    ctx: &CodecContext<'_>,
    records: Vec<ObjectRecord>,
    index: &mut ObjectIndex,
) -> Result<Vec<String>> {
    let count = r.read_count("entity")?;
    if count != records.len() {
        return Err(SavError::CorruptData(format!(
            "{count} entities for {} object records",
            records.len()
        )));
    }

    let mut keys = Vec::with_capacity(records.len());
    for record in records {
        let entity = read_entity(r, ctx, &record)?;
        keys.push(record.path_name().to_owned());
        index.insert(record, entity)?;
    }
    Ok(keys)
}

fn check_section(context: &str, declared: usize, start: u64, end: u64) -> Result<()> {
    if end - start != declared as u64 {
        return Err(SavError::length_mismatch(context, declared as u64, end - start));
    }
    Ok(())
}

fn read_level<R: Read>(
    r: &mut ByteReader<R>,
    ctx: &CodecContext<'_>,
    name: Option<String>,
    index: &mut ObjectIndex,
) -> Result<SaveLevel> {
    let label = name.as_deref().unwrap_or("persistent level").to_owned();

    let objects_len = r.read_count("objects section")?;
    let start = r.position();
    let records = read_records(r, ctx)?;
    let collectables = read_collectables(r, ctx)?;
    check_section(
        &format!("objects section of {label}"),
        objects_len,
        start,
        r.position(),
    )?;

    let entities_len = r.read_count("entities section")?;
    let start = r.position();
    let object_keys = read_entities(r, ctx, records, index)?;
    check_section(
        &format!("entities section of {label}"),
        entities_len,
        start,
        r.position(),
    )?;

    let repeated = read_collectables(r, ctx)?;
    if repeated != collectables {
        warn!(level = %label, "second collectables list differs from the first, keeping the first");
    }

    debug!(level = %label, objects = object_keys.len(), "level read");
    Ok(SaveLevel {
        name,
        object_keys,
        collectables,
    })
}

fn read_legacy_level<R: Read>(
    r: &mut ByteReader<R>,
    ctx: &CodecContext<'_>,
    index: &mut ObjectIndex,
) -> Result<SaveLevel> {
    let records = read_records(r, ctx)?;
    let object_keys = read_entities(r, ctx, records, index)?;
    let collectables = read_collectables(r, ctx)?;
    Ok(SaveLevel {
        name: None,
        object_keys,
        collectables,
    })
}
