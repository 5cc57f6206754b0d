//! Object/actor records and their entities
//!
//! Records are written first for a whole level, then one length-prefixed
//! entity per record in the same order.

mod trailer;

pub use trailer::{TrailerRegistry, TrailerShape, read_trailer, write_trailer};

use std::io::{self, Read};

use tracing::warn;

use crate::{
    context::CodecContext,
    error::{Result, SavError},
    primitive::{ByteReader, ByteWriter},
    property::{read_properties, read_vec3, read_vec4, write_properties, write_vec3, write_vec4},
    types::{ActorHeader, ActorLinks, Entity, ObjectRecord, RecordKind, Transform},
};

const RECORD_OBJECT: i32 = 0;
const RECORD_ACTOR: i32 = 1;

/// Write an object or actor header record
pub fn write_record(w: &mut ByteWriter, ctx: &CodecContext<'_>, record: &ObjectRecord) {
    match &record.kind {
        RecordKind::Object { outer_path_name } => {
            w.write_i32(RECORD_OBJECT);
            w.write_string(&record.class_name);
            ctx.write_reference(w, &record.reference);
            w.write_string(outer_path_name);
        }
        RecordKind::Actor(actor) => {
            w.write_i32(RECORD_ACTOR);
            w.write_string(&record.class_name);
            ctx.write_reference(w, &record.reference);
            w.write_i32(actor.need_transform);
            write_vec4(w, &actor.transform.rotation);
            if actor.transform.is_out_of_bounds() {
                warn!(
                    path = %record.reference.path_name,
                    x = actor.transform.translation.x,
                    y = actor.transform.translation.y,
                    "actor out of bounds, moved to safe position"
                );
            }
            write_vec3(w, &actor.transform.bounded_translation());
            write_vec3(w, &actor.transform.scale);
            w.write_i32(actor.was_placed_in_level);
        }
    }
}

pub fn read_record<R: Read>(r: &mut ByteReader<R>, ctx: &CodecContext<'_>) -> Result<ObjectRecord> {
    let record_type = r.read_i32()?;
    let class_name = r.read_string()?;
    let reference = ctx.read_reference(r)?;

    let kind = match record_type {
        RECORD_OBJECT => RecordKind::Object {
            outer_path_name: r.read_string()?,
        },
        RECORD_ACTOR => RecordKind::Actor(ActorHeader {
            need_transform: r.read_i32()?,
            transform: Transform {
                rotation: read_vec4(r)?,
                translation: read_vec3(r)?,
                scale: read_vec3(r)?,
            },
            was_placed_in_level: r.read_i32()?,
        }),
        other => {
            return Err(SavError::CorruptData(format!(
                "record '{}' has unknown type {other}",
                reference.path_name
            )));
        }
    };

    Ok(ObjectRecord {
        class_name,
        reference,
        kind,
    })
}

fn write_links(w: &mut ByteWriter, ctx: &CodecContext<'_>, links: Option<&ActorLinks>) {
    match links {
        Some(links) => {
            ctx.write_reference(w, &links.parent);
            w.write_i32(links.children.len() as i32);
            for child in &links.children {
                ctx.write_reference(w, child);
            }
        }
        None => {
            ctx.write_reference(w, &Default::default());
            w.write_i32(0);
        }
    }
}

/// Write a length-prefixed entity for `record`; returns the body length
pub fn write_entity(
    w: &mut ByteWriter,
    ctx: &CodecContext<'_>,
    record: &ObjectRecord,
    entity: &Entity,
) -> Result<u32> {
    let len_slot = w.reserve_i32();
    let start = w.span_start();

    if record.is_actor() {
        write_links(w, ctx, entity.links.as_ref());
    } else if entity.links.is_some() {
        warn!(path = %record.reference.path_name, "dropping actor links of a plain object");
    }

    if !entity.force_empty {
        write_properties(w, ctx, &entity.properties, &record.class_name)?;
        write_trailer(w, ctx, &record.class_name, &entity.trailer);
    }

    w.patch_span(len_slot, start)
}

/// Read the length-prefixed entity belonging to `record`
pub fn read_entity<R: Read>(
    r: &mut ByteReader<R>,
    ctx: &CodecContext<'_>,
    record: &ObjectRecord,
) -> Result<Entity> {
    let len = r.read_count("entity body")?;
    let body = r.read_bytes(len)?;
    parse_entity_body(&body, ctx, record).map_err(|err| match err {
        SavError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => SavError::CorruptData(
            format!(
                "entity of '{}' overruns its {len}-byte body",
                record.reference.path_name
            ),
        ),
        other => other,
    })
}

fn parse_entity_body(body: &[u8], ctx: &CodecContext<'_>, record: &ObjectRecord) -> Result<Entity> {
    let len = body.len() as u64;
    let mut r = ByteReader::new(body);
    let mut entity = Entity::default();

    if record.is_actor() {
        let parent = ctx.read_reference(&mut r)?;
        let count = r.read_count("child")?;
        let mut children = Vec::new();
        for _ in 0..count {
            children.push(ctx.read_reference(&mut r)?);
        }
        entity.links = Some(ActorLinks { parent, children });
    }

    if r.position() == len {
        entity.force_empty = true;
        return Ok(entity);
    }

    entity.properties = read_properties(&mut r, ctx, &record.class_name)?;
    let remaining = usize::try_from(len - r.position())
        .map_err(|_| SavError::CorruptData("entity body too large".into()))?;
    entity.trailer = read_trailer(&mut r, ctx, &record.class_name, remaining)?;
    Ok(entity)
}

#[cfg(test)]
mod tests;
