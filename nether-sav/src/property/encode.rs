//! Property encoder

use tracing::warn;

use super::{
    structs::{write_network_trace, write_struct_value, write_vec3},
    text::{text_problem, write_text},
};
use crate::{
    BALANCER_STRUCT_TYPE, FOG_OF_WAR_PROPERTY, FOLIAGE_REMOVAL_CLASS, FOLIAGE_TRANSFORM_PROPERTY,
    LEVEL_STREAMING_SAVE_VERSION, NONE_PROPERTY,
    context::CodecContext,
    error::Result,
    primitive::{ByteWriter, Guid},
    types::{
        ArrayValue, ByteValue, MapEntry, MapItem, MapKey, MapMode, MapValue, Property,
        PropertyKind, PropertyValue, SetValue, StructArray, StructProperty, StructValue,
    },
};

/// Write a property list followed by the `None` sentinel.
///
/// `parent_type` is the owning class or struct type; a few container layouts
/// depend on it.
pub fn write_properties(
    w: &mut ByteWriter,
    ctx: &CodecContext<'_>,
    properties: &[Property],
    parent_type: &str,
) -> Result<()> {
    for property in properties {
        write_property(w, ctx, property, parent_type)?;
    }
    w.write_string(NONE_PROPERTY);
    Ok(())
}

/// Write one property record. Returns `false` when the property cannot be
/// represented in this context and was skipped.
pub fn write_property(
    w: &mut ByteWriter,
    ctx: &CodecContext<'_>,
    property: &Property,
    parent_type: &str,
) -> Result<bool> {
    if let Some(reason) = skip_reason(ctx, property, parent_type) {
        warn!(property = %property.name, kind = %property.kind(), "skipping property: {reason}");
        return Ok(false);
    }

    w.write_string(&property.name);
    w.write_string(property.kind().tag());
    let size_slot = w.reserve_i32();
    w.write_i32(property.index);
    write_tag_data(w, &property.value);
    write_guid_marker(w, property.guid.as_ref());

    let start = w.span_start();
    write_payload(w, ctx, property, parent_type)?;
    w.patch_span(size_slot, start)?;

    // Item state rides after the declared size
    if let PropertyValue::Struct(StructProperty {
        value: StructValue::InventoryItem(item),
        ..
    }) = &property.value
    {
        let written = match &item.state {
            Some(state) => write_property(w, ctx, state, parent_type)?,
            None => false,
        };
        if !written {
            w.write_string(NONE_PROPERTY);
        }
    }

    Ok(true)
}

fn write_guid_marker(w: &mut ByteWriter, guid: Option<&Guid>) {
    match guid {
        Some(guid) => {
            w.write_u8(1);
            w.write_guid(guid);
        }
        None => w.write_u8(0),
    }
}

fn write_tag_data(w: &mut ByteWriter, value: &PropertyValue) {
    match value {
        PropertyValue::Bool(v) => w.write_bool(*v),
        PropertyValue::Byte(ByteValue::Raw(_)) => w.write_string(NONE_PROPERTY),
        PropertyValue::Byte(ByteValue::Enum { enum_name, .. })
        | PropertyValue::Enum { enum_name, .. } => w.write_string(enum_name),
        PropertyValue::Array(array) => w.write_string(array.element_kind().tag()),
        PropertyValue::Set(set) => w.write_string(set.element_kind().tag()),
        PropertyValue::Map(map) => {
            w.write_string(map.key_type.tag());
            w.write_string(map.value_type.tag());
        }
        PropertyValue::Struct(s) => {
            w.write_string(&s.type_name);
            w.write_guid(&s.struct_guid);
        }
        _ => {}
    }
}

fn write_payload(
    w: &mut ByteWriter,
    ctx: &CodecContext<'_>,
    property: &Property,
    parent_type: &str,
) -> Result<()> {
    match &property.value {
        PropertyValue::Bool(_) => {}
        PropertyValue::Int8(v) => w.write_i8(*v),
        PropertyValue::Int(v) => w.write_i32(*v),
        PropertyValue::UInt32(v) => w.write_u32(*v),
        PropertyValue::Int64(v) => w.write_i64(*v),
        PropertyValue::UInt64(v) => w.write_u64(*v),
        PropertyValue::Float(v) => w.write_f32(*v),
        PropertyValue::Double(v) => w.write_f64(*v),
        PropertyValue::Str(v) | PropertyValue::Name(v) => w.write_string(v),
        PropertyValue::Object(v) | PropertyValue::Interface(v) => ctx.write_reference(w, v),
        PropertyValue::Enum { value, .. } => w.write_string(value),
        PropertyValue::Byte(ByteValue::Raw(v)) => w.write_u8(*v),
        PropertyValue::Byte(ByteValue::Enum { value, .. }) => w.write_string(value),
        PropertyValue::Text(text) => write_text(w, ctx, text),
        PropertyValue::Array(array) => write_array(w, ctx, &property.name, array)?,
        PropertyValue::Map(map) => write_map(w, ctx, &property.name, parent_type, map)?,
        PropertyValue::Set(set) => write_set(w, ctx, set),
        PropertyValue::Struct(s) => write_struct_value(w, ctx, &s.value, &s.type_name)?,
    }
    Ok(())
}

/// Why a property cannot be written as-is, if anything
fn skip_reason(ctx: &CodecContext<'_>, property: &Property, parent_type: &str) -> Option<String> {
    if property.name == NONE_PROPERTY {
        return Some("name collides with the list terminator".into());
    }

    match &property.value {
        PropertyValue::Text(text) => text_problem(text),
        PropertyValue::Array(ArrayValue::Text(texts)) => texts.iter().find_map(text_problem),
        PropertyValue::Byte(ByteValue::Enum { enum_name, .. }) if enum_name == NONE_PROPERTY => {
            Some("named byte value with enum 'None'".into())
        }
        PropertyValue::Struct(s) => {
            let registered = ctx.structs().shape(&s.type_name);
            (registered != s.value.shape()).then(|| {
                format!(
                    "struct '{}' is registered as {registered:?} but holds {:?}",
                    s.type_name,
                    s.value.shape()
                )
            })
        }
        PropertyValue::Set(set) => {
            let vectors = foliage_set(ctx, parent_type);
            match set {
                SetValue::Vector(_) if !vectors => {
                    Some(format!("vector set outside '{FOLIAGE_REMOVAL_CLASS}'"))
                }
                SetValue::NetworkTrace(_) if vectors => {
                    Some(format!("network trace set inside '{FOLIAGE_REMOVAL_CLASS}'"))
                }
                _ => None,
            }
        }
        PropertyValue::Map(map) => {
            if !is_map_key_kind(map.key_type) {
                Some(format!("map key type {}", map.key_type))
            } else if !is_map_value_kind(map.value_type) {
                Some(format!("map value type {}", map.value_type))
            } else {
                None
            }
        }
        _ => None,
    }
}

pub(crate) fn foliage_set(ctx: &CodecContext<'_>, parent_type: &str) -> bool {
    ctx.save_version() >= LEVEL_STREAMING_SAVE_VERSION && parent_type == FOLIAGE_REMOVAL_CLASS
}

pub(crate) fn is_map_key_kind(kind: PropertyKind) -> bool {
    matches!(
        kind,
        PropertyKind::Int
            | PropertyKind::Int64
            | PropertyKind::Name
            | PropertyKind::Str
            | PropertyKind::Object
            | PropertyKind::Enum
            | PropertyKind::Struct
    )
}

pub(crate) fn is_map_value_kind(kind: PropertyKind) -> bool {
    matches!(
        kind,
        PropertyKind::Byte
            | PropertyKind::Bool
            | PropertyKind::Int
            | PropertyKind::Int64
            | PropertyKind::Float
            | PropertyKind::Double
            | PropertyKind::Str
            | PropertyKind::Name
            | PropertyKind::Object
            | PropertyKind::Struct
    )
}

fn write_array(
    w: &mut ByteWriter,
    ctx: &CodecContext<'_>,
    name: &str,
    array: &ArrayValue,
) -> Result<()> {
    if let ArrayValue::Struct(structs) = array {
        return write_struct_array(w, ctx, name, structs);
    }

    let fog = name == FOG_OF_WAR_PROPERTY;
    match array {
        ArrayValue::Byte(values) if fog => {
            w.write_i32(values.len() as i32 * 4);
            for value in values {
                w.write_bytes(&[0, 0, *value, 255]);
            }
            return Ok(());
        }
        _ => w.write_i32(array.len() as i32),
    }

    match array {
        ArrayValue::Byte(values) => w.write_bytes(values),
        ArrayValue::Bool(values) => values.iter().for_each(|v| w.write_bool(*v)),
        ArrayValue::Int(values) => values.iter().for_each(|v| w.write_i32(*v)),
        ArrayValue::Int64(values) => values.iter().for_each(|v| w.write_i64(*v)),
        ArrayValue::Float(values) => values.iter().for_each(|v| w.write_f32(*v)),
        ArrayValue::Double(values) => values.iter().for_each(|v| w.write_f64(*v)),
        ArrayValue::Enum(values) | ArrayValue::Str(values) | ArrayValue::Name(values) => {
            values.iter().for_each(|v| w.write_string(v))
        }
        ArrayValue::Text(values) => values.iter().for_each(|v| write_text(w, ctx, v)),
        ArrayValue::Object(values) | ArrayValue::Interface(values) => {
            values.iter().for_each(|v| ctx.write_reference(w, v))
        }
        ArrayValue::Struct(_) => {}
    }
    Ok(())
}

fn write_struct_array(
    w: &mut ByteWriter,
    ctx: &CodecContext<'_>,
    name: &str,
    array: &StructArray,
) -> Result<()> {
    let shape = ctx.structs().array_shape(&array.type_name);
    let elements: Vec<&StructValue> = array
        .elements
        .iter()
        .filter(|element| {
            let fits = element.shape() == shape;
            if !fits {
                warn!(
                    property = name,
                    struct_type = %array.type_name,
                    "skipping {:?} element in {shape:?} array",
                    element.shape()
                );
            }
            fits
        })
        .collect();

    w.write_i32(elements.len() as i32);
    w.write_string(name);
    w.write_string(PropertyKind::Struct.tag());
    let size_slot = w.reserve_i32();
    w.write_i32(0);
    w.write_string(&array.type_name);
    w.write_guid(&array.struct_guid);
    w.write_u8(0);

    let start = w.span_start();
    for element in elements {
        write_struct_value(w, ctx, element, &array.type_name)?;
    }
    w.patch_span(size_slot, start)?;
    Ok(())
}

/// Whether an entry's key/value variants match what the map declares
fn entry_fits(map: &MapValue, entry: &MapEntry, name: &str, parent_type: &str) -> bool {
    let key_fits = entry.key.kind() == map.key_type
        && match &entry.key {
            MapKey::Vector(_) => name == FOLIAGE_TRANSFORM_PROPERTY,
            MapKey::Properties(_) => name != FOLIAGE_TRANSFORM_PROPERTY,
            _ => true,
        };
    let value_fits = entry.value.kind() == map.value_type
        && match &entry.value {
            MapItem::ByteName(_) => map.key_type == PropertyKind::Str,
            MapItem::Byte(_) => map.key_type != PropertyKind::Str,
            MapItem::Balancer { .. } => parent_type == BALANCER_STRUCT_TYPE,
            MapItem::Properties(_) => parent_type != BALANCER_STRUCT_TYPE,
            _ => true,
        };
    key_fits && value_fits
}

fn write_map(
    w: &mut ByteWriter,
    ctx: &CodecContext<'_>,
    name: &str,
    parent_type: &str,
    map: &MapValue,
) -> Result<()> {
    w.write_i32(map.mode.code());
    match &map.mode {
        MapMode::Named { first, second } => {
            w.write_string(first);
            w.write_string(second);
        }
        MapMode::Prefixed {
            opaque,
            first,
            second,
        } => {
            w.write_bytes(opaque);
            w.write_string(first);
            w.write_string(second);
        }
        MapMode::Plain | MapMode::Other(_) => {}
    }

    let entries: Vec<&MapEntry> = map
        .entries
        .iter()
        .filter(|entry| {
            let fits = entry_fits(map, entry, name, parent_type);
            if !fits {
                warn!(
                    property = name,
                    "skipping map entry {}/{} in {}/{} map",
                    entry.key.kind(),
                    entry.value.kind(),
                    map.key_type,
                    map.value_type
                );
            }
            fits
        })
        .collect();

    w.write_i32(entries.len() as i32);
    for entry in entries {
        match &entry.key {
            MapKey::Int(v) => w.write_i32(*v),
            MapKey::Int64(v) => w.write_i64(*v),
            MapKey::Name(v) | MapKey::Str(v) | MapKey::Enum(v) => w.write_string(v),
            MapKey::Object(v) => ctx.write_reference(w, v),
            MapKey::Vector(v) => write_vec3(w, v),
            MapKey::Properties(properties) => write_properties(w, ctx, properties, "")?,
        }
        match &entry.value {
            MapItem::Byte(v) => w.write_u8(*v),
            MapItem::ByteName(v) | MapItem::Str(v) | MapItem::Name(v) => w.write_string(v),
            MapItem::Bool(v) => w.write_bool(*v),
            MapItem::Int(v) => w.write_i32(*v),
            MapItem::Int64(v) => w.write_i64(*v),
            MapItem::Float(v) => w.write_f32(*v),
            MapItem::Double(v) => w.write_f64(*v),
            MapItem::Object(v) => ctx.write_reference(w, v),
            MapItem::Balancer {
                normal_index,
                overflow_index,
                filter_index,
            } => {
                w.write_i32(*normal_index);
                w.write_i32(*overflow_index);
                w.write_i32(*filter_index);
            }
            MapItem::Properties(properties) => write_properties(w, ctx, properties, "")?,
        }
    }
    Ok(())
}

fn write_set(w: &mut ByteWriter, ctx: &CodecContext<'_>, set: &SetValue) {
    w.write_i32(0);
    match set {
        SetValue::Object(values) => {
            w.write_i32(values.len() as i32);
            values.iter().for_each(|v| ctx.write_reference(w, v));
        }
        SetValue::Int(values) => {
            w.write_i32(values.len() as i32);
            values.iter().for_each(|v| w.write_i32(*v));
        }
        SetValue::Name(values) | SetValue::Str(values) => {
            w.write_i32(values.len() as i32);
            values.iter().for_each(|v| w.write_string(v));
        }
        SetValue::Vector(values) => {
            w.write_i32(values.len() as i32);
            values.iter().for_each(|v| write_vec3(w, v));
        }
        SetValue::NetworkTrace(values) => {
            w.write_i32(values.len() as i32);
            values.iter().for_each(|v| write_network_trace(w, ctx, v));
        }
    }
}
