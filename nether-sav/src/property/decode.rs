//! Property decoder

use std::io::Read;

use tracing::warn;

use super::{
    encode::{foliage_set, is_map_key_kind, is_map_value_kind},
    structs::{read_network_trace, read_struct_value, read_vec3},
    text::read_text,
};
use crate::{
    BALANCER_STRUCT_TYPE, FOG_OF_WAR_PROPERTY, FOLIAGE_TRANSFORM_PROPERTY, NONE_PROPERTY,
    context::CodecContext,
    error::{Result, SavError},
    primitive::{ByteReader, Guid},
    types::{
        ArrayValue, ByteValue, MapEntry, MapItem, MapKey, MapMode, MapValue, Property,
        PropertyKind, PropertyValue, SetValue, StructArray, StructProperty, StructValue,
    },
};

/// Type-specific data between the property header and its GUID marker
enum TagData {
    Plain,
    Bool(bool),
    EnumName(String),
    Element(PropertyKind),
    Map {
        key: PropertyKind,
        value: PropertyKind,
    },
    Struct {
        type_name: String,
        guid: Guid,
    },
}

/// Read properties up to and including the `None` sentinel
pub fn read_properties<R: Read>(
    r: &mut ByteReader<R>,
    ctx: &CodecContext<'_>,
    parent_type: &str,
) -> Result<Vec<Property>> {
    let mut properties = Vec::new();
    while let Some(property) = read_property(r, ctx, parent_type)? {
        properties.push(property);
    }
    Ok(properties)
}

/// Read one property record, or `None` at the list sentinel
pub fn read_property<R: Read>(
    r: &mut ByteReader<R>,
    ctx: &CodecContext<'_>,
    parent_type: &str,
) -> Result<Option<Property>> {
    let name = r.read_string()?;
    if name == NONE_PROPERTY {
        return Ok(None);
    }

    let tag = r.read_string()?;
    let kind = PropertyKind::from_tag(&tag).ok_or_else(|| SavError::UnsupportedProperty(tag.clone()))?;
    let size = r.read_i32()?;
    let size = usize::try_from(size)
        .map_err(|_| SavError::CorruptData(format!("{tag} '{name}' has negative size {size}")))?;
    let index = r.read_i32()?;
    let tag_data = read_tag_data(r, kind, &name)?;
    let guid = match r.read_u8()? {
        0 => None,
        _ => Some(r.read_guid()?),
    };

    let start = r.position();
    let mut value = read_payload(r, ctx, kind, tag_data, &name, parent_type, size)?;
    let actual = r.position() - start;
    if actual != size as u64 {
        return Err(SavError::length_mismatch(
            &format!("{tag} '{name}'"),
            size as u64,
            actual,
        ));
    }

    if let PropertyValue::Struct(StructProperty {
        value: StructValue::InventoryItem(item),
        ..
    }) = &mut value
    {
        item.state = read_property(r, ctx, parent_type)?.map(Box::new);
    }

    Ok(Some(Property {
        name,
        index,
        guid,
        value,
    }))
}

fn read_element_kind<R: Read>(
    r: &mut ByteReader<R>,
    container: &'static str,
    property: &str,
) -> Result<PropertyKind> {
    let tag = r.read_string()?;
    PropertyKind::from_tag(&tag).ok_or_else(|| SavError::UnsupportedElement {
        container,
        kind: tag,
        property: property.to_string(),
    })
}

fn read_tag_data<R: Read>(r: &mut ByteReader<R>, kind: PropertyKind, name: &str) -> Result<TagData> {
    let data = match kind {
        PropertyKind::Bool => TagData::Bool(r.read_bool()?),
        PropertyKind::Byte | PropertyKind::Enum => TagData::EnumName(r.read_string()?),
        PropertyKind::Array => TagData::Element(read_element_kind(r, "ArrayProperty", name)?),
        PropertyKind::Set => TagData::Element(read_element_kind(r, "SetProperty", name)?),
        PropertyKind::Map => TagData::Map {
            key: read_element_kind(r, "MapProperty", name)?,
            value: read_element_kind(r, "MapProperty", name)?,
        },
        PropertyKind::Struct => TagData::Struct {
            type_name: r.read_string()?,
            guid: r.read_guid()?,
        },
        _ => TagData::Plain,
    };
    Ok(data)
}

fn read_payload<R: Read>(
    r: &mut ByteReader<R>,
    ctx: &CodecContext<'_>,
    kind: PropertyKind,
    tag_data: TagData,
    name: &str,
    parent_type: &str,
    size: usize,
) -> Result<PropertyValue> {
    let value = match tag_data {
        TagData::Bool(value) => PropertyValue::Bool(value),
        TagData::EnumName(enum_name) if kind == PropertyKind::Byte => {
            if enum_name == NONE_PROPERTY {
                PropertyValue::Byte(ByteValue::Raw(r.read_u8()?))
            } else {
                PropertyValue::Byte(ByteValue::Enum {
                    enum_name,
                    value: r.read_string()?,
                })
            }
        }
        TagData::EnumName(enum_name) => PropertyValue::Enum {
            enum_name,
            value: r.read_string()?,
        },
        TagData::Element(element) if kind == PropertyKind::Array => {
            PropertyValue::Array(read_array(r, ctx, element, name)?)
        }
        TagData::Element(element) => PropertyValue::Set(read_set(r, ctx, element, name, parent_type)?),
        TagData::Map { key, value } => {
            PropertyValue::Map(read_map(r, ctx, key, value, name, parent_type)?)
        }
        TagData::Struct { type_name, guid } => {
            let shape = ctx.structs().shape(&type_name);
            let value = read_struct_value(r, ctx, shape, &type_name, Some(size))?;
            PropertyValue::Struct(StructProperty {
                type_name,
                struct_guid: guid,
                value,
            })
        }
        TagData::Plain => match kind {
            PropertyKind::Int8 => PropertyValue::Int8(r.read_i8()?),
            PropertyKind::Int => PropertyValue::Int(r.read_i32()?),
            PropertyKind::UInt32 => PropertyValue::UInt32(r.read_u32()?),
            PropertyKind::Int64 => PropertyValue::Int64(r.read_i64()?),
            PropertyKind::UInt64 => PropertyValue::UInt64(r.read_u64()?),
            PropertyKind::Float => PropertyValue::Float(r.read_f32()?),
            PropertyKind::Double => PropertyValue::Double(r.read_f64()?),
            PropertyKind::Str => PropertyValue::Str(r.read_string()?),
            PropertyKind::Name => PropertyValue::Name(r.read_string()?),
            PropertyKind::Object => PropertyValue::Object(ctx.read_reference(r)?),
            PropertyKind::Interface => PropertyValue::Interface(ctx.read_reference(r)?),
            PropertyKind::Text => PropertyValue::Text(read_text(r, ctx)?),
            other => {
                return Err(SavError::CorruptData(format!(
                    "{other} '{name}' without tag data"
                )));
            }
        },
    };
    Ok(value)
}

fn unsupported(container: &'static str, kind: PropertyKind, property: &str) -> SavError {
    SavError::UnsupportedElement {
        container,
        kind: kind.tag().to_string(),
        property: property.to_string(),
    }
}

fn read_many<R: Read, T>(
    r: &mut ByteReader<R>,
    count: usize,
    mut read: impl FnMut(&mut ByteReader<R>) -> Result<T>,
) -> Result<Vec<T>> {
    let mut values = Vec::new();
    for _ in 0..count {
        values.push(read(r)?);
    }
    Ok(values)
}

fn read_array<R: Read>(
    r: &mut ByteReader<R>,
    ctx: &CodecContext<'_>,
    element: PropertyKind,
    name: &str,
) -> Result<ArrayValue> {
    let count = r.read_count("array element")?;

    let array = match element {
        PropertyKind::Byte if name == FOG_OF_WAR_PROPERTY => {
            if count % 4 != 0 {
                return Err(SavError::CorruptData(format!(
                    "'{name}' holds {count} bytes, not whole pixels"
                )));
            }
            let raw = r.read_bytes(count)?;
            let values = raw
                .chunks_exact(4)
                .map(|pixel| {
                    if pixel[0] != 0 || pixel[1] != 0 || pixel[3] != 255 {
                        warn!(property = name, ?pixel, "unexpected fog of war pixel");
                    }
                    pixel[2]
                })
                .collect();
            ArrayValue::Byte(values)
        }
        PropertyKind::Byte => ArrayValue::Byte(r.read_bytes(count)?),
        PropertyKind::Bool => ArrayValue::Bool(read_many(r, count, |r| r.read_bool())?),
        PropertyKind::Int => ArrayValue::Int(read_many(r, count, |r| r.read_i32())?),
        PropertyKind::Int64 => ArrayValue::Int64(read_many(r, count, |r| r.read_i64())?),
        PropertyKind::Float => ArrayValue::Float(read_many(r, count, |r| r.read_f32())?),
        PropertyKind::Double => ArrayValue::Double(read_many(r, count, |r| r.read_f64())?),
        PropertyKind::Enum => ArrayValue::Enum(read_many(r, count, |r| r.read_string())?),
        PropertyKind::Str => ArrayValue::Str(read_many(r, count, |r| r.read_string())?),
        PropertyKind::Name => ArrayValue::Name(read_many(r, count, |r| r.read_string())?),
        PropertyKind::Text => ArrayValue::Text(read_many(r, count, |r| read_text(r, ctx))?),
        PropertyKind::Object => {
            ArrayValue::Object(read_many(r, count, |r| ctx.read_reference(r))?)
        }
        PropertyKind::Interface => {
            ArrayValue::Interface(read_many(r, count, |r| ctx.read_reference(r))?)
        }
        PropertyKind::Struct => ArrayValue::Struct(read_struct_array(r, ctx, count, name)?),
        other => return Err(unsupported("ArrayProperty", other, name)),
    };
    Ok(array)
}

fn read_struct_array<R: Read>(
    r: &mut ByteReader<R>,
    ctx: &CodecContext<'_>,
    count: usize,
    name: &str,
) -> Result<StructArray> {
    let inner_name = r.read_string()?;
    if inner_name != name {
        return Err(SavError::CorruptData(format!(
            "struct array '{name}' has element header for '{inner_name}'"
        )));
    }
    let inner_tag = r.read_string()?;
    if inner_tag != PropertyKind::Struct.tag() {
        return Err(SavError::CorruptData(format!(
            "struct array '{name}' has element header '{inner_tag}'"
        )));
    }
    let size = r.read_i32()?;
    let inner_index = r.read_i32()?;
    let type_name = r.read_string()?;
    let struct_guid = r.read_guid()?;
    let guid_marker = r.read_u8()?;
    if inner_index != 0 || guid_marker != 0 {
        return Err(SavError::CorruptData(format!(
            "struct array '{name}' element header has index {inner_index} and guid marker {guid_marker}"
        )));
    }

    let shape = ctx.structs().array_shape(&type_name);
    let start = r.position();
    let elements = read_many(r, count, |r| {
        read_struct_value(r, ctx, shape, &type_name, None)
    })?;
    let actual = r.position() - start;
    if i64::try_from(actual).ok() != Some(i64::from(size)) {
        return Err(SavError::CorruptData(format!(
            "struct array '{name}': declared {size} bytes but decoded {actual}"
        )));
    }

    Ok(StructArray {
        type_name,
        struct_guid,
        elements,
    })
}

fn read_map<R: Read>(
    r: &mut ByteReader<R>,
    ctx: &CodecContext<'_>,
    key_type: PropertyKind,
    value_type: PropertyKind,
    name: &str,
    parent_type: &str,
) -> Result<MapValue> {
    if !is_map_key_kind(key_type) {
        return Err(unsupported("MapProperty", key_type, name));
    }
    if !is_map_value_kind(value_type) {
        return Err(unsupported("MapProperty", value_type, name));
    }

    let mode = match r.read_i32()? {
        0 => MapMode::Plain,
        2 => MapMode::Named {
            first: r.read_string()?,
            second: r.read_string()?,
        },
        3 => MapMode::Prefixed {
            opaque: r.read_array::<9>()?,
            first: r.read_string()?,
            second: r.read_string()?,
        },
        other => MapMode::Other(other),
    };

    let count = r.read_count("map entry")?;
    let mut entries = Vec::new();
    for _ in 0..count {
        let key = match key_type {
            PropertyKind::Int => MapKey::Int(r.read_i32()?),
            PropertyKind::Int64 => MapKey::Int64(r.read_i64()?),
            PropertyKind::Name => MapKey::Name(r.read_string()?),
            PropertyKind::Str => MapKey::Str(r.read_string()?),
            PropertyKind::Object => MapKey::Object(ctx.read_reference(r)?),
            PropertyKind::Enum => MapKey::Enum(r.read_string()?),
            _ if name == FOLIAGE_TRANSFORM_PROPERTY => MapKey::Vector(read_vec3(r)?),
            _ => MapKey::Properties(read_properties(r, ctx, "")?),
        };
        let value = match value_type {
            PropertyKind::Byte if key_type == PropertyKind::Str => {
                MapItem::ByteName(r.read_string()?)
            }
            PropertyKind::Byte => MapItem::Byte(r.read_u8()?),
            PropertyKind::Bool => MapItem::Bool(r.read_bool()?),
            PropertyKind::Int => MapItem::Int(r.read_i32()?),
            PropertyKind::Int64 => MapItem::Int64(r.read_i64()?),
            PropertyKind::Float => MapItem::Float(r.read_f32()?),
            PropertyKind::Double => MapItem::Double(r.read_f64()?),
            PropertyKind::Str => MapItem::Str(r.read_string()?),
            PropertyKind::Name => MapItem::Name(r.read_string()?),
            PropertyKind::Object => MapItem::Object(ctx.read_reference(r)?),
            _ if parent_type == BALANCER_STRUCT_TYPE => MapItem::Balancer {
                normal_index: r.read_i32()?,
                overflow_index: r.read_i32()?,
                filter_index: r.read_i32()?,
            },
            _ => MapItem::Properties(read_properties(r, ctx, "")?),
        };
        entries.push(MapEntry { key, value });
    }

    Ok(MapValue {
        key_type,
        value_type,
        mode,
        entries,
    })
}

fn read_set<R: Read>(
    r: &mut ByteReader<R>,
    ctx: &CodecContext<'_>,
    element: PropertyKind,
    name: &str,
    parent_type: &str,
) -> Result<SetValue> {
    let reserved = r.read_i32()?;
    if reserved != 0 {
        return Err(SavError::UnsupportedElement {
            container: "SetProperty",
            kind: format!("{element} with {reserved} removed elements"),
            property: name.to_string(),
        });
    }
    let count = r.read_count("set element")?;

    let set = match element {
        PropertyKind::Object => SetValue::Object(read_many(r, count, |r| ctx.read_reference(r))?),
        PropertyKind::Int => SetValue::Int(read_many(r, count, |r| r.read_i32())?),
        PropertyKind::Name => SetValue::Name(read_many(r, count, |r| r.read_string())?),
        PropertyKind::Str => SetValue::Str(read_many(r, count, |r| r.read_string())?),
        PropertyKind::Struct if foliage_set(ctx, parent_type) => {
            SetValue::Vector(read_many(r, count, read_vec3)?)
        }
        PropertyKind::Struct => {
            SetValue::NetworkTrace(read_many(r, count, |r| read_network_trace(r, ctx))?)
        }
        other => return Err(unsupported("SetProperty", other, name)),
    };
    Ok(set)
}
