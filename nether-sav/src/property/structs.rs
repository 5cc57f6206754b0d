//! Struct shape registry and struct payload codec

use std::io::Read;

use hashbrown::HashMap;

use super::{read_properties, write_properties};
use crate::{
    context::CodecContext,
    error::{Result, SavError},
    primitive::{ByteReader, ByteWriter},
    types::{
        BoxValue, Color, GpuBufferPixel, InventoryItem, LinearColor, NetworkTrace, StructValue,
        TrackPosition, Vec2, Vec3, Vec4,
    },
};

/// Binary layout of a struct payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructShape {
    Color,
    LinearColor,
    Vector,
    Rotator,
    Vector2D,
    Quat,
    Vector4,
    Box,
    RailroadTrackPosition,
    TimerHandle,
    Guid,
    InventoryItem,
    FluidBox,
    SlateBrush,
    DateTime,
    NetworkTrace,
    GpuBufferPixel,
    FrameRange,
    /// Payload kept verbatim, sized by the enclosing property
    Opaque,
    /// `None`-terminated property list
    Properties,
}

const STRUCT_SHAPES: &[(&str, StructShape)] = &[
    ("Color", StructShape::Color),
    ("LinearColor", StructShape::LinearColor),
    ("Vector", StructShape::Vector),
    ("Rotator", StructShape::Rotator),
    ("Vector2D", StructShape::Vector2D),
    ("Quat", StructShape::Quat),
    ("Vector4", StructShape::Vector4),
    ("Box", StructShape::Box),
    ("RailroadTrackPosition", StructShape::RailroadTrackPosition),
    ("TimerHandle", StructShape::TimerHandle),
    ("Guid", StructShape::Guid),
    ("InventoryItem", StructShape::InventoryItem),
    ("FluidBox", StructShape::FluidBox),
    ("SlateBrush", StructShape::SlateBrush),
    ("DateTime", StructShape::DateTime),
    ("FINNetworkTrace", StructShape::NetworkTrace),
    ("FINGPUT1BufferPixel", StructShape::GpuBufferPixel),
    ("FINLuaProcessorStateStorage", StructShape::Opaque),
    ("FICFrameRange", StructShape::FrameRange),
];

const ARRAY_STRUCT_SHAPES: &[(&str, StructShape)] = &[
    ("InventoryItem", StructShape::InventoryItem),
    ("Guid", StructShape::Guid),
    ("FINNetworkTrace", StructShape::NetworkTrace),
    ("Vector", StructShape::Vector),
    ("LinearColor", StructShape::LinearColor),
    ("FINGPUT1BufferPixel", StructShape::GpuBufferPixel),
];

/// Maps struct type names to payload shapes.
///
/// Standalone struct properties and struct array elements use separate
/// tables. Unregistered names fall back to [`StructShape::Properties`].
#[derive(Debug, Clone)]
pub struct StructRegistry {
    shapes: HashMap<String, StructShape>,
    array_shapes: HashMap<String, StructShape>,
}

impl Default for StructRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StructRegistry {
    /// Registry with the built-in shapes
    pub fn new() -> Self {
        let collect = |table: &[(&str, StructShape)]| {
            table
                .iter()
                .map(|(name, shape)| (name.to_string(), *shape))
                .collect()
        };
        Self {
            shapes: collect(STRUCT_SHAPES),
            array_shapes: collect(ARRAY_STRUCT_SHAPES),
        }
    }

    /// Registry where every struct is a property list
    pub fn empty() -> Self {
        Self {
            shapes: HashMap::new(),
            array_shapes: HashMap::new(),
        }
    }

    pub fn register(&mut self, type_name: impl Into<String>, shape: StructShape) {
        self.shapes.insert(type_name.into(), shape);
    }

    pub fn register_array(&mut self, type_name: impl Into<String>, shape: StructShape) {
        self.array_shapes.insert(type_name.into(), shape);
    }

    pub fn shape(&self, type_name: &str) -> StructShape {
        self.shapes
            .get(type_name)
            .copied()
            .unwrap_or(StructShape::Properties)
    }

    pub fn array_shape(&self, type_name: &str) -> StructShape {
        self.array_shapes
            .get(type_name)
            .copied()
            .unwrap_or(StructShape::Properties)
    }
}

impl StructValue {
    pub fn shape(&self) -> StructShape {
        match self {
            Self::Color(_) => StructShape::Color,
            Self::LinearColor(_) => StructShape::LinearColor,
            Self::Vector(_) => StructShape::Vector,
            Self::Rotator(_) => StructShape::Rotator,
            Self::Vector2D(_) => StructShape::Vector2D,
            Self::Quat(_) => StructShape::Quat,
            Self::Vector4(_) => StructShape::Vector4,
            Self::Box(_) => StructShape::Box,
            Self::RailroadTrackPosition(_) => StructShape::RailroadTrackPosition,
            Self::TimerHandle(_) => StructShape::TimerHandle,
            Self::Guid(_) => StructShape::Guid,
            Self::InventoryItem(_) => StructShape::InventoryItem,
            Self::FluidBox(_) => StructShape::FluidBox,
            Self::SlateBrush(_) => StructShape::SlateBrush,
            Self::DateTime(_) => StructShape::DateTime,
            Self::NetworkTrace(_) => StructShape::NetworkTrace,
            Self::GpuBufferPixel(_) => StructShape::GpuBufferPixel,
            Self::FrameRange { .. } => StructShape::FrameRange,
            Self::Opaque(_) => StructShape::Opaque,
            Self::Properties(_) => StructShape::Properties,
        }
    }
}

pub(crate) fn write_vec3(w: &mut ByteWriter, v: &Vec3) {
    w.write_f32(v.x);
    w.write_f32(v.y);
    w.write_f32(v.z);
}

pub(crate) fn read_vec3<R: Read>(r: &mut ByteReader<R>) -> Result<Vec3> {
    Ok(Vec3::new(r.read_f32()?, r.read_f32()?, r.read_f32()?))
}

pub(crate) fn write_vec4(w: &mut ByteWriter, v: &Vec4) {
    w.write_f32(v.x);
    w.write_f32(v.y);
    w.write_f32(v.z);
    w.write_f32(v.w);
}

pub(crate) fn read_vec4<R: Read>(r: &mut ByteReader<R>) -> Result<Vec4> {
    Ok(Vec4::new(
        r.read_f32()?,
        r.read_f32()?,
        r.read_f32()?,
        r.read_f32()?,
    ))
}

fn write_linear_color(w: &mut ByteWriter, c: &LinearColor) {
    w.write_f32(c.r);
    w.write_f32(c.g);
    w.write_f32(c.b);
    w.write_f32(c.a);
}

fn read_linear_color<R: Read>(r: &mut ByteReader<R>) -> Result<LinearColor> {
    Ok(LinearColor {
        r: r.read_f32()?,
        g: r.read_f32()?,
        b: r.read_f32()?,
        a: r.read_f32()?,
    })
}

pub(crate) fn write_network_trace(w: &mut ByteWriter, ctx: &CodecContext<'_>, trace: &NetworkTrace) {
    ctx.write_reference(w, &trace.reference);
    match &trace.prev {
        Some(prev) => {
            w.write_i32(1);
            write_network_trace(w, ctx, prev);
        }
        None => w.write_i32(0),
    }
    match &trace.step {
        Some(step) => {
            w.write_i32(1);
            w.write_string(step);
        }
        None => w.write_i32(0),
    }
}

pub(crate) fn read_network_trace<R: Read>(
    r: &mut ByteReader<R>,
    ctx: &CodecContext<'_>,
) -> Result<NetworkTrace> {
    let reference = ctx.read_reference(r)?;
    let prev = match r.read_i32()? {
        0 => None,
        _ => Some(Box::new(read_network_trace(r, ctx)?)),
    };
    let step = match r.read_i32()? {
        0 => None,
        _ => Some(r.read_string()?),
    };
    Ok(NetworkTrace {
        reference,
        prev,
        step,
    })
}

/// Write a struct payload (without the enclosing property header)
pub(crate) fn write_struct_value(
    w: &mut ByteWriter,
    ctx: &CodecContext<'_>,
    value: &StructValue,
    type_name: &str,
) -> Result<()> {
    match value {
        StructValue::Color(c) => w.write_bytes(&[c.b, c.g, c.r, c.a]),
        StructValue::LinearColor(c) => write_linear_color(w, c),
        StructValue::Vector(v) | StructValue::Rotator(v) => write_vec3(w, v),
        StructValue::Vector2D(v) => {
            w.write_f32(v.x);
            w.write_f32(v.y);
        }
        StructValue::Quat(v) | StructValue::Vector4(v) => write_vec4(w, v),
        StructValue::Box(b) => {
            write_vec3(w, &b.min);
            write_vec3(w, &b.max);
            w.write_u8(b.is_valid);
        }
        StructValue::RailroadTrackPosition(p) => {
            ctx.write_reference(w, &p.track);
            w.write_f32(p.offset);
            w.write_f32(p.forward);
        }
        StructValue::TimerHandle(handle) | StructValue::SlateBrush(handle) => {
            w.write_string(handle)
        }
        StructValue::Guid(guid) => w.write_guid(guid),
        StructValue::InventoryItem(item) => {
            w.write_i32(item.unknown);
            w.write_string(&item.item_name);
            ctx.write_reference(w, &item.item_state);
        }
        StructValue::FluidBox(value) => w.write_f32(*value),
        StructValue::DateTime(ticks) => w.write_i64(*ticks),
        StructValue::NetworkTrace(trace) => write_network_trace(w, ctx, trace),
        StructValue::GpuBufferPixel(pixel) => {
            w.write_bytes(&pixel.character);
            write_linear_color(w, &pixel.foreground);
            write_linear_color(w, &pixel.background);
        }
        StructValue::FrameRange { begin, end } => {
            w.write_i64(*begin);
            w.write_i64(*end);
        }
        StructValue::Opaque(bytes) => w.write_bytes(bytes),
        StructValue::Properties(properties) => write_properties(w, ctx, properties, type_name)?,
    }
    Ok(())
}

/// Read a struct payload of the given shape.
///
/// `size` is the enclosing property's declared size; only opaque shapes need it.
pub(crate) fn read_struct_value<R: Read>(
    r: &mut ByteReader<R>,
    ctx: &CodecContext<'_>,
    shape: StructShape,
    type_name: &str,
    size: Option<usize>,
) -> Result<StructValue> {
    let value = match shape {
        StructShape::Color => {
            let [b, g, red, a] = r.read_array::<4>()?;
            StructValue::Color(Color { r: red, g, b, a })
        }
        StructShape::LinearColor => StructValue::LinearColor(read_linear_color(r)?),
        StructShape::Vector => StructValue::Vector(read_vec3(r)?),
        StructShape::Rotator => StructValue::Rotator(read_vec3(r)?),
        StructShape::Vector2D => StructValue::Vector2D(Vec2 {
            x: r.read_f32()?,
            y: r.read_f32()?,
        }),
        StructShape::Quat => StructValue::Quat(read_vec4(r)?),
        StructShape::Vector4 => StructValue::Vector4(read_vec4(r)?),
        StructShape::Box => StructValue::Box(BoxValue {
            min: read_vec3(r)?,
            max: read_vec3(r)?,
            is_valid: r.read_u8()?,
        }),
        StructShape::RailroadTrackPosition => {
            StructValue::RailroadTrackPosition(TrackPosition {
                track: ctx.read_reference(r)?,
                offset: r.read_f32()?,
                forward: r.read_f32()?,
            })
        }
        StructShape::TimerHandle => StructValue::TimerHandle(r.read_string()?),
        StructShape::Guid => StructValue::Guid(r.read_guid()?),
        StructShape::InventoryItem => StructValue::InventoryItem(InventoryItem {
            unknown: r.read_i32()?,
            item_name: r.read_string()?,
            item_state: ctx.read_reference(r)?,
            state: None,
        }),
        StructShape::FluidBox => StructValue::FluidBox(r.read_f32()?),
        StructShape::SlateBrush => StructValue::SlateBrush(r.read_string()?),
        StructShape::DateTime => StructValue::DateTime(r.read_i64()?),
        StructShape::NetworkTrace => StructValue::NetworkTrace(read_network_trace(r, ctx)?),
        StructShape::GpuBufferPixel => StructValue::GpuBufferPixel(GpuBufferPixel {
            character: r.read_array::<2>()?,
            foreground: read_linear_color(r)?,
            background: read_linear_color(r)?,
        }),
        StructShape::FrameRange => StructValue::FrameRange {
            begin: r.read_i64()?,
            end: r.read_i64()?,
        },
        StructShape::Opaque => {
            let size = size.ok_or_else(|| {
                SavError::CorruptData(format!(
                    "opaque struct '{type_name}' has no declared size"
                ))
            })?;
            StructValue::Opaque(r.read_bytes(size)?)
        }
        StructShape::Properties => StructValue::Properties(read_properties(r, ctx, type_name)?),
    };
    Ok(value)
}
