//! Tagged property values

use serde::{Deserialize, Serialize};

use super::record::ObjectReference;
use crate::primitive::Guid;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

/// Closed set of property kinds
///
/// The wire tag of each kind is its name followed by `Property`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    Bool,
    Int8,
    Int,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    Str,
    Name,
    Object,
    Interface,
    Enum,
    Byte,
    Text,
    Array,
    Map,
    Set,
    Struct,
}

impl PropertyKind {
    pub const ALL: [PropertyKind; 19] = [
        Self::Bool,
        Self::Int8,
        Self::Int,
        Self::UInt32,
        Self::Int64,
        Self::UInt64,
        Self::Float,
        Self::Double,
        Self::Str,
        Self::Name,
        Self::Object,
        Self::Interface,
        Self::Enum,
        Self::Byte,
        Self::Text,
        Self::Array,
        Self::Map,
        Self::Set,
        Self::Struct,
    ];

    /// Wire type tag, e.g. `IntProperty`
    pub fn tag(self) -> &'static str {
        match self {
            Self::Bool => "BoolProperty",
            Self::Int8 => "Int8Property",
            Self::Int => "IntProperty",
            Self::UInt32 => "UInt32Property",
            Self::Int64 => "Int64Property",
            Self::UInt64 => "UInt64Property",
            Self::Float => "FloatProperty",
            Self::Double => "DoubleProperty",
            Self::Str => "StrProperty",
            Self::Name => "NameProperty",
            Self::Object => "ObjectProperty",
            Self::Interface => "InterfaceProperty",
            Self::Enum => "EnumProperty",
            Self::Byte => "ByteProperty",
            Self::Text => "TextProperty",
            Self::Array => "ArrayProperty",
            Self::Map => "MapProperty",
            Self::Set => "SetProperty",
            Self::Struct => "StructProperty",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl std::fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// One named, typed field of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    /// Static array index, 0 for scalars
    #[serde(default)]
    pub index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<Guid>,
    pub value: PropertyValue,
}

impl Property {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            index: 0,
            guid: None,
            value,
        }
    }

    pub fn with_index(mut self, index: i32) -> Self {
        self.index = index;
        self
    }

    pub fn with_guid(mut self, guid: Guid) -> Self {
        self.guid = Some(guid);
        self
    }

    pub fn kind(&self) -> PropertyKind {
        self.value.kind()
    }
}

/// Payload of a `ByteProperty`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ByteValue {
    /// Enum name `None`: a raw byte
    Raw(u8),
    /// Named enum value
    Enum { enum_name: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Int8(i8),
    Int(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Str(String),
    Name(String),
    Object(ObjectReference),
    Interface(ObjectReference),
    Enum { enum_name: String, value: String },
    Byte(ByteValue),
    Text(TextValue),
    Array(ArrayValue),
    Map(MapValue),
    Set(SetValue),
    Struct(StructProperty),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Bool(_) => PropertyKind::Bool,
            Self::Int8(_) => PropertyKind::Int8,
            Self::Int(_) => PropertyKind::Int,
            Self::UInt32(_) => PropertyKind::UInt32,
            Self::Int64(_) => PropertyKind::Int64,
            Self::UInt64(_) => PropertyKind::UInt64,
            Self::Float(_) => PropertyKind::Float,
            Self::Double(_) => PropertyKind::Double,
            Self::Str(_) => PropertyKind::Str,
            Self::Name(_) => PropertyKind::Name,
            Self::Object(_) => PropertyKind::Object,
            Self::Interface(_) => PropertyKind::Interface,
            Self::Enum { .. } => PropertyKind::Enum,
            Self::Byte(_) => PropertyKind::Byte,
            Self::Text(_) => PropertyKind::Text,
            Self::Array(_) => PropertyKind::Array,
            Self::Map(_) => PropertyKind::Map,
            Self::Set(_) => PropertyKind::Set,
            Self::Struct(_) => PropertyKind::Struct,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) | Self::Name(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectReference> {
        match self {
            Self::Object(v) | Self::Interface(v) => Some(v),
            _ => None,
        }
    }
}

/// Localized text with its history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextValue {
    #[serde(default)]
    pub flags: i32,
    pub history: TextHistory,
}

impl TextValue {
    /// Plain base text
    pub fn base(
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            flags: 0,
            history: TextHistory::Base {
                namespace: namespace.into(),
                key: key.into(),
                value: value.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TextHistory {
    /// History type 0
    Base {
        namespace: String,
        key: String,
        value: String,
    },
    /// History types 1 (named) and 3 (argument) format
    Format {
        history_type: u8,
        source: Box<TextValue>,
        arguments: Vec<FormatArgument>,
    },
    /// History type 10
    Transform {
        source: Box<TextValue>,
        transform_type: u8,
    },
    /// History type 255
    None { culture_invariant: Option<String> },
}

impl TextHistory {
    pub fn history_type(&self) -> u8 {
        match self {
            Self::Base { .. } => 0,
            Self::Format { history_type, .. } => *history_type,
            Self::Transform { .. } => 10,
            Self::None { .. } => 255,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatArgument {
    pub name: String,
    pub value: FormatArgumentValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FormatArgumentValue {
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    Text(TextValue),
    Gender(u8),
}

impl FormatArgumentValue {
    /// Wire value-type byte
    pub fn value_type(&self) -> u8 {
        match self {
            Self::Int(_) => 0,
            Self::UInt(_) => 1,
            Self::Float(_) => 2,
            Self::Double(_) => 3,
            Self::Text(_) => 4,
            Self::Gender(_) => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrayValue {
    Byte(Vec<u8>),
    Bool(Vec<bool>),
    Int(Vec<i32>),
    Int64(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Enum(Vec<String>),
    Str(Vec<String>),
    Name(Vec<String>),
    Text(Vec<TextValue>),
    Object(Vec<ObjectReference>),
    Interface(Vec<ObjectReference>),
    Struct(StructArray),
}

impl ArrayValue {
    pub fn element_kind(&self) -> PropertyKind {
        match self {
            Self::Byte(_) => PropertyKind::Byte,
            Self::Bool(_) => PropertyKind::Bool,
            Self::Int(_) => PropertyKind::Int,
            Self::Int64(_) => PropertyKind::Int64,
            Self::Float(_) => PropertyKind::Float,
            Self::Double(_) => PropertyKind::Double,
            Self::Enum(_) => PropertyKind::Enum,
            Self::Str(_) => PropertyKind::Str,
            Self::Name(_) => PropertyKind::Name,
            Self::Text(_) => PropertyKind::Text,
            Self::Object(_) => PropertyKind::Object,
            Self::Interface(_) => PropertyKind::Interface,
            Self::Struct(_) => PropertyKind::Struct,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Byte(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Enum(v) | Self::Str(v) | Self::Name(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::Object(v) | Self::Interface(v) => v.len(),
            Self::Struct(v) => v.elements.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Struct elements of an array, sharing one inner type header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructArray {
    pub type_name: String,
    #[serde(default)]
    pub struct_guid: Guid,
    pub elements: Vec<StructValue>,
}

/// Map header prefix
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum MapMode {
    #[default]
    Plain,
    /// Mode 2: two strings
    Named { first: String, second: String },
    /// Mode 3: nine opaque bytes then two strings
    Prefixed {
        opaque: [u8; 9],
        first: String,
        second: String,
    },
    /// Any other mode value, no extra fields
    Other(i32),
}

impl MapMode {
    pub fn code(&self) -> i32 {
        match self {
            Self::Plain => 0,
            Self::Named { .. } => 2,
            Self::Prefixed { .. } => 3,
            Self::Other(code) => *code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    pub key_type: PropertyKind,
    pub value_type: PropertyKind,
    #[serde(default)]
    pub mode: MapMode,
    pub entries: Vec<MapEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntry {
    pub key: MapKey,
    pub value: MapItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapKey {
    Int(i32),
    Int64(i64),
    Name(String),
    Str(String),
    Object(ObjectReference),
    Enum(String),
    /// Struct key stored as a bare vector (foliage transforms)
    Vector(Vec3),
    Properties(Vec<Property>),
}

impl MapKey {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Int(_) => PropertyKind::Int,
            Self::Int64(_) => PropertyKind::Int64,
            Self::Name(_) => PropertyKind::Name,
            Self::Str(_) => PropertyKind::Str,
            Self::Object(_) => PropertyKind::Object,
            Self::Enum(_) => PropertyKind::Enum,
            Self::Vector(_) | Self::Properties(_) => PropertyKind::Struct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapItem {
    Byte(u8),
    /// Byte value keyed by a string: stored as a name
    ByteName(String),
    Bool(bool),
    Int(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Name(String),
    Object(ObjectReference),
    /// Load balancer slot indices
    Balancer {
        normal_index: i32,
        overflow_index: i32,
        filter_index: i32,
    },
    Properties(Vec<Property>),
}

impl MapItem {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Byte(_) | Self::ByteName(_) => PropertyKind::Byte,
            Self::Bool(_) => PropertyKind::Bool,
            Self::Int(_) => PropertyKind::Int,
            Self::Int64(_) => PropertyKind::Int64,
            Self::Float(_) => PropertyKind::Float,
            Self::Double(_) => PropertyKind::Double,
            Self::Str(_) => PropertyKind::Str,
            Self::Name(_) => PropertyKind::Name,
            Self::Object(_) => PropertyKind::Object,
            Self::Balancer { .. } | Self::Properties(_) => PropertyKind::Struct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SetValue {
    Object(Vec<ObjectReference>),
    Int(Vec<i32>),
    Name(Vec<String>),
    Str(Vec<String>),
    /// Foliage removal locations
    Vector(Vec<Vec3>),
    NetworkTrace(Vec<NetworkTrace>),
}

impl SetValue {
    pub fn element_kind(&self) -> PropertyKind {
        match self {
            Self::Object(_) => PropertyKind::Object,
            Self::Int(_) => PropertyKind::Int,
            Self::Name(_) => PropertyKind::Name,
            Self::Str(_) => PropertyKind::Str,
            Self::Vector(_) | Self::NetworkTrace(_) => PropertyKind::Struct,
        }
    }
}

/// Struct property with its declared type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructProperty {
    pub type_name: String,
    #[serde(default)]
    pub struct_guid: Guid,
    pub value: StructValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxValue {
    pub min: Vec3,
    pub max: Vec3,
    pub is_valid: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPosition {
    pub track: ObjectReference,
    pub offset: f32,
    pub forward: f32,
}

/// Inventory slot contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Opaque leading field, preserved as read
    #[serde(default)]
    pub unknown: i32,
    pub item_name: String,
    pub item_state: ObjectReference,
    /// Nested property following a top-level item outside its declared size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Box<Property>>,
}

/// Recursive network trace (modded content)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkTrace {
    pub reference: ObjectReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<Box<NetworkTrace>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpuBufferPixel {
    pub character: [u8; 2],
    pub foreground: LinearColor,
    pub background: LinearColor,
}

/// Decoded struct payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructValue {
    Color(Color),
    LinearColor(LinearColor),
    Vector(Vec3),
    Rotator(Vec3),
    Vector2D(Vec2),
    Quat(Vec4),
    Vector4(Vec4),
    Box(BoxValue),
    RailroadTrackPosition(TrackPosition),
    TimerHandle(String),
    Guid(Guid),
    InventoryItem(InventoryItem),
    FluidBox(f32),
    SlateBrush(String),
    DateTime(i64),
    NetworkTrace(NetworkTrace),
    GpuBufferPixel(GpuBufferPixel),
    FrameRange { begin: i64, end: i64 },
    /// Registered opaque extension: bytes kept verbatim
    Opaque(Vec<u8>),
    /// Generic fallback: a `None`-terminated property list
    Properties(Vec<Property>),
}
