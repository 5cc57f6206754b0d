//! Object/actor records, entities and class trailers

use serde::{Deserialize, Serialize};

use super::property::{Property, Vec3, Vec4};

/// Reference to another object by level and pathName.
///
/// `level_name` is `None` when the reference points into the file's own map;
/// it is written out as the header's map name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ObjectReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_name: Option<String>,
    pub path_name: String,
}

impl ObjectReference {
    /// Reference into the file's own map
    pub fn new(path_name: impl Into<String>) -> Self {
        Self {
            level_name: None,
            path_name: path_name.into(),
        }
    }

    /// Reference into an explicitly named level
    pub fn in_level(level_name: impl Into<String>, path_name: impl Into<String>) -> Self {
        Self {
            level_name: Some(level_name.into()),
            path_name: path_name.into(),
        }
    }

    /// The null reference (empty level and path)
    pub fn null() -> Self {
        Self::in_level("", "")
    }

    pub fn is_null(&self) -> bool {
        self.path_name.is_empty()
    }
}

/// Actor placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub rotation: Vec4,
    pub translation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
}

fn default_scale() -> Vec3 {
    Vec3::new(1.0, 1.0, 1.0)
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            rotation: Vec4::new(0.0, 0.0, 0.0, 1.0),
            translation: Vec3::default(),
            scale: default_scale(),
        }
    }
}

/// Absolute X/Y beyond which an actor is moved back to [`SAFE_TRANSLATION`]
pub const TRANSLATION_LIMIT: f32 = 500_000.0;

/// Where out-of-bounds actors are relocated
pub const SAFE_TRANSLATION: Vec3 = Vec3 {
    x: 0.0,
    y: 0.0,
    z: 2000.0,
};

impl Transform {
    /// Whether X or Y lies outside ±[`TRANSLATION_LIMIT`]
    pub fn is_out_of_bounds(&self) -> bool {
        self.translation.x.abs() > TRANSLATION_LIMIT || self.translation.y.abs() > TRANSLATION_LIMIT
    }

    /// Translation as it will be written: out-of-bounds positions reset to [`SAFE_TRANSLATION`]
    pub fn bounded_translation(&self) -> Vec3 {
        if self.is_out_of_bounds() {
            SAFE_TRANSLATION
        } else {
            self.translation
        }
    }
}

/// Actor-only record fields
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActorHeader {
    #[serde(default)]
    pub need_transform: i32,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub was_placed_in_level: i32,
}

/// Record variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordKind {
    /// Plain object (usually a component) owned by `outer_path_name`
    Object { outer_path_name: String },
    /// Placed actor
    Actor(ActorHeader),
}

/// Object or actor header record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub class_name: String,
    pub reference: ObjectReference,
    pub kind: RecordKind,
}

impl ObjectRecord {
    pub fn object(
        class_name: impl Into<String>,
        reference: ObjectReference,
        outer_path_name: impl Into<String>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            reference,
            kind: RecordKind::Object {
                outer_path_name: outer_path_name.into(),
            },
        }
    }

    pub fn actor(class_name: impl Into<String>, reference: ObjectReference, transform: Transform) -> Self {
        Self {
            class_name: class_name.into(),
            reference,
            kind: RecordKind::Actor(ActorHeader {
                transform,
                ..Default::default()
            }),
        }
    }

    pub fn path_name(&self) -> &str {
        &self.reference.path_name
    }

    pub fn is_actor(&self) -> bool {
        matches!(self.kind, RecordKind::Actor(_))
    }
}

/// Parent and component links carried at the start of an actor's entity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActorLinks {
    pub parent: ObjectReference,
    pub children: Vec<ObjectReference>,
}

/// Property payload paired 1:1 with an [`ObjectRecord`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entity {
    /// Only meaningful for actor records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<ActorLinks>,
    /// Emit an empty body (links only) to hard-reset the object's state
    #[serde(default)]
    pub force_empty: bool,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub trailer: Trailer,
}

impl Entity {
    pub fn with_properties(properties: Vec<Property>) -> Self {
        Self {
            properties,
            ..Default::default()
        }
    }

    /// First property with the given name
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    /// Replace the property with the same name and index, or append it
    pub fn set_property(&mut self, property: Property) {
        match self
            .properties
            .iter_mut()
            .find(|p| p.name == property.name && p.index == property.index)
        {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }

    /// Remove every property with the given name; returns whether any existed
    pub fn remove_property(&mut self, name: &str) -> bool {
        let before = self.properties.len();
        self.properties.retain(|p| p.name != name);
        self.properties.len() != before
    }
}

/// Item riding a conveyor belt or lift
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConveyorItem {
    pub length: i32,
    pub name: String,
    /// Item state reference, normally empty
    #[serde(default)]
    pub state_level_name: String,
    #[serde(default)]
    pub state_path_name: String,
    pub position: f32,
}

/// Power circuit entry of the circuit subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub circuit_id: i32,
    pub reference: ObjectReference,
}

/// Opaque per-slot physics blob of a wheeled vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSlot {
    pub name: String,
    pub data: Vec<u8>,
}

/// Byte length of [`VehicleSlot::data`]
pub const VEHICLE_SLOT_DATA_LEN: usize = 53;

/// Class-specific block following an entity's property list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Trailer {
    /// Nothing known: four zero bytes
    #[default]
    None,
    Conveyor {
        count: i32,
        items: Vec<ConveyorItem>,
    },
    /// Game state / game mode object lists
    GameState {
        count: i32,
        objects: Vec<ObjectReference>,
    },
    PowerLine {
        count: i32,
        source: ObjectReference,
        target: ObjectReference,
    },
    CircuitSubsystem {
        count: i32,
        circuits: Vec<Circuit>,
    },
    Train {
        count: i32,
        slots: Vec<VehicleSlot>,
        previous: ObjectReference,
        next: ObjectReference,
    },
    Vehicle {
        count: i32,
        slots: Vec<VehicleSlot>,
    },
    /// Bytes for a class the codec does not interpret, carried verbatim
    Opaque(Vec<u8>),
}
