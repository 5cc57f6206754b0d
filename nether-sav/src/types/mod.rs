//! In-memory save model
//!
//! Every type derives serde so a decoded graph can be dumped or edited
//! outside the codec.

mod header;
mod property;
mod record;

pub use header::SaveHeader;
pub use property::{
    ArrayValue, BoxValue, ByteValue, Color, FormatArgument, FormatArgumentValue, GpuBufferPixel,
    InventoryItem, LinearColor, MapEntry, MapItem, MapKey, MapMode, MapValue, NetworkTrace,
    Property, PropertyKind, PropertyValue, SetValue, StructArray, StructProperty, StructValue,
    TextHistory, TextValue, TrackPosition, Vec2, Vec3, Vec4,
};
pub use record::{
    ActorHeader, ActorLinks, Circuit, ConveyorItem, Entity, ObjectRecord, ObjectReference,
    RecordKind, SAFE_TRANSLATION, TRANSLATION_LIMIT, Trailer, Transform, VEHICLE_SLOT_DATA_LEN,
    VehicleSlot,
};

use serde::{Deserialize, Serialize};

/// One level's bookkeeping in a decoded save
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SaveLevel {
    /// `None` for the persistent level (always last, or the only one pre-v29)
    pub name: Option<String>,
    /// pathNames in file order
    pub object_keys: Vec<String>,
    pub collectables: Vec<ObjectReference>,
}

impl SaveLevel {
    pub fn persistent() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_roundtrip() {
        for kind in PropertyKind::ALL {
            assert_eq!(PropertyKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(PropertyKind::Int.tag(), "IntProperty");
        assert_eq!(PropertyKind::from_tag("SoftObjectProperty"), None);
    }

    #[test]
    fn test_set_property_replaces_by_name_and_index() {
        let mut entity = Entity::default();
        entity.set_property(Property::new("mHealth", PropertyValue::Float(1.0)));
        entity.set_property(Property::new("mHealth", PropertyValue::Float(2.0)).with_index(1));
        entity.set_property(Property::new("mHealth", PropertyValue::Float(3.0)));

        assert_eq!(entity.properties.len(), 2);
        assert_eq!(entity.property("mHealth").unwrap().value.as_float(), Some(3.0));

        assert!(entity.remove_property("mHealth"));
        assert!(entity.properties.is_empty());
        assert!(!entity.remove_property("mHealth"));
    }

    #[test]
    fn test_translation_clamp_threshold() {
        let mut transform = Transform::default();
        transform.translation = Vec3::new(500_000.0, -500_000.0, 7.0);
        assert!(!transform.is_out_of_bounds());
        assert_eq!(transform.bounded_translation(), transform.translation);

        transform.translation.y = -500_000.5;
        assert!(transform.is_out_of_bounds());
        assert_eq!(transform.bounded_translation(), SAFE_TRANSLATION);

        transform.translation = Vec3::new(0.0, 0.0, 9.0e6);
        assert!(!transform.is_out_of_bounds());
    }

    #[test]
    fn test_model_serializes_to_json() {
        let entity = Entity::with_properties(vec![Property::new(
            "mOwner",
            PropertyValue::Object(ObjectReference::new("Persistent_Level:PersistentLevel.Foo")),
        )]);
        let json = serde_json::to_string(&entity).unwrap();
        let back: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entity);
    }
}
