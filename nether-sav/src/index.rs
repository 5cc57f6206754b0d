//! pathName lookup over a decoded object graph

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, SavError},
    types::{Entity, ObjectRecord, Property},
};

/// A record with its entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedObject {
    pub record: ObjectRecord,
    pub entity: Entity,
}

/// Objects of one session, keyed by pathName and kept in insertion order.
///
/// Filled while decoding and read by editing code; the codec itself never
/// queries it.
#[derive(Debug, Clone, Default)]
pub struct ObjectIndex {
    objects: Vec<IndexedObject>,
    by_path: HashMap<String, usize>,
}

impl ObjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, path_name: &str) -> bool {
        self.by_path.contains_key(path_name)
    }

    /// Add an object; a second object with the same pathName is corrupt input
    pub fn insert(&mut self, record: ObjectRecord, entity: Entity) -> Result<()> {
        if self.by_path.contains_key(record.path_name()) {
            return Err(SavError::CorruptData(format!(
                "duplicate pathName '{}'",
                record.path_name()
            )));
        }
        self.by_path
            .insert(record.path_name().to_owned(), self.objects.len());
        self.objects.push(IndexedObject { record, entity });
        Ok(())
    }

    pub fn lookup(&self, path_name: &str) -> Option<&IndexedObject> {
        self.by_path.get(path_name).map(|&idx| &self.objects[idx])
    }

    pub fn lookup_mut(&mut self, path_name: &str) -> Option<&mut IndexedObject> {
        self.by_path
            .get(path_name)
            .map(|&idx| &mut self.objects[idx])
    }

    /// First property named `name` on the entity of `path_name`
    pub fn get_property(&self, path_name: &str, name: &str) -> Option<&Property> {
        self.lookup(path_name)?.entity.property(name)
    }

    /// Replace the property with the same name and index, or append it
    pub fn set_property(&mut self, path_name: &str, property: Property) -> Result<()> {
        let object = self
            .lookup_mut(path_name)
            .ok_or_else(|| SavError::MissingObject(path_name.to_owned()))?;
        object.entity.set_property(property);
        Ok(())
    }

    /// Remove every property named `name`; `Ok(false)` when none existed
    pub fn delete_property(&mut self, path_name: &str, name: &str) -> Result<bool> {
        let object = self
            .lookup_mut(path_name)
            .ok_or_else(|| SavError::MissingObject(path_name.to_owned()))?;
        Ok(object.entity.remove_property(name))
    }

    /// Objects in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &IndexedObject> {
        self.objects.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ObjectReference, PropertyValue, Transform};

    const PATH: &str = "Persistent_Level:PersistentLevel.Build_SmelterMk1_C_42";

    fn smelter() -> ObjectRecord {
        ObjectRecord::actor(
            "/Game/FactoryGame/Buildable/Factory/SmelterMk1/Build_SmelterMk1.Build_SmelterMk1_C",
            ObjectReference::new(PATH),
            Transform::default(),
        )
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut index = ObjectIndex::new();
        index
            .insert(
                smelter(),
                Entity::with_properties(vec![Property::new(
                    "mCurrentPotential",
                    PropertyValue::Float(1.5),
                )]),
            )
            .unwrap();

        assert_eq!(index.len(), 1);
        assert!(index.contains(PATH));
        assert!(index.lookup("missing").is_none());
        assert_eq!(
            index
                .get_property(PATH, "mCurrentPotential")
                .and_then(|p| p.value.as_float()),
            Some(1.5)
        );
    }

    #[test]
    fn test_duplicate_path_is_corrupt() {
        let mut index = ObjectIndex::new();
        index.insert(smelter(), Entity::default()).unwrap();
        assert!(matches!(
            index.insert(smelter(), Entity::default()),
            Err(SavError::CorruptData(_))
        ));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_set_and_delete_property() {
        let mut index = ObjectIndex::new();
        index.insert(smelter(), Entity::default()).unwrap();

        index
            .set_property(PATH, Property::new("mIsProductionPaused", PropertyValue::Bool(true)))
            .unwrap();
        assert!(index.get_property(PATH, "mIsProductionPaused").is_some());

        assert!(index.delete_property(PATH, "mIsProductionPaused").unwrap());
        assert!(!index.delete_property(PATH, "mIsProductionPaused").unwrap());
        assert!(matches!(
            index.set_property("missing", Property::new("x", PropertyValue::Int(1))),
            Err(SavError::MissingObject(_))
        ));
    }

    #[test]
    fn test_iter_keeps_insertion_order() {
        let mut index = ObjectIndex::new();
        for n in [3, 1, 2] {
            let record = ObjectRecord::object(
                "/Script/FactoryGame.FGInventoryComponent",
                ObjectReference::new(format!("Persistent_Level:PersistentLevel.Inv_{n}")),
                "",
            );
            index.insert(record, Entity::default()).unwrap();
        }
        let order: Vec<_> = index.iter().map(|o| o.record.path_name().to_owned()).collect();
        assert_eq!(
            order,
            [
                "Persistent_Level:PersistentLevel.Inv_3",
                "Persistent_Level:PersistentLevel.Inv_1",
                "Persistent_Level:PersistentLevel.Inv_2",
            ]
        );
    }
}
