//! Decoded save: header, levels and the object index

use crate::{
    config::CodecConfig,
    context::Registries,
    error::{Result, SavError},
    index::ObjectIndex,
    stream::{LevelPlan, Progress, SaveDataProvider, SaveEncoder},
    types::{Entity, ObjectRecord, ObjectReference, SaveHeader, SaveLevel},
};

/// A whole decoded save
#[derive(Debug, Clone)]
pub struct SaveGame {
    pub header: SaveHeader,
    /// In file order; the persistent level is last
    pub levels: Vec<SaveLevel>,
    pub index: ObjectIndex,
    /// Chunks the body was split into on disk
    pub chunk_count: usize,
    pub registries: Registries,
}

impl SaveGame {
    /// An empty save with only the persistent level
    pub fn new(header: SaveHeader) -> Self {
        Self {
            header,
            levels: vec![SaveLevel::persistent()],
            index: ObjectIndex::new(),
            chunk_count: 0,
            registries: Registries::default(),
        }
    }

    pub fn level(&self, name: Option<&str>) -> Option<&SaveLevel> {
        self.levels.iter().find(|level| level.name.as_deref() == name)
    }

    /// Levels in the order they are written
    pub fn level_plans(&self) -> Vec<LevelPlan> {
        self.levels
            .iter()
            .map(|level| LevelPlan {
                name: level.name.clone(),
            })
            .collect()
    }

    /// Add an object to `level`, creating a named level ahead of the persistent one if needed
    pub fn insert_object(
        &mut self,
        level: Option<&str>,
        record: ObjectRecord,
        entity: Entity,
    ) -> Result<()> {
        let path_name = record.path_name().to_owned();
        self.index.insert(record, entity)?;

        let idx = match self.levels.iter().position(|l| l.name.as_deref() == level) {
            Some(idx) => idx,
            None => {
                let new_level = match level {
                    Some(name) => SaveLevel::named(name),
                    None => SaveLevel::persistent(),
                };
                let at = match level {
                    Some(_) => self
                        .levels
                        .iter()
                        .position(|l| l.name.is_none())
                        .unwrap_or(self.levels.len()),
                    None => self.levels.len(),
                };
                self.levels.insert(at, new_level);
                at
            }
        };
        self.levels[idx].object_keys.push(path_name);
        Ok(())
    }

    /// Re-encode this save through an [`IndexProvider`]
    pub async fn encode<G: Progress>(&self, config: CodecConfig, progress: &mut G) -> Result<Vec<u8>> {
        let mut encoder =
            SaveEncoder::new(self.header.clone(), config)?.with_registries(self.registries.clone());
        let mut provider = IndexProvider::new(self);
        encoder
            .encode(&self.level_plans(), &mut provider, progress)
            .await
    }
}

/// Serves encode requests straight from a decoded [`SaveGame`]
#[derive(Debug, Clone, Copy)]
pub struct IndexProvider<'a> {
    game: &'a SaveGame,
}

impl<'a> IndexProvider<'a> {
    pub fn new(game: &'a SaveGame) -> Self {
        Self { game }
    }

    fn level(&self, name: Option<&str>) -> Result<&'a SaveLevel> {
        self.game.level(name).ok_or_else(|| {
            SavError::Provider(format!(
                "unknown level '{}'",
                name.unwrap_or("<persistent>")
            ))
        })
    }
}

impl SaveDataProvider for IndexProvider<'_> {
    async fn request_object_keys(&mut self, level: Option<&str>) -> Result<Vec<String>> {
        Ok(self.level(level)?.object_keys.clone())
    }

    async fn request_objects(
        &mut self,
        path_names: &[String],
    ) -> Result<Vec<(ObjectRecord, Entity)>> {
        path_names
            .iter()
            .map(|path_name| {
                self.game
                    .index
                    .lookup(path_name)
                    .map(|object| (object.record.clone(), object.entity.clone()))
                    .ok_or_else(|| SavError::MissingObject(path_name.clone()))
            })
            .collect()
    }

    async fn request_collectables(&mut self, level: Option<&str>) -> Result<Vec<ObjectReference>> {
        Ok(self.level(level)?.collectables.clone())
    }
}
