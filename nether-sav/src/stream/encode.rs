//! Encode session state machine
//!
//! ```text
//! Idle -> WritingHeader -> MultiLevel | SingleLevel
//!      -> StreamingObjects -> StreamingEntities -> NextLevel | Finalizing -> Done
//! ```
//!
//! Each level is streamed twice from the provider: once for the records and
//! once for the entities, so no more than one batch of objects is held at a
//! time.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    chunk::ChunkAssembler,
    header::write_header,
    progress::{Progress, ProgressPhase, stream_percent},
    provider::SaveDataProvider,
};
use crate::{
    config::CodecConfig,
    context::{CodecContext, Registries},
    error::{Result, SavError},
    object::{write_entity, write_record},
    primitive::ByteWriter,
    types::{Entity, ObjectRecord, ObjectReference, SaveHeader},
};

/// One level to encode, in file order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelPlan {
    /// `None` for the persistent level, which must be last
    pub name: Option<String>,
}

impl LevelPlan {
    pub fn persistent() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// Where an encode session currently is
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EncodeState {
    #[default]
    Idle,
    WritingHeader,
    MultiLevel,
    SingleLevel,
    StreamingObjects {
        level: usize,
    },
    StreamingEntities {
        level: usize,
    },
    NextLevel,
    Finalizing,
    Done,
    Failed,
}

impl fmt::Display for EncodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeState::Idle => f.write_str("idle"),
            EncodeState::WritingHeader => f.write_str("writing header"),
            EncodeState::MultiLevel => f.write_str("multi-level"),
            EncodeState::SingleLevel => f.write_str("single level"),
            EncodeState::StreamingObjects { level } => write!(f, "streaming objects of level {level}"),
            EncodeState::StreamingEntities { level } => {
                write!(f, "streaming entities of level {level}")
            }
            EncodeState::NextLevel => f.write_str("next level"),
            EncodeState::Finalizing => f.write_str("finalizing"),
            EncodeState::Done => f.write_str("done"),
            EncodeState::Failed => f.write_str("failed"),
        }
    }
}

fn transition(state: &mut EncodeState, next: EncodeState) {
    debug!(from = %state, to = %next, "encode state");
    *state = next;
}

fn count_i32(len: usize, what: &str) -> Result<i32> {
    i32::try_from(len).map_err(|_| SavError::InvalidConfig(format!("too many {what}: {len}")))
}

/// Streams a save from a [`SaveDataProvider`] into framed, compressed bytes
#[derive(Debug)]
pub struct SaveEncoder {
    header: SaveHeader,
    config: CodecConfig,
    registries: Registries,
    state: EncodeState,
}

impl SaveEncoder {
    pub fn new(header: SaveHeader, config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            header,
            config,
            registries: Registries::default(),
            state: EncodeState::Idle,
        })
    }

    /// Use custom struct/trailer registries
    pub fn with_registries(mut self, registries: Registries) -> Self {
        self.registries = registries;
        self
    }

    pub fn state(&self) -> &EncodeState {
        &self.state
    }

    pub fn header(&self) -> &SaveHeader {
        &self.header
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Run one full session.
    ///
    /// Levels are written in the given order; for save versions before 29
    /// exactly one level is allowed. Any error, including a provider failure,
    /// aborts the session and leaves the encoder in [`EncodeState::Failed`].
    pub async fn encode<P, G>(
        &mut self,
        levels: &[LevelPlan],
        provider: &mut P,
        progress: &mut G,
    ) -> Result<Vec<u8>>
    where
        P: SaveDataProvider,
        G: Progress,
    {
        transition(&mut self.state, EncodeState::Idle);

        let session = Session {
            ctx: CodecContext::new(&self.header, &self.registries),
            config: &self.config,
            chunks: ChunkAssembler::new(&self.config),
            state: &mut self.state,
            provider,
            progress,
            levels: levels.len(),
        };
        let result = session.run(levels).await;

        if let Err(err) = &result {
            warn!(%err, "encode session aborted");
            transition(&mut self.state, EncodeState::Failed);
        }
        result
    }
}

struct Session<'a, P, G> {
    ctx: CodecContext<'a>,
    config: &'a CodecConfig,
    chunks: ChunkAssembler,
    state: &'a mut EncodeState,
    provider: &'a mut P,
    progress: &'a mut G,
    levels: usize,
}

impl<P: SaveDataProvider, G: Progress> Session<'_, P, G> {
    async fn run(mut self, levels: &[LevelPlan]) -> Result<Vec<u8>> {
        transition(self.state, EncodeState::WritingHeader);
        self.progress
            .report(ProgressPhase::Header, "writing header", 0);
        let mut header_bytes = ByteWriter::new();
        write_header(&mut header_bytes, self.ctx.header);

        if self.ctx.header.has_levels() {
            transition(self.state, EncodeState::MultiLevel);
            if levels.is_empty() {
                return Err(SavError::InvalidConfig(
                    "at least the persistent level is required".into(),
                ));
            }
            let extra = count_i32(levels.len() - 1, "levels")?;
            self.chunks.writer().write_i32(extra);
        } else {
            transition(self.state, EncodeState::SingleLevel);
            if levels.len() != 1 {
                return Err(SavError::InvalidConfig(format!(
                    "save version {} has exactly one level, got {}",
                    self.ctx.save_version(),
                    levels.len()
                )));
            }
        }

        for (idx, plan) in levels.iter().enumerate() {
            if idx > 0 {
                transition(self.state, EncodeState::NextLevel);
            }
            self.level(idx, plan).await?;
        }

        transition(self.state, EncodeState::Finalizing);
        self.progress
            .report(ProgressPhase::Finalizing, "compressing remaining chunks", 96);
        let bytes = self.chunks.finish(header_bytes.as_slice())?;

        transition(self.state, EncodeState::Done);
        self.progress.report(ProgressPhase::Done, "save encoded", 100);
        info!(bytes = bytes.len(), levels = levels.len(), "save encoded");
        Ok(bytes)
    }

    async fn level(&mut self, idx: usize, plan: &LevelPlan) -> Result<()> {
        let sections = self.ctx.header.has_levels();
        let level = plan.name.as_deref();

        if sections && idx + 1 < self.levels {
            let Some(name) = level else {
                return Err(SavError::InvalidConfig(format!(
                    "level {idx} needs a name; only the last level is implicit"
                )));
            };
            self.chunks.writer().write_string(name);
        }

        let keys = self.provider.request_object_keys(level).await?;
        let collectables = self.provider.request_collectables(level).await?;
        debug!(
            level = level.unwrap_or("<persistent>"),
            objects = keys.len(),
            collectables = collectables.len(),
            "level keys received"
        );

        // Records
        transition(self.state, EncodeState::StreamingObjects { level: idx });
        let section = sections.then(|| {
            let key = self.chunks.reserve();
            (key, self.chunks.writer().span_start())
        });
        let count = count_i32(keys.len(), "objects")?;
        self.chunks.writer().write_i32(count);

        let mut done = 0;
        for batch in keys.chunks(self.config.batch_size) {
            let objects = self.fetch(batch).await?;
            for (record, _) in &objects {
                write_record(self.chunks.writer(), &self.ctx, record);
            }
            self.chunks.cut_full_chunks()?;
            done += batch.len();
            self.report(ProgressPhase::Objects, idx, 0, done, keys.len());
        }

        if let Some((key, start)) = section {
            self.write_collectables(&collectables)?;
            self.chunks.resolve_span(key, start)?;
        }

        // Entities
        transition(self.state, EncodeState::StreamingEntities { level: idx });
        let section = sections.then(|| {
            let key = self.chunks.reserve();
            (key, self.chunks.writer().span_start())
        });
        self.chunks.writer().write_i32(count);

        let max = self.chunks.max_chunk_size();
        let mut done = 0;
        for batch in keys.chunks(self.config.batch_size) {
            let objects = self.fetch(batch).await?;
            for (record, entity) in &objects {
                let len = write_entity(self.chunks.writer(), &self.ctx, record, entity)?;
                if len as usize > max {
                    debug!(path = %record.path_name(), len, "oversized entity flushed");
                    self.chunks.flush()?;
                } else {
                    self.chunks.cut_full_chunks()?;
                }
            }
            done += batch.len();
            self.report(ProgressPhase::Entities, idx, 1, done, keys.len());
        }

        if let Some((key, start)) = section {
            self.chunks.resolve_span(key, start)?;
        }
        self.write_collectables(&collectables)?;
        self.chunks.cut_full_chunks()
    }

    /// Request one batch and check the reply lines up with it
    async fn fetch(&mut self, batch: &[String]) -> Result<Vec<(ObjectRecord, Entity)>> {
        let objects = self.provider.request_objects(batch).await?;
        for (path_name, (record, _)) in batch.iter().zip(&objects) {
            if record.path_name() != path_name {
                return Err(SavError::MissingObject(path_name.clone()));
            }
        }
        if let Some(missing) = batch.get(objects.len()) {
            return Err(SavError::MissingObject(missing.clone()));
        }
        if objects.len() > batch.len() {
            return Err(SavError::Provider(format!(
                "{} objects returned for {} pathNames",
                objects.len(),
                batch.len()
            )));
        }
        Ok(objects)
    }

    fn write_collectables(&mut self, collectables: &[ObjectReference]) -> Result<()> {
        let count = count_i32(collectables.len(), "collectables")?;
        let w = self.chunks.writer();
        w.write_i32(count);
        for reference in collectables {
            self.ctx.write_reference(w, reference);
        }
        Ok(())
    }

    fn report(&mut self, phase: ProgressPhase, level: usize, pass: usize, done: usize, total: usize) {
        let percent = stream_percent(level, self.levels, pass, done, total);
        let message = format!("level {}/{}: {done}/{total} {phase}", level + 1, self.levels);
        self.progress.report(phase, &message, percent);
    }
}
