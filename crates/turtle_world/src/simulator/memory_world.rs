//! In-memory world used by the demo binary and tests.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

use crate::geometry::{BlockPos, ChunkPos};

use super::turtle::TurtleSnapshot;
use super::types::{Block, BlockKind, OwnerRef, WorldId};
use super::world::{EntityKind, EntityRef, TurtleWorld, WorldError};

pub const TURTLE_BLOCK_ID: &str = "turtle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min_y: i32,
    pub max_y: i32,
    /// Horizontal border: `|x|` and `|z|` must stay below it.
    pub border: i32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min_y: -64,
            max_y: 319,
            border: 29_999_984,
        }
    }
}

impl WorldBounds {
    pub fn contains(&self, pos: BlockPos) -> bool {
        (self.min_y..=self.max_y).contains(&pos.y)
            && pos.x.unsigned_abs() < self.border.unsigned_abs()
            && pos.z.unsigned_abs() < self.border.unsigned_abs()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    pub serial: u64,
    pub kind: EntityKind,
    pub template: TurtleSnapshot,
}

#[derive(Debug, Clone, Default)]
struct Dimension {
    bounds: WorldBounds,
    loaded: BTreeSet<ChunkPos>,
    blocks: BTreeMap<BlockPos, Block>,
    /// Everything at or below this height defaults to the floor block.
    floor: Option<(i32, Block)>,
    entities: BTreeMap<BlockPos, EntityRecord>,
    protected: BTreeSet<BlockPos>,
}

impl Dimension {
    fn is_loaded(&self, pos: BlockPos) -> bool {
        self.loaded.contains(&ChunkPos::of(pos))
    }
}

#[derive(Debug, Default)]
pub struct MemoryWorld {
    dimensions: BTreeMap<WorldId, Dimension>,
    next_serial: u64,
    spawn_calls: usize,
    remove_calls: usize,
    fail_next_spawn: Option<WorldError>,
    next_spawn_kind: Option<EntityKind>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_world(mut self, world: impl Into<WorldId>, bounds: WorldBounds) -> Self {
        self.add_world(world, bounds);
        self
    }

    pub fn add_world(&mut self, world: impl Into<WorldId>, bounds: WorldBounds) {
        self.dimensions.entry(world.into()).or_default().bounds = bounds;
    }

    /// Flat world: chunks within `radius` of the origin are loaded and every
    /// block at or below `floor_y` is `floor_block`.
    pub fn flat(world: impl Into<WorldId>, radius: i32, floor_y: i32, floor_block: Block) -> Self {
        let world = world.into();
        let mut memory = Self::new().with_world(world.clone(), WorldBounds::default());
        for x in -radius..=radius {
            for z in -radius..=radius {
                memory.load_chunk(&world, ChunkPos { x, z });
            }
        }
        if let Some(dimension) = memory.dimensions.get_mut(&world) {
            dimension.floor = Some((floor_y, floor_block));
        }
        memory
    }

    pub fn load_chunk(&mut self, world: &str, chunk: ChunkPos) {
        if let Some(dimension) = self.dimensions.get_mut(world) {
            dimension.loaded.insert(chunk);
        }
    }

    pub fn unload_chunk(&mut self, world: &str, chunk: ChunkPos) {
        if let Some(dimension) = self.dimensions.get_mut(world) {
            dimension.loaded.remove(&chunk);
        }
    }

    /// Writes a block regardless of load state.
    pub fn put_block(&mut self, world: &str, pos: BlockPos, block: Block) {
        if let Some(dimension) = self.dimensions.get_mut(world) {
            dimension.blocks.insert(pos, block);
        }
    }

    pub fn protect(&mut self, world: &str, pos: BlockPos) {
        if let Some(dimension) = self.dimensions.get_mut(world) {
            dimension.protected.insert(pos);
        }
    }

    /// The next `spawn_entity_like` call fails with `err`.
    pub fn fail_next_spawn(&mut self, err: WorldError) {
        self.fail_next_spawn = Some(err);
    }

    /// The next spawned entity is created with `kind` instead of a turtle.
    pub fn spawn_next_as(&mut self, kind: EntityKind) {
        self.next_spawn_kind = Some(kind);
    }

    pub fn spawn_calls(&self) -> usize {
        self.spawn_calls
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls
    }

    pub fn entity_at(&self, world: &str, pos: BlockPos) -> Option<&EntityRecord> {
        self.dimensions.get(world)?.entities.get(&pos)
    }

    pub fn entity_count(&self) -> usize {
        self.dimensions
            .values()
            .map(|dimension| dimension.entities.len())
            .sum()
    }
}

impl TurtleWorld for MemoryWorld {
    fn is_loaded(&self, world: &str, pos: BlockPos) -> bool {
        self.dimensions
            .get(world)
            .is_some_and(|dimension| dimension.is_loaded(pos))
    }

    fn is_in_bounds(&self, world: &str, pos: BlockPos) -> bool {
        self.dimensions
            .get(world)
            .is_some_and(|dimension| dimension.bounds.contains(pos))
    }

    fn block(&self, world: &str, pos: BlockPos) -> Block {
        let Some(dimension) = self.dimensions.get(world) else {
            return Block::air();
        };
        if dimension.entities.contains_key(&pos) {
            return Block {
                id: TURTLE_BLOCK_ID.to_string(),
                kind: BlockKind::Turtle,
            };
        }
        if let Some(block) = dimension.blocks.get(&pos) {
            return block.clone();
        }
        match &dimension.floor {
            Some((floor_y, floor_block)) if pos.y <= *floor_y => floor_block.clone(),
            _ => Block::air(),
        }
    }

    fn set_block(&mut self, world: &str, pos: BlockPos, block: Block) -> Result<(), WorldError> {
        let dimension = self
            .dimensions
            .get_mut(world)
            .ok_or_else(|| WorldError::UnknownWorld {
                world: world.to_string(),
            })?;
        if !dimension.is_loaded(pos) {
            return Err(WorldError::NotLoaded {
                world: world.to_string(),
                pos,
            });
        }
        dimension.blocks.insert(pos, block);
        Ok(())
    }

    fn is_protected(&self, world: &str, pos: BlockPos, _owner: Option<&OwnerRef>) -> bool {
        self.dimensions
            .get(world)
            .is_some_and(|dimension| dimension.protected.contains(&pos))
    }

    fn spawn_entity_like(
        &mut self,
        world: &str,
        pos: BlockPos,
        template: &TurtleSnapshot,
    ) -> Result<EntityRef, WorldError> {
        self.spawn_calls += 1;
        if let Some(err) = self.fail_next_spawn.take() {
            return Err(err);
        }
        let dimension = self
            .dimensions
            .get_mut(world)
            .ok_or_else(|| WorldError::UnknownWorld {
                world: world.to_string(),
            })?;
        if !dimension.is_loaded(pos) {
            return Err(WorldError::NotLoaded {
                world: world.to_string(),
                pos,
            });
        }
        if dimension.entities.contains_key(&pos) {
            return Err(WorldError::Occupied {
                world: world.to_string(),
                pos,
            });
        }

        self.next_serial += 1;
        let kind = self.next_spawn_kind.take().unwrap_or(EntityKind::Turtle);
        dimension.entities.insert(
            pos,
            EntityRecord {
                serial: self.next_serial,
                kind: kind.clone(),
                template: template.clone(),
            },
        );
        trace!(world, ?pos, serial = self.next_serial, "entity spawned");
        Ok(EntityRef {
            world: world.to_string(),
            pos,
            kind,
            serial: self.next_serial,
        })
    }

    fn remove_entity(&mut self, world: &str, pos: BlockPos) {
        self.remove_calls += 1;
        if let Some(dimension) = self.dimensions.get_mut(world) {
            dimension.entities.remove(&pos);
        }
    }
}
