//! Collaborator interfaces the simulation core calls into.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::BlockPos;

use super::turtle::TurtleSnapshot;
use super::types::{Block, OwnerRef, TurtleId, TurtleSide, WorldId};
use super::upgrade::PeripheralHandle;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EntityKind {
    Turtle,
    Other(String),
}

/// Handle to a spawned entity. Only valid for the duration of one call;
/// callers must not cache it across relocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub world: WorldId,
    pub pos: BlockPos,
    pub kind: EntityKind,
    pub serial: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("world {world} is unknown")]
    UnknownWorld { world: WorldId },
    #[error("position {pos:?} in {world} is occupied")]
    Occupied { world: WorldId, pos: BlockPos },
    #[error("position {pos:?} in {world} is not loaded")]
    NotLoaded { world: WorldId, pos: BlockPos },
    #[error("spawn rejected: {reason}")]
    SpawnRejected { reason: String },
}

/// Block and entity storage. Only ever mutated from the tick thread.
pub trait TurtleWorld {
    fn is_loaded(&self, world: &str, pos: BlockPos) -> bool;

    fn is_in_bounds(&self, world: &str, pos: BlockPos) -> bool;

    fn block(&self, world: &str, pos: BlockPos) -> Block;

    fn set_block(&mut self, world: &str, pos: BlockPos, block: Block) -> Result<(), WorldError>;

    /// Returns true when `owner` may not modify or enter `pos`.
    fn is_protected(&self, _world: &str, _pos: BlockPos, _owner: Option<&OwnerRef>) -> bool {
        false
    }

    /// Creates a turtle entity at `pos` initialised from `template`.
    fn spawn_entity_like(
        &mut self,
        world: &str,
        pos: BlockPos,
        template: &TurtleSnapshot,
    ) -> Result<EntityRef, WorldError>;

    fn remove_entity(&mut self, world: &str, pos: BlockPos);
}

/// Capability table of the computer attached to each turtle.
pub trait PeripheralRegistry: Send {
    fn set_peripheral(
        &mut self,
        turtle_id: &TurtleId,
        side: TurtleSide,
        handle: Option<PeripheralHandle>,
    );
}

/// Registry for hosts that do not expose peripherals.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPeripherals;

impl PeripheralRegistry for NoPeripherals {
    fn set_peripheral(&mut self, _: &TurtleId, _: TurtleSide, _: Option<PeripheralHandle>) {}
}
