//! The simulated turtle and its transferable state.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::geometry::{BlockPos, Facing};

use super::animation::AnimationController;
use super::config::TurtleConfig;
use super::fuel::FuelLedger;
use super::types::{Inventory, OwnerRef, TurtleId, TurtleTier, WorldId, INVENTORY_SIZE};
use super::upgrade::{UpgradeIds, UpgradeManager};
use super::world::EntityRef;

/// Set while a relocation is in flight.
///
/// Clones share the flag, so world callbacks fired during a relocation can
/// tell that the turtle is mid-move and must be left alone.
#[derive(Debug, Clone, Default)]
pub struct MoveLatch(Arc<AtomicBool>);

impl MoveLatch {
    pub fn is_engaged(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Returns `None` when a relocation is already in progress.
    pub(crate) fn engage(&self) -> Option<MoveGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| MoveGuard(Arc::clone(&self.0)))
    }
}

/// Clears the latch when dropped, including during unwinding.
#[derive(Debug)]
pub(crate) struct MoveGuard(Arc<AtomicBool>);

impl Drop for MoveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Registration parameters for a new turtle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurtleSpawnConfig {
    pub turtle_id: TurtleId,
    pub world: WorldId,
    pub pos: BlockPos,
    #[serde(default)]
    pub facing: Facing,
    #[serde(default)]
    pub tier: TurtleTier,
    #[serde(default)]
    pub owner: Option<OwnerRef>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub fuel_level: u32,
    #[serde(default)]
    pub inventory: Inventory,
}

impl TurtleSpawnConfig {
    pub fn new(turtle_id: impl Into<TurtleId>, world: impl Into<WorldId>, pos: BlockPos) -> Self {
        Self {
            turtle_id: turtle_id.into(),
            world: world.into(),
            pos,
            facing: Facing::default(),
            tier: TurtleTier::default(),
            owner: None,
            label: None,
            fuel_level: 0,
            inventory: Inventory::default(),
        }
    }
}

/// Everything a replacement entity needs to continue as the same turtle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurtleSnapshot {
    pub turtle_id: TurtleId,
    pub tier: TurtleTier,
    pub world: WorldId,
    pub pos: BlockPos,
    pub facing: Facing,
    pub selected_slot: usize,
    pub inventory: Inventory,
    pub fuel_level: u32,
    pub fuel_limit: u32,
    pub upgrades: UpgradeIds,
    pub owner: Option<OwnerRef>,
    pub label: Option<String>,
}

#[derive(Debug)]
pub struct Turtle {
    id: TurtleId,
    tier: TurtleTier,
    entity: EntityRef,
    facing: Facing,
    selected_slot: usize,
    inventory: Inventory,
    fuel: FuelLedger,
    upgrades: UpgradeManager,
    owner: Option<OwnerRef>,
    label: Option<String>,
    animation: AnimationController,
    move_latch: MoveLatch,
    computer_attached: bool,
}

impl Turtle {
    pub(crate) fn new(spec: TurtleSpawnConfig, entity: EntityRef, config: &TurtleConfig) -> Self {
        let mut fuel = FuelLedger::for_tier(spec.tier, config);
        fuel.add(spec.fuel_level);
        Self {
            id: spec.turtle_id,
            tier: spec.tier,
            entity,
            facing: spec.facing,
            selected_slot: 0,
            inventory: spec.inventory,
            fuel,
            upgrades: UpgradeManager::new(),
            owner: spec.owner,
            label: spec.label,
            animation: AnimationController::with_duration(config.animation_duration_ticks),
            move_latch: MoveLatch::default(),
            computer_attached: true,
        }
    }

    pub fn id(&self) -> &TurtleId {
        &self.id
    }

    pub fn tier(&self) -> TurtleTier {
        self.tier
    }

    pub fn world(&self) -> &str {
        &self.entity.world
    }

    pub fn pos(&self) -> BlockPos {
        self.entity.pos
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn set_facing(&mut self, facing: Facing) {
        self.facing = facing;
    }

    pub fn selected_slot(&self) -> usize {
        self.selected_slot
    }

    /// Returns false when the slot does not exist.
    pub fn select(&mut self, slot: usize) -> bool {
        if slot >= INVENTORY_SIZE {
            return false;
        }
        self.selected_slot = slot;
        true
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    pub fn fuel(&self) -> &FuelLedger {
        &self.fuel
    }

    pub fn fuel_mut(&mut self) -> &mut FuelLedger {
        &mut self.fuel
    }

    pub fn upgrades(&self) -> &UpgradeManager {
        &self.upgrades
    }

    pub fn upgrades_mut(&mut self) -> &mut UpgradeManager {
        &mut self.upgrades
    }

    pub fn owner(&self) -> Option<&OwnerRef> {
        self.owner.as_ref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label.filter(|label| !label.trim().is_empty());
    }

    pub fn animation(&self) -> &AnimationController {
        &self.animation
    }

    pub fn animation_mut(&mut self) -> &mut AnimationController {
        &mut self.animation
    }

    pub fn move_latch(&self) -> MoveLatch {
        self.move_latch.clone()
    }

    pub fn is_moving(&self) -> bool {
        self.move_latch.is_engaged()
    }

    pub fn computer_attached(&self) -> bool {
        self.computer_attached
    }

    pub(crate) fn set_computer_attached(&mut self, attached: bool) {
        self.computer_attached = attached;
    }

    /// Only the relocator swaps the backing entity.
    pub(super) fn replace_entity(&mut self, entity: EntityRef) -> EntityRef {
        std::mem::replace(&mut self.entity, entity)
    }

    pub fn snapshot(&self) -> TurtleSnapshot {
        TurtleSnapshot {
            turtle_id: self.id.clone(),
            tier: self.tier,
            world: self.entity.world.clone(),
            pos: self.entity.pos,
            facing: self.facing,
            selected_slot: self.selected_slot,
            inventory: self.inventory.clone(),
            fuel_level: self.fuel.level(),
            fuel_limit: self.fuel.cap(),
            upgrades: self.upgrades.ids(),
            owner: self.owner.clone(),
            label: self.label.clone(),
        }
    }
}
