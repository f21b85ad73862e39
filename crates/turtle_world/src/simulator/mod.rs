//! Turtle simulator - command pipeline between script workers and the tick loop.
//!
//! This module is organized into submodules:
//! - `types`: Core type definitions (IDs, constants, blocks, inventory)
//! - `config`: Fuel limits, animation timing, work budget
//! - `fuel` / `animation` / `upgrade`: per-turtle state machines
//! - `turtle`: the turtle itself and its transferable snapshot
//! - `relocation`: entity replacement on movement
//! - `queue` / `command`: submission and execution of commands
//! - `kernel`: TurtleKernel (registry, per-tick dispatch, queries)
//! - `events` / `client`: correlated responses back to script workers

mod animation;
mod budget;
mod client;
mod command;
mod config;
mod events;
mod fuel;
mod kernel;
mod memory_world;
mod queue;
mod relocation;
mod turtle;
mod types;
mod upgrade;
mod world;

#[cfg(test)]
mod tests;

pub use animation::{AnimationController, AnimationKind, AnimationProgress};
pub use budget::{TickWorkBudget, WorkMonitor, WorkStats};
pub use client::{ClientError, TurtleClient};
pub use command::{
    Command, CommandContext, CommandError, CommandOutput, CommandResult, InteractDirection,
    MoveDirection, TurnDirection, TurtleCommand, MOVE_FUEL_COST, NO_SPACE_MESSAGE,
};
pub use config::{
    ConfigError, TurtleConfig, DEFAULT_ADVANCED_FUEL_LIMIT, DEFAULT_CONFIG_FILE_NAME,
    DEFAULT_EVENT_CAPACITY, DEFAULT_MAX_FUEL_LIMIT, DEFAULT_NORMAL_FUEL_LIMIT,
    DEFAULT_TICK_RATE_HZ, DEFAULT_TICK_WORK_BUDGET_MS, ENV_ADVANCED_FUEL_LIMIT, ENV_FUEL_LIMIT,
    ENV_FUEL_REQUIRED, ENV_TICK_BUDGET_MS, ENV_TICK_RATE_HZ,
};
pub use events::{BroadcastEventBus, CommandResponse, EventSink, ResponseChannel, TurtleEvent};
pub use fuel::FuelLedger;
pub use kernel::{ExecutedCommand, KernelError, TickReport, TurtleKernel, TURTLE_REMOVED_MESSAGE};
pub use memory_world::{EntityRecord, MemoryWorld, WorldBounds, TURTLE_BLOCK_ID};
pub use queue::{CommandQueue, CommandSubmitter, QueueEntry};
pub use relocation::MovementRelocator;
pub use turtle::{MoveLatch, Turtle, TurtleSnapshot, TurtleSpawnConfig};
pub use types::{
    Block, BlockKind, CorrelationId, Inventory, ItemStack, OwnerRef, TurtleId, TurtleSide,
    TurtleTier, WorldId, WorldTime, DEFAULT_ANIMATION_DURATION_TICKS, FIRST_CORRELATION_ID,
    INVENTORY_SIZE, MAX_STACK_SIZE, TURTLE_RESPONSE_EVENT,
};
pub use upgrade::{
    ModemUpgrade, PeripheralHandle, ToolUpgrade, TurtleUpgrade, UpgradeCatalog, UpgradeIds,
    UpgradeKind, UpgradeManager, UpgradeTickContext,
};
pub use world::{EntityKind, EntityRef, NoPeripherals, PeripheralRegistry, TurtleWorld, WorldError};
