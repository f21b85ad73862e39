//! Commands: units of work executed against one turtle on the tick thread.

mod interact;
mod inventory;
mod movement;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::geometry::BlockPos;

use super::config::TurtleConfig;
use super::relocation::MovementRelocator;
use super::turtle::Turtle;
use super::types::{TurtleSide, WorldTime};
use super::upgrade::UpgradeCatalog;
use super::world::{PeripheralRegistry, TurtleWorld};

pub const MOVE_FUEL_COST: u32 = 1;

/// Failure message when items taken by a command have nowhere to go.
pub const NO_SPACE_MESSAGE: &str = "No space for items";

pub type CommandOutput = Vec<Value>;
pub type CommandResult = Result<CommandOutput, CommandError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The command's own precondition or effect failed.
    #[error("{0}")]
    Rejected(String),
    /// Unexpected failure inside the command body.
    #[error("{0}")]
    Internal(String),
}

impl CommandError {
    pub fn rejected(message: impl Into<String>) -> Self {
        CommandError::Rejected(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            CommandError::Rejected(message) | CommandError::Internal(message) => message,
        }
    }
}

/// Everything a command may touch while it runs.
pub struct CommandContext<'a> {
    pub turtle: &'a mut Turtle,
    pub world: &'a mut dyn TurtleWorld,
    pub config: &'a TurtleConfig,
    pub catalog: &'a UpgradeCatalog,
    pub peripherals: &'a mut dyn PeripheralRegistry,
    pub relocator: MovementRelocator,
    pub time: WorldTime,
}

/// A single requested operation on a turtle.
///
/// Commands may mutate the turtle and the world but never enqueue further
/// commands; the context deliberately has no access to the queue.
pub trait Command: Send {
    fn name(&self) -> &str {
        "command"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Forward,
    Back,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractDirection {
    Front,
    Up,
    Down,
}

impl InteractDirection {
    pub fn target(self, turtle: &Turtle) -> BlockPos {
        match self {
            InteractDirection::Front => turtle.facing().step(turtle.pos()),
            InteractDirection::Up => turtle.pos().up(),
            InteractDirection::Down => turtle.pos().down(),
        }
    }
}

/// Built-in turtle operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TurtleCommand {
    Move(MoveDirection),
    Turn(TurnDirection),
    Dig {
        direction: InteractDirection,
        side: Option<TurtleSide>,
    },
    Place(InteractDirection),
    Detect(InteractDirection),
    Inspect(InteractDirection),
    Select(usize),
    Refuel(u32),
    TransferTo {
        slot: usize,
        count: u32,
    },
    Equip(TurtleSide),
    GetFuelLevel,
}

impl TurtleCommand {
    pub fn label(&self) -> &'static str {
        match self {
            TurtleCommand::Move(MoveDirection::Forward) => "forward",
            TurtleCommand::Move(MoveDirection::Back) => "back",
            TurtleCommand::Move(MoveDirection::Up) => "up",
            TurtleCommand::Move(MoveDirection::Down) => "down",
            TurtleCommand::Turn(TurnDirection::Left) => "turn_left",
            TurtleCommand::Turn(TurnDirection::Right) => "turn_right",
            TurtleCommand::Dig { .. } => "dig",
            TurtleCommand::Place(_) => "place",
            TurtleCommand::Detect(_) => "detect",
            TurtleCommand::Inspect(_) => "inspect",
            TurtleCommand::Select(_) => "select",
            TurtleCommand::Refuel(_) => "refuel",
            TurtleCommand::TransferTo { .. } => "transfer_to",
            TurtleCommand::Equip(_) => "equip",
            TurtleCommand::GetFuelLevel => "get_fuel_level",
        }
    }
}

impl Command for TurtleCommand {
    fn name(&self) -> &str {
        self.label()
    }

    fn execute(&self, ctx: &mut CommandContext<'_>) -> CommandResult {
        match *self {
            TurtleCommand::Move(direction) => movement::move_turtle(ctx, direction),
            TurtleCommand::Turn(direction) => movement::turn(ctx, direction),
            TurtleCommand::Dig { direction, side } => interact::dig(ctx, direction, side),
            TurtleCommand::Place(direction) => interact::place(ctx, direction),
            TurtleCommand::Detect(direction) => interact::detect(ctx, direction),
            TurtleCommand::Inspect(direction) => interact::inspect(ctx, direction),
            TurtleCommand::Select(slot) => inventory::select(ctx, slot),
            TurtleCommand::Refuel(limit) => inventory::refuel(ctx, limit),
            TurtleCommand::TransferTo { slot, count } => inventory::transfer_to(ctx, slot, count),
            TurtleCommand::Equip(side) => inventory::equip(ctx, side),
            TurtleCommand::GetFuelLevel => inventory::fuel_level(ctx),
        }
    }
}
