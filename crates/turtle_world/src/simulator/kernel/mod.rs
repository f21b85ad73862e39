//! TurtleKernel: turtle registry, per-tick command dispatch, and
//! presentation queries.

mod dispatch;
mod observation;
mod registry;

pub use registry::TURTLE_REMOVED_MESSAGE;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use super::budget::WorkMonitor;
use super::config::TurtleConfig;
use super::events::{CommandResponse, EventSink, ResponseChannel};
use super::queue::CommandQueue;
use super::relocation::MovementRelocator;
use super::turtle::Turtle;
use super::types::{CorrelationId, TurtleId, WorldTime};
use super::upgrade::UpgradeCatalog;
use super::world::{PeripheralRegistry, WorldError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    #[error("turtle {turtle_id} is not registered")]
    UnknownTurtle { turtle_id: TurtleId },
    #[error("turtle {turtle_id} is already registered")]
    DuplicateTurtle { turtle_id: TurtleId },
    #[error("failed to spawn turtle {turtle_id}: {source}")]
    SpawnFailed {
        turtle_id: TurtleId,
        #[source]
        source: WorldError,
    },
}

impl KernelError {
    fn unknown(turtle_id: &str) -> Self {
        KernelError::UnknownTurtle {
            turtle_id: turtle_id.to_string(),
        }
    }
}

/// One command started during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedCommand {
    pub turtle_id: TurtleId,
    pub correlation_id: CorrelationId,
    pub command: String,
    pub success: bool,
}

/// What happened during one call to [`TurtleKernel::tick`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TickReport {
    pub time: WorldTime,
    pub executed: Vec<ExecutedCommand>,
    /// Responses published because an animation finished this tick.
    pub completed: usize,
    /// Turtles with queued work that the budget pushed to a later tick.
    pub deferred: Vec<TurtleId>,
}

/// Per-turtle state owned by the kernel.
struct TurtleBrain {
    turtle: Turtle,
    queue: CommandQueue,
    /// Response held back until the command's animation finishes.
    pending: Option<CommandResponse>,
}

pub struct TurtleKernel {
    config: TurtleConfig,
    time: WorldTime,
    turtles: BTreeMap<TurtleId, TurtleBrain>,
    responses: ResponseChannel,
    peripherals: Box<dyn PeripheralRegistry>,
    work_monitor: Box<dyn WorkMonitor>,
    catalog: UpgradeCatalog,
    relocator: MovementRelocator,
    /// Turtle visited first on the next tick.
    scheduler_cursor: Option<TurtleId>,
}

impl TurtleKernel {
    pub fn new(
        config: TurtleConfig,
        events: Arc<dyn EventSink>,
        peripherals: Box<dyn PeripheralRegistry>,
        work_monitor: Box<dyn WorkMonitor>,
    ) -> Self {
        Self {
            config: config.sanitized(),
            time: 0,
            turtles: BTreeMap::new(),
            responses: ResponseChannel::new(events),
            peripherals,
            work_monitor,
            catalog: UpgradeCatalog::with_defaults(),
            relocator: MovementRelocator,
            scheduler_cursor: None,
        }
    }

    pub fn with_catalog(mut self, catalog: UpgradeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &TurtleConfig {
        &self.config
    }

    pub fn catalog(&self) -> &UpgradeCatalog {
        &self.catalog
    }

    pub fn time(&self) -> WorldTime {
        self.time
    }
}
