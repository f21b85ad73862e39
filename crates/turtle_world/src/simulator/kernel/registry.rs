use std::sync::Arc;
use tracing::{debug, info};

use super::super::command::{Command, CommandError};
use super::super::events::CommandResponse;
use super::super::queue::{CommandQueue, CommandSubmitter};
use super::super::turtle::{Turtle, TurtleSnapshot, TurtleSpawnConfig};
use super::super::types::{CorrelationId, TurtleSide};
use super::super::upgrade::TurtleUpgrade;
use super::super::world::{EntityKind, EntityRef, PeripheralRegistry, TurtleWorld, WorldError};
use super::{KernelError, TurtleBrain, TurtleKernel};

/// Failure message for commands still queued when their turtle is removed.
pub const TURTLE_REMOVED_MESSAGE: &str = "Turtle removed";

impl TurtleKernel {
    /// Spawns the turtle's first entity and starts accepting commands for it.
    pub fn register_turtle(
        &mut self,
        spec: TurtleSpawnConfig,
        world: &mut dyn TurtleWorld,
    ) -> Result<CommandSubmitter, KernelError> {
        if self.turtles.contains_key(&spec.turtle_id) {
            return Err(KernelError::DuplicateTurtle {
                turtle_id: spec.turtle_id,
            });
        }
        let turtle_id = spec.turtle_id.clone();
        let placeholder = EntityRef {
            world: spec.world.clone(),
            pos: spec.pos,
            kind: EntityKind::Turtle,
            serial: 0,
        };
        let mut turtle = Turtle::new(spec, placeholder, &self.config);

        let template = turtle.snapshot();
        let entity = world
            .spawn_entity_like(&template.world, template.pos, &template)
            .map_err(|source| KernelError::SpawnFailed {
                turtle_id: turtle_id.clone(),
                source,
            })?;
        if entity.kind != EntityKind::Turtle {
            world.remove_entity(&entity.world, entity.pos);
            return Err(KernelError::SpawnFailed {
                turtle_id,
                source: WorldError::SpawnRejected {
                    reason: format!("incompatible entity kind {:?}", entity.kind),
                },
            });
        }
        turtle.replace_entity(entity);

        let queue = CommandQueue::new(turtle_id.clone());
        let submitter = queue.submitter();
        info!(
            turtle_id = %turtle_id,
            world = turtle.world(),
            pos = ?turtle.pos(),
            tier = ?turtle.tier(),
            "turtle registered"
        );
        self.turtles.insert(
            turtle_id,
            TurtleBrain {
                turtle,
                queue,
                pending: None,
            },
        );
        Ok(submitter)
    }

    /// Removes the turtle and its entity.
    ///
    /// A response held for a running animation is published, and every
    /// command still queued is answered with a failure, before the event
    /// stream closes. Commands submitted after removal are dropped.
    pub fn remove_turtle(
        &mut self,
        turtle_id: &str,
        world: &mut dyn TurtleWorld,
    ) -> Result<TurtleSnapshot, KernelError> {
        let brain = self
            .turtles
            .remove(turtle_id)
            .ok_or_else(|| KernelError::unknown(turtle_id))?;
        let turtle = brain.turtle;
        world.remove_entity(turtle.world(), turtle.pos());
        if turtle.computer_attached() {
            for side in TurtleSide::ALL {
                self.peripherals.set_peripheral(turtle.id(), side, None);
            }
        }
        if let Some(response) = brain.pending {
            self.responses.deliver(turtle_id, &response);
        }
        let mut cancelled = 0usize;
        for entry in brain.queue.drain() {
            let response = CommandResponse::failure(
                entry.correlation_id,
                &CommandError::rejected(TURTLE_REMOVED_MESSAGE),
            );
            self.responses.deliver(turtle_id, &response);
            cancelled += 1;
        }
        self.responses.close(turtle_id);
        info!(turtle_id, cancelled_commands = cancelled, "turtle removed");
        Ok(turtle.snapshot())
    }

    /// Cloneable submission handle for script workers.
    pub fn submitter(&self, turtle_id: &str) -> Result<CommandSubmitter, KernelError> {
        self.turtles
            .get(turtle_id)
            .map(|brain| brain.queue.submitter())
            .ok_or_else(|| KernelError::unknown(turtle_id))
    }

    pub fn submit_command<C: Command + 'static>(
        &self,
        turtle_id: &str,
        command: C,
    ) -> Result<CorrelationId, KernelError> {
        self.turtles
            .get(turtle_id)
            .map(|brain| brain.queue.submit(command))
            .ok_or_else(|| KernelError::unknown(turtle_id))
    }

    /// Installs or clears an upgrade outside of command execution.
    /// Returns false when the upgrade was already installed.
    pub fn set_upgrade(
        &mut self,
        turtle_id: &str,
        side: TurtleSide,
        upgrade: Option<Arc<dyn TurtleUpgrade>>,
    ) -> Result<bool, KernelError> {
        let brain = self
            .turtles
            .get_mut(turtle_id)
            .ok_or_else(|| KernelError::unknown(turtle_id))?;
        let id = brain.turtle.id().clone();
        let attached = brain.turtle.computer_attached();
        let peripherals: &mut dyn PeripheralRegistry = self.peripherals.as_mut();
        let registry = if attached { Some(peripherals) } else { None };
        Ok(brain
            .turtle
            .upgrades_mut()
            .set_upgrade(side, upgrade, &id, registry))
    }

    /// Peripheral handles are regenerated on the next tick.
    pub fn attach_computer(&mut self, turtle_id: &str) -> Result<(), KernelError> {
        let brain = self
            .turtles
            .get_mut(turtle_id)
            .ok_or_else(|| KernelError::unknown(turtle_id))?;
        if brain.turtle.computer_attached() {
            return Ok(());
        }
        brain.turtle.set_computer_attached(true);
        brain.turtle.upgrades_mut().invalidate_peripherals();
        debug!(turtle_id, "computer attached");
        Ok(())
    }

    pub fn detach_computer(&mut self, turtle_id: &str) -> Result<(), KernelError> {
        let brain = self
            .turtles
            .get_mut(turtle_id)
            .ok_or_else(|| KernelError::unknown(turtle_id))?;
        if !brain.turtle.computer_attached() {
            return Ok(());
        }
        brain.turtle.set_computer_attached(false);
        brain.turtle.upgrades_mut().invalidate_peripherals();
        for side in TurtleSide::ALL {
            self.peripherals.set_peripheral(brain.turtle.id(), side, None);
        }
        debug!(turtle_id, "computer detached");
        Ok(())
    }
}
