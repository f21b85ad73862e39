use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error, trace};

use super::super::command::{CommandContext, CommandError};
use super::super::events::CommandResponse;
use super::super::queue::QueueEntry;
use super::super::types::TurtleId;
use super::super::world::{PeripheralRegistry, TurtleWorld};
use super::{ExecutedCommand, TickReport, TurtleKernel};

impl TurtleKernel {
    /// Advances every turtle by one simulation tick.
    ///
    /// Per turtle, in round-robin order: upgrades are updated, a running
    /// animation is advanced, and when the turtle is idle and the work
    /// budget allows, one queued command is executed. A response is
    /// published immediately unless the command started an animation, in
    /// which case it is published on the tick that animation finishes.
    pub fn tick(&mut self, world: &mut dyn TurtleWorld) -> TickReport {
        self.time = self.time.saturating_add(1);
        self.work_monitor.begin_tick();

        let order = self.dispatch_order();
        let mut report = TickReport {
            time: self.time,
            ..TickReport::default()
        };
        for turtle_id in &order {
            self.tick_turtle(turtle_id, world, &mut report);
        }

        // Deferred turtles go first next tick; otherwise rotate by one.
        self.scheduler_cursor = report
            .deferred
            .first()
            .or_else(|| order.get(1))
            .or_else(|| order.first())
            .cloned();
        if !report.deferred.is_empty() {
            debug!(
                time = self.time,
                deferred = report.deferred.len(),
                "work budget exhausted; commands deferred"
            );
        }
        report
    }

    fn dispatch_order(&self) -> Vec<TurtleId> {
        let mut order: Vec<TurtleId> = self.turtles.keys().cloned().collect();
        let start = match &self.scheduler_cursor {
            Some(cursor) => order.iter().position(|id| id >= cursor).unwrap_or(0),
            None => 0,
        };
        order.rotate_left(start);
        order
    }

    fn tick_turtle(
        &mut self,
        turtle_id: &TurtleId,
        world: &mut dyn TurtleWorld,
        report: &mut TickReport,
    ) {
        let time = self.time;
        let Some(brain) = self.turtles.get_mut(turtle_id) else {
            return;
        };

        let attached = brain.turtle.computer_attached();
        let peripherals: &mut dyn PeripheralRegistry = self.peripherals.as_mut();
        let registry = if attached { Some(peripherals) } else { None };
        brain.turtle.upgrades_mut().update(turtle_id, time, registry);

        if brain.turtle.animation().is_animating() {
            if brain.turtle.animation_mut().tick() {
                return;
            }
            if let Some(response) = brain.pending.take() {
                self.responses.deliver(turtle_id, &response);
                report.completed += 1;
            }
        }

        if brain.queue.is_empty() {
            return;
        }
        if !self.work_monitor.can_work() {
            report.deferred.push(turtle_id.clone());
            return;
        }
        let Some(QueueEntry {
            correlation_id,
            command,
        }) = brain.queue.try_pop()
        else {
            return;
        };

        let name = command.name().to_string();
        trace!(turtle_id = %turtle_id, correlation_id, command = %name, "executing command");
        let started_at = Instant::now();
        let outcome = {
            let mut ctx = CommandContext {
                turtle: &mut brain.turtle,
                world: &mut *world,
                config: &self.config,
                catalog: &self.catalog,
                peripherals: self.peripherals.as_mut(),
                relocator: self.relocator,
                time,
            };
            panic::catch_unwind(AssertUnwindSafe(|| command.execute(&mut ctx)))
        };
        let elapsed = started_at.elapsed();
        self.work_monitor
            .track_work(u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX));

        let result = outcome.unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            error!(
                turtle_id = %turtle_id,
                correlation_id,
                command = %name,
                %message,
                "command panicked"
            );
            Err(CommandError::Internal(message))
        });
        if let Err(err) = &result {
            debug!(turtle_id = %turtle_id, correlation_id, command = %name, %err, "command failed");
        }

        report.executed.push(ExecutedCommand {
            turtle_id: turtle_id.clone(),
            correlation_id,
            command: name,
            success: result.is_ok(),
        });
        let response = CommandResponse::from_result(correlation_id, result);
        if brain.turtle.animation().is_animating() {
            brain.pending = Some(response);
        } else {
            self.responses.deliver(turtle_id, &response);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "command panicked".to_string()
}
