//! Entity replacement: the only way a turtle changes position.

use tracing::{debug, warn};

use crate::geometry::BlockPos;

use super::turtle::Turtle;
use super::world::{EntityKind, TurtleWorld};

#[derive(Debug, Clone, Copy, Default)]
pub struct MovementRelocator;

impl MovementRelocator {
    /// Moves `turtle` to `target_pos` in `target_world`.
    ///
    /// Returns false without mutating anything when the destination is
    /// unloaded, out of bounds, or the replacement entity cannot be created.
    pub fn relocate(
        &self,
        turtle: &mut Turtle,
        world: &mut dyn TurtleWorld,
        target_world: &str,
        target_pos: BlockPos,
    ) -> bool {
        if turtle.world() == target_world && turtle.pos() == target_pos {
            return true;
        }
        if !world.is_loaded(target_world, target_pos) {
            return false;
        }
        if !world.is_in_bounds(target_world, target_pos) {
            return false;
        }
        let mid_move = turtle.animation().kind().is_movement();
        debug_assert!(!mid_move, "relocation attempted during a movement animation");
        if mid_move {
            return false;
        }

        let Some(_guard) = turtle.move_latch().engage() else {
            warn!(turtle_id = %turtle.id(), "reentrant relocation ignored");
            return false;
        };

        let template = turtle.snapshot();
        let entity = match world.spawn_entity_like(target_world, target_pos, &template) {
            Ok(entity) => entity,
            Err(err) => {
                warn!(turtle_id = %turtle.id(), ?target_pos, %err, "replacement entity not created");
                return false;
            }
        };
        if entity.kind != EntityKind::Turtle
            || entity.world != target_world
            || entity.pos != target_pos
        {
            warn!(
                turtle_id = %turtle.id(),
                ?target_pos,
                kind = ?entity.kind,
                "replacement entity has an incompatible type"
            );
            world.remove_entity(&entity.world, entity.pos);
            return false;
        }

        let previous = turtle.replace_entity(entity);
        world.remove_entity(&previous.world, previous.pos);
        debug!(
            turtle_id = %turtle.id(),
            from = ?previous.pos,
            to = ?target_pos,
            world = target_world,
            "turtle relocated"
        );
        true
    }
}
