use super::*;
use std::panic::{self, AssertUnwindSafe};

/// World that is loaded everywhere but blows up when asked to spawn.
struct PanickingWorld;

impl TurtleWorld for PanickingWorld {
    fn is_loaded(&self, _world: &str, _pos: BlockPos) -> bool {
        true
    }

    fn is_in_bounds(&self, _world: &str, _pos: BlockPos) -> bool {
        true
    }

    fn block(&self, _world: &str, _pos: BlockPos) -> Block {
        Block::air()
    }

    fn set_block(&mut self, _world: &str, _pos: BlockPos, _block: Block) -> Result<(), WorldError> {
        Ok(())
    }

    fn spawn_entity_like(
        &mut self,
        _world: &str,
        _pos: BlockPos,
        _template: &TurtleSnapshot,
    ) -> Result<EntityRef, WorldError> {
        panic!("neighbour update failed");
    }

    fn remove_entity(&mut self, _world: &str, _pos: BlockPos) {}
}

#[test]
fn relocating_to_same_place_causes_no_entity_churn() {
    let mut world = flat_world();
    let mut turtle = spawn_turtle(&mut world, "t-1", start_pos(), 10);
    let (spawns, removes) = (world.spawn_calls(), world.remove_calls());

    assert!(MovementRelocator.relocate(&mut turtle, &mut world, WORLD, start_pos()));
    assert_eq!(world.spawn_calls(), spawns);
    assert_eq!(world.remove_calls(), removes);
}

#[test]
fn relocation_moves_entity_and_carries_state() {
    let mut world = flat_world();
    let mut turtle = spawn_turtle(&mut world, "t-1", start_pos(), 42);
    turtle.select(3);
    turtle
        .inventory_mut()
        .set(3, Some(ItemStack::new("cobblestone", 12)));
    let target = start_pos().offset(0, 0, -1);

    assert!(MovementRelocator.relocate(&mut turtle, &mut world, WORLD, target));
    assert_eq!(turtle.pos(), target);
    assert!(!turtle.is_moving());
    assert!(world.entity_at(WORLD, start_pos()).is_none());

    let record = world.entity_at(WORLD, target).expect("entity at target");
    assert_eq!(record.kind, EntityKind::Turtle);
    assert_eq!(record.template.fuel_level, 42);
    assert_eq!(record.template.selected_slot, 3);
    assert_eq!(
        record.template.inventory.get(3),
        Some(&ItemStack::new("cobblestone", 12))
    );
    assert_eq!(world.entity_count(), 1);
}

#[test]
fn relocation_into_unloaded_chunk_touches_nothing() {
    let mut world = flat_world();
    let mut turtle = spawn_turtle(&mut world, "t-1", start_pos(), 10);
    let target = BlockPos::new(16 * 5, FLOOR_Y + 1, 0);
    world.unload_chunk(WORLD, ChunkPos::of(target));
    let (spawns, removes) = (world.spawn_calls(), world.remove_calls());
    let before = turtle.entity().clone();

    assert!(!MovementRelocator.relocate(&mut turtle, &mut world, WORLD, target));
    assert_eq!(turtle.entity(), &before);
    assert_eq!(world.spawn_calls(), spawns);
    assert_eq!(world.remove_calls(), removes);
}

#[test]
fn relocation_out_of_bounds_is_refused() {
    let mut world = flat_world();
    let mut turtle = spawn_turtle(&mut world, "t-1", start_pos(), 10);
    let target = BlockPos::new(0, WorldBounds::default().max_y + 1, 0);

    assert!(!MovementRelocator.relocate(&mut turtle, &mut world, WORLD, target));
    assert_eq!(turtle.pos(), start_pos());
}

#[test]
fn failed_spawn_leaves_original_entity_intact() {
    let mut world = flat_world();
    let mut turtle = spawn_turtle(&mut world, "t-1", start_pos(), 10);
    let before = turtle.snapshot();
    let removes = world.remove_calls();
    world.fail_next_spawn(WorldError::SpawnRejected {
        reason: "entity cap".to_string(),
    });

    assert!(!MovementRelocator.relocate(
        &mut turtle,
        &mut world,
        WORLD,
        start_pos().offset(1, 0, 0)
    ));
    assert_eq!(turtle.snapshot(), before);
    assert_eq!(world.remove_calls(), removes);
    assert!(world.entity_at(WORLD, start_pos()).is_some());
    assert!(!turtle.is_moving());
}

#[test]
fn incompatible_replacement_is_discarded() {
    let mut world = flat_world();
    let mut turtle = spawn_turtle(&mut world, "t-1", start_pos(), 10);
    let target = start_pos().offset(1, 0, 0);
    world.spawn_next_as(EntityKind::Other("minecart".to_string()));

    assert!(!MovementRelocator.relocate(&mut turtle, &mut world, WORLD, target));
    assert_eq!(turtle.pos(), start_pos());
    assert!(world.entity_at(WORLD, target).is_none());
    assert!(world.entity_at(WORLD, start_pos()).is_some());
}

#[test]
fn reentrant_relocation_is_ignored() {
    let mut world = flat_world();
    let mut turtle = spawn_turtle(&mut world, "t-1", start_pos(), 10);
    let latch = turtle.move_latch();
    let guard = latch.engage().expect("latch is free");
    let spawns = world.spawn_calls();

    assert!(!MovementRelocator.relocate(
        &mut turtle,
        &mut world,
        WORLD,
        start_pos().offset(1, 0, 0)
    ));
    assert_eq!(world.spawn_calls(), spawns);
    assert!(turtle.is_moving());

    drop(guard);
    assert!(!turtle.is_moving());
}

#[test]
fn move_latch_is_released_when_relocation_unwinds() {
    let mut world = flat_world();
    let mut turtle = spawn_turtle(&mut world, "t-1", start_pos(), 10);
    let mut exploding = PanickingWorld;

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        MovementRelocator.relocate(&mut turtle, &mut exploding, WORLD, start_pos().offset(1, 0, 0))
    }));
    assert!(outcome.is_err());
    assert!(!turtle.is_moving());
    assert_eq!(turtle.pos(), start_pos());
}
