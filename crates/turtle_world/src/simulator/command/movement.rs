use super::super::animation::AnimationKind;
use super::{CommandContext, CommandError, CommandResult, MoveDirection, TurnDirection, MOVE_FUEL_COST};

pub(super) fn move_turtle(ctx: &mut CommandContext<'_>, direction: MoveDirection) -> CommandResult {
    let world_id = ctx.turtle.world().to_string();
    let pos = ctx.turtle.pos();
    let facing = ctx.turtle.facing();
    let (target, animation) = match direction {
        MoveDirection::Forward => (facing.step(pos), AnimationKind::MoveForward),
        MoveDirection::Back => (facing.opposite().step(pos), AnimationKind::MoveBack),
        MoveDirection::Up => (pos.up(), AnimationKind::MoveUp),
        MoveDirection::Down => (pos.down(), AnimationKind::MoveDown),
    };

    if !ctx.world.is_in_bounds(&world_id, target) {
        return Err(CommandError::rejected(match direction {
            MoveDirection::Up => "Too high to move",
            MoveDirection::Down => "Too low to move",
            MoveDirection::Forward | MoveDirection::Back => "Cannot pass the world border",
        }));
    }
    if !ctx.world.is_loaded(&world_id, target) {
        return Err(CommandError::rejected("Cannot leave loaded world"));
    }
    if !ctx.world.block(&world_id, target).is_passable() {
        return Err(CommandError::rejected("Movement obstructed"));
    }
    if ctx.world.is_protected(&world_id, target, ctx.turtle.owner()) {
        return Err(CommandError::rejected("Cannot enter protected area"));
    }
    if !ctx.turtle.fuel().has(MOVE_FUEL_COST) {
        return Err(CommandError::rejected("Out of fuel"));
    }
    if !ctx
        .relocator
        .relocate(ctx.turtle, ctx.world, &world_id, target)
    {
        return Err(CommandError::rejected("Cannot leave loaded world"));
    }

    ctx.turtle.fuel_mut().consume(MOVE_FUEL_COST);
    ctx.turtle.animation_mut().begin(animation);
    Ok(Vec::new())
}

pub(super) fn turn(ctx: &mut CommandContext<'_>, direction: TurnDirection) -> CommandResult {
    let facing = ctx.turtle.facing();
    let (facing, animation) = match direction {
        TurnDirection::Left => (facing.turn_left(), AnimationKind::TurnLeft),
        TurnDirection::Right => (facing.turn_right(), AnimationKind::TurnRight),
    };
    ctx.turtle.set_facing(facing);
    ctx.turtle.animation_mut().begin(animation);
    Ok(Vec::new())
}
