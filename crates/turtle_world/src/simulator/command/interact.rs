use serde_json::{json, Value};
use tracing::debug;

use super::super::animation::AnimationKind;
use super::super::turtle::Turtle;
use super::super::types::{Block, BlockKind, ItemStack, TurtleSide};
use super::{CommandContext, CommandError, CommandResult, InteractDirection, NO_SPACE_MESSAGE};

fn digging_side(turtle: &Turtle, requested: Option<TurtleSide>) -> Result<TurtleSide, CommandError> {
    let can_dig = |side: TurtleSide| {
        turtle
            .upgrades()
            .get(side)
            .is_some_and(|upgrade| upgrade.can_dig())
    };
    let found = match requested {
        Some(side) => can_dig(side).then_some(side),
        None => [TurtleSide::Right, TurtleSide::Left]
            .into_iter()
            .find(|side| can_dig(*side)),
    };
    found.ok_or_else(|| CommandError::rejected("No tool to dig with"))
}

pub(super) fn dig(
    ctx: &mut CommandContext<'_>,
    direction: InteractDirection,
    side: Option<TurtleSide>,
) -> CommandResult {
    let side = digging_side(ctx.turtle, side)?;
    let world_id = ctx.turtle.world().to_string();
    let target = direction.target(ctx.turtle);

    let block = ctx.world.block(&world_id, target);
    if block.is_passable() {
        return Err(CommandError::rejected("Nothing to dig here"));
    }
    // Other turtles are never dug out from under their own queue.
    if matches!(block.kind, BlockKind::Unbreakable | BlockKind::Turtle) {
        return Err(CommandError::rejected("Unbreakable block detected"));
    }
    if ctx.world.is_protected(&world_id, target, ctx.turtle.owner()) {
        return Err(CommandError::rejected("Cannot break protected block"));
    }
    let mut inventory = ctx.turtle.inventory().clone();
    let start_slot = ctx.turtle.selected_slot();
    if inventory
        .insert_from(start_slot, ItemStack::single(block.id.clone()))
        .is_some()
    {
        debug!(turtle_id = %ctx.turtle.id(), item = %block.id, "inventory full; dig refused");
        return Err(CommandError::rejected(NO_SPACE_MESSAGE));
    }
    ctx.world
        .set_block(&world_id, target, Block::air())
        .map_err(|err| CommandError::rejected(err.to_string()))?;
    *ctx.turtle.inventory_mut() = inventory;
    ctx.turtle.animation_mut().begin(match side {
        TurtleSide::Left => AnimationKind::SwingLeftTool,
        TurtleSide::Right => AnimationKind::SwingRightTool,
    });
    Ok(Vec::new())
}

pub(super) fn place(ctx: &mut CommandContext<'_>, direction: InteractDirection) -> CommandResult {
    let slot = ctx.turtle.selected_slot();
    let Some(item_id) = ctx.turtle.inventory().get(slot).map(|stack| stack.id.clone()) else {
        return Err(CommandError::rejected("No items to place"));
    };
    let world_id = ctx.turtle.world().to_string();
    let target = direction.target(ctx.turtle);

    let placeable = ctx.world.is_loaded(&world_id, target)
        && ctx.world.is_in_bounds(&world_id, target)
        && ctx.world.block(&world_id, target).is_passable()
        && !ctx.world.is_protected(&world_id, target, ctx.turtle.owner());
    if !placeable {
        return Err(CommandError::rejected("Cannot place block here"));
    }
    ctx.world
        .set_block(&world_id, target, Block::solid(item_id))
        .map_err(|err| CommandError::rejected(err.to_string()))?;
    ctx.turtle.inventory_mut().take(slot, 1);
    ctx.turtle.animation_mut().begin(AnimationKind::Wait);
    Ok(Vec::new())
}

pub(super) fn detect(ctx: &mut CommandContext<'_>, direction: InteractDirection) -> CommandResult {
    let target = direction.target(ctx.turtle);
    let block = ctx.world.block(ctx.turtle.world(), target);
    Ok(vec![Value::Bool(!block.is_passable())])
}

pub(super) fn inspect(ctx: &mut CommandContext<'_>, direction: InteractDirection) -> CommandResult {
    let target = direction.target(ctx.turtle);
    let block = ctx.world.block(ctx.turtle.world(), target);
    if block.is_air() {
        return Err(CommandError::rejected("No block to inspect"));
    }
    Ok(vec![json!({ "name": block.id, "kind": block.kind })])
}
