use serde_json::Value;
use tracing::debug;

use super::super::animation::AnimationKind;
use super::super::types::{ItemStack, TurtleSide, INVENTORY_SIZE};
use super::super::world::PeripheralRegistry;
use super::{CommandContext, CommandError, CommandResult, NO_SPACE_MESSAGE};

pub(super) fn select(ctx: &mut CommandContext<'_>, slot: usize) -> CommandResult {
    if !ctx.turtle.select(slot) {
        return Err(CommandError::rejected("Slot number out of range"));
    }
    Ok(Vec::new())
}

pub(super) fn refuel(ctx: &mut CommandContext<'_>, limit: u32) -> CommandResult {
    if !ctx.turtle.fuel().fuel_required() {
        return Ok(Vec::new());
    }
    let slot = ctx.turtle.selected_slot();
    let Some(stack) = ctx.turtle.inventory().get(slot) else {
        return Err(CommandError::rejected("No items to combust"));
    };
    let Some(value) = ctx.config.fuel_value(&stack.id) else {
        return Err(CommandError::rejected("Items not combustible"));
    };
    // refuel(0) only checks combustibility.
    if limit == 0 {
        return Ok(Vec::new());
    }

    let count = limit.min(stack.count);
    let Some(consumed) = ctx.turtle.inventory_mut().take(slot, count) else {
        return Err(CommandError::rejected("No items to combust"));
    };
    let added = ctx
        .turtle
        .fuel_mut()
        .add(value.saturating_mul(consumed.count));
    debug!(
        turtle_id = %ctx.turtle.id(),
        item = %consumed.id,
        items = consumed.count,
        added,
        "turtle refuelled"
    );
    ctx.turtle.animation_mut().begin(AnimationKind::Wait);
    Ok(Vec::new())
}

pub(super) fn transfer_to(ctx: &mut CommandContext<'_>, slot: usize, count: u32) -> CommandResult {
    if slot >= INVENTORY_SIZE {
        return Err(CommandError::rejected("Slot number out of range"));
    }
    let source = ctx.turtle.selected_slot();
    if slot == source || count == 0 {
        return Ok(Vec::new());
    }
    let inventory = ctx.turtle.inventory_mut();
    let Some(taken) = inventory.take(source, count) else {
        return Ok(Vec::new());
    };
    let taken_count = taken.count;
    let moved = match inventory.insert_into(slot, taken) {
        None => taken_count,
        Some(rest) => {
            let moved = taken_count - rest.count;
            inventory.insert_into(source, rest);
            moved
        }
    };
    if moved == 0 {
        return Err(CommandError::rejected("No space for items"));
    }
    ctx.turtle.animation_mut().begin(AnimationKind::ShortWait);
    Ok(Vec::new())
}

pub(super) fn equip(ctx: &mut CommandContext<'_>, side: TurtleSide) -> CommandResult {
    let slot = ctx.turtle.selected_slot();
    let incoming = match ctx.turtle.inventory().get(slot) {
        Some(stack) => match ctx.catalog.get(&stack.id) {
            Some(upgrade) => Some(upgrade),
            None => return Err(CommandError::rejected("Not a valid upgrade")),
        },
        None => None,
    };
    let outgoing = ctx.turtle.upgrades().get(side).cloned();
    if incoming.is_none() && outgoing.is_none() {
        return Ok(Vec::new());
    }

    let mut inventory = ctx.turtle.inventory().clone();
    if incoming.is_some() {
        inventory.take(slot, 1);
    }
    if let Some(outgoing) = &outgoing {
        let returned = ItemStack::single(outgoing.id());
        if let Some(rest) = inventory.insert_from(slot, returned) {
            debug!(turtle_id = %ctx.turtle.id(), item = %rest.id, "inventory full; equip refused");
            return Err(CommandError::rejected(NO_SPACE_MESSAGE));
        }
    }
    *ctx.turtle.inventory_mut() = inventory;

    let turtle_id = ctx.turtle.id().clone();
    let attached = ctx.turtle.computer_attached();
    let peripherals: &mut dyn PeripheralRegistry = &mut *ctx.peripherals;
    let registry = if attached { Some(peripherals) } else { None };
    ctx.turtle
        .upgrades_mut()
        .set_upgrade(side, incoming, &turtle_id, registry);
    ctx.turtle.animation_mut().begin(AnimationKind::Wait);
    Ok(Vec::new())
}

pub(super) fn fuel_level(ctx: &mut CommandContext<'_>) -> CommandResult {
    let fuel = ctx.turtle.fuel();
    if !fuel.fuel_required() {
        return Ok(vec![Value::from("unlimited")]);
    }
    Ok(vec![Value::from(fuel.level())])
}
