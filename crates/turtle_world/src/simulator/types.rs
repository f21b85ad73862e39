//! Core type definitions: IDs, constants, inventory and block types.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

pub type TurtleId = String;
pub type WorldId = String;
pub type CorrelationId = u64;
pub type WorldTime = u64;

// ============================================================================
// Constants
// ============================================================================

pub const INVENTORY_SIZE: usize = 16;
pub const MAX_STACK_SIZE: u32 = 64;
pub const DEFAULT_ANIMATION_DURATION_TICKS: u32 = 8;
pub const TURTLE_RESPONSE_EVENT: &str = "turtle_response";
pub const FIRST_CORRELATION_ID: CorrelationId = 1;

// ============================================================================
// Turtle Identity
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurtleSide {
    Left,
    Right,
}

impl TurtleSide {
    pub const ALL: [TurtleSide; 2] = [TurtleSide::Left, TurtleSide::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            TurtleSide::Left => "left",
            TurtleSide::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurtleTier {
    #[default]
    Normal,
    Advanced,
}

/// Weak reference to the player that placed a turtle.
///
/// Only consulted for protection checks; the turtle never owns the player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    pub player_id: String,
    pub name: String,
}

impl OwnerRef {
    pub fn new(player_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            name: name.into(),
        }
    }
}

// ============================================================================
// Blocks
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Air,
    Liquid,
    Solid,
    Unbreakable,
    Turtle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub kind: BlockKind,
}

impl Block {
    pub fn air() -> Self {
        Self {
            id: "air".to_string(),
            kind: BlockKind::Air,
        }
    }

    pub fn solid(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: BlockKind::Solid,
        }
    }

    pub fn liquid(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: BlockKind::Liquid,
        }
    }

    pub fn unbreakable(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: BlockKind::Unbreakable,
        }
    }

    /// Air and liquids can be moved through and replaced.
    pub fn is_passable(&self) -> bool {
        matches!(self.kind, BlockKind::Air | BlockKind::Liquid)
    }

    pub fn is_air(&self) -> bool {
        self.kind == BlockKind::Air
    }
}

// ============================================================================
// Inventory
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub id: String,
    pub count: u32,
}

impl ItemStack {
    pub fn new(id: impl Into<String>, count: u32) -> Self {
        Self {
            id: id.into(),
            count,
        }
    }

    pub fn single(id: impl Into<String>) -> Self {
        Self::new(id, 1)
    }

    pub fn stacks_with(&self, other: &ItemStack) -> bool {
        self.id == other.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<Option<ItemStack>>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            slots: vec![None; INVENTORY_SIZE],
        }
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn get(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Replaces the slot content, returning what was there before.
    pub fn set(&mut self, slot: usize, stack: Option<ItemStack>) -> Option<ItemStack> {
        let stack = stack.filter(|stack| stack.count > 0);
        match self.slots.get_mut(slot) {
            Some(entry) => std::mem::replace(entry, stack),
            None => None,
        }
    }

    /// Removes up to `count` items from a slot.
    pub fn take(&mut self, slot: usize, count: u32) -> Option<ItemStack> {
        let entry = self.slots.get_mut(slot)?;
        let stack = entry.as_mut()?;
        let taken = count.min(stack.count);
        if taken == 0 {
            return None;
        }
        stack.count -= taken;
        let id = stack.id.clone();
        if stack.count == 0 {
            *entry = None;
        }
        Some(ItemStack::new(id, taken))
    }

    /// Inserts into one slot, returning the remainder that did not fit.
    pub fn insert_into(&mut self, slot: usize, stack: ItemStack) -> Option<ItemStack> {
        let Some(entry) = self.slots.get_mut(slot) else {
            return Some(stack);
        };
        match entry {
            None => {
                let placed = stack.count.min(MAX_STACK_SIZE);
                let rest = stack.count - placed;
                *entry = Some(ItemStack::new(stack.id.clone(), placed));
                (rest > 0).then(|| ItemStack::new(stack.id, rest))
            }
            Some(existing) if existing.stacks_with(&stack) => {
                let space = MAX_STACK_SIZE.saturating_sub(existing.count);
                let placed = stack.count.min(space);
                existing.count += placed;
                let rest = stack.count - placed;
                (rest > 0).then(|| ItemStack::new(stack.id, rest))
            }
            Some(_) => Some(stack),
        }
    }

    /// Inserts starting at `start_slot` and wrapping around, the way a
    /// turtle stores dug items.
    pub fn insert_from(&mut self, start_slot: usize, stack: ItemStack) -> Option<ItemStack> {
        let len = self.slots.len();
        let mut remainder = Some(stack);
        for offset in 0..len {
            let Some(stack) = remainder.take() else {
                break;
            };
            remainder = self.insert_into((start_slot + offset) % len, stack);
        }
        remainder
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &ItemStack)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, stack)| stack.as_ref().map(|stack| (slot, stack)))
    }
}
